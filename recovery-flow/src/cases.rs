//! Read-only case queue and its search/filter predicate.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;

/// Status filter value that matches every case.
pub const ALL_STATUSES: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Pending,
    Flagged,
    InProgress,
    Escalated,
    Completed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::Flagged => "flagged",
            CaseStatus::InProgress => "in_progress",
            CaseStatus::Escalated => "escalated",
            CaseStatus::Completed => "completed",
        }
    }

    pub fn needs_supervisor(&self) -> bool {
        matches!(self, CaseStatus::Flagged | CaseStatus::Escalated)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// A subrogation case in the recovery queue. Identity is the claim number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub claim_number: String,
    pub claimant: String,
    pub third_party: String,
    pub recovery_amount: Money,
    pub days_open: u32,
    pub status: CaseStatus,
    pub priority: Priority,
}

impl Case {
    /// `search` must already be lower-cased.
    fn matches_search(&self, search: &str) -> bool {
        search.is_empty()
            || self.claim_number.to_lowercase().contains(search)
            || self.claimant.to_lowercase().contains(search)
    }

    fn matches_status(&self, status: &str) -> bool {
        status == ALL_STATUSES || self.status.as_str() == status
    }
}

/// Returns `true` when `case` passes both the search term and the status filter.
///
/// The search term is matched case-insensitively against the claim number and the
/// claimant name; an empty term matches everything. The status filter is either
/// [`ALL_STATUSES`] or the snake_case name of a [`CaseStatus`]; any other value
/// matches nothing.
pub fn matches(case: &Case, search: &str, status: &str) -> bool {
    case.matches_status(status) && case.matches_search(&search.to_lowercase())
}

/// Filters `cases` preserving their order.
pub fn filter<'a>(cases: &'a [Case], search: &str, status: &str) -> Vec<&'a Case> {
    let search = search.to_lowercase();
    cases
        .iter()
        .filter(|case| case.matches_status(status) && case.matches_search(&search))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub flagged: usize,
    pub total_recovery: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EscalationStats {
    pub escalations: usize,
    pub high_priority: usize,
    pub recovery_at_stake: Money,
}

fn sum_recovery<'a>(cases: impl Iterator<Item = &'a Case>) -> Money {
    cases.fold(Money::zero(), |acc, case| {
        acc.checked_add(case.recovery_amount).unwrap_or(acc)
    })
}

/// In-memory, read-only case queue.
#[derive(Debug, Clone)]
pub struct CaseRegistry {
    cases: Vec<Case>,
}

impl CaseRegistry {
    pub fn new(cases: Vec<Case>) -> Self {
        Self { cases }
    }

    /// The fixed sample queue shipped with the desk.
    pub fn sample() -> Self {
        let case = |id: &str,
                    claim_number: &str,
                    claimant: &str,
                    third_party: &str,
                    pounds: i64,
                    days_open: u32,
                    status: CaseStatus,
                    priority: Priority| Case {
            id: id.to_string(),
            claim_number: claim_number.to_string(),
            claimant: claimant.to_string(),
            third_party: third_party.to_string(),
            recovery_amount: Money::from_pounds(pounds),
            days_open,
            status,
            priority,
        };

        Self::new(vec![
            case("1", "CLM-2024-78432", "J. Smith", "ABC Insurance", 4200, 45, CaseStatus::Pending, Priority::Medium),
            case("2", "CLM-2024-78419", "M. Johnson", "XYZ Motors", 2850, 32, CaseStatus::Pending, Priority::Low),
            case("3", "CLM-2024-78405", "S. Williams", "Direct Line", 7500, 58, CaseStatus::Flagged, Priority::High),
            case("4", "CLM-2024-78390", "R. Brown", "General Insurance", 3100, 21, CaseStatus::Pending, Priority::Low),
            case("5", "CLM-2024-78378", "P. Davis", "Churchill", 5600, 67, CaseStatus::Flagged, Priority::High),
        ])
    }

    pub fn list(&self) -> &[Case] {
        &self.cases
    }

    pub fn find(&self, claim_number: &str) -> Option<&Case> {
        self.cases.iter().find(|c| c.claim_number == claim_number)
    }

    pub fn filter(&self, search: &str, status: &str) -> Vec<&Case> {
        filter(&self.cases, search, status)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            total: self.cases.len(),
            pending: self
                .cases
                .iter()
                .filter(|c| c.status == CaseStatus::Pending)
                .count(),
            flagged: self
                .cases
                .iter()
                .filter(|c| c.status == CaseStatus::Flagged)
                .count(),
            total_recovery: sum_recovery(self.cases.iter()),
        }
    }

    /// Cases waiting on a supervisor: flagged or escalated.
    pub fn escalations(&self) -> Vec<&Case> {
        self.cases
            .iter()
            .filter(|c| c.status.needs_supervisor())
            .collect()
    }

    pub fn escalation_stats(&self) -> EscalationStats {
        let escalated = self.escalations();
        EscalationStats {
            escalations: escalated.len(),
            high_priority: escalated
                .iter()
                .filter(|c| c.priority == Priority::High)
                .count(),
            recovery_at_stake: sum_recovery(escalated.into_iter()),
        }
    }
}

impl Default for CaseRegistry {
    fn default() -> Self {
        Self::sample()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_numbers(cases: &[&Case]) -> Vec<String> {
        cases.iter().map(|c| c.claim_number.clone()).collect()
    }

    #[test]
    fn test_sample_queue_is_stable() {
        let registry = CaseRegistry::sample();
        assert_eq!(registry.list().len(), 5);
        assert_eq!(registry.list()[0].claim_number, "CLM-2024-78432");
        assert_eq!(registry.list()[4].claim_number, "CLM-2024-78378");
    }

    #[test]
    fn test_empty_search_and_all_returns_everything_in_order() {
        let registry = CaseRegistry::sample();
        let all = registry.filter("", ALL_STATUSES);
        assert_eq!(all.len(), registry.list().len());
        let expected: Vec<&Case> = registry.list().iter().collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_search_is_case_insensitive_on_claimant_and_claim_number() {
        let registry = CaseRegistry::sample();
        assert_eq!(
            claim_numbers(&registry.filter("smith", ALL_STATUSES)),
            vec!["CLM-2024-78432"]
        );
        assert_eq!(
            claim_numbers(&registry.filter("clm-2024-7841", ALL_STATUSES)),
            vec!["CLM-2024-78419"]
        );
        // counterparty is not searched
        assert!(registry.filter("churchill", ALL_STATUSES).is_empty());
    }

    #[test]
    fn test_status_filter() {
        let registry = CaseRegistry::sample();
        assert_eq!(
            claim_numbers(&registry.filter("", "flagged")),
            vec!["CLM-2024-78405", "CLM-2024-78378"]
        );
        assert_eq!(
            claim_numbers(&registry.filter("davis", "flagged")),
            vec!["CLM-2024-78378"]
        );
        assert!(registry.filter("davis", "pending").is_empty());
        assert!(registry.filter("", "unknown").is_empty());
    }

    #[test]
    fn test_filter_agrees_with_predicate_for_every_combination() {
        let registry = CaseRegistry::sample();
        let terms = ["", "j", "SMITH", "2024", "783", ". ", "zzz", "m. johnson"];
        let statuses = ["all", "pending", "flagged", "in_progress", "escalated", "completed"];

        for term in terms {
            for status in statuses {
                let filtered = registry.filter(term, status);
                for case in registry.list() {
                    let lowered = term.to_lowercase();
                    let expected = (status == ALL_STATUSES || case.status.as_str() == status)
                        && (case.claim_number.to_lowercase().contains(&lowered)
                            || case.claimant.to_lowercase().contains(&lowered));
                    assert_eq!(matches(case, term, status), expected);
                    assert_eq!(filtered.contains(&case), expected, "{term:?} / {status}");
                }
            }
        }
    }

    #[test]
    fn test_queue_stats() {
        let stats = CaseRegistry::sample().stats();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.flagged, 2);
        assert_eq!(stats.total_recovery, Money::from_pounds(23250));
    }

    #[test]
    fn test_escalations() {
        let registry = CaseRegistry::sample();
        assert_eq!(
            claim_numbers(&registry.escalations()),
            vec!["CLM-2024-78405", "CLM-2024-78378"]
        );
        let stats = registry.escalation_stats();
        assert_eq!(stats.escalations, 2);
        assert_eq!(stats.high_priority, 2);
        assert_eq!(stats.recovery_at_stake, Money::from_pounds(13100));
    }
}
