//! Pure mapping from desk state and agent payloads to display records.
//!
//! Nothing here mutates its input. Missing payload fields render as [`PLACEHOLDER`].

use chrono::DateTime;
use serde::Serialize;

use crate::{
    cases::{Case, CaseRegistry, CaseStatus, Priority},
    money::Money,
    navigator::{Navigator, Screen},
    orchestration::Orchestration,
    outlay::Approval,
    payload::{
        AuditStep, BreakdownItem, CaseEvaluation, Discrepancy, ExceptionFlag, NextStep,
        OutlayDocument,
    },
    processing,
};

pub const PLACEHOLDER: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    Default,
    Destructive,
    Outline,
    Secondary,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: String,
    pub variant: BadgeVariant,
}

impl Badge {
    fn new(label: impl Into<String>, variant: BadgeVariant) -> Self {
        Self {
            label: label.into(),
            variant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Pass,
    Review,
    Fail,
}

impl ScoreBand {
    /// Pass at 80 and above, review from 50 to 79, fail below 50.
    pub fn of(score: f64) -> Self {
        if score >= 80.0 {
            ScoreBand::Pass
        } else if score >= 50.0 {
            ScoreBand::Review
        } else {
            ScoreBand::Fail
        }
    }
}

pub fn score_badge(score: f64) -> Badge {
    let shown = number(score);
    match ScoreBand::of(score) {
        ScoreBand::Pass => Badge::new(format!("PASS ({shown}%)"), BadgeVariant::Success),
        ScoreBand::Review => Badge::new(format!("REVIEW ({shown}%)"), BadgeVariant::Default),
        ScoreBand::Fail => Badge::new(format!("FAIL ({shown}%)"), BadgeVariant::Destructive),
    }
}

/// CRITICAL and WARNING get their own styles; anything else is shown as-is, neutrally.
pub fn severity_badge(severity: Option<&str>) -> Badge {
    match severity {
        Some("CRITICAL") => Badge::new("CRITICAL", BadgeVariant::Destructive),
        Some("WARNING") => Badge::new("WARNING", BadgeVariant::Default),
        Some(other) => Badge::new(other, BadgeVariant::Outline),
        None => Badge::new(PLACEHOLDER, BadgeVariant::Outline),
    }
}

/// LOW and MEDIUM are graded; any other reported level is treated as high risk.
pub fn risk_badge(risk_level: Option<&str>) -> Badge {
    match risk_level {
        Some(level @ "LOW") => Badge::new(level, BadgeVariant::Secondary),
        Some(level @ "MEDIUM") => Badge::new(level, BadgeVariant::Default),
        Some(level) => Badge::new(level, BadgeVariant::Destructive),
        None => Badge::new(PLACEHOLDER, BadgeVariant::Outline),
    }
}

pub fn status_badge(status: CaseStatus) -> Badge {
    match status {
        CaseStatus::Pending => Badge::new("Pending", BadgeVariant::Outline),
        CaseStatus::Flagged => Badge::new("Flagged", BadgeVariant::Destructive),
        CaseStatus::InProgress => Badge::new("In Progress", BadgeVariant::Default),
        CaseStatus::Escalated => Badge::new("Escalated", BadgeVariant::Secondary),
        CaseStatus::Completed => Badge::new("Completed", BadgeVariant::Secondary),
    }
}

pub fn priority_badge(priority: Priority) -> Badge {
    priority_label_badge(Some(priority.as_str()))
}

/// Free-text priority as reported by an agent. Unknown values keep their label and
/// take the medium style.
pub fn priority_label_badge(priority: Option<&str>) -> Badge {
    let Some(priority) = priority else {
        return Badge::new(PLACEHOLDER, BadgeVariant::Outline);
    };
    let variant = match priority.to_lowercase().as_str() {
        "high" => BadgeVariant::Destructive,
        "low" => BadgeVariant::Secondary,
        _ => BadgeVariant::Default,
    };
    Badge::new(priority.to_uppercase(), variant)
}

fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

pub fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn pounds(value: Option<f64>) -> String {
    value
        .and_then(Money::from_major)
        .map(|m| m.to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

pub fn percent(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{}%", number(v)))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// RFC 3339 timestamps as `dd/mm/yyyy, hh:mm:ss`. Unparseable values are shown verbatim.
pub fn timestamp(value: Option<&String>) -> String {
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.format("%d/%m/%Y, %H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.clone()),
        None => PLACEHOLDER.to_string(),
    }
}

pub fn time_of_day(value: Option<&String>) -> String {
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.clone()),
        None => PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

fn field(label: &'static str, value: String) -> Field {
    Field { label, value }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    pub label: &'static str,
    pub passed: bool,
}

fn check(label: &'static str, passed: bool) -> Check {
    Check { label, passed }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRow {
    pub claim_number: String,
    pub claimant: String,
    pub third_party: String,
    pub recovery_amount: String,
    pub days_open: u32,
    pub status: Badge,
    pub priority: Badge,
}

pub fn case_row(case: &Case) -> CaseRow {
    CaseRow {
        claim_number: case.claim_number.clone(),
        claimant: case.claimant.clone(),
        third_party: case.third_party.clone(),
        recovery_amount: case.recovery_amount.to_string(),
        days_open: case.days_open,
        status: status_badge(case.status),
        priority: priority_badge(case.priority),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueView {
    pub total_cases: usize,
    pub pending: usize,
    pub flagged: usize,
    pub total_recovery: String,
    pub cases: Vec<CaseRow>,
}

/// Queue statistics cover every case; the rows honour the search and status filter.
pub fn queue(registry: &CaseRegistry, search: &str, status: &str) -> QueueView {
    let stats = registry.stats();
    QueueView {
        total_cases: stats.total,
        pending: stats.pending,
        flagged: stats.flagged,
        total_recovery: stats.total_recovery.to_string(),
        cases: registry
            .filter(search, status)
            .into_iter()
            .map(case_row)
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EscalationView {
    pub escalations: usize,
    pub high_priority: usize,
    pub recovery_at_stake: String,
    pub cases: Vec<CaseRow>,
}

pub fn escalations(registry: &CaseRegistry) -> EscalationView {
    let stats = registry.escalation_stats();
    EscalationView {
        escalations: stats.escalations,
        high_priority: stats.high_priority,
        recovery_at_stake: stats.recovery_at_stake.to_string(),
        cases: registry.escalations().into_iter().map(case_row).collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscrepancyView {
    pub severity: Badge,
    pub category: String,
    pub description: String,
    pub source: String,
    pub requires_action: bool,
}

fn discrepancy(d: &Discrepancy) -> DiscrepancyView {
    DiscrepancyView {
        severity: severity_badge(d.severity.as_deref()),
        category: text(d.category.as_ref()),
        description: text(d.description.as_ref()),
        source: text(d.source.as_ref()),
        requires_action: d.requires_action,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagView {
    pub flag_type: String,
    pub description: String,
    pub urgency: String,
    pub recommended_action: String,
}

fn exception_flag(f: &ExceptionFlag) -> FlagView {
    FlagView {
        flag_type: text(f.flag_type.as_ref()),
        description: text(f.description.as_ref()),
        urgency: text(f.urgency.as_ref()),
        recommended_action: text(f.recommended_action.as_ref()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub priority: Badge,
    pub action: String,
    pub assigned_to: String,
    pub deadline: String,
}

fn next_step(s: &NextStep) -> StepView {
    StepView {
        priority: priority_label_badge(s.priority.as_deref()),
        action: text(s.action.as_ref()),
        assigned_to: text(s.assigned_to.as_ref()),
        deadline: timestamp(s.deadline.as_ref()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationView {
    pub case_status: String,
    pub processed_at: String,
    pub overall_assessment: String,
    pub claim: Vec<Field>,
    pub policy: Vec<Field>,
    pub financial: Vec<Field>,
    pub liability: Vec<Field>,
    pub supporting_evidence: Vec<String>,
    pub data_completeness: String,
    pub overall_validation: String,
    pub validation_score: Option<Badge>,
    pub validation: Vec<Field>,
    pub discrepancies: Vec<DiscrepancyView>,
    pub exception_flags: Vec<FlagView>,
    pub fraud_risk: Badge,
    pub fraud_score: String,
    pub requires_investigation: bool,
    pub legal_review_required: bool,
    pub next_steps: Vec<StepView>,
    pub ready_for_document_generation: bool,
}

pub fn evaluation(e: &CaseEvaluation) -> EvaluationView {
    let summary = e.case_summary.clone().unwrap_or_default();
    let aggregated = e.aggregated_data.clone().unwrap_or_default();
    let claim = aggregated.claim_summary.unwrap_or_default();
    let policy = aggregated.policy_summary.unwrap_or_default();
    let financial = aggregated.financial_summary.unwrap_or_default();
    let liability = aggregated.liability_summary.unwrap_or_default();
    let validation = e.validation_status.clone().unwrap_or_default();
    let fraud = e.fraud_assessment.clone().unwrap_or_default();

    EvaluationView {
        case_status: text(summary.case_status.as_ref()),
        processed_at: timestamp(summary.processing_timestamp.as_ref()),
        overall_assessment: text(summary.overall_assessment.as_ref()),
        claim: vec![
            field("Claim Number", text(claim.claim_number.as_ref())),
            field("Claimant", text(claim.claimant.as_ref())),
            field("Incident Date", text(claim.incident_date.as_ref())),
            field("Description", text(claim.incident_description.as_ref())),
            field("Claim Status", text(claim.claim_status.as_ref())),
        ],
        policy: vec![
            field("Policy Number", text(policy.policy_number.as_ref())),
            field("Policy Holder", text(policy.policy_holder.as_ref())),
            field("Policy Type", text(policy.policy_type.as_ref())),
        ],
        financial: vec![
            field("Total Recovery", pounds(financial.total_recovery_amount)),
            field("Repair Costs", pounds(financial.repair_costs)),
            field(
                "Expected Recovery",
                percent(financial.expected_recovery_percentage),
            ),
        ],
        liability: vec![
            field("At-Fault Party", text(liability.at_fault_party.as_ref())),
            field("Liability", percent(liability.liability_percentage)),
            field("Determination", text(liability.determination.as_ref())),
        ],
        supporting_evidence: liability.supporting_evidence,
        data_completeness: percent(aggregated.data_completeness),
        overall_validation: text(validation.overall_validation.as_ref()),
        validation_score: validation.validation_score.map(score_badge),
        validation: vec![
            field("Data Accuracy", text(validation.data_accuracy_status.as_ref())),
            field(
                "Liability Clarity",
                text(validation.liability_clarity_status.as_ref()),
            ),
            field("Documentation", text(validation.documentation_status.as_ref())),
            field("Compliance", text(validation.compliance_status.as_ref())),
        ],
        discrepancies: e.discrepancies_identified.iter().map(discrepancy).collect(),
        exception_flags: e.exception_flags.iter().map(exception_flag).collect(),
        fraud_risk: risk_badge(fraud.risk_level.as_deref()),
        fraud_score: fraud
            .fraud_score
            .map(number)
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        requires_investigation: fraud.requires_investigation,
        legal_review_required: e.legal_review_required,
        next_steps: e.next_steps.iter().map(next_step).collect(),
        ready_for_document_generation: e.is_ready(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownView {
    pub category: String,
    pub description: String,
    pub amount: String,
}

fn breakdown(b: &BreakdownItem) -> BreakdownView {
    BreakdownView {
        category: text(b.category.as_ref()),
        description: text(b.description.as_ref()),
        amount: pounds(b.amount),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditView {
    pub step: String,
    pub time: String,
    pub action: String,
    pub data_source: String,
}

fn audit(a: &AuditStep) -> AuditView {
    AuditView {
        step: text(a.step.as_ref()),
        time: time_of_day(a.timestamp.as_ref()),
        action: text(a.action.as_ref()),
        data_source: text(a.data_source.as_ref()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub metadata: Vec<Field>,
    pub total_recovery: String,
    pub currency: String,
    pub breakdown: Vec<BreakdownView>,
    pub calculation: Vec<Field>,
    pub case_details: Vec<Field>,
    pub supporting_documentation: Vec<Check>,
    pub validation_checks: Vec<Check>,
    pub audit_trail: Vec<AuditView>,
    pub sections: Vec<Field>,
    pub status: String,
    pub next_actions: Vec<StepView>,
}

pub fn document(d: &OutlayDocument) -> DocumentView {
    let metadata = d.document_metadata.clone().unwrap_or_default();
    let summary = d.outlay_summary.clone().unwrap_or_default();
    let calculation = summary.recovery_calculation.clone().unwrap_or_default();
    let details = d.case_details_included.clone().unwrap_or_default();
    let docs = d.supporting_documentation.clone().unwrap_or_default();
    let checks = d.validation_checks_passed.clone().unwrap_or_default();
    let sections = d.document_sections.clone().unwrap_or_default();

    DocumentView {
        metadata: vec![
            field("Document ID", text(metadata.document_id.as_ref())),
            field("Document Type", text(metadata.document_type.as_ref())),
            field("Template", text(metadata.template_used.as_ref())),
            field("Generated", timestamp(metadata.generated_timestamp.as_ref())),
            field("Case Reference", text(metadata.case_reference.as_ref())),
        ],
        total_recovery: pounds(summary.total_recovery_amount),
        currency: text(summary.currency.as_ref()),
        breakdown: summary.breakdown.iter().map(breakdown).collect(),
        calculation: vec![
            field("Total Damages", pounds(calculation.total_damages)),
            field("Liability", percent(calculation.liability_percentage)),
            field("Recoverable Amount", pounds(calculation.recoverable_amount)),
            field("Administrative Fees", pounds(calculation.administrative_fees)),
            field("Final Recovery", pounds(calculation.final_recovery_amount)),
        ],
        case_details: vec![
            field("Claim Number", text(details.claim_number.as_ref())),
            field("Policy Number", text(details.policy_number.as_ref())),
            field("Claimant", text(details.claimant_name.as_ref())),
            field("Incident Date", text(details.incident_date.as_ref())),
            field("Liable Party", text(details.liability_party.as_ref())),
            field("Liability", percent(details.liability_percentage)),
        ],
        supporting_documentation: vec![
            check("Police report", docs.police_report_referenced),
            check("Repair estimates", docs.repair_estimates_included),
            check("Witness statements", docs.witness_statements_included),
            check("Photos", docs.photos_attached),
            check("Policy documents", docs.policy_documents_referenced),
        ],
        validation_checks: vec![
            check("Data completeness", checks.data_completeness),
            check("Calculation accuracy", checks.calculation_accuracy),
            check("Template compliance", checks.template_compliance),
            check("Regulatory compliance", checks.regulatory_compliance),
        ],
        audit_trail: d.audit_trail.iter().map(audit).collect(),
        sections: vec![
            field("Executive Summary", text(sections.executive_summary.as_ref())),
            field("Incident Details", text(sections.incident_details.as_ref())),
            field(
                "Liability Assessment",
                text(sections.liability_assessment.as_ref()),
            ),
            field(
                "Financial Breakdown",
                text(sections.financial_breakdown.as_ref()),
            ),
            field(
                "Supporting Evidence",
                text(sections.supporting_evidence.as_ref()),
            ),
            field(
                "Recovery Recommendation",
                text(sections.recovery_recommendation.as_ref()),
            ),
        ],
        status: text(d.document_status.as_ref()),
        next_actions: d.next_actions.iter().map(next_step).collect(),
    }
}

/// Borrowed view of one desk's state.
pub struct Snapshot<'a> {
    pub navigator: &'a Navigator,
    pub processing: &'a Orchestration<CaseEvaluation>,
    pub outlay: &'a Orchestration<OutlayDocument>,
    pub approval: &'a Orchestration<Approval>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenView {
    Dashboard {
        queue: QueueView,
    },
    Processing {
        case: CaseRow,
        pending: bool,
        error: Option<String>,
        evaluation: Option<EvaluationView>,
        can_open_outlay: bool,
    },
    Outlay {
        case: CaseRow,
        pending: bool,
        approving: bool,
        error: Option<String>,
        document: Option<DocumentView>,
        can_generate: bool,
        can_approve: bool,
    },
    Supervisor {
        escalations: EscalationView,
    },
}

/// Builds the view of the current screen. `search` and `status` only affect the
/// dashboard rows.
pub fn screen(
    snapshot: &Snapshot<'_>,
    registry: &CaseRegistry,
    search: &str,
    status: &str,
) -> ScreenView {
    match snapshot.navigator.screen() {
        Screen::Dashboard => ScreenView::Dashboard {
            queue: queue(registry, search, status),
        },
        Screen::Supervisor => ScreenView::Supervisor {
            escalations: escalations(registry),
        },
        Screen::Processing {
            case,
            evaluation: carried,
        } => {
            let state = snapshot.processing;
            let shown = state.output().or(carried.as_ref());
            ScreenView::Processing {
                case: case_row(case),
                pending: state.is_pending(),
                error: state.error().map(str::to_string),
                evaluation: shown.map(evaluation),
                can_open_outlay: processing::ready_evaluation(state).is_some(),
            }
        }
        Screen::Outlay { case, .. } => {
            let drafting = snapshot.outlay;
            let approval = snapshot.approval;
            let busy = drafting.is_pending() || approval.is_pending();
            ScreenView::Outlay {
                case: case_row(case),
                pending: drafting.is_pending(),
                approving: approval.is_pending(),
                error: approval
                    .error()
                    .or(drafting.error())
                    .map(str::to_string),
                document: drafting.output().map(document),
                can_generate: !busy && drafting.output().is_none(),
                can_approve: !busy && drafting.output().is_some(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_bands() {
        assert_eq!(ScoreBand::of(80.0), ScoreBand::Pass);
        assert_eq!(ScoreBand::of(79.0), ScoreBand::Review);
        assert_eq!(ScoreBand::of(50.0), ScoreBand::Review);
        assert_eq!(ScoreBand::of(49.0), ScoreBand::Fail);
        assert_eq!(score_badge(85.0).label, "PASS (85%)");
        assert_eq!(score_badge(62.5).label, "REVIEW (62.5%)");
        assert_eq!(score_badge(10.0).variant, BadgeVariant::Destructive);
    }

    #[test]
    fn test_severity_badges() {
        assert_eq!(severity_badge(Some("CRITICAL")).variant, BadgeVariant::Destructive);
        assert_eq!(severity_badge(Some("WARNING")).variant, BadgeVariant::Default);
        let info = severity_badge(Some("INFO"));
        assert_eq!(info.label, "INFO");
        assert_eq!(info.variant, BadgeVariant::Outline);
        assert_eq!(severity_badge(None).label, PLACEHOLDER);
    }

    #[test]
    fn test_risk_badges() {
        assert_eq!(risk_badge(Some("LOW")).variant, BadgeVariant::Secondary);
        assert_eq!(risk_badge(Some("MEDIUM")).variant, BadgeVariant::Default);
        assert_eq!(risk_badge(Some("HIGH")).variant, BadgeVariant::Destructive);
        assert_eq!(risk_badge(Some("SEVERE")).variant, BadgeVariant::Destructive);
        assert_eq!(risk_badge(None).label, PLACEHOLDER);
    }

    #[test]
    fn test_priority_labels() {
        let badge = priority_label_badge(Some("High"));
        assert_eq!(badge.label, "HIGH");
        assert_eq!(badge.variant, BadgeVariant::Destructive);
        assert_eq!(priority_label_badge(Some("urgent")).variant, BadgeVariant::Default);
        assert_eq!(status_badge(CaseStatus::InProgress).label, "In Progress");
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(pounds(Some(4200.0)), "£4,200");
        assert_eq!(pounds(None), PLACEHOLDER);
        assert_eq!(percent(Some(75.0)), "75%");
        assert_eq!(
            timestamp(Some(&"2024-01-15T10:30:00Z".to_string())),
            "15/01/2024, 10:30:00"
        );
        assert_eq!(timestamp(Some(&"yesterday".to_string())), "yesterday");
        assert_eq!(time_of_day(Some(&"2024-01-15T10:30:05+00:00".to_string())), "10:30:05");
    }

    #[test]
    fn test_sparse_evaluation_renders_placeholders() {
        let e = CaseEvaluation::from_value(json!({
            "validation_status": {"validation_score": 79},
            "discrepancies_identified": [{"severity": "CRITICAL", "description": "Date mismatch"}]
        }))
        .unwrap();

        let view = evaluation(&e);
        assert_eq!(view.case_status, PLACEHOLDER);
        assert_eq!(view.financial[0].value, PLACEHOLDER);
        assert_eq!(view.validation_score.map(|b| b.label).as_deref(), Some("REVIEW (79%)"));
        assert_eq!(view.discrepancies.len(), 1);
        assert_eq!(view.discrepancies[0].source, PLACEHOLDER);
        assert_eq!(view.fraud_risk.label, PLACEHOLDER);
        assert!(!view.ready_for_document_generation);
    }

    #[test]
    fn test_document_rendering() {
        let d = OutlayDocument::from_value(json!({
            "outlay_summary": {
                "total_recovery_amount": 4200,
                "breakdown": [{"category": "Repairs", "amount": 3500.5}],
                "recovery_calculation": {"liability_percentage": 100}
            },
            "supporting_documentation": {"police_report_referenced": true},
            "audit_trail": [{"step": "1", "timestamp": "2024-01-15T09:00:00Z"}],
            "document_status": "READY_FOR_APPROVAL"
        }))
        .unwrap();

        let view = document(&d);
        assert_eq!(view.total_recovery, "£4,200");
        assert_eq!(view.breakdown[0].amount, "£3,500.50");
        assert_eq!(view.calculation[1].value, "100%");
        assert!(view.supporting_documentation[0].passed);
        assert!(!view.supporting_documentation[1].passed);
        assert_eq!(view.audit_trail[0].time, "09:00:00");
        assert_eq!(view.status, "READY_FOR_APPROVAL");
    }

    #[test]
    fn test_dashboard_view_filters_rows_not_stats() {
        let registry = CaseRegistry::sample();
        let navigator = Navigator::new();
        let processing = Orchestration::new(crate::orchestration::Operation::ProcessCase);
        let outlay = Orchestration::new(crate::orchestration::Operation::GenerateDocument);
        let approval = Orchestration::new(crate::orchestration::Operation::ApproveDocument);
        let snapshot = Snapshot {
            navigator: &navigator,
            processing: &processing,
            outlay: &outlay,
            approval: &approval,
        };

        let ScreenView::Dashboard { queue } = screen(&snapshot, &registry, "", "flagged") else {
            panic!("expected dashboard");
        };
        assert_eq!(queue.total_cases, 5);
        assert_eq!(queue.cases.len(), 2);
        assert_eq!(queue.total_recovery, "£23,250");
    }
}
