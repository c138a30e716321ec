//! Outlay document drafting and approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    cases::Case,
    error::{FlowError, Result},
    gateway::{self, AgentCapability, AgentDirectory, AgentGateway, AgentRequest},
    orchestration::{Completion, Operation, Orchestration},
    payload::{CaseEvaluation, OutlayDocument},
};

pub const DOCUMENT_FAILED: &str = "Document generation failed";

/// Delay standing in for the side effect of a real approval.
pub const DEFAULT_APPROVAL_DELAY: Duration = Duration::from_millis(1500);

/// Liability figure asserted to the document agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", rename_all = "snake_case")]
pub enum LiabilityBasis {
    /// "100% third party fault", regardless of what the evaluation found.
    AssumedFullThirdPartyFault,
    /// The percentage assessed during case evaluation.
    Assessed { percentage: f64 },
}

/// Claims the document request makes about the case. They are stated to the agent as
/// facts; nothing here is computed by the desk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlayAssumptions {
    pub liability: LiabilityBasis,
    pub documents_validated: bool,
}

impl OutlayAssumptions {
    /// Full third-party fault, documents validated.
    pub fn assumed() -> Self {
        Self {
            liability: LiabilityBasis::AssumedFullThirdPartyFault,
            documents_validated: true,
        }
    }

    /// Uses the evaluation's liability percentage when it reported a usable one.
    pub fn from_evaluation(evaluation: &CaseEvaluation) -> Self {
        let liability = evaluation
            .liability_percentage()
            .map(|percentage| LiabilityBasis::Assessed { percentage })
            .unwrap_or(LiabilityBasis::AssumedFullThirdPartyFault);
        Self {
            liability,
            documents_validated: true,
        }
    }
}

impl Default for OutlayAssumptions {
    fn default() -> Self {
        Self::assumed()
    }
}

/// Where the liability assumption for document requests comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionPolicy {
    #[default]
    Assumed,
    Evaluation,
}

impl AssumptionPolicy {
    pub fn resolve(&self, evaluation: &CaseEvaluation) -> OutlayAssumptions {
        match self {
            AssumptionPolicy::Assumed => OutlayAssumptions::assumed(),
            AssumptionPolicy::Evaluation => OutlayAssumptions::from_evaluation(evaluation),
        }
    }
}

fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Instruction sent to the document agent for `case`.
pub fn instruction(case: &Case, assumptions: &OutlayAssumptions) -> String {
    let liability = match assumptions.liability {
        LiabilityBasis::AssumedFullThirdPartyFault => "100".to_string(),
        LiabilityBasis::Assessed { percentage } => format_percentage(percentage),
    };
    let documents = if assumptions.documents_validated {
        "Documents validated."
    } else {
        "Documents not yet validated."
    };
    format!(
        "Generate outlay document for claim {}. Claimant: {}. Third Party: {}. Recovery Amount: £{}. Liability: {}% third party fault. {}",
        case.claim_number,
        case.claimant,
        case.third_party,
        case.recovery_amount.plain(),
        liability,
        documents
    )
}

/// Record of a simulated approval. Not persisted anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Approval {
    pub claim_number: String,
    pub approved_at: DateTime<Utc>,
}

/// Drives document drafting against the document agent, and the approval step.
#[derive(Clone)]
pub struct OutlayOrchestrator {
    gateway: Arc<dyn AgentGateway>,
    directory: Arc<AgentDirectory>,
    approval_delay: Duration,
}

impl OutlayOrchestrator {
    pub fn new(
        gateway: Arc<dyn AgentGateway>,
        directory: Arc<AgentDirectory>,
        approval_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            directory,
            approval_delay,
        }
    }

    pub fn request(&self, case: &Case, assumptions: &OutlayAssumptions) -> AgentRequest {
        self.directory.request(
            AgentCapability::OutlayDocument,
            instruction(case, assumptions),
        )
    }

    /// Issues one drafting call for `case` and records the outcome in `state`.
    ///
    /// Refused once a document has been produced for the current screen.
    pub async fn generate(
        &self,
        state: &Mutex<Orchestration<OutlayDocument>>,
        case: &Case,
        assumptions: &OutlayAssumptions,
    ) -> Result<Completion> {
        let ticket = {
            let mut guard = state.lock().await;
            if guard.output().is_some() {
                return Err(FlowError::DocumentAlreadyGenerated(case.claim_number.clone()));
            }
            guard.begin(&case.claim_number)?
        };
        info!(
            claim_number = %case.claim_number,
            generation = ticket.generation,
            liability = ?assumptions.liability,
            "Generating outlay document"
        );

        let request = self.request(case, assumptions);
        let outcome = match gateway::call(self.gateway.as_ref(), &request, DOCUMENT_FAILED).await {
            Ok(payload) => OutlayDocument::from_value(payload).map_err(|e| e.to_string()),
            Err(failure) => Err(failure.into_message()),
        };
        Ok(state.lock().await.finish(&ticket, outcome))
    }

    /// Holds the approval in its pending state for the configured delay, then records it.
    ///
    /// Requires a drafted document for the same case. The drafting lock is held until
    /// the approval has begun, so a refocus cannot slip in between the two. The caller
    /// is responsible for returning to the dashboard on [`Completion::Applied`].
    pub async fn approve(
        &self,
        drafting: &Mutex<Orchestration<OutlayDocument>>,
        state: &Mutex<Orchestration<Approval>>,
        claim_number: &str,
    ) -> Result<Completion> {
        let ticket = {
            let drafting = drafting.lock().await;
            if drafting.is_pending() {
                return Err(FlowError::AlreadyPending(Operation::GenerateDocument));
            }
            if drafting.subject() != Some(claim_number) || drafting.output().is_none() {
                return Err(FlowError::NothingToApprove);
            }
            state.lock().await.begin(claim_number)?
        };
        info!(%claim_number, "Approving outlay document");

        tokio::time::sleep(self.approval_delay).await;

        let approval = Approval {
            claim_number: claim_number.to_string(),
            approved_at: Utc::now(),
        };
        Ok(state.lock().await.finish(&ticket, Ok(approval)))
    }
}
