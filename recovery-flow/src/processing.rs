use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    cases::Case,
    error::Result,
    gateway::{self, AgentCapability, AgentDirectory, AgentGateway, AgentRequest},
    navigator::ReadyEvaluation,
    orchestration::{Completion, Orchestration},
    payload::CaseEvaluation,
};

pub const PROCESSING_FAILED: &str = "Processing failed";

/// Instruction sent to the coordinator agent for `case`.
pub fn instruction(case: &Case) -> String {
    format!(
        "Process case {} for {} vs {}, estimated recovery £{}",
        case.claim_number,
        case.claimant,
        case.third_party,
        case.recovery_amount.plain()
    )
}

/// Drives the case evaluation round trip against the coordinator agent.
#[derive(Clone)]
pub struct ProcessingOrchestrator {
    gateway: Arc<dyn AgentGateway>,
    directory: Arc<AgentDirectory>,
}

impl ProcessingOrchestrator {
    pub fn new(gateway: Arc<dyn AgentGateway>, directory: Arc<AgentDirectory>) -> Self {
        Self { gateway, directory }
    }

    pub fn request(&self, case: &Case) -> AgentRequest {
        self.directory
            .request(AgentCapability::SubrogationCoordinator, instruction(case))
    }

    /// Issues one evaluation call for `case` and records the outcome in `state`.
    ///
    /// The lock on `state` is not held while the agent call is outstanding.
    pub async fn process(
        &self,
        state: &Mutex<Orchestration<CaseEvaluation>>,
        case: &Case,
    ) -> Result<Completion> {
        let ticket = state.lock().await.begin(&case.claim_number)?;
        info!(
            claim_number = %case.claim_number,
            generation = ticket.generation,
            "Processing case"
        );

        let outcome = self.evaluate(case).await;
        Ok(state.lock().await.finish(&ticket, outcome))
    }

    async fn evaluate(&self, case: &Case) -> std::result::Result<CaseEvaluation, String> {
        let request = self.request(case);
        let payload = gateway::call(self.gateway.as_ref(), &request, PROCESSING_FAILED)
            .await
            .map_err(|failure| failure.into_message())?;
        CaseEvaluation::from_value(payload).map_err(|e| e.to_string())
    }
}

/// The evaluation that may be handed to the outlay screen, if the agent declared it ready.
pub fn ready_evaluation(state: &Orchestration<CaseEvaluation>) -> Option<ReadyEvaluation> {
    if state.is_pending() {
        return None;
    }
    state.output().cloned().and_then(ReadyEvaluation::new)
}
