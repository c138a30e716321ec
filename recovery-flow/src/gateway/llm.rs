//! Gateway backed directly by an LLM through OpenRouter.
//!
//! Each capability gets its own system preamble asking for a JSON-only answer in the
//! shape the desk renders. The model's reply is wrapped into the same two-layer
//! [`AgentEnvelope`] the hosted platform returns.

use async_trait::async_trait;
use rig::{client::CompletionClient, completion::Prompt, providers::openrouter};
use serde_json::Value;
use tracing::{info, warn};

use super::{AgentCapability, AgentEnvelope, AgentGateway, AgentRequest, GatewayError};

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

const COORDINATOR_PREAMBLE: &str = r#"You are a subrogation recovery coordinator for a motor insurer.
Given a case instruction, aggregate and validate the case and respond with ONLY this JSON (no prose):
{
  "case_summary": {"case_id": "", "case_status": "", "processing_timestamp": "RFC3339", "overall_assessment": ""},
  "aggregated_data": {
    "claim_summary": {"claim_number": "", "claimant": "", "incident_date": "", "incident_description": "", "claim_date": "", "claim_status": ""},
    "policy_summary": {"policy_number": "", "policy_holder": "", "policy_type": ""},
    "liability_summary": {"liability_percentage": 0, "at_fault_party": "", "determination": "", "supporting_evidence": [""]},
    "financial_summary": {"total_recovery_amount": 0, "repair_costs": 0, "expected_recovery_percentage": 0},
    "data_completeness": 0
  },
  "validation_status": {"overall_validation": "", "validation_score": 0, "data_accuracy_status": "", "liability_clarity_status": "", "documentation_status": "", "compliance_status": ""},
  "discrepancies_identified": [{"category": "", "description": "", "severity": "CRITICAL|WARNING|INFO", "source": "", "requires_action": false}],
  "exception_flags": [{"flag_type": "", "description": "", "urgency": "", "recommended_action": ""}],
  "fraud_assessment": {"risk_level": "LOW|MEDIUM|HIGH", "requires_investigation": false, "fraud_score": 0},
  "legal_review_required": false,
  "next_steps": [{"priority": "HIGH|MEDIUM|LOW", "action": "", "assigned_to": "", "deadline": "RFC3339"}],
  "ready_for_outlay_generation": false
}"#;

const OUTLAY_PREAMBLE: &str = r#"You draft subrogation outlay (recovery) documents for a motor insurer.
Given a case instruction, respond with ONLY this JSON (no prose):
{
  "document_metadata": {"document_id": "", "document_type": "", "template_used": "", "generated_timestamp": "RFC3339", "case_reference": ""},
  "outlay_summary": {
    "total_recovery_amount": 0, "currency": "GBP",
    "breakdown": [{"category": "", "description": "", "amount": 0}],
    "recovery_calculation": {"total_damages": 0, "liability_percentage": 0, "recoverable_amount": 0, "administrative_fees": 0, "final_recovery_amount": 0}
  },
  "case_details_included": {"claim_number": "", "policy_number": "", "claimant_name": "", "incident_date": "", "liability_party": "", "liability_percentage": 0},
  "supporting_documentation": {"police_report_referenced": false, "repair_estimates_included": false, "witness_statements_included": false, "photos_attached": false, "policy_documents_referenced": false},
  "audit_trail": [{"step": "", "timestamp": "RFC3339", "action": "", "data_source": ""}],
  "validation_checks_passed": {"data_completeness": false, "calculation_accuracy": false, "template_compliance": false, "regulatory_compliance": false},
  "document_sections": {"executive_summary": "", "incident_details": "", "liability_assessment": "", "financial_breakdown": "", "supporting_evidence": "", "recovery_recommendation": ""},
  "document_status": "",
  "next_actions": [{"priority": "", "action": "", "assigned_to": "", "deadline": ""}]
}"#;

const DATA_AGGREGATION_PREAMBLE: &str = "You aggregate claim, policy, liability and financial data for a subrogation case. Respond with a single JSON object only.";

const VALIDATION_PREAMBLE: &str = "You validate subrogation case data for accuracy and regulatory compliance. Respond with a single JSON object only.";

fn preamble(capability: AgentCapability) -> &'static str {
    match capability {
        AgentCapability::SubrogationCoordinator => COORDINATOR_PREAMBLE,
        AgentCapability::OutlayDocument => OUTLAY_PREAMBLE,
        AgentCapability::DataAggregation => DATA_AGGREGATION_PREAMBLE,
        AgentCapability::ValidationCompliance => VALIDATION_PREAMBLE,
    }
}

/// Strips an optional Markdown code fence around a JSON answer.
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Wraps a model completion into the platform envelope.
pub(crate) fn envelope_from_completion(text: &str) -> AgentEnvelope {
    match serde_json::from_str::<Value>(strip_fence(text)) {
        Ok(value @ Value::Object(_)) => AgentEnvelope::success(value),
        Ok(_) => AgentEnvelope::rejected("error", "Agent answered with a non-object JSON value"),
        Err(e) => {
            warn!(error = %e, "Agent answer was not valid JSON");
            AgentEnvelope::rejected("error", "Agent answer was not valid JSON")
        }
    }
}

pub struct LlmAgentGateway {
    client: openrouter::Client,
    model: String,
}

impl LlmAgentGateway {
    pub fn new(api_key: &str, model: impl Into<String>) -> Self {
        Self {
            client: openrouter::Client::new(api_key),
            model: model.into(),
        }
    }
}

#[async_trait]
impl AgentGateway for LlmAgentGateway {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentEnvelope, GatewayError> {
        info!(agent = %request.capability, model = %self.model, "Prompting LLM agent");

        let agent = self
            .client
            .agent(&self.model)
            .preamble(preamble(request.capability))
            .build();

        let response = agent
            .prompt(request.instruction.as_str())
            .await
            .map_err(|e| GatewayError::Agent(e.to_string()))?;

        Ok(envelope_from_completion(&response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::STATUS_SUCCESS;

    #[test]
    fn test_fenced_json_is_accepted() {
        let envelope = envelope_from_completion("```json\n{\"document_status\": \"DRAFT\"}\n```");
        assert!(envelope.success);
        assert_eq!(envelope.response.status, STATUS_SUCCESS);
    }

    #[test]
    fn test_prose_is_a_business_failure() {
        let envelope = envelope_from_completion("Sure! Here is the document.");
        assert!(envelope.success);
        assert_eq!(envelope.response.status, "error");
        assert!(envelope.into_payload("fallback").is_err());
    }

    #[test]
    fn test_non_object_is_rejected() {
        let envelope = envelope_from_completion("[1, 2, 3]");
        assert_eq!(envelope.response.status, "error");
    }
}
