//! Structurally validated agent payloads.
//!
//! The agents return loosely shaped JSON. Every field below is optional: a missing key
//! or a value of the wrong type falls back to its default (`None`, `false`, or an empty
//! list) instead of failing the whole payload. Lists keep the entries that parse and
//! drop the ones that don't. Only a payload that is not a JSON object at all is rejected.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FlowError, Result};

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Accepts a JSON object, or a string containing one.
fn object_from(value: Value, what: &str) -> Result<Value> {
    match value {
        Value::Object(_) => Ok(value),
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(inner @ Value::Object(_)) => Ok(inner),
            _ => Err(FlowError::MalformedPayload(format!(
                "{what} is a string that does not contain a JSON object"
            ))),
        },
        Value::Null => Err(FlowError::MalformedPayload(format!(
            "agent returned no {what}"
        ))),
        other => Err(FlowError::MalformedPayload(format!(
            "{what} must be a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Case evaluation (coordinator agent)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseEvaluation {
    #[serde(default, deserialize_with = "lenient")]
    pub case_summary: Option<CaseSummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub aggregated_data: Option<AggregatedData>,
    #[serde(default, deserialize_with = "lenient")]
    pub validation_status: Option<ValidationStatus>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub discrepancies_identified: Vec<Discrepancy>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub exception_flags: Vec<ExceptionFlag>,
    #[serde(default, deserialize_with = "lenient")]
    pub fraud_assessment: Option<FraudAssessment>,
    #[serde(default, deserialize_with = "lenient")]
    pub legal_review_required: bool,
    #[serde(default, deserialize_with = "lenient_list")]
    pub next_steps: Vec<NextStep>,
    #[serde(default, deserialize_with = "lenient")]
    pub ready_for_document_generation: Option<bool>,
    /// The platform's name for the same flag. Either one being true marks the case ready.
    #[serde(default, deserialize_with = "lenient")]
    pub ready_for_outlay_generation: Option<bool>,
}

impl CaseEvaluation {
    pub fn from_value(value: Value) -> Result<Self> {
        let object = object_from(value, "case evaluation")?;
        serde_json::from_value(object).map_err(|e| FlowError::MalformedPayload(e.to_string()))
    }

    pub fn is_ready(&self) -> bool {
        self.ready_for_document_generation == Some(true)
            || self.ready_for_outlay_generation == Some(true)
    }

    /// Liability percentage assessed during aggregation, when the agent reported one.
    pub fn liability_percentage(&self) -> Option<f64> {
        self.aggregated_data
            .as_ref()?
            .liability_summary
            .as_ref()?
            .liability_percentage
            .filter(|p| p.is_finite() && (0.0..=100.0).contains(p))
    }

    pub fn validation_score(&self) -> Option<f64> {
        self.validation_status.as_ref()?.validation_score
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub case_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub case_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub processing_timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub overall_assessment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregatedData {
    #[serde(default, deserialize_with = "lenient")]
    pub claim_summary: Option<ClaimSummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub policy_summary: Option<PolicySummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub liability_summary: Option<LiabilitySummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub financial_summary: Option<FinancialSummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub data_completeness: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub claim_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub claimant: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub incident_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub incident_description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub claim_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub claim_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    #[serde(default, deserialize_with = "lenient")]
    pub policy_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub policy_holder: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub policy_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub coverage_limits: Option<CoverageLimits>,
    #[serde(default, deserialize_with = "lenient")]
    pub effective_dates: Option<EffectiveDates>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageLimits {
    #[serde(default, deserialize_with = "lenient")]
    pub bodily_injury: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub property_damage: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub collision: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub deductible: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectiveDates {
    #[serde(default, deserialize_with = "lenient")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiabilitySummary {
    #[serde(default, deserialize_with = "lenient")]
    pub liability_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub at_fault_party: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub determination: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub supporting_evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    #[serde(default, deserialize_with = "lenient")]
    pub total_recovery_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub repair_costs: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub expected_recovery_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub overall_validation: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub validation_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub data_accuracy_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub liability_clarity_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub documentation_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub compliance_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub severity: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub source: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub requires_action: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExceptionFlag {
    #[serde(default, deserialize_with = "lenient")]
    pub flag_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub urgency: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub recommended_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FraudAssessment {
    #[serde(default, deserialize_with = "lenient")]
    pub risk_level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub requires_investigation: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub fraud_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    #[serde(default, deserialize_with = "lenient")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub deadline: Option<String>,
}

// ---------------------------------------------------------------------------
// Outlay document (document agent)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlayDocument {
    #[serde(default, deserialize_with = "lenient")]
    pub document_metadata: Option<DocumentMetadata>,
    #[serde(default, deserialize_with = "lenient")]
    pub outlay_summary: Option<OutlaySummary>,
    #[serde(default, deserialize_with = "lenient")]
    pub case_details_included: Option<CaseDetailsIncluded>,
    #[serde(default, deserialize_with = "lenient")]
    pub supporting_documentation: Option<SupportingDocumentation>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub audit_trail: Vec<AuditStep>,
    #[serde(default, deserialize_with = "lenient")]
    pub validation_checks_passed: Option<ValidationChecks>,
    #[serde(default, deserialize_with = "lenient")]
    pub document_sections: Option<DocumentSections>,
    #[serde(default, deserialize_with = "lenient")]
    pub document_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub next_actions: Vec<NextStep>,
}

impl OutlayDocument {
    pub fn from_value(value: Value) -> Result<Self> {
        let object = object_from(value, "outlay document")?;
        serde_json::from_value(object).map_err(|e| FlowError::MalformedPayload(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub document_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub document_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub template_used: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub generated_timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub case_reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlaySummary {
    #[serde(default, deserialize_with = "lenient")]
    pub total_recovery_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub breakdown: Vec<BreakdownItem>,
    #[serde(default, deserialize_with = "lenient")]
    pub recovery_calculation: Option<RecoveryCalculation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakdownItem {
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<f64>,
}

/// Damages × liability% − fees = final amount, as computed by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryCalculation {
    #[serde(default, deserialize_with = "lenient")]
    pub total_damages: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub liability_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub recoverable_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub administrative_fees: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub final_recovery_amount: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseDetailsIncluded {
    #[serde(default, deserialize_with = "lenient")]
    pub claim_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub policy_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub claimant_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub incident_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub liability_party: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub liability_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportingDocumentation {
    #[serde(default, deserialize_with = "lenient")]
    pub police_report_referenced: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub repair_estimates_included: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub witness_statements_included: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub photos_attached: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub policy_documents_referenced: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStep {
    #[serde(default, deserialize_with = "lenient")]
    pub step: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub data_source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationChecks {
    #[serde(default, deserialize_with = "lenient")]
    pub data_completeness: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub calculation_accuracy: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub template_compliance: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub regulatory_compliance: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSections {
    #[serde(default, deserialize_with = "lenient")]
    pub executive_summary: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub incident_details: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub liability_assessment: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub financial_breakdown: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub supporting_evidence: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub recovery_recommendation: Option<String>,
}
