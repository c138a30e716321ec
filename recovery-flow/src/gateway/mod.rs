//! Contract with the external agent platform.
//!
//! The platform answers with a two-layer envelope: an outer `success` flag for the call
//! itself and an inner `response.status` set by the agent. A payload is only usable when
//! both layers report success; see [`AgentEnvelope::into_payload`].

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "rig")]
pub mod llm;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[cfg(feature = "http")]
pub use http::HttpAgentGateway;
#[cfg(feature = "rig")]
pub use llm::LlmAgentGateway;

/// Inner status marking a usable agent result.
pub const STATUS_SUCCESS: &str = "success";

/// The remote capabilities offered by the agent platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCapability {
    DataAggregation,
    ValidationCompliance,
    SubrogationCoordinator,
    OutlayDocument,
}

impl fmt::Display for AgentCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentCapability::DataAggregation => "data_aggregation",
            AgentCapability::ValidationCompliance => "validation_compliance",
            AgentCapability::SubrogationCoordinator => "subrogation_coordinator",
            AgentCapability::OutlayDocument => "outlay_document",
        };
        f.write_str(name)
    }
}

/// Maps each capability to the opaque agent token the platform expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDirectory {
    pub data_aggregation: String,
    pub validation_compliance: String,
    pub subrogation_coordinator: String,
    pub outlay_document: String,
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self {
            data_aggregation: "696f47e43bd35d7a6606b38f".to_string(),
            validation_compliance: "696f4809b50537828e0b0e31".to_string(),
            subrogation_coordinator: "696f48343bd35d7a6606b3a8".to_string(),
            outlay_document: "696f4874b50537828e0b0e48".to_string(),
        }
    }
}

impl AgentDirectory {
    pub fn token(&self, capability: AgentCapability) -> &str {
        match capability {
            AgentCapability::DataAggregation => &self.data_aggregation,
            AgentCapability::ValidationCompliance => &self.validation_compliance,
            AgentCapability::SubrogationCoordinator => &self.subrogation_coordinator,
            AgentCapability::OutlayDocument => &self.outlay_document,
        }
    }

    pub fn request(&self, capability: AgentCapability, instruction: String) -> AgentRequest {
        AgentRequest {
            agent_id: self.token(capability).to_string(),
            capability,
            instruction,
        }
    }
}

/// A single instruction for one agent. Built fresh for every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentRequest {
    pub agent_id: String,
    pub capability: AgentCapability,
    pub instruction: String,
}

/// Inner response written by the agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outer envelope returned by the platform for every call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: AgentResponse,
    #[serde(default)]
    pub error: Option<String>,
}

impl AgentEnvelope {
    pub fn success(result: Value) -> Self {
        Self {
            success: true,
            response: AgentResponse {
                status: STATUS_SUCCESS.to_string(),
                result: Some(result),
                message: None,
            },
            error: None,
        }
    }

    /// The call went through but the agent reported a non-success status.
    pub fn rejected(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            response: AgentResponse {
                status: status.into(),
                result: None,
                message: Some(message.into()),
            },
            error: None,
        }
    }

    /// The platform itself reported the call as failed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: AgentResponse::default(),
            error: Some(error.into()),
        }
    }

    /// Applies the two-layer success check.
    ///
    /// Both the outer `success` flag and the inner `status == "success"` must hold. On
    /// failure the message is the platform error, then the agent message, then
    /// `fallback`, whichever is first non-empty. A missing result yields `Value::Null`.
    pub fn into_payload(self, fallback: &str) -> Result<Value, String> {
        if self.success && self.response.status == STATUS_SUCCESS {
            return Ok(self.response.result.unwrap_or(Value::Null));
        }
        let message = [self.error, self.response.message]
            .into_iter()
            .flatten()
            .find(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Err(message)
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("request to agent platform failed: {0}")]
    Transport(String),

    #[error("agent platform responded with HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("could not decode agent platform response: {0}")]
    Decode(String),

    #[error("agent call failed: {0}")]
    Agent(String),
}

/// Why an agent call produced no usable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentFailure {
    /// Network or unexpected failure before an envelope was received.
    Transport(String),
    /// The envelope arrived but one of its two success layers was negative.
    Business(String),
}

impl AgentFailure {
    pub fn into_message(self) -> String {
        match self {
            AgentFailure::Transport(m) | AgentFailure::Business(m) => m,
        }
    }
}

/// Normalized outcome of one agent call.
pub type AgentResult = std::result::Result<Value, AgentFailure>;

/// The swappable transport to the agent platform.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentEnvelope, GatewayError>;
}

/// Invokes `gateway` and folds transport and business failures into an [`AgentResult`].
pub async fn call(gateway: &dyn AgentGateway, request: &AgentRequest, fallback: &str) -> AgentResult {
    debug!(
        agent = %request.capability,
        agent_id = %request.agent_id,
        instruction_length = request.instruction.len(),
        "Invoking agent"
    );
    match gateway.invoke(request).await {
        Ok(envelope) => envelope.into_payload(fallback).map_err(|message| {
            warn!(agent = %request.capability, %message, "Agent reported failure");
            AgentFailure::Business(message)
        }),
        Err(e) => {
            warn!(agent = %request.capability, error = %e, "Agent call failed");
            Err(AgentFailure::Transport(e.to_string()))
        }
    }
}

/// A canned reply for [`ScriptedGateway`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Envelope(AgentEnvelope),
    TransportError(String),
}

/// Offline gateway answering from per-capability queues of canned replies.
///
/// Every request is recorded so callers can inspect what was sent. A capability with an
/// empty queue answers with a transport error.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<HashMap<AgentCapability, VecDeque<ScriptedReply>>>,
    calls: Mutex<Vec<AgentRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, capability: AgentCapability, reply: ScriptedReply) {
        self.replies
            .lock()
            .await
            .entry(capability)
            .or_default()
            .push_back(reply);
    }

    pub async fn push_success(&self, capability: AgentCapability, result: Value) {
        self.push(capability, ScriptedReply::Envelope(AgentEnvelope::success(result)))
            .await;
    }

    pub async fn calls(&self) -> Vec<AgentRequest> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl AgentGateway for ScriptedGateway {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentEnvelope, GatewayError> {
        self.calls.lock().await.push(request.clone());
        let reply = self
            .replies
            .lock()
            .await
            .get_mut(&request.capability)
            .and_then(|queue| queue.pop_front());
        match reply {
            Some(ScriptedReply::Envelope(envelope)) => Ok(envelope),
            Some(ScriptedReply::TransportError(message)) => Err(GatewayError::Transport(message)),
            None => Err(GatewayError::Transport(format!(
                "no scripted reply for {}",
                request.capability
            ))),
        }
    }
}
