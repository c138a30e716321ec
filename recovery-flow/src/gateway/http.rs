//! HTTP client for the hosted agent platform.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use super::{AgentEnvelope, AgentGateway, AgentRequest, GatewayError};

#[derive(Serialize)]
struct InvokeBody<'a> {
    message: &'a str,
    agent_id: &'a str,
}

/// Posts `{ "message", "agent_id" }` to a single platform endpoint and decodes the
/// [`AgentEnvelope`] it answers with.
#[derive(Clone)]
pub struct HttpAgentGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpAgentGateway {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl AgentGateway for HttpAgentGateway {
    async fn invoke(&self, request: &AgentRequest) -> Result<AgentEnvelope, GatewayError> {
        let body = InvokeBody {
            message: &request.instruction,
            agent_id: &request.agent_id,
        };

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            error!(agent = %request.capability, error = %e, "Agent platform unreachable");
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let envelope = response
            .json::<AgentEnvelope>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        debug!(
            agent = %request.capability,
            success = envelope.success,
            status = %envelope.response.status,
            "Agent platform responded"
        );

        Ok(envelope)
    }
}
