use recovery_flow::{
    AgentDirectory, AgentGateway, AssumptionPolicy, DeskSettings, FlowError,
    gateway::{HttpAgentGateway, LlmAgentGateway, llm::DEFAULT_MODEL},
    runner::DEFAULT_SESSION_TTL,
};
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentBackend {
    Http,
    Llm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    pub backend: AgentBackend,
    pub agent_api_url: Option<String>,
    pub agent_api_key: Option<String>,
    pub agent_timeout: Duration,
    pub openrouter_api_key: Option<String>,
    pub llm_model: String,
    pub agents: AgentDirectory,
    pub approval_delay: Duration,
    pub liability_source: AssumptionPolicy,
    pub session_ttl: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            backend: AgentBackend::Http,
            agent_api_url: None,
            agent_api_key: None,
            agent_timeout: Duration::from_secs(120),
            openrouter_api_key: None,
            llm_model: DEFAULT_MODEL.into(),
            agents: AgentDirectory::default(),
            approval_delay: Duration::from_millis(1500),
            liability_source: AssumptionPolicy::Assumed,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

fn parse<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, FlowError> {
    raw.trim()
        .parse()
        .map_err(|_| FlowError::Config(format!("{name} has an invalid value: {raw}")))
}

impl Settings {
    pub fn from_env() -> Result<Self, FlowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` on top of the defaults. Empty values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FlowError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(v) = var("PORT") {
            let port: u16 = parse("PORT", &v)?;
            settings.bind_addr = format!("0.0.0.0:{port}");
        }
        if let Some(v) = var("BIND_ADDR") {
            settings.bind_addr = v;
        }

        if let Some(v) = var("AGENT_BACKEND") {
            settings.backend = match v.trim().to_lowercase().as_str() {
                "http" => AgentBackend::Http,
                "llm" => AgentBackend::Llm,
                other => {
                    return Err(FlowError::Config(format!(
                        "AGENT_BACKEND must be http or llm, got {other}"
                    )));
                }
            };
        }
        settings.agent_api_url = var("AGENT_API_URL");
        settings.agent_api_key = var("AGENT_API_KEY");
        if let Some(v) = var("AGENT_TIMEOUT_SECS") {
            settings.agent_timeout = Duration::from_secs(parse("AGENT_TIMEOUT_SECS", &v)?);
        }

        settings.openrouter_api_key = var("OPENROUTER_API_KEY");
        if let Some(v) = var("LLM_MODEL") {
            settings.llm_model = v;
        }

        if let Some(v) = var("AGENT_ID_DATA_AGGREGATION") {
            settings.agents.data_aggregation = v;
        }
        if let Some(v) = var("AGENT_ID_VALIDATION") {
            settings.agents.validation_compliance = v;
        }
        if let Some(v) = var("AGENT_ID_COORDINATOR") {
            settings.agents.subrogation_coordinator = v;
        }
        if let Some(v) = var("AGENT_ID_OUTLAY_DOCUMENT") {
            settings.agents.outlay_document = v;
        }

        if let Some(v) = var("APPROVAL_DELAY_MS") {
            settings.approval_delay = Duration::from_millis(parse("APPROVAL_DELAY_MS", &v)?);
        }
        if let Some(v) = var("OUTLAY_LIABILITY_SOURCE") {
            settings.liability_source = match v.trim().to_lowercase().as_str() {
                "assumed" => AssumptionPolicy::Assumed,
                "evaluation" => AssumptionPolicy::Evaluation,
                other => {
                    return Err(FlowError::Config(format!(
                        "OUTLAY_LIABILITY_SOURCE must be assumed or evaluation, got {other}"
                    )));
                }
            };
        }

        if let Some(v) = var("SESSION_TTL_SECS") {
            let secs: u64 = parse("SESSION_TTL_SECS", &v)?;
            if secs == 0 {
                return Err(FlowError::Config("SESSION_TTL_SECS must be positive".into()));
            }
            settings.session_ttl = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    pub fn desk(&self) -> DeskSettings {
        DeskSettings {
            approval_delay: self.approval_delay,
            assumptions: self.liability_source,
            session_ttl: self.session_ttl,
        }
    }

    /// Builds the gateway for the selected backend, failing when its credentials are missing.
    pub fn gateway(&self) -> Result<Arc<dyn AgentGateway>, FlowError> {
        match self.backend {
            AgentBackend::Http => {
                let url = self.agent_api_url.clone().ok_or_else(|| {
                    FlowError::Config("AGENT_API_URL is required for the http backend".into())
                })?;
                info!(endpoint = %url, timeout_secs = self.agent_timeout.as_secs(), "Using HTTP agent platform");
                let gateway =
                    HttpAgentGateway::new(url, self.agent_api_key.clone(), self.agent_timeout)?;
                Ok(Arc::new(gateway))
            }
            AgentBackend::Llm => {
                let key = self.openrouter_api_key.as_deref().ok_or_else(|| {
                    FlowError::Config("OPENROUTER_API_KEY is required for the llm backend".into())
                })?;
                info!(model = %self.llm_model, "Using LLM agent backend");
                Ok(Arc::new(LlmAgentGateway::new(key, self.llm_model.clone())))
            }
        }
    }
}
