use thiserror::Error;

use crate::{gateway::GatewayError, navigator::ScreenKind, orchestration::Operation};

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Cannot {action} from the {from} screen")]
    InvalidTransition {
        from: ScreenKind,
        action: &'static str,
    },

    #[error("{0} is already in progress")]
    AlreadyPending(Operation),

    #[error("{operation} was requested for {claim_number}, which is no longer in focus")]
    OutOfContext {
        operation: Operation,
        claim_number: String,
    },

    #[error("Case evaluation is not ready for document generation")]
    NotReady,

    #[error("Outlay document already generated for {0}")]
    DocumentAlreadyGenerated(String),

    #[error("No outlay document to approve")]
    NothingToApprove,

    #[error("Malformed agent payload: {0}")]
    MalformedPayload(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
