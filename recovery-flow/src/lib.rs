//! Core of a subrogation recovery desk: the case queue, screen navigation, and the
//! orchestration of the remote agents that evaluate cases and draft outlay documents.

pub mod cases;
pub mod error;
pub mod gateway;
pub mod money;
pub mod navigator;
pub mod orchestration;
pub mod outlay;
pub mod payload;
pub mod processing;
pub mod render;
pub mod runner;
pub mod session;

// Re-export commonly used types
pub use cases::{ALL_STATUSES, Case, CaseRegistry, CaseStatus, Priority};
pub use error::{FlowError, Result};
pub use gateway::{
    AgentCapability, AgentDirectory, AgentEnvelope, AgentGateway, AgentRequest, GatewayError,
    ScriptedGateway, ScriptedReply,
};
pub use money::Money;
pub use navigator::{Navigator, ReadyEvaluation, Screen, ScreenKind};
pub use orchestration::{Completion, Operation, Orchestration};
pub use outlay::{AssumptionPolicy, LiabilityBasis, OutlayAssumptions};
pub use payload::{CaseEvaluation, OutlayDocument};
pub use render::ScreenView;
pub use runner::{DeskRunner, DeskSettings};
pub use session::{InMemorySessionStorage, Session, SessionStorage};
