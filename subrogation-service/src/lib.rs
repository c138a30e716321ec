pub mod config;
pub mod service;

pub use config::{AgentBackend, Settings};
pub use service::{AppState, build_router};
