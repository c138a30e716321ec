//! DeskRunner: loads a session, applies exactly one user action to it, and leaves the
//! session in storage for the next round trip.
//!
//! Agent calls are made without holding any session lock, so a session stays
//! navigable (and viewable) while processing or drafting is outstanding. Whatever the
//! user does in the meantime refocuses the orchestrations, and the late result is
//! discarded if it no longer belongs to the screen.

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::{
    cases::{Case, CaseRegistry},
    error::{FlowError, Result},
    gateway::{AgentDirectory, AgentGateway},
    navigator::{Screen, ScreenKind},
    orchestration::Completion,
    outlay::{AssumptionPolicy, DEFAULT_APPROVAL_DELAY, OutlayOrchestrator},
    processing::{self, ProcessingOrchestrator},
    render::{self, ScreenView, Snapshot},
    session::{Session, SessionStorage},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeskSettings {
    pub approval_delay: Duration,
    pub assumptions: AssumptionPolicy,
    /// Sessions unused for this long are dropped.
    pub session_ttl: Duration,
}

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(3600);

impl Default for DeskSettings {
    fn default() -> Self {
        Self {
            approval_delay: DEFAULT_APPROVAL_DELAY,
            assumptions: AssumptionPolicy::Assumed,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

fn invalid(from: ScreenKind, action: &'static str) -> FlowError {
    FlowError::InvalidTransition { from, action }
}

#[derive(Clone)]
pub struct DeskRunner {
    registry: Arc<CaseRegistry>,
    storage: Arc<dyn SessionStorage>,
    processing: ProcessingOrchestrator,
    outlay: OutlayOrchestrator,
    assumptions: AssumptionPolicy,
    session_ttl: Duration,
}

impl DeskRunner {
    pub fn new(
        registry: Arc<CaseRegistry>,
        storage: Arc<dyn SessionStorage>,
        gateway: Arc<dyn AgentGateway>,
        directory: Arc<AgentDirectory>,
        settings: DeskSettings,
    ) -> Self {
        Self {
            registry,
            storage,
            processing: ProcessingOrchestrator::new(gateway.clone(), directory.clone()),
            outlay: OutlayOrchestrator::new(gateway, directory, settings.approval_delay),
            assumptions: settings.assumptions,
            session_ttl: settings.session_ttl,
        }
    }

    pub fn registry(&self) -> &CaseRegistry {
        &self.registry
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Drops sessions that have been idle for longer than the configured TTL.
    pub async fn evict_idle_sessions(&self) -> Result<usize> {
        let evicted = self.storage.evict_idle(self.session_ttl).await?;
        if evicted > 0 {
            info!(evicted, ttl_secs = self.session_ttl.as_secs(), "Evicted idle sessions");
        }
        Ok(evicted)
    }

    pub async fn open_session(&self) -> Result<Arc<Session>> {
        self.evict_idle_sessions().await?;
        let session = Arc::new(Session::new());
        self.storage.save(session.clone()).await?;
        info!(session_id = %session.id, "Session opened");
        Ok(session)
    }

    /// Loads a session and marks it as used.
    pub async fn session(&self, session_id: &str) -> Result<Arc<Session>> {
        let session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;
        session.touch();
        Ok(session)
    }

    pub async fn close_session(&self, session_id: &str) -> Result<()> {
        if !self.storage.delete(session_id).await? {
            return Err(FlowError::SessionNotFound(session_id.to_string()));
        }
        info!(%session_id, "Session closed");
        Ok(())
    }

    /// Dashboard → processing for the case with `claim_number`.
    pub async fn select_case(&self, session_id: &str, claim_number: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        let case = self
            .registry
            .find(claim_number)
            .cloned()
            .ok_or_else(|| FlowError::CaseNotFound(claim_number.to_string()))?;

        let mut navigator = session.navigator.lock().await;
        navigator.select_case(case)?;
        session.sync(&navigator).await;
        info!(%session_id, %claim_number, "Case selected");
        Ok(())
    }

    /// Runs case evaluation for the case on the processing screen.
    pub async fn process(&self, session_id: &str) -> Result<Completion> {
        let session = self.session(session_id).await?;
        let case = {
            let navigator = session.navigator.lock().await;
            match navigator.screen() {
                Screen::Processing { case, .. } => case.clone(),
                _ => return Err(invalid(navigator.kind(), "process a case")),
            }
        };
        let completion = self.processing.process(&session.processing, &case).await?;
        info!(%session_id, claim_number = %case.claim_number, ?completion, "Processing finished");
        Ok(completion)
    }

    /// Processing → outlay. Requires an evaluation the agent declared ready.
    pub async fn open_outlay(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        let mut navigator = session.navigator.lock().await;
        if navigator.kind() != ScreenKind::Processing {
            return Err(invalid(navigator.kind(), "open the outlay document"));
        }
        let ready = {
            let state = session.processing.lock().await;
            processing::ready_evaluation(&state)
        }
        .ok_or(FlowError::NotReady)?;

        navigator.open_outlay(ready)?;
        session.sync(&navigator).await;
        info!(%session_id, "Outlay screen opened");
        Ok(())
    }

    pub async fn generate_document(&self, session_id: &str) -> Result<Completion> {
        let session = self.session(session_id).await?;
        let (case, assumptions) = {
            let navigator = session.navigator.lock().await;
            match navigator.screen() {
                Screen::Outlay { case, evaluation } => (
                    case.clone(),
                    self.assumptions.resolve(evaluation.evaluation()),
                ),
                _ => return Err(invalid(navigator.kind(), "generate the outlay document")),
            }
        };
        let completion = self
            .outlay
            .generate(&session.outlay, &case, &assumptions)
            .await?;
        info!(%session_id, claim_number = %case.claim_number, ?completion, "Document generation finished");
        Ok(completion)
    }

    /// Approves the drafted document and, once the approval lands, returns to the
    /// dashboard.
    pub async fn approve(&self, session_id: &str) -> Result<Completion> {
        let session = self.session(session_id).await?;
        let case = self.outlay_case(&session, "approve the outlay document").await?;
        let completion = self
            .outlay
            .approve(&session.outlay, &session.approval, &case.claim_number)
            .await?;

        if completion == Completion::Applied {
            let mut navigator = session.navigator.lock().await;
            let still_here = matches!(
                navigator.screen(),
                Screen::Outlay { case: current, .. } if current.claim_number == case.claim_number
            );
            if still_here {
                navigator.back_to_dashboard();
                session.sync(&navigator).await;
            }
            info!(%session_id, claim_number = %case.claim_number, "Outlay document approved");
        }
        Ok(completion)
    }

    async fn outlay_case(&self, session: &Session, action: &'static str) -> Result<Case> {
        let navigator = session.navigator.lock().await;
        match navigator.screen() {
            Screen::Outlay { case, .. } => Ok(case.clone()),
            _ => Err(invalid(navigator.kind(), action)),
        }
    }

    pub async fn back(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        let mut navigator = session.navigator.lock().await;
        navigator.back()?;
        session.sync(&navigator).await;
        Ok(())
    }

    pub async fn go_dashboard(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        let mut navigator = session.navigator.lock().await;
        navigator.back_to_dashboard();
        session.sync(&navigator).await;
        Ok(())
    }

    pub async fn open_supervisor(&self, session_id: &str) -> Result<()> {
        let session = self.session(session_id).await?;
        let mut navigator = session.navigator.lock().await;
        navigator.open_supervisor();
        session.sync(&navigator).await;
        Ok(())
    }

    pub async fn screen_kind(&self, session_id: &str) -> Result<ScreenKind> {
        let session = self.session(session_id).await?;
        let kind = session.navigator.lock().await.kind();
        Ok(kind)
    }

    /// Renders the current screen. `search` and `status` filter the dashboard rows.
    pub async fn view(&self, session_id: &str, search: &str, status: &str) -> Result<ScreenView> {
        let session = self.session(session_id).await?;
        let navigator = session.navigator.lock().await;
        let processing = session.processing.lock().await;
        let outlay = session.outlay.lock().await;
        let approval = session.approval.lock().await;
        let snapshot = Snapshot {
            navigator: &navigator,
            processing: &processing,
            outlay: &outlay,
            approval: &approval,
        };
        Ok(render::screen(&snapshot, &self.registry, search, status))
    }
}
