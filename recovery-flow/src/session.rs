use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    error::Result,
    navigator::{Navigator, Screen},
    orchestration::{Operation, Orchestration},
    outlay::Approval,
    payload::{CaseEvaluation, OutlayDocument},
};

/// One user's desk: the current screen plus the state of every agent-backed operation.
///
/// Locks are always taken in field order (navigator, processing, outlay, approval) and
/// never held across an agent call.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Milliseconds since the epoch of the last access.
    last_seen: AtomicI64,
    pub navigator: Mutex<Navigator>,
    pub processing: Mutex<Orchestration<CaseEvaluation>>,
    pub outlay: Mutex<Orchestration<OutlayDocument>>,
    pub approval: Mutex<Orchestration<Approval>>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            last_seen: AtomicI64::new(now.timestamp_millis()),
            navigator: Mutex::new(Navigator::new()),
            processing: Mutex::new(Orchestration::new(Operation::ProcessCase)),
            outlay: Mutex::new(Orchestration::new(Operation::GenerateDocument)),
            approval: Mutex::new(Orchestration::new(Operation::ApproveDocument)),
        }
    }

    pub fn touch(&self) {
        self.touch_at(Utc::now());
    }

    pub(crate) fn touch_at(&self, at: DateTime<Utc>) {
        self.last_seen.store(at.timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_seen.load(Ordering::Relaxed))
            .unwrap_or(self.created_at)
    }

    /// `true` once the session has gone unused for at least `ttl`.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.last_seen())
            .to_std()
            .is_ok_and(|idle| idle >= ttl)
    }

    /// Refocuses every orchestration on the case the navigator now shows.
    ///
    /// Must be called after each transition, with the navigator lock still held.
    pub async fn sync(&self, navigator: &Navigator) {
        let (processing, drafting) = match navigator.screen() {
            Screen::Processing { case, .. } => (Some(case.claim_number.as_str()), None),
            Screen::Outlay { case, .. } => {
                let claim = Some(case.claim_number.as_str());
                (claim, claim)
            }
            Screen::Dashboard | Screen::Supervisor => (None, None),
        };
        self.processing.lock().await.focus(processing);
        self.outlay.lock().await.focus(drafting);
        self.approval.lock().await.focus(drafting);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Arc<Session>) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Arc<Session>>>;
    async fn delete(&self, id: &str) -> Result<bool>;
    /// Drops every session idle for at least `ttl`; returns how many were dropped.
    async fn evict_idle(&self, ttl: Duration) -> Result<usize>;
}

/// In-memory implementation of SessionStorage. Sessions vanish on restart.
#[derive(Default)]
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Arc<Session>>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Arc<Session>) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Arc<Session>>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.remove(id).is_some())
    }

    async fn evict_idle(&self, ttl: Duration) -> Result<usize> {
        let now = Utc::now();
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_idle(now, ttl))
            .map(|entry| entry.key().clone())
            .collect();
        for id in &idle {
            self.sessions.remove(id);
        }
        Ok(idle.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cases::CaseRegistry;

    #[tokio::test]
    async fn test_storage_roundtrip() {
        let storage = InMemorySessionStorage::new();
        let session = Arc::new(Session::with_id("desk-1".to_string()));
        storage.save(session).await.unwrap();

        assert!(storage.get("desk-1").await.unwrap().is_some());
        assert!(storage.get("desk-2").await.unwrap().is_none());
        assert!(storage.delete("desk-1").await.unwrap());
        assert!(!storage.delete("desk-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let storage = InMemorySessionStorage::new();
        let stale = Arc::new(Session::with_id("stale".to_string()));
        stale.touch_at(Utc::now() - chrono::TimeDelta::hours(2));
        storage.save(stale).await.unwrap();
        storage
            .save(Arc::new(Session::with_id("fresh".to_string())))
            .await
            .unwrap();

        let evicted = storage.evict_idle(Duration::from_secs(3600)).await.unwrap();
        assert_eq!(evicted, 1);
        assert!(storage.get("stale").await.unwrap().is_none());
        assert!(storage.get("fresh").await.unwrap().is_some());
    }

    #[test]
    fn test_touch_resets_idleness() {
        let session = Session::new();
        let ttl = Duration::from_secs(60);
        session.touch_at(Utc::now() - chrono::TimeDelta::minutes(5));
        assert!(session.is_idle(Utc::now(), ttl));

        session.touch();
        assert!(!session.is_idle(Utc::now(), ttl));
    }

    #[tokio::test]
    async fn test_sync_focuses_orchestrations() {
        let session = Session::new();
        let case = CaseRegistry::sample().list()[0].clone();

        let mut navigator = session.navigator.lock().await;
        navigator.select_case(case).unwrap();
        session.sync(&navigator).await;

        assert_eq!(
            session.processing.lock().await.subject(),
            Some("CLM-2024-78432")
        );
        assert_eq!(session.outlay.lock().await.subject(), None);

        navigator.back_to_dashboard();
        session.sync(&navigator).await;
        assert_eq!(session.processing.lock().await.subject(), None);
    }
}
