use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assessment::gap_scoring::GapAnalysis;
use crate::assessment::planner::InterviewPlan;
use crate::models::session::SessionState;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Session {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict { id: Uuid, expected: u64, actual: u64 },

    #[error("Active session limit of {0} reached")]
    CapacityExceeded(usize),
}

/// One interview session as stored between answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: Uuid,
    /// Incremented on every successful write.
    pub version: u64,
    pub plan: InterviewPlan,
    pub gap_analysis: Option<GapAnalysis>,
    pub state: SessionState,
    pub answers_evaluated: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(plan: InterviewPlan, gap_analysis: Option<GapAnalysis>) -> Self {
        let state = plan.initial_state();
        Self::with_state(plan, gap_analysis, state)
    }

    /// Opens a record that continues from an existing state instead of the
    /// plan's starting point.
    pub fn with_state(
        plan: InterviewPlan,
        gap_analysis: Option<GapAnalysis>,
        state: SessionState,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            version: 1,
            state,
            plan,
            gap_analysis,
            answers_evaluated: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Session persistence. Implement this to swap the backing store.
///
/// `update` is a compare-and-swap on `version`: two writes computed from the
/// same snapshot cannot both succeed.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord, StoreError>;

    async fn get(&self, id: Uuid) -> Result<SessionRecord, StoreError>;

    /// Replaces the stored record if its version still equals `record.version`.
    /// Returns the record as written, with the version bumped.
    async fn update(&self, record: SessionRecord) -> Result<SessionRecord, StoreError>;

    async fn remove(&self, id: Uuid) -> Result<SessionRecord, StoreError>;
}

/// Process-local store. Sessions do not survive a restart.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
    capacity: usize,
}

impl InMemorySessionStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity,
        }
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<SessionRecord, StoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.capacity {
            warn!("Session store full ({} active)", sessions.len());
            return Err(StoreError::CapacityExceeded(self.capacity));
        }
        sessions.insert(record.id, record.clone());
        info!("Session {} created", record.id);
        Ok(record)
    }

    async fn get(&self, id: Uuid) -> Result<SessionRecord, StoreError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn update(&self, mut record: SessionRecord) -> Result<SessionRecord, StoreError> {
        let mut sessions = self.sessions.write().await;
        let existing = sessions
            .get_mut(&record.id)
            .ok_or(StoreError::NotFound(record.id))?;

        if existing.version != record.version {
            return Err(StoreError::VersionConflict {
                id: record.id,
                expected: record.version,
                actual: existing.version,
            });
        }

        record.version += 1;
        record.updated_at = Utc::now();
        *existing = record.clone();
        Ok(record)
    }

    async fn remove(&self, id: Uuid) -> Result<SessionRecord, StoreError> {
        let removed = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(StoreError::NotFound(id))?;
        info!("Session {id} closed after {} answers", removed.answers_evaluated);
        Ok(removed)
    }
}
