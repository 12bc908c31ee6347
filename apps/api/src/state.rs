use std::sync::Arc;

use crate::assessment::gap_scoring::GapScorer;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable gap scorer. Default: SkillSetGapScorer.
    pub gap_scorer: Arc<dyn GapScorer>,
    /// Active interview sessions. Default: InMemorySessionStore.
    pub sessions: Arc<dyn SessionStore>,
}
