use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::session::{SessionState, Strategy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyCount {
    pub strategy: Strategy,
    pub count: usize,
}

/// End-of-session report built from the final state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub answers_evaluated: u32,
    pub questions_asked: usize,
    pub final_difficulty: u8,
    pub confidence_score: f64,
    pub weaknesses: Vec<String>,
    pub strengths: Vec<String>,
    /// Weaknesses never later shown as a strength.
    pub unresolved_weaknesses: Vec<String>,
    pub focus_areas: Vec<String>,
    /// Counts over the retained strategy window, in alphabet order. Zero counts omitted.
    pub strategy_counts: Vec<StrategyCount>,
}

pub fn summarize(session_id: Uuid, answers_evaluated: u32, state: &SessionState) -> SessionSummary {
    let strategy_counts = Strategy::ALL
        .into_iter()
        .map(|strategy| StrategyCount {
            strategy,
            count: state
                .strategy_history
                .iter()
                .filter(|s| **s == strategy)
                .count(),
        })
        .filter(|c| c.count > 0)
        .collect();

    let unresolved_weaknesses = state
        .weakness_tags
        .iter()
        .filter(|w| !state.strengths.iter().any(|s| s.eq_ignore_ascii_case(w)))
        .cloned()
        .collect();

    SessionSummary {
        session_id,
        answers_evaluated,
        questions_asked: state.question_history.len(),
        final_difficulty: state.current_difficulty.level(),
        confidence_score: state.confidence_score,
        weaknesses: state.weakness_tags.clone(),
        strengths: state.strengths.clone(),
        unresolved_weaknesses,
        focus_areas: state.focus_areas.clone(),
        strategy_counts,
    }
}
