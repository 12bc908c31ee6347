use serde::{Deserialize, Serialize};

use crate::models::session::{SessionState, Strategy};

/// Maximum number of skills a generated question may be tagged with.
pub const MAX_QUESTION_SKILLS: usize = 3;

/// What the question generator is asked to produce next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionBrief {
    pub strategy: Strategy,
    pub difficulty: u8,
    pub focus_areas: Vec<String>,
    /// Previously asked questions the generator must not repeat.
    pub asked_questions: Vec<String>,
}

impl QuestionBrief {
    pub fn for_state(strategy: Strategy, state: &SessionState) -> Self {
        Self {
            strategy,
            difficulty: state.current_difficulty.level(),
            focus_areas: state.focus_areas.clone(),
            asked_questions: state.question_history.clone(),
        }
    }
}

/// A question returned by the generator, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub text: String,
    pub skills: Vec<String>,
}
