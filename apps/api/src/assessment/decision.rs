//! Decision Engine: turns one normalized evaluation plus the current session
//! state into the next strategy and the updated state.
//!
//! `decide` is pure: the caller owns persistence and must serialize concurrent
//! answer submissions for the same session.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assessment::normalizer::{merge_unique, round1, SCORE_MAX, SCORE_MIN};
use crate::models::evaluation::{BuzzwordDensity, Dimension, Evaluation};
use crate::models::session::{Difficulty, SessionState, Strategy, StrategyHistory};

/// Every non-confidence dimension must exceed this to escalate.
const MASTERY_THRESHOLD: f64 = 7.0;
/// Core dimensions below this are treated as a knowledge gap.
const CORE_GAP_THRESHOLD: f64 = 5.0;
/// Example usage, clarity and structure below this need follow-up.
const DELIVERY_THRESHOLD: f64 = 5.0;
/// Confidence below this switches topic even when content is adequate.
const SWITCH_TOPIC_CONFIDENCE: f64 = 4.0;
/// Confidence below this arms the repetition guard and difficulty drop.
const LOW_CONFIDENCE: f64 = 5.0;

const WEAKNESS_BELOW: f64 = 6.0;
const STRENGTH_AT: f64 = 8.0;

/// Weight the previous confidence trend keeps on each update.
const CONFIDENCE_RETENTION: f64 = 0.7;

pub const VAGUENESS_TAG: &str = "vagueness";
pub const BUZZWORD_TAG: &str = "buzzword_overuse";

const MASTERY_DIMENSIONS: [Dimension; 6] = [
    Dimension::ConceptualCorrectness,
    Dimension::ImplementationDepth,
    Dimension::TradeoffAwareness,
    Dimension::Clarity,
    Dimension::Structure,
    Dimension::ExampleUsage,
];

/// Output of one pass through the decision loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub next_strategy: Strategy,
    pub updated_session_state: SessionState,
}

/// Strategy from the evaluation alone, before the repetition guard.
fn base_strategy(eval: &Evaluation) -> Strategy {
    let conceptual = eval.conceptual_correctness;
    let tradeoff = eval.tradeoff_awareness;
    let core_min = conceptual.min(eval.implementation_depth).min(tradeoff);

    if MASTERY_DIMENSIONS
        .iter()
        .all(|d| eval.score(*d) > MASTERY_THRESHOLD)
    {
        return Strategy::IncreaseDifficulty;
    }

    if core_min < CORE_GAP_THRESHOLD {
        // Ties go to conceptual, then tradeoff, then implementation.
        return if conceptual == core_min {
            Strategy::Clarify
        } else if tradeoff == core_min {
            Strategy::AskTradeoff
        } else {
            Strategy::ProbeDeeper
        };
    }

    if eval.example_usage < DELIVERY_THRESHOLD || eval.buzzword_density == BuzzwordDensity::High {
        return Strategy::AskExample;
    }

    if eval.vagueness_flag
        || eval.clarity < DELIVERY_THRESHOLD
        || eval.structure < DELIVERY_THRESHOLD
    {
        return Strategy::Clarify;
    }

    if eval.confidence < SWITCH_TOPIC_CONFIDENCE {
        return Strategy::SwitchTopic;
    }

    Strategy::AskExample
}

/// Chooses the next strategy, switching topic instead of picking the same
/// strategy a third time in a row for a low-confidence answer.
pub fn choose_strategy(eval: &Evaluation, history: &StrategyHistory) -> Strategy {
    let chosen = base_strategy(eval);

    let repeating = matches!(
        history.last_two(),
        Some((a, b)) if a == b && b == chosen
    );

    if repeating && eval.confidence < LOW_CONFIDENCE {
        debug!("Strategy {chosen} repeated twice with low confidence; switching topic");
        return Strategy::SwitchTopic;
    }

    chosen
}

/// Moves difficulty at most one step: up on mastery, down when a clarify or
/// probe is paired with low confidence.
pub fn next_difficulty(current: Difficulty, strategy: Strategy, confidence: f64) -> Difficulty {
    match strategy {
        Strategy::IncreaseDifficulty => current.step_up(),
        Strategy::Clarify | Strategy::ProbeDeeper if confidence < LOW_CONFIDENCE => {
            current.step_down()
        }
        _ => current,
    }
}

/// Tags for every dimension scoring below 6, plus vagueness and buzzword overuse.
pub fn observed_weaknesses(eval: &Evaluation) -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = Dimension::ALL
        .into_iter()
        .filter(|d| eval.score(*d) < WEAKNESS_BELOW)
        .map(Dimension::tag)
        .collect();
    if eval.vagueness_flag {
        tags.push(VAGUENESS_TAG);
    }
    if eval.buzzword_density == BuzzwordDensity::High {
        tags.push(BUZZWORD_TAG);
    }
    tags
}

/// Tags for every dimension scoring 8 or above.
pub fn observed_strengths(eval: &Evaluation) -> Vec<&'static str> {
    Dimension::ALL
        .into_iter()
        .filter(|d| eval.score(*d) >= STRENGTH_AT)
        .map(Dimension::tag)
        .collect()
}

/// Exponentially weighted confidence trend, rounded to one decimal.
pub fn smoothed_confidence(previous: f64, observed: f64) -> f64 {
    round1(previous * CONFIDENCE_RETENTION + observed * (1.0 - CONFIDENCE_RETENTION))
        .clamp(SCORE_MIN, SCORE_MAX)
}

/// Runs one step of the decision loop. Total and deterministic.
pub fn decide(eval: &Evaluation, state: &SessionState) -> Decision {
    let next_strategy = choose_strategy(eval, &state.strategy_history);

    let mut updated = state.clone();
    updated.current_difficulty =
        next_difficulty(state.current_difficulty, next_strategy, eval.confidence);
    merge_unique(&mut updated.weakness_tags, observed_weaknesses(eval));
    merge_unique(&mut updated.strengths, observed_strengths(eval));
    updated.confidence_score = smoothed_confidence(state.confidence_score, eval.confidence);
    updated.record_strategy(next_strategy);

    debug!(
        "Decision: strategy={} difficulty {} -> {} confidence {:.1} -> {:.1}",
        next_strategy,
        state.current_difficulty.level(),
        updated.current_difficulty.level(),
        state.confidence_score,
        updated.confidence_score
    );

    Decision {
        next_strategy,
        updated_session_state: updated,
    }
}
