use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of strategies remembered per session.
pub const STRATEGY_WINDOW: usize = 30;

/// Neutral confidence a fresh session starts from.
pub const INITIAL_CONFIDENCE: f64 = 5.0;

/// Next-step instruction handed to the question generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Clarify,
    ProbeDeeper,
    AskExample,
    AskTradeoff,
    IncreaseDifficulty,
    SwitchTopic,
}

impl Strategy {
    pub const ALL: [Strategy; 6] = [
        Strategy::Clarify,
        Strategy::ProbeDeeper,
        Strategy::AskExample,
        Strategy::AskTradeoff,
        Strategy::IncreaseDifficulty,
        Strategy::SwitchTopic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Clarify => "clarify",
            Strategy::ProbeDeeper => "probe_deeper",
            Strategy::AskExample => "ask_example",
            Strategy::AskTradeoff => "ask_tradeoff",
            Strategy::IncreaseDifficulty => "increase_difficulty",
            Strategy::SwitchTopic => "switch_topic",
        }
    }

    /// Parses a strategy label, case-insensitively. Returns `None` for anything
    /// outside the alphabet.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        Strategy::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interview difficulty level. Always within 1 – 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(1);
    pub const MAX: Difficulty = Difficulty(5);
    pub const DEFAULT: Difficulty = Difficulty(2);

    /// Builds a difficulty, clamping out-of-range levels into 1 – 5.
    pub fn new(level: i64) -> Self {
        Difficulty(level.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn step_up(self) -> Self {
        Difficulty((self.0 + 1).min(Self::MAX.0))
    }

    pub fn step_down(self) -> Self {
        Difficulty(self.0.saturating_sub(1).max(Self::MIN.0))
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Difficulty {
    fn from(level: i64) -> Self {
        Difficulty::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

/// Sliding window over the strategies chosen in a session.
/// Holds at most `STRATEGY_WINDOW` entries; the oldest is evicted first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Strategy>", into = "Vec<Strategy>")]
pub struct StrategyHistory(VecDeque<Strategy>);

impl StrategyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a strategy and trims the window.
    pub fn push(&mut self, strategy: Strategy) {
        self.0.push_back(strategy);
        while self.0.len() > STRATEGY_WINDOW {
            self.0.pop_front();
        }
    }

    pub fn last(&self) -> Option<Strategy> {
        self.0.back().copied()
    }

    /// The two most recent entries, oldest first.
    pub fn last_two(&self) -> Option<(Strategy, Strategy)> {
        let len = self.0.len();
        if len < 2 {
            return None;
        }
        Some((self.0[len - 2], self.0[len - 1]))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.0.iter()
    }
}

impl From<Vec<Strategy>> for StrategyHistory {
    fn from(strategies: Vec<Strategy>) -> Self {
        let mut history = StrategyHistory::new();
        for strategy in strategies {
            history.push(strategy);
        }
        history
    }
}

impl From<StrategyHistory> for Vec<Strategy> {
    fn from(history: StrategyHistory) -> Self {
        history.0.into_iter().collect()
    }
}

/// Per-session state carried across the answer loop.
///
/// Weaknesses, strengths and asked questions only ever grow; the engine
/// unions new observations into them and never removes entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_difficulty: Difficulty,
    pub weakness_tags: Vec<String>,
    pub strengths: Vec<String>,
    pub confidence_score: f64,
    pub strategy_history: StrategyHistory,
    pub question_history: Vec<String>,
    pub focus_areas: Vec<String>,
    pub last_strategy: Option<Strategy>,
}

impl SessionState {
    pub fn new(start: Difficulty, focus_areas: Vec<String>) -> Self {
        Self {
            current_difficulty: start,
            focus_areas,
            ..Self::default()
        }
    }

    /// Records a chosen strategy, keeping `last_strategy` in step with the history.
    pub fn record_strategy(&mut self, strategy: Strategy) {
        self.strategy_history.push(strategy);
        self.last_strategy = self.strategy_history.last();
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            current_difficulty: Difficulty::DEFAULT,
            weakness_tags: Vec::new(),
            strengths: Vec::new(),
            confidence_score: INITIAL_CONFIDENCE,
            strategy_history: StrategyHistory::new(),
            question_history: Vec::new(),
            focus_areas: Vec::new(),
            last_strategy: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_clamps_into_range() {
        assert_eq!(Difficulty::new(0).level(), 1);
        assert_eq!(Difficulty::new(-7).level(), 1);
        assert_eq!(Difficulty::new(9).level(), 5);
        assert_eq!(Difficulty::new(3).level(), 3);
    }

    #[test]
    fn test_difficulty_steps_saturate() {
        assert_eq!(Difficulty::MAX.step_up(), Difficulty::MAX);
        assert_eq!(Difficulty::MIN.step_down(), Difficulty::MIN);
        assert_eq!(Difficulty::new(2).step_up().level(), 3);
        assert_eq!(Difficulty::new(2).step_down().level(), 1);
    }

    #[test]
    fn test_difficulty_deserializes_clamped() {
        let d: Difficulty = serde_json::from_str("42").unwrap();
        assert_eq!(d, Difficulty::MAX);
        assert_eq!(serde_json::to_string(&Difficulty::new(3)).unwrap(), "3");
    }

    #[test]
    fn test_strategy_history_evicts_oldest() {
        let mut history = StrategyHistory::new();
        history.push(Strategy::Clarify);
        for _ in 0..STRATEGY_WINDOW {
            history.push(Strategy::AskExample);
        }
        assert_eq!(history.len(), STRATEGY_WINDOW);
        assert!(history.iter().all(|s| *s == Strategy::AskExample));
    }

    #[test]
    fn test_strategy_history_deserialize_trims_to_window() {
        let labels: Vec<&str> = std::iter::repeat("clarify").take(45).collect();
        let json = serde_json::to_string(&labels).unwrap();
        let history: StrategyHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(history.len(), STRATEGY_WINDOW);
    }

    #[test]
    fn test_last_two_requires_two_entries() {
        let mut history = StrategyHistory::new();
        history.push(Strategy::Clarify);
        assert!(history.last_two().is_none());
        history.push(Strategy::ProbeDeeper);
        assert_eq!(
            history.last_two(),
            Some((Strategy::Clarify, Strategy::ProbeDeeper))
        );
    }

    #[test]
    fn test_strategy_parse_round_trips_labels() {
        for s in Strategy::ALL {
            assert_eq!(Strategy::parse(s.as_str()), Some(s));
        }
        assert_eq!(Strategy::parse(" Probe_Deeper "), Some(Strategy::ProbeDeeper));
        assert_eq!(Strategy::parse("interrogate"), None);
    }

    #[test]
    fn test_record_strategy_mirrors_last() {
        let mut state = SessionState::default();
        state.record_strategy(Strategy::AskTradeoff);
        assert_eq!(state.last_strategy, Some(Strategy::AskTradeoff));
        assert_eq!(state.strategy_history.len(), 1);
    }

    #[test]
    fn test_session_state_wire_shape() {
        let json = serde_json::to_value(SessionState::default()).unwrap();
        assert_eq!(json["currentDifficulty"], 2);
        assert_eq!(json["confidenceScore"], 5.0);
        assert!(json["strategyHistory"].as_array().unwrap().is_empty());
        assert!(json["lastStrategy"].is_null());
    }
}
