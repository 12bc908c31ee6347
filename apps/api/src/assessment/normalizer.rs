//! Normalizer: turns untrusted oracle/generator/client payloads into range-safe values.
//!
//! Nothing in here fails. Malformed numbers are clamped, unknown enum literals
//! fall back to their defaults, and anything that is not a list becomes an empty
//! list. Every payload that reaches the decision engine or the planner passes
//! through one of the `normalize_*` functions first.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::warn;

use crate::assessment::gap_scoring::{
    AtsSignals, CandidateProfile, GapAnalysis, JobRequirements, MAX_FOCUS_AREAS, MAX_SUGGESTIONS,
};
use crate::models::evaluation::{BuzzwordDensity, Dimension, Evaluation};
use crate::models::question::{GeneratedQuestion, MAX_QUESTION_SKILLS};
use crate::models::session::{
    Difficulty, SessionState, Strategy, StrategyHistory, INITIAL_CONFIDENCE,
};

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 10.0;

/// Skill label used when the question generator tags nothing and no focus area exists.
const FALLBACK_SKILL: &str = "general";

// ────────────────────────────────────────────────────────────────────────────
// Scalar coercion
// ────────────────────────────────────────────────────────────────────────────

/// Coerces a JSON value to a finite number.
///
/// Numbers pass through, numeric strings are parsed (blank strings are 0),
/// booleans become 1/0. Everything else, and any non-finite result, is `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok()
            }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|v| v.is_finite())
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0 && v.is_finite()).unwrap_or(false),
        _ => false,
    }
}

/// Coerces and clamps a quality score into 0.0 – 10.0, using `default` when
/// the value is missing or not a finite number.
pub fn clamp_score(value: Option<&Value>, default: f64) -> f64 {
    value
        .and_then(coerce_number)
        .unwrap_or(default)
        .clamp(SCORE_MIN, SCORE_MAX)
}

/// Rounds a sum to an integer percentage within 0 – 100. Non-finite input is 0.
pub fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Looks up the first present, non-null key among aliases.
pub fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

/// Reads a free-text field. Non-strings become empty; strings are trimmed.
pub fn normalize_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

// ────────────────────────────────────────────────────────────────────────────
// Collections
// ────────────────────────────────────────────────────────────────────────────

/// Deduplicates labels case-insensitively, keeping the first spelling seen.
/// Labels are trimmed and blank ones dropped.
pub fn dedup_labels<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    merge_unique(&mut out, items);
    out
}

/// Unions labels into `target` without introducing case-insensitive duplicates.
pub fn merge_unique<I, S>(target: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = target.iter().map(|t| t.to_lowercase()).collect();
    for item in items {
        let label = item.as_ref().trim();
        if label.is_empty() {
            continue;
        }
        if seen.insert(label.to_lowercase()) {
            target.push(label.to_string());
        }
    }
}

/// Reads a list of labels. Non-arrays become empty; non-string and blank
/// entries are dropped; duplicates are removed case-insensitively.
pub fn normalize_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => dedup_labels(items.iter().filter_map(Value::as_str)),
        _ => Vec::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Oracle text
// ────────────────────────────────────────────────────────────────────────────

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

fn try_parse_json_object(text: &str) -> Option<Value> {
    let text = strip_json_fences(text);
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    // Prose around the object: fall back to the outermost braces.
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Parses raw oracle output into a JSON object. Unparseable text degrades to
/// an empty object, which normalizes to all defaults.
pub fn parse_oracle_text(text: &str) -> Value {
    try_parse_json_object(text).unwrap_or_else(|| {
        warn!("Oracle returned unparseable output; using defaults");
        Value::Object(Map::new())
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes an oracle evaluation payload.
///
/// Scores are clamped to 0 – 10; missing or non-numeric scores are 0, except
/// `confidence`, which defaults to 5. Keys are accepted in camelCase or snake_case.
pub fn normalize_evaluation(raw: &Value) -> Evaluation {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let score = |dimension: Dimension| {
        let default = match dimension {
            Dimension::Confidence => INITIAL_CONFIDENCE,
            _ => 0.0,
        };
        clamp_score(field(obj, &[dimension.key(), dimension.tag()]), default)
    };

    Evaluation {
        conceptual_correctness: score(Dimension::ConceptualCorrectness),
        implementation_depth: score(Dimension::ImplementationDepth),
        tradeoff_awareness: score(Dimension::TradeoffAwareness),
        clarity: score(Dimension::Clarity),
        structure: score(Dimension::Structure),
        example_usage: score(Dimension::ExampleUsage),
        confidence: score(Dimension::Confidence),
        vagueness_flag: field(obj, &["vaguenessFlag", "vagueness_flag"])
            .map(coerce_bool)
            .unwrap_or(false),
        buzzword_density: field(obj, &["buzzwordDensity", "buzzword_density"])
            .and_then(Value::as_str)
            .map(BuzzwordDensity::normalize)
            .unwrap_or_default(),
    }
}

/// Normalizes an evaluation that arrives either as a JSON object or as the
/// oracle's raw text response.
pub fn evaluation_from_payload(payload: &Value) -> Evaluation {
    match payload {
        Value::String(text) => normalize_evaluation(&parse_oracle_text(text)),
        other => normalize_evaluation(other),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session state
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes a (possibly partial) session state payload.
///
/// `currentDifficulty` defaults to 2 and is clamped to 1 – 5; `confidenceScore`
/// defaults to 5 and is clamped to 0 – 10. Unknown strategy labels are dropped
/// and the history is trimmed to its window. `lastStrategy` is re-derived from
/// the history so the two never disagree.
pub fn normalize_session_state(raw: &Value) -> SessionState {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let current_difficulty = field(obj, &["currentDifficulty", "current_difficulty"])
        .and_then(coerce_number)
        .map(|level| Difficulty::new(level.round() as i64))
        .unwrap_or(Difficulty::DEFAULT);

    let strategy_history: StrategyHistory =
        match field(obj, &["strategyHistory", "strategy_history"]) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(Strategy::parse)
                .collect::<Vec<_>>()
                .into(),
            _ => StrategyHistory::new(),
        };

    SessionState {
        current_difficulty,
        weakness_tags: normalize_string_list(field(obj, &["weaknessTags", "weakness_tags"])),
        strengths: normalize_string_list(field(obj, &["strengths"])),
        confidence_score: clamp_score(
            field(obj, &["confidenceScore", "confidence_score"]),
            INITIAL_CONFIDENCE,
        ),
        last_strategy: strategy_history.last(),
        strategy_history,
        question_history: normalize_string_list(field(
            obj,
            &["questionHistory", "question_history"],
        )),
        focus_areas: normalize_string_list(field(obj, &["focusAreas", "focus_areas"])),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gap analysis
// ────────────────────────────────────────────────────────────────────────────

/// Project names, given either as plain labels or as objects with a name.
fn normalize_project_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    dedup_labels(items.iter().filter_map(|item| match item {
        Value::String(name) => Some(name.as_str()),
        Value::Object(obj) => field(obj, &["name", "title"]).and_then(Value::as_str),
        _ => None,
    }))
}

/// Normalizes an untrusted candidate profile. Any list that is missing or not
/// a list becomes empty; non-string entries are dropped.
pub fn normalize_candidate_profile(raw: &Value) -> CandidateProfile {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    CandidateProfile {
        skills: normalize_string_list(field(obj, &["skills"])),
        keywords: normalize_string_list(field(obj, &["keywords"])),
        projects: normalize_project_list(field(obj, &["projects"])),
    }
}

/// Normalizes untrusted job requirements the same way as a candidate profile.
pub fn normalize_job_requirements(raw: &Value) -> JobRequirements {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    JobRequirements {
        required_skills: normalize_string_list(field(obj, &["requiredSkills", "required_skills"])),
        preferred_skills: normalize_string_list(field(
            obj,
            &["preferredSkills", "preferred_skills"],
        )),
        keywords: normalize_string_list(field(obj, &["keywords"])),
    }
}

fn percent_field(obj: &Map<String, Value>, keys: &[&str]) -> u8 {
    field(obj, keys)
        .and_then(coerce_number)
        .map(clamp_percent)
        .unwrap_or(0)
}

/// Normalizes an untrusted gap analysis payload (for example one stored by an
/// earlier job-description attach). Percentages are clamped to 0 – 100,
/// `focusAreas` is capped at 5 and `suggestions` at 3.
pub fn normalize_gap_analysis(raw: &Value) -> GapAnalysis {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let ats = field(obj, &["atsSignals", "ats_signals"])
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut focus_areas = normalize_string_list(field(obj, &["focusAreas", "focus_areas"]));
    focus_areas.truncate(MAX_FOCUS_AREAS);
    let mut suggestions = normalize_string_list(field(ats, &["suggestions"]));
    suggestions.truncate(MAX_SUGGESTIONS);

    GapAnalysis {
        match_percentage: percent_field(obj, &["matchPercentage", "match_percentage"]),
        missing_required_skills: normalize_string_list(field(
            obj,
            &["missingRequiredSkills", "missing_required_skills"],
        )),
        missing_preferred_skills: normalize_string_list(field(
            obj,
            &["missingPreferredSkills", "missing_preferred_skills"],
        )),
        strong_matches: normalize_string_list(field(obj, &["strongMatches", "strong_matches"])),
        weak_matches: normalize_string_list(field(obj, &["weakMatches", "weak_matches"])),
        focus_areas,
        ats_signals: AtsSignals {
            keyword_match_percent: percent_field(
                ats,
                &["keywordMatchPercent", "keyword_match_percent"],
            ),
            suggestions,
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generated questions
// ────────────────────────────────────────────────────────────────────────────

/// Normalizes the question generator's output.
///
/// Returns `None` when no usable question text is present. Skills are
/// deduplicated and capped at 3; an untagged question inherits the first focus
/// area (or "general").
pub fn normalize_generated_question(
    raw: &Value,
    focus_areas: &[String],
) -> Option<GeneratedQuestion> {
    let parsed;
    let raw = match raw {
        Value::String(text) => match try_parse_json_object(text) {
            Some(value) => {
                parsed = value;
                &parsed
            }
            None => {
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                return Some(GeneratedQuestion {
                    text: text.to_string(),
                    skills: default_skills(focus_areas),
                });
            }
        },
        other => other,
    };

    let obj = raw.as_object()?;
    let text = field(obj, &["question", "questionText", "question_text", "text"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();

    let mut skills =
        normalize_string_list(field(obj, &["skills", "tags", "skillTags", "skill_tags"]));
    skills.truncate(MAX_QUESTION_SKILLS);
    if skills.is_empty() {
        skills = default_skills(focus_areas);
    }

    Some(GeneratedQuestion { text, skills })
}

fn default_skills(focus_areas: &[String]) -> Vec<String> {
    vec![focus_areas
        .first()
        .cloned()
        .unwrap_or_else(|| FALLBACK_SKILL.to_string())]
}
