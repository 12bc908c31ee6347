//! Gap Scoring: measures a candidate profile against a job's requirement sets.
//!
//! Default: `SkillSetGapScorer` (pure-Rust, deterministic, fully testable).
//! `AppState` holds an `Arc<dyn GapScorer>` so the backend can be swapped
//! without touching handlers.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assessment::normalizer::{clamp_percent, dedup_labels};

/// Upper bound on focus areas emitted by the scorer and the planner.
pub const MAX_FOCUS_AREAS: usize = 5;
/// Upper bound on ATS suggestions.
pub const MAX_SUGGESTIONS: usize = 3;

const REQUIRED_WEIGHT: f64 = 0.6;
const PREFERRED_WEIGHT: f64 = 0.25;
const KEYWORD_WEIGHT: f64 = 0.15;

/// Missing preferred skills and unmatched keywords each contribute at most
/// this many focus areas.
const SECONDARY_FOCUS_LIMIT: usize = 2;

const NO_GAPS_SUGGESTION: &str =
    "Resume covers the listed requirements. Lead with measurable impact for each.";

// ────────────────────────────────────────────────────────────────────────────
// Input / output data models
// ────────────────────────────────────────────────────────────────────────────

/// Candidate evidence extracted from a resume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    pub skills: Vec<String>,
    pub keywords: Vec<String>,
    pub projects: Vec<String>,
}

/// Requirement sets extracted from a job description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobRequirements {
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtsSignals {
    pub keyword_match_percent: u8,
    pub suggestions: Vec<String>,
}

/// Resume-vs-job fit report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub match_percentage: u8, // 0 – 100
    pub missing_required_skills: Vec<String>,
    pub missing_preferred_skills: Vec<String>,
    pub strong_matches: Vec<String>, // matched required or preferred
    pub weak_matches: Vec<String>,   // keyword-only overlap
    pub focus_areas: Vec<String>,    // ≤ 5, required gaps first
    pub ats_signals: AtsSignals,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The gap scorer trait. Carried in `AppState` as `Arc<dyn GapScorer>`.
pub trait GapScorer: Send + Sync {
    fn score(&self, candidate: &CandidateProfile, job: &JobRequirements) -> GapAnalysis;
}

/// Exact skill-set overlap scorer.
///
/// Algorithm:
/// 1. Case-fold candidate skills, keywords and project names into one corpus.
/// 2. For each requirement set: score = round(100 × matched / total), 0 when empty.
/// 3. match = 0.6 × required + 0.25 × preferred + 0.15 × keywords, clamped to 0 – 100.
pub struct SkillSetGapScorer;

impl GapScorer for SkillSetGapScorer {
    fn score(&self, candidate: &CandidateProfile, job: &JobRequirements) -> GapAnalysis {
        score_gap(candidate, job)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core algorithm
// ────────────────────────────────────────────────────────────────────────────

struct SetMatch {
    matched: Vec<String>,
    missing: Vec<String>,
    score: u8,
}

/// Trims, lowercases and deduplicates labels, dropping blanks.
fn case_fold(items: &[String]) -> Vec<String> {
    dedup_labels(items.iter().map(|s| s.trim().to_lowercase()))
}

fn match_set(requirements: &[String], corpus: &HashSet<String>) -> SetMatch {
    let (matched, missing): (Vec<String>, Vec<String>) = requirements
        .iter()
        .cloned()
        .partition(|r| corpus.contains(r));

    let score = if requirements.is_empty() {
        0
    } else {
        clamp_percent(100.0 * matched.len() as f64 / requirements.len() as f64)
    };

    SetMatch {
        matched,
        missing,
        score,
    }
}

/// Display form of a case-folded label: first character upper-cased.
pub fn display_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn display_all(labels: &[String]) -> Vec<String> {
    labels.iter().map(|l| display_label(l)).collect()
}

/// Scores a candidate profile against job requirements. Empty inputs yield
/// zero scores and empty lists.
pub fn score_gap(candidate: &CandidateProfile, job: &JobRequirements) -> GapAnalysis {
    let corpus: HashSet<String> = case_fold(&candidate.skills)
        .into_iter()
        .chain(case_fold(&candidate.keywords))
        .chain(case_fold(&candidate.projects))
        .collect();

    let required = match_set(&case_fold(&job.required_skills), &corpus);
    let preferred = match_set(&case_fold(&job.preferred_skills), &corpus);
    let keywords = match_set(&case_fold(&job.keywords), &corpus);

    let match_percentage = clamp_percent(
        required.score as f64 * REQUIRED_WEIGHT
            + preferred.score as f64 * PREFERRED_WEIGHT
            + keywords.score as f64 * KEYWORD_WEIGHT,
    );

    let strong = dedup_labels(required.matched.iter().chain(&preferred.matched));
    let strong_set: HashSet<&str> = strong.iter().map(String::as_str).collect();
    let weak: Vec<String> = keywords
        .matched
        .iter()
        .filter(|k| !strong_set.contains(k.as_str()))
        .cloned()
        .collect();

    let mut focus = dedup_labels(
        required
            .missing
            .iter()
            .chain(preferred.missing.iter().take(SECONDARY_FOCUS_LIMIT))
            .chain(keywords.missing.iter().take(SECONDARY_FOCUS_LIMIT)),
    );
    focus.truncate(MAX_FOCUS_AREAS);

    let suggestions = build_suggestions(&required.missing, &preferred.missing, &keywords.missing);

    debug!(
        "Gap scored: required={} preferred={} keywords={} match={}",
        required.score, preferred.score, keywords.score, match_percentage
    );

    GapAnalysis {
        match_percentage,
        missing_required_skills: display_all(&required.missing),
        missing_preferred_skills: display_all(&preferred.missing),
        strong_matches: display_all(&strong),
        weak_matches: display_all(&weak),
        focus_areas: display_all(&focus),
        ats_signals: AtsSignals {
            keyword_match_percent: keywords.score,
            suggestions,
        },
    }
}

/// Builds up to three ATS suggestions, required gaps first.
fn build_suggestions(
    missing_required: &[String],
    missing_preferred: &[String],
    unmatched_keywords: &[String],
) -> Vec<String> {
    let top = |labels: &[String]| -> String {
        labels
            .iter()
            .take(3)
            .map(|l| display_label(l))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut suggestions = Vec::new();
    if !missing_required.is_empty() {
        suggestions.push(format!(
            "Add evidence for missing required skills: {}.",
            top(missing_required)
        ));
    }
    if !missing_preferred.is_empty() {
        suggestions.push(format!(
            "Highlight any experience with preferred skills: {}.",
            top(missing_preferred)
        ));
    }
    if !unmatched_keywords.is_empty() {
        suggestions.push(format!(
            "Mirror job description keywords such as: {}.",
            top(unmatched_keywords)
        ));
    }
    if suggestions.is_empty() {
        suggestions.push(NO_GAPS_SUGGESTION.to_string());
    }
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn candidate(skills: &[&str]) -> CandidateProfile {
        CandidateProfile {
            skills: strings(skills),
            ..CandidateProfile::default()
        }
    }

    fn job(required: &[&str], preferred: &[&str], keywords: &[&str]) -> JobRequirements {
        JobRequirements {
            required_skills: strings(required),
            preferred_skills: strings(preferred),
            keywords: strings(keywords),
        }
    }

    #[test]
    fn test_one_of_three_required_scores_twenty() {
        let report = score_gap(
            &candidate(&["python"]),
            &job(&["python", "sql", "docker"], &[], &[]),
        );
        assert_eq!(report.match_percentage, 20);
        assert_eq!(report.missing_required_skills, vec!["Sql", "Docker"]);
        assert_eq!(report.strong_matches, vec!["Python"]);
    }

    #[test]
    fn test_empty_requirements_score_zero() {
        let report = score_gap(&candidate(&["rust"]), &JobRequirements::default());
        assert_eq!(report.match_percentage, 0);
        assert!(report.focus_areas.is_empty());
        assert!(report.missing_required_skills.is_empty());
        assert_eq!(report.ats_signals.keyword_match_percent, 0);
    }

    #[test]
    fn test_empty_everything_does_not_panic() {
        let report = score_gap(&CandidateProfile::default(), &JobRequirements::default());
        assert_eq!(report.match_percentage, 0);
        assert_eq!(report.ats_signals.suggestions, vec![NO_GAPS_SUGGESTION.to_string()]);
    }

    #[test]
    fn test_full_match_scores_hundred() {
        let report = score_gap(
            &candidate(&["Rust", "Tokio", "postgres"]),
            &job(&["rust"], &["tokio"], &["postgres"]),
        );
        assert_eq!(report.match_percentage, 100);
        assert!(report.missing_required_skills.is_empty());
        assert_eq!(report.weak_matches, vec!["Postgres"]);
    }

    #[test]
    fn test_matching_is_case_insensitive_and_uses_projects() {
        let profile = CandidateProfile {
            skills: strings(&["  KUBERNETES "]),
            keywords: vec![],
            projects: strings(&["Ledger"]),
        };
        let report = score_gap(&profile, &job(&["kubernetes", "ledger"], &[], &[]));
        assert_eq!(report.match_percentage, 60);
    }

    #[test]
    fn test_duplicate_requirements_are_folded() {
        let report = score_gap(&candidate(&["go"]), &job(&["Go", "go", "GO", "java"], &[], &[]));
        // Folded to {go, java}: 50% required → 30 overall
        assert_eq!(report.match_percentage, 30);
        assert_eq!(report.missing_required_skills, vec!["Java"]);
    }

    #[test]
    fn test_weak_matches_exclude_strong_matches() {
        let report = score_gap(
            &candidate(&["rust", "grpc"]),
            &job(&["rust"], &[], &["rust", "grpc"]),
        );
        assert_eq!(report.strong_matches, vec!["Rust"]);
        assert_eq!(report.weak_matches, vec!["Grpc"]);
    }

    #[test]
    fn test_focus_areas_order_required_then_preferred_then_keywords() {
        let report = score_gap(
            &candidate(&[]),
            &job(&["sql"], &["redis", "kafka", "spark"], &["ci", "cd", "observability"]),
        );
        assert_eq!(report.focus_areas, vec!["Sql", "Redis", "Kafka", "Ci", "Cd"]);
    }

    #[test]
    fn test_focus_areas_capped_at_five() {
        let report = score_gap(
            &candidate(&[]),
            &job(&["a", "b", "c", "d", "e", "f", "g"], &["h"], &["i"]),
        );
        assert_eq!(report.focus_areas.len(), MAX_FOCUS_AREAS);
        assert_eq!(report.focus_areas[0], "A");
    }

    #[test]
    fn test_focus_areas_dedup_keyword_already_missing_as_required() {
        let report = score_gap(&candidate(&[]), &job(&["docker"], &[], &["docker", "helm"]));
        assert_eq!(report.focus_areas, vec!["Docker", "Helm"]);
    }

    #[test]
    fn test_suggestions_prioritize_required_gaps() {
        let report = score_gap(&candidate(&[]), &job(&["sql"], &["redis"], &["ci"]));
        let suggestions = &report.ats_signals.suggestions;
        assert_eq!(suggestions.len(), 3);
        assert!(suggestions[0].contains("required"));
        assert!(suggestions[0].contains("Sql"));
        assert!(suggestions[1].contains("preferred"));
    }

    #[test]
    fn test_suggestions_affirm_when_no_gaps() {
        let report = score_gap(&candidate(&["sql"]), &job(&["sql"], &[], &[]));
        assert_eq!(report.ats_signals.suggestions, vec![NO_GAPS_SUGGESTION.to_string()]);
    }

    #[test]
    fn test_weighted_components_round_each_set() {
        // required 1/2 = 50, preferred 1/3 = 33, keywords 2/3 = 67
        // 30 + 8.25 + 10.05 = 48.3 → 48
        let report = score_gap(
            &candidate(&["a", "p", "k1", "k2"]),
            &job(&["a", "b"], &["p", "q", "r"], &["k1", "k2", "k3"]),
        );
        assert_eq!(report.match_percentage, 48);
        assert_eq!(report.ats_signals.keyword_match_percent, 67);
    }

    #[test]
    fn test_display_label() {
        assert_eq!(display_label("system design"), "System design");
        assert_eq!(display_label(""), "");
    }

    #[test]
    fn test_scorer_trait_delegates() {
        let scorer: &dyn GapScorer = &SkillSetGapScorer;
        let report = scorer.score(&candidate(&["python"]), &job(&["python"], &[], &[]));
        assert_eq!(report.match_percentage, 60);
    }
}
