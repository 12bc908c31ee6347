//! Interview Planner: derives the starting difficulty, round layout and focus
//! topics for a new session.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assessment::gap_scoring::{GapAnalysis, MAX_FOCUS_AREAS};
use crate::assessment::normalizer::dedup_labels;
use crate::models::session::{Difficulty, SessionState};

/// Generic topics used when there is no job description to derive gaps from.
const GENERIC_FOCUS_AREAS: &[&str] = &["problem solving", "communication clarity"];
const RESUME_FOCUS_SKILLS: usize = 2;

/// Seniority keywords, checked in order; the first hit wins.
const SENIORITY_LEVELS: &[(&[&str], i64)] = &[
    (&["intern", "fresher", "entry"], 1),
    (&["junior"], 2),
    (&["mid"], 3),
    (&["senior", "lead", "staff"], 4),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundType {
    Behavioral,
    TechnicalFundamentals,
    Applied,
    EdgeCases,
    SystemDesign,
}

/// Every session runs the same rounds in the same order.
pub const ROUND_STRUCTURE: [RoundType; 5] = [
    RoundType::Behavioral,
    RoundType::TechnicalFundamentals,
    RoundType::Applied,
    RoundType::EdgeCases,
    RoundType::SystemDesign,
];

/// Session-start configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPlan {
    pub round_structure: Vec<RoundType>,
    pub start_difficulty: Difficulty,
    pub focus_areas: Vec<String>,
    /// Informational only.
    pub rationale: Vec<String>,
}

impl InterviewPlan {
    /// The state a session created from this plan starts in.
    pub fn initial_state(&self) -> SessionState {
        SessionState::new(self.start_difficulty, self.focus_areas.clone())
    }
}

/// Unit words that mark a number as a years-of-experience count.
const YEAR_UNITS: &[&str] = &["year", "yr"];

/// Reads a years-of-experience count from lowercased text: an integer that
/// opens the text, or one followed by a year unit ("7 years", "10+ yrs").
/// Version numbers such as "python 3" are not years.
fn years_of_experience(text: &str) -> Option<u64> {
    let text = text.trim_start();
    let mut offset = 0;

    while let Some(found) = text[offset..].find(|c: char| c.is_ascii_digit()) {
        let start = offset + found;
        let run = &text[start..];
        let len = run
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(run.len());
        let unit = run[len..].trim_start_matches(|c: char| c == '+' || c.is_whitespace());

        if start == 0 || YEAR_UNITS.iter().any(|u| unit.starts_with(u)) {
            // Only overflow can fail here; treat it as "a lot of years".
            return Some(run[..len].parse().unwrap_or(u64::MAX));
        }
        offset = start + len;
    }
    None
}

/// Infers a starting difficulty from free-text experience.
///
/// Seniority keywords are matched first (case-insensitive substring), then a
/// leading or year-tagged integer is read as years of experience. No signal at
/// all yields 2.
pub fn infer_start_difficulty(experience: &str) -> Difficulty {
    let text = experience.to_lowercase();

    let from_keywords = SENIORITY_LEVELS
        .iter()
        .find(|(words, _)| words.iter().any(|w| text.contains(w)))
        .map(|(_, level)| *level);

    let level = from_keywords.or_else(|| {
        years_of_experience(&text).map(|years| match years {
            0..=1 => 1,
            2..=3 => 2,
            4..=6 => 3,
            _ => 4,
        })
    });

    Difficulty::new(level.unwrap_or(Difficulty::DEFAULT.level() as i64))
}

/// Builds the plan for a new session.
///
/// Focus areas come from the gap analysis when it has any; otherwise the first
/// two resume skills plus the generic topics are used.
pub fn build_plan(
    experience: &str,
    gap_analysis: Option<&GapAnalysis>,
    resume_skills: &[String],
) -> InterviewPlan {
    let start_difficulty = infer_start_difficulty(experience);
    let mut rationale = vec![format!(
        "Starting at difficulty {} based on stated experience.",
        start_difficulty.level()
    )];

    let gap_focus = gap_analysis
        .map(|g| g.focus_areas.as_slice())
        .filter(|f| !f.is_empty());

    let mut focus_areas = match gap_focus {
        Some(areas) => {
            rationale.push("Focus areas target gaps against the job description.".to_string());
            dedup_labels(areas)
        }
        None => {
            rationale.push(
                "No job description gaps available; focusing on resume skills and fundamentals."
                    .to_string(),
            );
            let skills = dedup_labels(resume_skills);
            dedup_labels(
                skills
                    .iter()
                    .map(String::as_str)
                    .take(RESUME_FOCUS_SKILLS)
                    .chain(GENERIC_FOCUS_AREAS.iter().copied()),
            )
        }
    };
    focus_areas.truncate(MAX_FOCUS_AREAS);

    if let Some(gap) = gap_analysis {
        rationale.push(format!("Resume matches {}% of the role.", gap.match_percentage));
    }

    debug!(
        "Plan built: start_difficulty={} focus_areas={:?}",
        start_difficulty.level(),
        focus_areas
    );

    InterviewPlan {
        round_structure: ROUND_STRUCTURE.to_vec(),
        start_difficulty,
        focus_areas,
        rationale,
    }
}
