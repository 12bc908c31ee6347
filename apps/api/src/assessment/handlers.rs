//! Axum route handlers for the Assessment API.
//!
//! Handlers only load and store session records; every decision is made by the
//! pure functions in the sibling modules.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::assessment::decision::{decide, Decision};
use crate::assessment::gap_scoring::{CandidateProfile, GapAnalysis, JobRequirements};
use crate::assessment::normalizer::{
    evaluation_from_payload, field, merge_unique, normalize_candidate_profile,
    normalize_gap_analysis, normalize_generated_question, normalize_job_requirements,
    normalize_session_state, normalize_string_list, normalize_text,
};
use crate::assessment::planner::{build_plan, InterviewPlan};
use crate::assessment::summary::{summarize, SessionSummary};
use crate::errors::AppError;
use crate::models::evaluation::Evaluation;
use crate::models::question::{GeneratedQuestion, QuestionBrief};
use crate::models::session::{SessionState, Strategy};
use crate::session::store::SessionRecord;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Normalized body of `POST /api/v1/gap-analysis`.
#[derive(Debug)]
pub struct GapAnalysisRequest {
    pub candidate: CandidateProfile,
    pub job: JobRequirements,
}

impl GapAnalysisRequest {
    pub fn from_payload(raw: &Value) -> Self {
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);
        let section = |key: &str| field(obj, &[key]).cloned().unwrap_or_default();
        Self {
            candidate: normalize_candidate_profile(&section("candidate")),
            job: normalize_job_requirements(&section("job")),
        }
    }
}

/// Normalized body of `POST /api/v1/sessions`.
#[derive(Debug)]
pub struct CreateSessionRequest {
    pub experience_text: String,
    pub resume_skills: Vec<String>,
    pub gap_analysis: Option<GapAnalysis>,
    /// Snapshot of a session being resumed from an external store.
    pub state: Option<SessionState>,
}

impl CreateSessionRequest {
    pub fn from_payload(raw: &Value) -> Self {
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);
        Self {
            experience_text: normalize_text(field(obj, &["experienceText", "experience_text"])),
            resume_skills: normalize_string_list(field(obj, &["resumeSkills", "resume_skills"])),
            gap_analysis: field(obj, &["gapAnalysis", "gap_analysis"])
                .map(normalize_gap_analysis),
            state: field(obj, &["state", "sessionState", "session_state"])
                .map(normalize_session_state),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub version: u64,
    pub plan: InterviewPlan,
    pub state: SessionState,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Oracle output: a JSON object or the raw response text.
    #[serde(default)]
    pub evaluation: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub next_strategy: Strategy,
    pub evaluation: Evaluation,
    pub state: SessionState,
    pub version: u64,
    pub answers_evaluated: u32,
    pub brief: QuestionBrief,
}

#[derive(Debug, Deserialize)]
pub struct RecordQuestionRequest {
    /// Question generator output: a JSON object or the raw response text.
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuestionResponse {
    pub question: GeneratedQuestion,
    pub version: u64,
    pub questions_asked: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/gap-analysis
///
/// Scores a candidate profile against a job's requirement sets.
pub async fn handle_gap_analysis(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<GapAnalysis>, AppError> {
    let request = GapAnalysisRequest::from_payload(&payload);
    let analysis = state.gap_scorer.score(&request.candidate, &request.job);
    info!("Gap analysis computed: match {}%", analysis.match_percentage);
    Ok(Json(analysis))
}

/// POST /api/v1/sessions
///
/// Plans a new interview and opens a session at the plan's starting difficulty.
/// A `state` snapshot in the body resumes that session instead; it keeps the
/// plan's focus areas when it carries none of its own.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let CreateSessionRequest {
        experience_text,
        resume_skills,
        gap_analysis,
        state: snapshot,
    } = CreateSessionRequest::from_payload(&payload);

    let plan = build_plan(&experience_text, gap_analysis.as_ref(), &resume_skills);

    let record = match snapshot {
        Some(mut resumed) => {
            if resumed.focus_areas.is_empty() {
                resumed.focus_areas = plan.focus_areas.clone();
            }
            info!(
                "Resuming session snapshot at difficulty {} after {} strategies",
                resumed.current_difficulty.level(),
                resumed.strategy_history.len()
            );
            SessionRecord::with_state(plan, gap_analysis, resumed)
        }
        None => SessionRecord::new(plan, gap_analysis),
    };
    let record = state.sessions.insert(record).await?;

    Ok(Json(CreateSessionResponse {
        session_id: record.id,
        version: record.version,
        plan: record.plan,
        state: record.state,
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionRecord>, AppError> {
    Ok(Json(state.sessions.get(session_id).await?))
}

/// POST /api/v1/sessions/:id/answers
///
/// Runs one step of the decision loop for an evaluated answer and returns the
/// brief for the next question. A concurrent submission for the same session
/// loses with 409 rather than overwriting this one.
pub async fn handle_submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    if request.evaluation.is_null() {
        return Err(AppError::Validation("evaluation is required".to_string()));
    }

    let mut record = state.sessions.get(session_id).await?;
    let evaluation = evaluation_from_payload(&request.evaluation);

    let Decision {
        next_strategy,
        updated_session_state,
    } = decide(&evaluation, &record.state);
    record.state = updated_session_state;
    record.answers_evaluated = record.answers_evaluated.saturating_add(1);

    let record = state.sessions.update(record).await?;

    info!(
        "Session {session_id}: answer {} -> {next_strategy} at difficulty {}",
        record.answers_evaluated,
        record.state.current_difficulty.level()
    );

    Ok(Json(SubmitAnswerResponse {
        next_strategy,
        brief: QuestionBrief::for_state(next_strategy, &record.state),
        evaluation,
        version: record.version,
        answers_evaluated: record.answers_evaluated,
        state: record.state,
    }))
}

/// POST /api/v1/sessions/:id/questions
///
/// Records a generated question so later briefs ask the generator to avoid it.
pub async fn handle_record_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<RecordQuestionRequest>,
) -> Result<Json<RecordQuestionResponse>, AppError> {
    let mut record = state.sessions.get(session_id).await?;

    let question = normalize_generated_question(&request.payload, &record.state.focus_areas)
        .ok_or_else(|| {
            AppError::UnprocessableEntity(
                "question generator returned no question text".to_string(),
            )
        })?;

    merge_unique(&mut record.state.question_history, [question.text.as_str()]);
    let record = state.sessions.update(record).await?;

    Ok(Json(RecordQuestionResponse {
        question,
        version: record.version,
        questions_asked: record.state.question_history.len(),
    }))
}

/// POST /api/v1/sessions/:id/complete
///
/// Closes the session and returns its summary.
pub async fn handle_complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let record = state.sessions.remove(session_id).await?;
    Ok(Json(summarize(
        record.id,
        record.answers_evaluated,
        &record.state,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    use crate::assessment::gap_scoring::SkillSetGapScorer;
    use crate::session::store::InMemorySessionStore;

    fn app_state() -> AppState {
        AppState {
            gap_scorer: Arc::new(SkillSetGapScorer),
            sessions: Arc::new(InMemorySessionStore::new(16)),
        }
    }

    async fn open_session(state: &AppState, payload: Value) -> CreateSessionResponse {
        let Json(body) = handle_create_session(State(state.clone()), Json(payload))
            .await
            .expect("session opens");
        body
    }

    async fn answer(state: &AppState, id: Uuid, evaluation: Value) -> SubmitAnswerResponse {
        let Json(body) = handle_submit_answer(
            State(state.clone()),
            Path(id),
            Json(SubmitAnswerRequest { evaluation }),
        )
        .await
        .expect("answer accepted");
        body
    }

    #[tokio::test]
    async fn test_gap_analysis_endpoint() {
        let payload = json!({
            "candidate": {"skills": ["python"]},
            "job": {"requiredSkills": ["python", "sql", "docker"]}
        });
        let Json(body) = handle_gap_analysis(State(app_state()), Json(payload))
            .await
            .unwrap();
        assert_eq!(body.match_percentage, 20);
        assert_eq!(body.missing_required_skills, vec!["Sql", "Docker"]);
    }

    #[tokio::test]
    async fn test_gap_analysis_tolerates_malformed_lists() {
        let payload = json!({
            "candidate": {"skills": ["python", null, 4], "keywords": "sql"},
            "job": {"requiredSkills": ["python", "sql"], "preferredSkills": "docker"}
        });
        let Json(body) = handle_gap_analysis(State(app_state()), Json(payload))
            .await
            .unwrap();
        assert_eq!(body.match_percentage, 30);
        assert_eq!(body.missing_required_skills, vec!["Sql"]);
        assert!(body.missing_preferred_skills.is_empty());
    }

    #[tokio::test]
    async fn test_create_session_uses_normalized_gap() {
        let state = app_state();
        let body = open_session(
            &state,
            json!({
                "experienceText": "5 years backend engineer",
                "resumeSkills": ["Go"],
                "gapAnalysis": {"matchPercentage": "300", "focusAreas": ["Sql", "sql", 7]}
            }),
        )
        .await;
        assert_eq!(body.plan.start_difficulty.level(), 3);
        assert_eq!(body.plan.focus_areas, vec!["Sql"]);
        assert_eq!(body.state.current_difficulty.level(), 3);
        assert_eq!(body.version, 1);

        let Json(record) = handle_get_session(State(state), Path(body.session_id))
            .await
            .unwrap();
        assert_eq!(record.gap_analysis.unwrap().match_percentage, 100);
    }

    #[tokio::test]
    async fn test_create_session_drops_malformed_fields() {
        let state = app_state();
        let body = open_session(
            &state,
            json!({"experienceText": 12, "resumeSkills": ["Go", 7, null], "gapAnalysis": "n/a"}),
        )
        .await;
        assert_eq!(body.plan.start_difficulty.level(), 2);
        assert_eq!(
            body.plan.focus_areas,
            vec!["Go", "problem solving", "communication clarity"]
        );
    }

    #[tokio::test]
    async fn test_create_session_resumes_normalized_state() {
        let state = app_state();
        let body = open_session(
            &state,
            json!({
                "experienceText": "junior",
                "resumeSkills": ["Rust"],
                "state": {
                    "currentDifficulty": 9,
                    "confidenceScore": "7.5",
                    "weaknessTags": ["clarity", "Clarity", 1],
                    "strategyHistory": ["clarify", "clarify", "teleport"],
                    "lastStrategy": "increase_difficulty"
                }
            }),
        )
        .await;
        assert_eq!(body.state.current_difficulty.level(), 5);
        assert_eq!(body.state.confidence_score, 7.5);
        assert_eq!(body.state.weakness_tags, vec!["clarity"]);
        assert_eq!(body.state.last_strategy, Some(Strategy::Clarify));
        assert_eq!(body.state.focus_areas, body.plan.focus_areas);
        assert_eq!(body.plan.start_difficulty.level(), 2);

        // A third low-confidence clarify is turned into a topic switch.
        let next = answer(
            &state,
            body.session_id,
            json!({
                "conceptualCorrectness": 2, "implementationDepth": 6, "tradeoffAwareness": 6,
                "clarity": 6, "structure": 6, "exampleUsage": 6, "confidence": 3
            }),
        )
        .await;
        assert_eq!(next.next_strategy, Strategy::SwitchTopic);
        assert_eq!(next.state.current_difficulty.level(), 5);
    }

    #[tokio::test]
    async fn test_submit_answer_escalates_on_mastery() {
        let state = app_state();
        let session = open_session(&state, json!({"experienceText": "junior"})).await;

        let body = answer(
            &state,
            session.session_id,
            json!({
                "conceptualCorrectness": 9, "implementationDepth": 9, "tradeoffAwareness": 9,
                "clarity": 9, "structure": 9, "exampleUsage": 9, "confidence": 9
            }),
        )
        .await;

        assert_eq!(body.next_strategy, Strategy::IncreaseDifficulty);
        assert_eq!(body.state.current_difficulty.level(), 3);
        assert_eq!(body.brief.difficulty, 3);
        assert_eq!(body.version, 2);
        assert_eq!(body.answers_evaluated, 1);
        assert_eq!(body.state.confidence_score, 6.2);
    }

    #[tokio::test]
    async fn test_submit_answer_accepts_raw_oracle_text() {
        let state = app_state();
        let session = open_session(&state, json!({})).await;
        let body = answer(
            &state,
            session.session_id,
            json!(concat!(
                "```json\n",
                r#"{"conceptualCorrectness": 3, "implementationDepth": 8, "tradeoffAwareness": 8, "#,
                r#""clarity": 8, "structure": 8, "exampleUsage": 8, "confidence": 8}"#,
                "\n```"
            )),
        )
        .await;
        assert_eq!(body.next_strategy, Strategy::Clarify);
        assert_eq!(body.evaluation.conceptual_correctness, 3.0);
    }

    #[tokio::test]
    async fn test_submit_answer_requires_evaluation() {
        let state = app_state();
        let session = open_session(&state, json!({})).await;
        let result = handle_submit_answer(
            State(state),
            Path(session.session_id),
            Json(SubmitAnswerRequest {
                evaluation: Value::Null,
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_submit_answer_unknown_session() {
        let result = handle_submit_answer(
            State(app_state()),
            Path(Uuid::new_v4()),
            Json(SubmitAnswerRequest {
                evaluation: json!({}),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_repeated_low_confidence_clarify_switches_topic() {
        let state = app_state();
        let session = open_session(&state, json!({})).await;
        let shaky = json!({
            "conceptualCorrectness": 2, "implementationDepth": 6, "tradeoffAwareness": 6,
            "clarity": 6, "structure": 6, "exampleUsage": 6, "confidence": 4
        });

        let first = answer(&state, session.session_id, shaky.clone()).await;
        let second = answer(&state, session.session_id, shaky.clone()).await;
        let third = answer(&state, session.session_id, shaky).await;

        assert_eq!(first.next_strategy, Strategy::Clarify);
        assert_eq!(second.next_strategy, Strategy::Clarify);
        assert_eq!(third.next_strategy, Strategy::SwitchTopic);
        // Two low-confidence clarifies step 2 -> 1 and stay at the floor.
        assert_eq!(third.state.current_difficulty.level(), 1);
    }

    #[tokio::test]
    async fn test_record_question_updates_history() {
        let state = app_state();
        let session = open_session(&state, json!({"resumeSkills": ["Rust"]})).await;

        let Json(body) = handle_record_question(
            State(state.clone()),
            Path(session.session_id),
            Json(RecordQuestionRequest {
                payload: json!({"question": "How does the borrow checker work?"}),
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.question.skills, vec!["Rust"]);
        assert_eq!(body.questions_asked, 1);

        let next = answer(&state, session.session_id, json!({"clarity": 7})).await;
        assert_eq!(
            next.brief.asked_questions,
            vec!["How does the borrow checker work?"]
        );
    }

    #[tokio::test]
    async fn test_record_question_without_text_is_unprocessable() {
        let state = app_state();
        let session = open_session(&state, json!({})).await;
        let result = handle_record_question(
            State(state),
            Path(session.session_id),
            Json(RecordQuestionRequest {
                payload: json!({"skills": ["sql"]}),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::UnprocessableEntity(_))));
    }

    #[tokio::test]
    async fn test_complete_session_returns_summary_and_closes() {
        let state = app_state();
        let session = open_session(&state, json!({})).await;
        answer(&state, session.session_id, json!({"clarity": 2})).await;

        let Json(summary) = handle_complete_session(State(state.clone()), Path(session.session_id))
            .await
            .unwrap();
        assert_eq!(summary.session_id, session.session_id);
        assert_eq!(summary.answers_evaluated, 1);
        assert!(summary.weaknesses.contains(&"clarity".to_string()));

        let result = handle_get_session(State(state), Path(session.session_id)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
