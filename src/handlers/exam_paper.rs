// src/handlers/exam_paper.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    paper::{self, AssembledQuestion, PaperQuestion},
    store,
};

/// Query parameters shared by the assembled-paper endpoints.
///
/// subject/language are consistency assertions, not lookup keys: the exam
/// id alone selects the data, and the optional fields are checked against
/// the stored exam row so a stale UI selection fails loudly.
#[derive(Debug, Deserialize)]
pub struct PaperParams {
    #[serde(rename = "examId")]
    pub exam_id: Option<i64>,
    pub subject: Option<String>,
    pub language: Option<String>,
}

/// Resolves, validates and assembles an exam's full question set.
///
/// The single code path behind both /exam-papers/view and
/// /questions/by-exam; each endpoint projects its own response shape from
/// the assembled records.
pub(crate) async fn load_assembled_paper(
    pool: &PgPool,
    params: &PaperParams,
) -> Result<Vec<AssembledQuestion>, AppError> {
    let Some(exam_id) = params.exam_id else {
        return Err(AppError::BadRequest("Exam ID is required".to_string()));
    };

    let exam = store::find_exam(pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    paper::verify_exam_assertions(&exam, params.subject.as_deref(), params.language.as_deref())?;

    let bundles = store::questions_for_exam(pool, exam_id).await?;

    // Zero questions for a valid exam is reported like a missing entity,
    // with a message that tells the two cases apart. Clients depend on
    // the shared status code.
    if bundles.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for the specified exam".to_string(),
        ));
    }

    tracing::debug!(
        "assembled {} questions for exam {}",
        bundles.len(),
        exam_id
    );

    Ok(bundles.iter().map(|b| paper::assemble(b, &exam)).collect())
}

/// Full assembled question set for an exam, with per-option feedback.
pub async fn view_exam_paper(
    State(pool): State<PgPool>,
    Query(params): Query<PaperParams>,
) -> Result<impl IntoResponse, AppError> {
    let assembled = load_assembled_paper(&pool, &params).await?;

    let questions: Vec<PaperQuestion> = assembled.iter().map(PaperQuestion::from).collect();
    Ok(Json(questions))
}

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    #[serde(rename = "examId")]
    pub exam_id: Option<i64>,
}

/// Question count and total marks for one exam.
pub async fn exam_paper_stats(
    State(pool): State<PgPool>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let Some(exam_id) = params.exam_id else {
        return Err(AppError::BadRequest("Exam ID is required".to_string()));
    };

    let exam = store::find_exam(&pool, exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    let marks = store::question_marks(&pool, exam_id).await?;
    let total_questions = marks.len();
    let total_marks: i64 = marks
        .into_iter()
        .map(|m| paper::marks_or_default(m) as i64)
        .sum();

    Ok(Json(json!({
        "examInfo": {
            "id": exam.id,
            "name": exam.exam,
            "year": exam.year,
            "subject": exam.subject,
            "language": exam.lang
        },
        "stats": {
            "totalQuestions": total_questions,
            "totalMarks": total_marks
        }
    })))
}
