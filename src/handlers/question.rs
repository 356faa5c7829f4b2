// src/handlers/question.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::{
    error::AppError,
    handlers::exam_paper::{PaperParams, load_assembled_paper},
    models::{
        exam_info::ExamInfo,
        question::{
            AnswerPayload, CreateQuestionRequest, Question, QuestionDetail, UpdateQuestionRequest,
        },
    },
    paper::{self, BrowseQuestion},
    store::{self, QUESTION_COLUMNS, QuestionBundle},
    utils::{html::clean_html, jwt::CurrentAdmin},
};
use validator::Validate;

/// Query parameters for the filtered question listing.
#[derive(Debug, Deserialize)]
pub struct ListQuestionsParams {
    #[serde(rename = "topicId")]
    pub topic_id: Option<i64>,
    #[serde(rename = "examInfoId")]
    pub exam_info_id: Option<i64>,
    pub subject: Option<String>,
}

fn detail_from_bundle(bundle: QuestionBundle, exam_info: Option<ExamInfo>) -> QuestionDetail {
    QuestionDetail {
        question: bundle.question,
        topic: bundle.topic,
        exam_info,
        answers: bundle.answers,
    }
}

/// Lists questions filtered by topic, exam, or subject.
/// At least one filter is required.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<ListQuestionsParams>,
) -> Result<impl IntoResponse, AppError> {
    // A subject filter goes through topics: find the subject's topic ids,
    // then match questions tagged with any of them.
    let topic_ids = match params.subject.as_deref() {
        Some(subject) => {
            let ids = store::topic_ids_for_subject(&pool, subject).await?;
            if ids.is_empty() {
                return Err(AppError::NotFound(
                    "No topics found for this subject, thus no questions.".to_string(),
                ));
            }
            Some(ids)
        }
        None => None,
    };

    if params.topic_id.is_none() && params.exam_info_id.is_none() && topic_ids.is_none() {
        return Err(AppError::BadRequest(
            "Please provide topicId, examInfoId, or subject to filter questions.".to_string(),
        ));
    }

    let bundles =
        store::questions_filtered(&pool, params.topic_id, params.exam_info_id, topic_ids).await?;

    if bundles.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for the given criteria.".to_string(),
        ));
    }

    // Decorate each bundle with its parent exam in one fetch.
    let mut exam_ids: Vec<i64> = bundles.iter().map(|b| b.question.exam_info_id).collect();
    exam_ids.sort_unstable();
    exam_ids.dedup();
    let exams: HashMap<i64, ExamInfo> = store::exams_by_ids(&pool, &exam_ids)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

    let details: Vec<QuestionDetail> = bundles
        .into_iter()
        .map(|b| {
            let exam = exams.get(&b.question.exam_info_id).cloned();
            detail_from_bundle(b, exam)
        })
        .collect();

    Ok(Json(details))
}

#[derive(Debug, Deserialize)]
pub struct NumbersParams {
    #[serde(rename = "examId")]
    pub exam_id: Option<i64>,
}

/// Ascending question numbers for an exam.
/// An exam with no questions yields an empty list, not a 404.
pub async fn question_numbers(
    State(pool): State<PgPool>,
    Query(params): Query<NumbersParams>,
) -> Result<impl IntoResponse, AppError> {
    let Some(exam_id) = params.exam_id else {
        return Err(AppError::BadRequest("Missing examId".to_string()));
    };

    let numbers = store::question_numbers(&pool, exam_id).await?;
    Ok(Json(numbers))
}

#[derive(Debug, Deserialize)]
pub struct ByExamAndNumberParams {
    #[serde(rename = "examId")]
    pub exam_id: Option<i64>,
    #[serde(rename = "questionNumber")]
    pub question_number: Option<i32>,
}

/// One question by (exam, number), with its stored answers.
pub async fn question_by_exam_and_number(
    State(pool): State<PgPool>,
    Query(params): Query<ByExamAndNumberParams>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(exam_id), Some(number)) = (params.exam_id, params.question_number) else {
        return Err(AppError::BadRequest(
            "Missing examId or questionNumber".to_string(),
        ));
    };

    let bundle = store::question_by_exam_and_number(&pool, exam_id, number)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(detail_from_bundle(bundle, None)))
}

/// Same assembly as the exam-paper view, projected to the browse shape
/// (no per-option feedback).
pub async fn questions_by_exam(
    State(pool): State<PgPool>,
    Query(params): Query<PaperParams>,
) -> Result<impl IntoResponse, AppError> {
    let assembled = load_assembled_paper(&pool, &params).await?;

    let questions: Vec<BrowseQuestion> = assembled.iter().map(BrowseQuestion::from).collect();
    Ok(Json(questions))
}

/// Retrieves a single question by ID with all its relations.
pub async fn get_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let bundle = store::question_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Question not found.".to_string()))?;

    let exam = store::find_exam(&pool, bundle.question.exam_info_id).await?;

    Ok(Json(detail_from_bundle(bundle, exam)))
}

/// Bulk-inserts a question's answer set.
///
/// answer_number is assigned from list position (1-based); client text
/// and feedback are sanitized and whitespace-normalized before storage.
async fn insert_answers(
    tx: &mut Transaction<'_, Postgres>,
    question_id: i64,
    answers: &[AnswerPayload],
) -> Result<(), AppError> {
    if answers.is_empty() {
        return Ok(());
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO question_answers \
         (question_id, answer_text, answer_text_json, answer_number, fraction, feedback, feedback_json) ",
    );

    builder.push_values(answers.iter().enumerate(), |mut row, (index, answer)| {
        row.push_bind(question_id)
            .push_bind(paper::clean_text(&clean_html(&answer.answer_text)))
            .push_bind(answer.answer_text_json.clone())
            .push_bind(index as i32 + 1)
            .push_bind(answer.fraction)
            .push_bind(paper::clean_text(&clean_html(
                answer.feedback.as_deref().unwrap_or(""),
            )))
            .push_bind(answer.feedback_json.clone());
    });

    builder.build().execute(&mut **tx).await?;

    Ok(())
}

/// Creates a question together with its answer set.
/// Admin only. The question row and the answers land in one transaction.
pub async fn create_question(
    State(pool): State<PgPool>,
    CurrentAdmin(claims): CurrentAdmin,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions \
         (question_number, exam_info_id, topic_id, question_text, question_text_json, \
          question_type, default_mark, general_feedback, general_feedback_json) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {QUESTION_COLUMNS}"
    ))
    .bind(payload.question_number)
    .bind(payload.exam_info_id)
    .bind(payload.topic_id)
    .bind(clean_html(&payload.question_text))
    .bind(payload.question_text_json)
    .bind(&payload.question_type)
    .bind(payload.default_mark)
    .bind(payload.general_feedback.as_deref().map(clean_html))
    .bind(payload.general_feedback_json)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        // 23503: foreign key violation (exam_info_id/topic_id).
        if e.to_string().contains("23503") || e.to_string().contains("foreign key") {
            AppError::BadRequest("exam_info_id or topicId references a missing row".to_string())
        } else {
            tracing::error!("Failed to create question: {:?}", e);
            AppError::from(e)
        }
    })?;

    if let Some(answers) = &payload.answers {
        insert_answers(&mut tx, question.id, answers).await?;
    }

    tx.commit().await?;

    tracing::info!(
        "admin {} created question {} (exam {})",
        claims.sub,
        question.id,
        question.exam_info_id
    );

    Ok((StatusCode::CREATED, Json(question)))
}

/// Replaces a question: updates the supplied scalar fields, then swaps
/// the entire answer set for the submitted one.
///
/// Admin only. Delete-then-reinsert is the contract for answers: the
/// client's list order becomes the new canonical numbering and old answer
/// ids do not survive. The whole replacement runs in one transaction so a
/// failure cannot leave the question answer-less.
pub async fn update_question(
    State(pool): State<PgPool>,
    CurrentAdmin(claims): CurrentAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM questions WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Question not found.".to_string()))?;

    let has_scalar_update = payload.question_number.is_some()
        || payload.question_text.is_some()
        || payload.question_text_json.is_some()
        || payload.default_mark.is_some()
        || payload.general_feedback.is_some()
        || payload.general_feedback_json.is_some();

    if has_scalar_update {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
        let mut separated = builder.separated(", ");

        if let Some(question_number) = payload.question_number {
            separated.push("question_number = ");
            separated.push_bind_unseparated(question_number);
        }

        if let Some(question_text) = &payload.question_text {
            separated.push("question_text = ");
            separated.push_bind_unseparated(clean_html(question_text));
        }

        if let Some(question_text_json) = payload.question_text_json {
            separated.push("question_text_json = ");
            separated.push_bind_unseparated(question_text_json);
        }

        if let Some(default_mark) = payload.default_mark {
            separated.push("default_mark = ");
            separated.push_bind_unseparated(default_mark);
        }

        if let Some(general_feedback) = &payload.general_feedback {
            separated.push("general_feedback = ");
            separated.push_bind_unseparated(clean_html(general_feedback));
        }

        if let Some(general_feedback_json) = payload.general_feedback_json {
            separated.push("general_feedback_json = ");
            separated.push_bind_unseparated(general_feedback_json);
        }

        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder.build().execute(&mut *tx).await.map_err(|e| {
            tracing::error!("Failed to update question: {:?}", e);
            AppError::from(e)
        })?;
    }

    // Full replace: no merge or diff against the previous answer set.
    sqlx::query("DELETE FROM question_answers WHERE question_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    if let Some(answers) = &payload.answers {
        insert_answers(&mut tx, id, answers).await?;
    }

    tx.commit().await?;

    tracing::info!("admin {} replaced question {}", claims.sub, id);

    Ok(Json(json!({ "success": true })))
}
