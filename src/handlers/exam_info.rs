// src/handlers/exam_info.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::exam_info::{ExamInfo, ExamInfoPayload},
    store,
    utils::jwt::CurrentAdmin,
};

/// Lists all exam entries, newest id first.
pub async fn list_exams(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, ExamInfo>(
        "SELECT id, exam, year, subject, lang FROM exam_info ORDER BY id DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(exams))
}

/// Retrieves a single exam entry by ID.
pub async fn get_exam(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store::find_exam(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Exam info not found.".to_string()))?;

    Ok(Json(exam))
}

/// Unpacks the payload, treating missing and empty fields the same way.
fn required_fields(payload: ExamInfoPayload) -> Result<(String, String, String, String), AppError> {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    match (
        present(payload.exam),
        present(payload.year),
        present(payload.subject),
        present(payload.lang),
    ) {
        (Some(exam), Some(year), Some(subject), Some(lang)) => Ok((exam, year, subject, lang)),
        _ => Err(AppError::BadRequest(
            "All fields are required: exam, year, subject, lang".to_string(),
        )),
    }
}

/// Creates a new exam entry.
/// Admin only. The (exam, year, subject, lang) tuple must be unique.
pub async fn create_exam(
    State(pool): State<PgPool>,
    CurrentAdmin(claims): CurrentAdmin,
    Json(payload): Json<ExamInfoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (exam, year, subject, lang) = required_fields(payload)?;

    let duplicate = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM exam_info WHERE exam = $1 AND year = $2 AND subject = $3 AND lang = $4",
    )
    .bind(&exam)
    .bind(&year)
    .bind(&subject)
    .bind(&lang)
    .fetch_optional(&pool)
    .await?;

    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "An exam with these details already exists".to_string(),
        ));
    }

    let created = sqlx::query_as::<_, ExamInfo>(
        "INSERT INTO exam_info (exam, year, subject, lang) VALUES ($1, $2, $3, $4) \
         RETURNING id, exam, year, subject, lang",
    )
    .bind(&exam)
    .bind(&year)
    .bind(&subject)
    .bind(&lang)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        // Postgres error code for unique violation is 23505; the
        // pre-check above can race with a concurrent insert.
        if e.to_string().contains("unique") || e.to_string().contains("23505") {
            AppError::Conflict("An exam with these details already exists".to_string())
        } else {
            tracing::error!("Failed to create exam: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!("admin {} created exam {}", claims.sub, created.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Exam created successfully",
            "exam": created
        })),
    ))
}

/// Updates an exam entry by ID.
/// Admin only. Updating an exam to its own unchanged tuple succeeds;
/// colliding with a *different* exam's tuple is a conflict.
pub async fn update_exam(
    State(pool): State<PgPool>,
    CurrentAdmin(_claims): CurrentAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<ExamInfoPayload>,
) -> Result<impl IntoResponse, AppError> {
    let (exam, year, subject, lang) = required_fields(payload)?;

    store::find_exam(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Exam info not found.".to_string()))?;

    let duplicate = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM exam_info \
         WHERE exam = $1 AND year = $2 AND subject = $3 AND lang = $4 AND id <> $5",
    )
    .bind(&exam)
    .bind(&year)
    .bind(&subject)
    .bind(&lang)
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    if duplicate.is_some() {
        return Err(AppError::Conflict(
            "An exam with these details already exists".to_string(),
        ));
    }

    let updated = sqlx::query_as::<_, ExamInfo>(
        "UPDATE exam_info SET exam = $1, year = $2, subject = $3, lang = $4 WHERE id = $5 \
         RETURNING id, exam, year, subject, lang",
    )
    .bind(&exam)
    .bind(&year)
    .bind(&subject)
    .bind(&lang)
    .bind(id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "message": "Exam updated successfully",
        "exam": updated
    })))
}

/// Deletes an exam entry by ID.
/// Admin only. Blocked while any question still references the exam.
pub async fn delete_exam(
    State(pool): State<PgPool>,
    CurrentAdmin(claims): CurrentAdmin,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store::find_exam(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Exam info not found.".to_string()))?;

    let question_count = store::count_questions(&pool, id).await?;
    if question_count > 0 {
        return Err(AppError::Conflict(format!(
            "Cannot delete exam. It has {} associated questions. Please delete the questions first.",
            question_count
        )));
    }

    sqlx::query("DELETE FROM exam_info WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tracing::info!("admin {} deleted exam {}", claims.sub, id);

    Ok(Json(json!({
        "message": "Exam deleted successfully"
    })))
}
