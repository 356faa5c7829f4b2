// src/handlers/topic.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::topic::{CreateTopicRequest, Topic},
    utils::jwt::CurrentAdmin,
};

/// Lists all topics.
pub async fn list_topics(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let topics = sqlx::query_as::<_, Topic>("SELECT id, topic, subject FROM topics ORDER BY id")
        .fetch_all(&pool)
        .await?;

    Ok(Json(topics))
}

#[derive(Debug, Deserialize)]
pub struct BySubjectParams {
    pub subject: Option<String>,
}

/// Lists topics belonging to one subject.
pub async fn topics_by_subject(
    State(pool): State<PgPool>,
    Query(params): Query<BySubjectParams>,
) -> Result<impl IntoResponse, AppError> {
    let Some(subject) = params.subject else {
        return Err(AppError::BadRequest(
            "Subject query parameter is required.".to_string(),
        ));
    };

    let topics = sqlx::query_as::<_, Topic>(
        "SELECT id, topic, subject FROM topics WHERE subject = $1 ORDER BY id",
    )
    .bind(&subject)
    .fetch_all(&pool)
    .await?;

    Ok(Json(topics))
}

/// Creates a new topic.
/// Admin only.
pub async fn create_topic(
    State(pool): State<PgPool>,
    CurrentAdmin(_claims): CurrentAdmin,
    Json(payload): Json<CreateTopicRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let created = sqlx::query_as::<_, Topic>(
        "INSERT INTO topics (topic, subject) VALUES ($1, $2) RETURNING id, topic, subject",
    )
    .bind(&payload.topic)
    .bind(&payload.subject)
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}
