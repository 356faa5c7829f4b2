// src/models/question.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{answer::Answer, exam_info::ExamInfo, topic::Topic};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Ordinal position within the owning exam. Expected unique per exam,
    /// but lookups tolerate duplicates by returning the first match.
    pub question_number: i32,

    pub exam_info_id: i64,

    pub topic_id: Option<i64>,

    /// Rich HTML produced by the client-side editor. Never
    /// whitespace-collapsed (structural whitespace is meaningful here).
    pub question_text: String,

    /// Alternate serialized form of question_text, kept in sync by the
    /// caller. Stored verbatim, never validated against question_text.
    pub question_text_json: Option<serde_json::Value>,

    /// Currently always "MCQ".
    pub question_type: String,

    pub default_mark: Option<i32>,

    pub general_feedback: Option<String>,

    pub general_feedback_json: Option<serde_json::Value>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Raw question detail: the row plus its relations, for lookup and
/// editing endpoints that need stored (uncleaned) content.
#[derive(Debug, Serialize)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_info: Option<ExamInfo>,
    pub answers: Vec<Answer>,
}

/// One answer option as submitted by the client.
/// answer_number is never accepted from the client; it is assigned from
/// list position at write time.
#[derive(Debug, Deserialize)]
pub struct AnswerPayload {
    #[serde(default)]
    pub answer_text: String,
    pub answer_text_json: Option<serde_json::Value>,
    #[serde(default)]
    pub fraction: f64,
    pub feedback: Option<String>,
    pub feedback_json: Option<serde_json::Value>,
}

/// DTO for creating a new question together with its answer set.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub question_number: i32,
    pub exam_info_id: i64,
    #[serde(default, alias = "topicId")]
    pub topic_id: Option<i64>,
    #[validate(length(min = 1))]
    pub question_text: String,
    pub question_text_json: Option<serde_json::Value>,
    #[validate(length(min = 1, max = 50))]
    pub question_type: String,
    pub default_mark: Option<i32>,
    pub general_feedback: Option<String>,
    pub general_feedback_json: Option<serde_json::Value>,
    #[serde(default)]
    pub answers: Option<Vec<AnswerPayload>>,
}

/// DTO for replacing a question. Scalar fields are optional (only the
/// supplied ones are updated); the answer set is always fully replaced.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub question_number: Option<i32>,
    pub question_text: Option<String>,
    pub question_text_json: Option<serde_json::Value>,
    pub default_mark: Option<i32>,
    pub general_feedback: Option<String>,
    pub general_feedback_json: Option<serde_json::Value>,
    #[serde(default)]
    pub answers: Option<Vec<AnswerPayload>>,
}
