// src/models/answer.rs

use serde::{Deserialize, Serialize};

/// Represents the 'question_answers' table in the database.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,

    pub question_id: i64,

    pub answer_text: String,

    pub answer_text_json: Option<serde_json::Value>,

    /// 1-based position within the question, assigned from submission
    /// order at write time.
    pub answer_number: i32,

    /// Correctness weight. Any positive value marks the answer correct;
    /// values strictly between 0 and 1 are valid partial-credit data.
    pub fraction: f64,

    pub feedback: Option<String>,

    pub feedback_json: Option<serde_json::Value>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
