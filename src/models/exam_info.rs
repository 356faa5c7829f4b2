// src/models/exam_info.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'exam_info' table in the database.
///
/// One row per (exam, year, subject, lang) tuple; the tuple is unique.
/// All four fields are free text — 'year' may embed a syllabus annotation
/// such as "2023 (Old Syllabus)".
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamInfo {
    pub id: i64,

    /// Exam name, e.g. "G.C.E. A/L".
    pub exam: String,

    pub year: String,

    pub subject: String,

    pub lang: String,
}

/// DTO for creating or replacing an exam entry.
///
/// Fields are optional so a missing field yields a friendly 400 instead of
/// a deserialization rejection; the handler checks presence.
#[derive(Debug, Deserialize)]
pub struct ExamInfoPayload {
    pub exam: Option<String>,
    pub year: Option<String>,
    pub subject: Option<String>,
    pub lang: Option<String>,
}
