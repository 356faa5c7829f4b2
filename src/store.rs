// src/store.rs

//! Query layer: produces the row sets the assembly pipeline consumes.
//!
//! Outer-join semantics throughout: a question with no topic or zero
//! answers is still returned rather than silently dropped. Sort contract:
//! questions by question_number ascending, answers by answer_number
//! ascending. "Not found" (`None`) stays distinct from "found but empty"
//! (`Ok(vec![])`); handlers surface the two differently.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::models::{answer::Answer, exam_info::ExamInfo, question::Question, topic::Topic};

/// One question row with its related topic and ordered answer set.
#[derive(Debug, Clone)]
pub struct QuestionBundle {
    pub question: Question,
    pub topic: Option<Topic>,
    pub answers: Vec<Answer>,
}

pub(crate) const QUESTION_COLUMNS: &str = "\
    id, question_number, exam_info_id, topic_id, question_text, \
    question_text_json, question_type, default_mark, general_feedback, \
    general_feedback_json, created_at, updated_at";

pub(crate) const ANSWER_COLUMNS: &str = "\
    id, question_id, answer_text, answer_text_json, answer_number, \
    fraction, feedback, feedback_json, created_at, updated_at";

pub async fn find_exam(pool: &PgPool, id: i64) -> Result<Option<ExamInfo>, sqlx::Error> {
    sqlx::query_as::<_, ExamInfo>("SELECT id, exam, year, subject, lang FROM exam_info WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Exams for a set of ids, used to decorate question lists.
pub async fn exams_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ExamInfo>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ExamInfo>(
        "SELECT id, exam, year, subject, lang FROM exam_info WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub async fn count_questions(pool: &PgPool, exam_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE exam_info_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

/// Stored default marks of every question in an exam, for totals.
pub async fn question_marks(pool: &PgPool, exam_id: i64) -> Result<Vec<Option<i32>>, sqlx::Error> {
    sqlx::query_scalar("SELECT default_mark FROM questions WHERE exam_info_id = $1")
        .bind(exam_id)
        .fetch_all(pool)
        .await
}

/// Ascending question numbers of an exam. An empty list is a valid
/// result, not an error.
pub async fn question_numbers(pool: &PgPool, exam_id: i64) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT question_number FROM questions WHERE exam_info_id = $1 ORDER BY question_number ASC",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub async fn topic_ids_for_subject(pool: &PgPool, subject: &str) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM topics WHERE subject = $1")
        .bind(subject)
        .fetch_all(pool)
        .await
}

/// All questions of an exam with their relations, ordered by question
/// number.
pub async fn questions_for_exam(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<QuestionBundle>, sqlx::Error> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_info_id = $1 \
         ORDER BY question_number ASC"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await?;

    load_bundles(pool, questions).await
}

/// Filtered question listing for the browse endpoints. Each filter is
/// optional; passing none returns every question, so handlers must
/// require at least one.
pub async fn questions_filtered(
    pool: &PgPool,
    topic_id: Option<i64>,
    exam_info_id: Option<i64>,
    topic_ids: Option<Vec<i64>>,
) -> Result<Vec<QuestionBundle>, sqlx::Error> {
    let questions = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions \
         WHERE ($1::BIGINT IS NULL OR topic_id = $1) \
           AND ($2::BIGINT IS NULL OR exam_info_id = $2) \
           AND ($3::BIGINT[] IS NULL OR topic_id = ANY($3)) \
         ORDER BY question_number ASC"
    ))
    .bind(topic_id)
    .bind(exam_info_id)
    .bind(topic_ids)
    .fetch_all(pool)
    .await?;

    load_bundles(pool, questions).await
}

/// Exactly one question by (exam, number), or `None`. (exam_info_id,
/// question_number) is expected unique but not enforced here; the lowest
/// id wins when duplicates exist.
pub async fn question_by_exam_and_number(
    pool: &PgPool,
    exam_id: i64,
    number: i32,
) -> Result<Option<QuestionBundle>, sqlx::Error> {
    let question = sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions \
         WHERE exam_info_id = $1 AND question_number = $2 \
         ORDER BY id ASC LIMIT 1"
    ))
    .bind(exam_id)
    .bind(number)
    .fetch_optional(pool)
    .await?;

    let Some(question) = question else {
        return Ok(None);
    };

    let mut bundles = load_bundles(pool, vec![question]).await?;
    Ok(bundles.pop())
}

pub async fn question_by_id(
    pool: &PgPool,
    id: i64,
) -> Result<Option<QuestionBundle>, sqlx::Error> {
    let question =
        sqlx::query_as::<_, Question>(&format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;

    let Some(question) = question else {
        return Ok(None);
    };

    let mut bundles = load_bundles(pool, vec![question]).await?;
    Ok(bundles.pop())
}

/// Fetches topics and answers for a page of questions and groups them
/// into bundles, preserving the question order.
async fn load_bundles(
    pool: &PgPool,
    questions: Vec<Question>,
) -> Result<Vec<QuestionBundle>, sqlx::Error> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let question_ids: Vec<i64> = questions.iter().map(|q| q.id).collect();

    let mut topic_ids: Vec<i64> = questions.iter().filter_map(|q| q.topic_id).collect();
    topic_ids.sort_unstable();
    topic_ids.dedup();

    let topics: Vec<Topic> = if topic_ids.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as::<_, Topic>("SELECT id, topic, subject FROM topics WHERE id = ANY($1)")
            .bind(&topic_ids)
            .fetch_all(pool)
            .await?
    };

    let answers = sqlx::query_as::<_, Answer>(&format!(
        "SELECT {ANSWER_COLUMNS} FROM question_answers WHERE question_id = ANY($1) \
         ORDER BY question_id, answer_number ASC"
    ))
    .bind(&question_ids)
    .fetch_all(pool)
    .await?;

    Ok(attach_relations(questions, topics, answers))
}

/// Pure grouping step: pairs every question with its topic (if any) and
/// its answers, keeping the incoming orders.
fn attach_relations(
    questions: Vec<Question>,
    topics: Vec<Topic>,
    answers: Vec<Answer>,
) -> Vec<QuestionBundle> {
    let topic_map: HashMap<i64, Topic> = topics.into_iter().map(|t| (t.id, t)).collect();

    let mut answer_map: HashMap<i64, Vec<Answer>> = HashMap::new();
    for answer in answers {
        answer_map.entry(answer.question_id).or_default().push(answer);
    }

    questions
        .into_iter()
        .map(|question| {
            let topic = question.topic_id.and_then(|id| topic_map.get(&id).cloned());
            let answers = answer_map.remove(&question.id).unwrap_or_default();
            QuestionBundle {
                question,
                topic,
                answers,
            }
        })
        .collect()
}
