// src/paper.rs

//! Exam-paper assembly.
//!
//! Turns one question row plus its related exam/topic/answer rows into a
//! single denormalized, client-safe record, the same way whether the
//! caller asked for one question or a whole exam. The two response shapes
//! (`PaperQuestion` for exam-paper viewing, `BrowseQuestion` for browsing
//! by exam) are projections of the same [`AssembledQuestion`] so they
//! cannot drift apart.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::{error::AppError, models::exam_info::ExamInfo, store::QuestionBundle};

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Collapses whitespace runs (spaces, tabs, newlines) to a single space
/// and trims the ends. Idempotent.
///
/// Applied to answer-level text and feedback only. Question text and
/// general feedback are structured rich HTML and keep their whitespace.
pub fn clean_text(input: &str) -> String {
    WHITESPACE_RUN.replace_all(input, " ").trim().to_string()
}

/// Marks for a question: the stored default mark, or 1 when it is absent
/// or zero.
pub fn marks_or_default(default_mark: Option<i32>) -> i32 {
    match default_mark {
        Some(mark) if mark != 0 => mark,
        _ => 1,
    }
}

/// Checks the caller-asserted subject/language against the exam row.
///
/// The UI lets a user pick exam, subject and language independently before
/// fetching, so a stale or hand-crafted combination must fail with a
/// message that names which field disagreed. Both checks are independent
/// and case-sensitive; parameters left out are not checked.
pub fn verify_exam_assertions(
    exam: &ExamInfo,
    subject: Option<&str>,
    language: Option<&str>,
) -> Result<(), AppError> {
    if let Some(subject) = subject {
        if exam.subject != subject {
            return Err(AppError::Mismatch(format!(
                "Subject mismatch. Exam has subject '{}' but '{}' was requested.",
                exam.subject, subject
            )));
        }
    }

    if let Some(language) = language {
        if exam.lang != language {
            return Err(AppError::Mismatch(format!(
                "Language mismatch. Exam has language '{}' but '{}' was requested.",
                exam.lang, language
            )));
        }
    }

    Ok(())
}

/// One normalized answer option.
#[derive(Debug, Clone)]
pub struct AssembledAnswer {
    pub number: i32,
    pub text: String,
    pub fraction: f64,
    pub feedback: String,
}

/// The superset record both response shapes project from.
#[derive(Debug, Clone)]
pub struct AssembledQuestion {
    pub id: i64,
    pub question_number: i32,
    pub question_text: String,
    pub question_type: String,
    pub marks: i32,
    pub general_feedback: Option<String>,
    /// Sorted by answer number, text and feedback cleaned.
    pub answers: Vec<AssembledAnswer>,
    pub correct_answer_number: Option<i32>,
    pub correct_answer_text: String,
    /// Subject of the related topic; empty when the question has none.
    pub subject: String,
    pub language: String,
    pub exam_name: String,
    pub exam_year: String,
}

/// The first (lowest answer_number) answer with a positive fraction.
///
/// Single-answer MCQ data should carry at most one positive fraction, but
/// the tie-break makes the output well-defined even when upstream data
/// violates that. No qualifying answer is a valid state, not an error.
pub fn resolve_correct_answer(answers: &[AssembledAnswer]) -> Option<&AssembledAnswer> {
    answers.iter().find(|a| a.fraction > 0.0)
}

/// Normalizes one question row and its relations into the client record.
pub fn assemble(bundle: &QuestionBundle, exam: &ExamInfo) -> AssembledQuestion {
    let mut answers: Vec<AssembledAnswer> = bundle
        .answers
        .iter()
        .map(|a| AssembledAnswer {
            number: a.answer_number,
            text: clean_text(&a.answer_text),
            fraction: a.fraction,
            feedback: clean_text(a.feedback.as_deref().unwrap_or("")),
        })
        .collect();

    // The query layer already orders by answer_number; re-sort so this
    // stage is correct standalone.
    answers.sort_by_key(|a| a.number);

    let correct = resolve_correct_answer(&answers);
    let correct_answer_number = correct.map(|a| a.number);
    let correct_answer_text = correct.map(|a| a.text.clone()).unwrap_or_default();

    let question = &bundle.question;

    AssembledQuestion {
        id: question.id,
        question_number: question.question_number,
        question_text: question.question_text.clone(),
        question_type: question.question_type.clone(),
        marks: marks_or_default(question.default_mark),
        general_feedback: question.general_feedback.clone(),
        answers,
        correct_answer_number,
        correct_answer_text,
        subject: bundle
            .topic
            .as_ref()
            .map(|t| t.subject.clone())
            .unwrap_or_default(),
        language: exam.lang.clone(),
        exam_name: exam.exam.clone(),
        exam_year: exam.year.clone(),
    }
}

/// Parent-exam summary echoed on every assembled question.
#[derive(Debug, Serialize)]
pub struct ExamSummary {
    pub name: String,
    pub year: String,
}

/// An option paired with its number (and, on the full shape, feedback).
#[derive(Debug, Serialize)]
pub struct NumberedOption {
    pub number: i32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Full-detail shape served by /exam-papers/view: includes per-option
/// feedback and the plural correctAnswers array kept for future
/// multi-answer support.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperQuestion {
    #[serde(rename = "_id")]
    pub id: i64,
    pub question_number: i32,
    pub question_text: String,
    pub question_type: String,
    pub marks: i32,
    #[serde(rename = "generalfeedback")]
    pub general_feedback: Option<String>,
    pub options: Vec<String>,
    pub options_feedback: Vec<String>,
    pub options_with_numbers: Vec<NumberedOption>,
    pub correct_answer: Option<i32>,
    pub correct_answers: Vec<i32>,
    pub correct_answer_text: String,
    pub subject: String,
    pub language: String,
    pub exam_info: ExamSummary,
}

impl From<&AssembledQuestion> for PaperQuestion {
    fn from(q: &AssembledQuestion) -> Self {
        PaperQuestion {
            id: q.id,
            question_number: q.question_number,
            question_text: q.question_text.clone(),
            question_type: q.question_type.clone(),
            marks: q.marks,
            general_feedback: q.general_feedback.clone(),
            options: q.answers.iter().map(|a| a.text.clone()).collect(),
            options_feedback: q.answers.iter().map(|a| a.feedback.clone()).collect(),
            options_with_numbers: q
                .answers
                .iter()
                .map(|a| NumberedOption {
                    number: a.number,
                    text: a.text.clone(),
                    feedback: Some(a.feedback.clone()),
                })
                .collect(),
            correct_answer: q.correct_answer_number,
            correct_answers: q.correct_answer_number.into_iter().collect(),
            correct_answer_text: q.correct_answer_text.clone(),
            subject: q.subject.clone(),
            language: q.language.clone(),
            exam_info: ExamSummary {
                name: q.exam_name.clone(),
                year: q.exam_year.clone(),
            },
        }
    }
}

/// Browse shape served by /questions/by-exam: same record, without
/// per-option feedback.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuestion {
    #[serde(rename = "_id")]
    pub id: i64,
    pub question_number: i32,
    pub question_text: String,
    pub question_type: String,
    pub marks: i32,
    pub feedback: Option<String>,
    pub options: Vec<String>,
    pub options_with_numbers: Vec<NumberedOption>,
    pub correct_answer: Option<i32>,
    pub correct_answer_text: String,
    pub subject: String,
    pub language: String,
    pub exam_info: ExamSummary,
}

impl From<&AssembledQuestion> for BrowseQuestion {
    fn from(q: &AssembledQuestion) -> Self {
        BrowseQuestion {
            id: q.id,
            question_number: q.question_number,
            question_text: q.question_text.clone(),
            question_type: q.question_type.clone(),
            marks: q.marks,
            feedback: q.general_feedback.clone(),
            options: q.answers.iter().map(|a| a.text.clone()).collect(),
            options_with_numbers: q
                .answers
                .iter()
                .map(|a| NumberedOption {
                    number: a.number,
                    text: a.text.clone(),
                    feedback: None,
                })
                .collect(),
            correct_answer: q.correct_answer_number,
            correct_answer_text: q.correct_answer_text.clone(),
            subject: q.subject.clone(),
            language: q.language.clone(),
            exam_info: ExamSummary {
                name: q.exam_name.clone(),
                year: q.exam_year.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{answer::Answer, question::Question, topic::Topic};

    fn exam() -> ExamInfo {
        ExamInfo {
            id: 1,
            exam: "G.C.E. A/L".to_string(),
            year: "2023 (Old Syllabus)".to_string(),
            subject: "Physics".to_string(),
            lang: "English".to_string(),
        }
    }

    fn answer(number: i32, text: &str, fraction: f64) -> Answer {
        Answer {
            id: number as i64 + 100,
            question_id: 10,
            answer_text: text.to_string(),
            answer_text_json: None,
            answer_number: number,
            fraction,
            feedback: None,
            feedback_json: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn question() -> Question {
        Question {
            id: 10,
            question_number: 3,
            exam_info_id: 1,
            topic_id: None,
            question_text: "<p>What   is  light?</p>".to_string(),
            question_text_json: None,
            question_type: "MCQ".to_string(),
            default_mark: None,
            general_feedback: None,
            general_feedback_json: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn bundle(answers: Vec<Answer>) -> QuestionBundle {
        QuestionBundle {
            question: question(),
            topic: None,
            answers,
        }
    }

    #[test]
    fn test_clean_text_collapses_and_trims() {
        let cleaned = clean_text("  a\tb\n\n c  d  ");
        assert_eq!(cleaned, "a b c d");
        assert!(!cleaned.contains("  "));
        assert!(!cleaned.contains('\t'));
        assert!(!cleaned.contains('\n'));
    }

    #[test]
    fn test_clean_text_idempotent() {
        let once = clean_text("  x \n y\t z ");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text("   \n\t "), "");
    }

    #[test]
    fn test_correct_answer_first_positive_fraction_wins() {
        // Fractions [0, 0, 0.5, 1.0] at numbers [1, 2, 3, 4]: the first
        // positive fraction (number 3) wins, not the full-credit one.
        let assembled = assemble(
            &bundle(vec![
                answer(1, "a", 0.0),
                answer(2, "b", 0.0),
                answer(3, "c", 0.5),
                answer(4, "d", 1.0),
            ]),
            &exam(),
        );

        assert_eq!(assembled.correct_answer_number, Some(3));
        assert_eq!(assembled.correct_answer_text, "c");
    }

    #[test]
    fn test_all_zero_fractions_is_not_an_error() {
        let assembled = assemble(
            &bundle(vec![answer(1, "a", 0.0), answer(2, "b", 0.0)]),
            &exam(),
        );

        assert_eq!(assembled.correct_answer_number, None);
        assert_eq!(assembled.correct_answer_text, "");
    }

    #[test]
    fn test_answers_resorted_defensively() {
        // Storage order scrambled; assembly must still emit ascending
        // answer numbers with no duplicates.
        let assembled = assemble(
            &bundle(vec![
                answer(3, "c", 0.0),
                answer(1, "a", 1.0),
                answer(2, "b", 0.0),
            ]),
            &exam(),
        );

        let numbers: Vec<i32> = assembled.answers.iter().map(|a| a.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        // Correct answer resolved against the sorted order.
        assert_eq!(assembled.correct_answer_number, Some(1));
    }

    #[test]
    fn test_answer_text_cleaned_question_text_untouched() {
        let assembled = assemble(
            &bundle(vec![answer(1, "  speed \n of\t light  ", 1.0)]),
            &exam(),
        );

        assert_eq!(assembled.answers[0].text, "speed of light");
        // Structural HTML whitespace in the question body is preserved.
        assert_eq!(assembled.question_text, "<p>What   is  light?</p>");
    }

    #[test]
    fn test_marks_default_when_absent_or_zero() {
        assert_eq!(marks_or_default(None), 1);
        assert_eq!(marks_or_default(Some(0)), 1);
        assert_eq!(marks_or_default(Some(5)), 5);
    }

    #[test]
    fn test_subject_from_topic_empty_without() {
        let mut b = bundle(vec![]);
        assert_eq!(assemble(&b, &exam()).subject, "");

        b.topic = Some(Topic {
            id: 7,
            topic: "Waves".to_string(),
            subject: "Physics".to_string(),
        });
        let assembled = assemble(&b, &exam());
        assert_eq!(assembled.subject, "Physics");
        assert_eq!(assembled.language, "English");
        assert_eq!(assembled.exam_name, "G.C.E. A/L");
        assert_eq!(assembled.exam_year, "2023 (Old Syllabus)");
    }

    #[test]
    fn test_assertions_pass_when_omitted() {
        assert!(verify_exam_assertions(&exam(), None, None).is_ok());
        assert!(verify_exam_assertions(&exam(), Some("Physics"), Some("English")).is_ok());
    }

    #[test]
    fn test_subject_mismatch_names_both_values() {
        let err = verify_exam_assertions(&exam(), Some("Chemistry"), None).unwrap_err();
        match err {
            AppError::Mismatch(msg) => {
                assert!(msg.contains("Physics"));
                assert!(msg.contains("Chemistry"));
            }
            other => panic!("expected Mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_language_checked_independently_of_subject() {
        // Subject matches; language alone must still be able to fail.
        let err = verify_exam_assertions(&exam(), Some("Physics"), Some("Sinhala")).unwrap_err();
        match err {
            AppError::Mismatch(msg) => {
                assert!(msg.contains("English"));
                assert!(msg.contains("Sinhala"));
            }
            other => panic!("expected Mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_assertions_are_case_sensitive() {
        assert!(verify_exam_assertions(&exam(), Some("physics"), None).is_err());
    }

    #[test]
    fn test_shapes_project_same_record() {
        let assembled = assemble(
            &bundle(vec![answer(1, "a", 0.0), answer(2, "b", 1.0)]),
            &exam(),
        );

        let paper = PaperQuestion::from(&assembled);
        let browse = BrowseQuestion::from(&assembled);

        assert_eq!(paper.options, browse.options);
        assert_eq!(paper.correct_answer, Some(2));
        assert_eq!(browse.correct_answer, Some(2));
        assert_eq!(paper.correct_answers, vec![2]);
        assert_eq!(paper.options_feedback.len(), 2);
        // Browse shape carries no per-option feedback.
        assert!(browse.options_with_numbers.iter().all(|o| o.feedback.is_none()));
    }

    #[test]
    fn test_correct_answers_array_empty_when_unresolved() {
        let assembled = assemble(&bundle(vec![answer(1, "a", 0.0)]), &exam());
        let paper = PaperQuestion::from(&assembled);
        assert_eq!(paper.correct_answer, None);
        assert!(paper.correct_answers.is_empty());
    }
}
