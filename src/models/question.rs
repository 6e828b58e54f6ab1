// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the exam-domain database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// Owning question-bank category, if any.
    pub category_id: Option<i64>,

    /// 'single', 'multiple' or 'essay'. The column is named 'type', which
    /// is reserved in Rust, hence the rename.
    #[sqlx(rename = "type")]
    pub question_type: String,

    /// Question body as sanitized HTML.
    pub content: String,

    /// Answer options, stored as a JSON array. Empty for essay questions.
    pub options: Json<Vec<String>>,

    /// The correct answer key or text.
    pub answer: String,

    /// Shown when reviewing a graded answer.
    pub explanation: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub category_id: Option<i64>,
    #[validate(length(min = 1, max = 20))]
    pub question_type: String,
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[validate(length(max = 10000))]
    pub explanation: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
