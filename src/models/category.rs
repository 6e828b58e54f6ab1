// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'categories' table. Categories classify both question-bank
/// entries and exam types, discriminated by `kind`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// 'question' or 'exam'.
    pub kind: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating a category.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom(function = validate_kind))]
    pub kind: String,
}

fn validate_kind(kind: &str) -> Result<(), validator::ValidationError> {
    match kind {
        "question" | "exam" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_category_kind")),
    }
}
