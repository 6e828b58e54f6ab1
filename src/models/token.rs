// src/models/token.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the single-row 'exam_tokens' table holding the shared exam
/// access code. The row is overwritten in place; no history is kept.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamToken {
    pub id: i64,
    pub code: String,
    pub active: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
