// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exam_instances' table: one sitting of a schedule,
/// usually per subject or class group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamInstance {
    pub id: i64,
    pub schedule_id: i64,
    pub name: String,
    /// Subject/field code used to pick the instance during monitoring.
    pub subject_code: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'question_packages' table (at most one per instance).
///
/// `question_ids` keeps the legacy comma-separated format; `total_questions`
/// must equal the parsed list length, which the write path enforces.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionPackage {
    pub id: i64,
    pub exam_id: i64,
    pub question_ids: String,
    pub total_questions: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for creating an exam instance. `participants` accepts the legacy
/// comma-separated roster string; it goes through the roster resolver and
/// lands in the join table.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    pub schedule_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 50))]
    pub subject_code: Option<String>,
    pub participants: Option<String>,
}

/// DTO for replacing an instance's question package.
#[derive(Debug, Deserialize)]
pub struct SetPackageRequest {
    pub question_ids: String,
    pub total_questions: i64,
}
