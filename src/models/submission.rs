// src/models/submission.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'submissions' table: one attempt per participant per
/// exam instance. Rows are written by the exam-taking client; this admin
/// layer reads them, apart from the reset/delete actions.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub exam_id: i64,
    pub participant_id: i64,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub total_questions: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    /// Final score; null until the attempt has been graded.
    pub score: Option<f64>,
    /// The "selesai" flag set by the exam-taking client on submit.
    pub finished: bool,
}

/// Progress state of one roster member, classified at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    NotStarted,
    Active,
    Finished,
}

impl ParticipantStatus {
    /// Single authoritative classification used by monitoring and recap.
    ///
    /// A submission counts as finished only when its score is present and
    /// strictly greater than zero; a graded score of exactly zero still
    /// classifies as active.
    pub fn classify(submission: Option<&Submission>) -> Self {
        match submission {
            None => ParticipantStatus::NotStarted,
            Some(s) => match s.score {
                Some(score) if score > 0.0 => ParticipantStatus::Finished,
                _ => ParticipantStatus::Active,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(score: Option<f64>) -> Submission {
        Submission {
            id: 1,
            exam_id: 1,
            participant_id: 7,
            started_at: None,
            finished_at: None,
            total_questions: 40,
            correct_count: 0,
            incorrect_count: 0,
            score,
            finished: false,
        }
    }

    #[test]
    fn no_row_is_not_started() {
        assert_eq!(ParticipantStatus::classify(None), ParticipantStatus::NotStarted);
    }

    #[test]
    fn zero_score_is_active_not_finished() {
        let s = submission(Some(0.0));
        assert_eq!(ParticipantStatus::classify(Some(&s)), ParticipantStatus::Active);
    }

    #[test]
    fn ungraded_row_is_active() {
        let s = submission(None);
        assert_eq!(ParticipantStatus::classify(Some(&s)), ParticipantStatus::Active);
    }

    #[test]
    fn positive_score_is_finished() {
        let s = submission(Some(75.0));
        assert_eq!(ParticipantStatus::classify(Some(&s)), ParticipantStatus::Finished);
    }
}
