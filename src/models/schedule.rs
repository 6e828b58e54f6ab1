// src/models/schedule.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exam_schedules' table.
///
/// The date and time window may be filled in later than the row itself,
/// so all three are nullable; the status label is derived, never stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamSchedule {
    pub id: i64,
    pub event_id: Option<i64>,
    /// Exam-type category.
    pub category_id: Option<i64>,
    pub exam_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// Maximum number of participants.
    pub quota: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Lifecycle of a schedule relative to the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    NotScheduled,
    Scheduled,
    InProgress,
    Finished,
}

impl ExamSchedule {
    /// Derives the status label from the exam window.
    ///
    /// The window is inclusive at both ends: an exam whose end time equals
    /// the current instant is still in progress. A schedule missing any of
    /// date, start or end time has not been planned yet.
    pub fn status_at(&self, now: NaiveDateTime) -> ScheduleStatus {
        let (Some(date), Some(start), Some(end)) =
            (self.exam_date, self.start_time, self.end_time)
        else {
            return ScheduleStatus::NotScheduled;
        };

        let opens = date.and_time(start);
        let closes = date.and_time(end);

        if now < opens {
            ScheduleStatus::Scheduled
        } else if now > closes {
            ScheduleStatus::Finished
        } else {
            ScheduleStatus::InProgress
        }
    }
}

/// DTO for creating a schedule.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub event_id: Option<i64>,
    pub category_id: Option<i64>,
    pub exam_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[validate(range(min = 0))]
    pub quota: i64,
}

/// Schedule row plus its derived status, as returned by the API.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    #[serde(flatten)]
    pub schedule: ExamSchedule,
    pub status: ScheduleStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(date: Option<&str>, start: Option<&str>, end: Option<&str>) -> ExamSchedule {
        ExamSchedule {
            id: 1,
            event_id: None,
            category_id: None,
            exam_date: date.map(|d| d.parse().unwrap()),
            start_time: start.map(|t| t.parse().unwrap()),
            end_time: end.map(|t| t.parse().unwrap()),
            quota: 30,
            created_at: None,
        }
    }

    fn at(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn missing_fields_mean_not_scheduled() {
        let s = schedule(None, Some("08:00:00"), Some("10:00:00"));
        assert_eq!(s.status_at(at("2026-03-01T09:00:00")), ScheduleStatus::NotScheduled);

        let s = schedule(Some("2026-03-01"), None, Some("10:00:00"));
        assert_eq!(s.status_at(at("2026-03-01T09:00:00")), ScheduleStatus::NotScheduled);

        let s = schedule(Some("2026-03-01"), Some("08:00:00"), None);
        assert_eq!(s.status_at(at("2026-03-01T09:00:00")), ScheduleStatus::NotScheduled);
    }

    #[test]
    fn before_window_is_scheduled() {
        let s = schedule(Some("2026-03-01"), Some("08:00:00"), Some("10:00:00"));
        assert_eq!(s.status_at(at("2026-03-01T07:59:59")), ScheduleStatus::Scheduled);
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let s = schedule(Some("2026-03-01"), Some("08:00:00"), Some("10:00:00"));
        assert_eq!(s.status_at(at("2026-03-01T08:00:00")), ScheduleStatus::InProgress);
        assert_eq!(s.status_at(at("2026-03-01T10:00:00")), ScheduleStatus::InProgress);
    }

    #[test]
    fn one_second_after_end_is_finished() {
        let s = schedule(Some("2026-03-01"), Some("08:00:00"), Some("10:00:00"));
        assert_eq!(s.status_at(at("2026-03-01T10:00:01")), ScheduleStatus::Finished);
    }
}
