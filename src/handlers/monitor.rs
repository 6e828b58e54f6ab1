// src/handlers/monitor.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::{
    config::{DEFAULT_PER_PAGE, MAX_PER_PAGE},
    error::AppError,
    models::{
        exam::ExamInstance,
        submission::{ParticipantStatus, Submission},
    },
    state::AppState,
};

/// Query parameters for the monitoring view.
#[derive(Debug, Deserialize)]
pub struct MonitorParams {
    /// Subject/field code used to pick the instance under the schedule.
    pub code: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// One roster member's progress.
#[derive(Debug, Serialize)]
pub struct MonitorRow {
    pub participant_id: i64,
    pub name: String,
    pub number: Option<String>,
    /// Questions answered so far.
    pub answered: i64,
    /// Declared package size; 0 when the instance has no package.
    pub total_questions: i64,
    pub status: ParticipantStatus,
}

/// Aggregate progress over the full roster, independent of pagination.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct MonitorStats {
    pub total_participants: i64,
    pub finished: i64,
    pub active: i64,
    pub not_started: i64,
}

#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub rows: Vec<MonitorRow>,
    pub stats: MonitorStats,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// Classifies every roster member against the submissions present and
/// tallies the four aggregate counters. Submissions from participants no
/// longer on the roster are ignored.
fn monitor_stats(roster: &[i64], submissions: &[Submission]) -> MonitorStats {
    let by_participant: HashMap<i64, &Submission> =
        submissions.iter().map(|s| (s.participant_id, s)).collect();

    let mut stats = MonitorStats {
        total_participants: roster.len() as i64,
        ..Default::default()
    };

    for id in roster {
        match ParticipantStatus::classify(by_participant.get(id).copied()) {
            ParticipantStatus::Finished => stats.finished += 1,
            ParticipantStatus::Active => stats.active += 1,
            ParticipantStatus::NotStarted => stats.not_started += 1,
        }
    }

    stats
}

/// Finds the exam instance to monitor for a schedule: first by schedule
/// and subject code, then by schedule alone.
pub(crate) async fn resolve_instance(
    pool: &PgPool,
    schedule_id: i64,
    subject_code: Option<&str>,
) -> Result<Option<ExamInstance>, AppError> {
    if let Some(code) = subject_code {
        let found = sqlx::query_as::<_, ExamInstance>(
            r#"
            SELECT id, schedule_id, name, subject_code, created_at
            FROM exam_instances
            WHERE schedule_id = $1 AND subject_code = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(schedule_id)
        .bind(code)
        .fetch_optional(pool)
        .await?;

        if found.is_some() {
            return Ok(found);
        }
    }

    Ok(sqlx::query_as::<_, ExamInstance>(
        r#"
        SELECT id, schedule_id, name, subject_code, created_at
        FROM exam_instances
        WHERE schedule_id = $1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(schedule_id)
    .fetch_optional(pool)
    .await?)
}

pub(crate) async fn fetch_submissions(
    pool: &PgPool,
    exam_id: i64,
) -> Result<Vec<Submission>, AppError> {
    Ok(sqlx::query_as::<_, Submission>(
        r#"
        SELECT id, exam_id, participant_id, started_at, finished_at,
               total_questions, correct_count, incorrect_count, score, finished
        FROM submissions
        WHERE exam_id = $1
        ORDER BY id
        "#,
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await?)
}

pub(crate) async fn fetch_package_total(
    pool: &PgPool,
    exam_id: i64,
) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT total_questions FROM question_packages WHERE exam_id = $1",
    )
    .bind(exam_id)
    .fetch_optional(pool)
    .await?
    .unwrap_or(0))
}

/// Participant names for a set of IDs, keyed by ID.
pub(crate) async fn fetch_names(
    pool: &PgPool,
    ids: &[i64],
) -> Result<HashMap<i64, (String, String)>, AppError> {
    #[derive(FromRow)]
    struct NameRow {
        id: i64,
        name: String,
        number: String,
    }

    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, NameRow>(
        "SELECT id, name, number FROM participants WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| (r.id, (r.name, r.number))).collect())
}

/// Live monitoring view for a schedule.
///
/// Resolves the exam instance (falling back across the subject code), then
/// reports per-participant progress for the requested page and aggregate
/// counters over the whole roster. A schedule without any instance yields
/// an empty page with zeroed counters rather than an error, so the
/// monitoring screen stays up while data is still being provisioned.
pub async fn monitor_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    Query(params): Query<MonitorParams>,
) -> Result<impl IntoResponse, AppError> {
    let pool = &state.data_pool;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let Some(exam) = resolve_instance(pool, schedule_id, params.code.as_deref()).await? else {
        return Ok(Json(MonitorResponse {
            rows: Vec::new(),
            stats: MonitorStats::default(),
            page,
            per_page,
            total: 0,
        }));
    };

    let roster = sqlx::query_scalar::<_, i64>(
        "SELECT participant_id FROM exam_participants WHERE exam_id = $1 ORDER BY participant_id",
    )
    .bind(exam.id)
    .fetch_all(pool)
    .await?;

    let submissions = fetch_submissions(pool, exam.id).await?;
    let total_questions = fetch_package_total(pool, exam.id).await?;

    #[derive(FromRow)]
    struct AnsweredRow {
        participant_id: i64,
        answered: i64,
    }

    let answered: HashMap<i64, i64> = sqlx::query_as::<_, AnsweredRow>(
        r#"
        SELECT s.participant_id, COUNT(a.id) AS answered
        FROM submissions s
        LEFT JOIN submission_answers a ON a.submission_id = s.id
        WHERE s.exam_id = $1
        GROUP BY s.participant_id
        "#,
    )
    .bind(exam.id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to count answers: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .into_iter()
    .map(|r| (r.participant_id, r.answered))
    .collect();

    let start = ((page - 1) * per_page) as usize;
    let page_ids: Vec<i64> = roster.iter().skip(start).take(per_page as usize).copied().collect();
    let names = fetch_names(pool, &page_ids).await?;

    let by_participant: HashMap<i64, &Submission> =
        submissions.iter().map(|s| (s.participant_id, s)).collect();

    let rows: Vec<MonitorRow> = page_ids
        .iter()
        .map(|id| {
            let submission = by_participant.get(id).copied();
            let (name, number) = match names.get(id) {
                Some((name, number)) => (name.clone(), Some(number.clone())),
                None => (format!("#{}", id), None),
            };
            MonitorRow {
                participant_id: *id,
                name,
                number,
                answered: *answered.get(id).unwrap_or(&0),
                total_questions,
                status: ParticipantStatus::classify(submission),
            }
        })
        .collect();

    let stats = monitor_stats(&roster, &submissions);

    Ok(Json(MonitorResponse {
        rows,
        stats,
        page,
        per_page,
        total: roster.len() as i64,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(participant_id: i64, score: Option<f64>) -> Submission {
        Submission {
            id: participant_id,
            exam_id: 1,
            participant_id,
            started_at: None,
            finished_at: None,
            total_questions: 40,
            correct_count: 0,
            incorrect_count: 0,
            score,
            finished: score.map(|v| v > 0.0).unwrap_or(false),
        }
    }

    #[test]
    fn tallies_full_roster() {
        // 25 on the roster: 10 finished, 5 graded zero, 10 never started.
        let roster: Vec<i64> = (1..=25).collect();
        let mut submissions: Vec<Submission> =
            (1..=10).map(|id| submission(id, Some(80.0))).collect();
        submissions.extend((11..=15).map(|id| submission(id, Some(0.0))));

        let stats = monitor_stats(&roster, &submissions);
        assert_eq!(
            stats,
            MonitorStats {
                total_participants: 25,
                finished: 10,
                active: 5,
                not_started: 10,
            }
        );
    }

    #[test]
    fn ignores_submissions_outside_roster() {
        let roster = vec![1, 2];
        let submissions = vec![submission(1, Some(90.0)), submission(99, Some(90.0))];

        let stats = monitor_stats(&roster, &submissions);
        assert_eq!(
            stats,
            MonitorStats {
                total_participants: 2,
                finished: 1,
                active: 0,
                not_started: 1,
            }
        );
    }

    #[test]
    fn empty_roster_is_all_zero() {
        assert_eq!(monitor_stats(&[], &[]), MonitorStats::default());
    }
}
