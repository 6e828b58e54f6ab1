// src/handlers/recap.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::{
    config::{DEFAULT_PER_PAGE, MAX_PER_PAGE},
    error::AppError,
    handlers::monitor::{fetch_names, fetch_submissions, resolve_instance},
    models::{
        schedule::{ExamSchedule, ScheduleResponse},
        submission::Submission,
    },
    state::AppState,
};

/// Query parameters for the recap table.
#[derive(Debug, Deserialize)]
pub struct RecapParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// One graded attempt in the recap.
#[derive(Debug, Clone, PartialEq)]
pub struct RecapEntry {
    pub participant_id: i64,
    pub total_questions: i64,
    pub correct: i64,
    pub incorrect: i64,
    pub score: i64,
}

/// A recap table row as served to the client.
#[derive(Debug, Serialize)]
pub struct RecapRow {
    pub no: i64,
    pub participant_id: i64,
    pub name: String,
    pub total_questions: i64,
    pub correct: i64,
    pub incorrect: i64,
    pub score: i64,
}

/// Arithmetic means over the completed set, each rounded to the nearest
/// integer.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RecapAverages {
    pub correct: i64,
    pub incorrect: i64,
    pub score: i64,
}

/// Attendance counters over every submission row of the instance.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct RecapStats {
    pub registered: i64,
    pub finished: i64,
    pub absent: i64,
}

#[derive(Debug, Serialize)]
pub struct RecapResponse {
    pub schedule: ScheduleResponse,
    pub stats: RecapStats,
    pub averages: RecapAverages,
    pub rows: Vec<RecapRow>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// A submission joins the recap once it has been graded, even at zero.
fn is_completed(submission: &Submission) -> bool {
    matches!(submission.score, Some(score) if score >= 0.0)
}

/// Derives the displayed figures for one graded attempt. The incorrect
/// count is recomputed as total minus correct rather than read from the
/// stored counter.
fn recap_entry(submission: &Submission) -> RecapEntry {
    let correct = submission.correct_count;
    RecapEntry {
        participant_id: submission.participant_id,
        total_questions: submission.total_questions,
        correct,
        incorrect: submission.total_questions - correct,
        score: submission.score.unwrap_or(0.0).round() as i64,
    }
}

fn recap_entries(submissions: &[Submission]) -> Vec<RecapEntry> {
    submissions.iter().filter(|s| is_completed(s)).map(recap_entry).collect()
}

fn recap_averages(entries: &[RecapEntry]) -> RecapAverages {
    if entries.is_empty() {
        return RecapAverages::default();
    }

    let n = entries.len() as f64;
    let (correct, incorrect, score) = entries.iter().fold((0i64, 0i64, 0i64), |acc, e| {
        (acc.0 + e.correct, acc.1 + e.incorrect, acc.2 + e.score)
    });

    RecapAverages {
        correct: (correct as f64 / n).round() as i64,
        incorrect: (incorrect as f64 / n).round() as i64,
        score: (score as f64 / n).round() as i64,
    }
}

/// Attendance derived from submission rows alone: whoever registered a
/// row but never flipped the finished flag counts as absent.
fn recap_stats(submissions: &[Submission]) -> RecapStats {
    let registered = submissions.len() as i64;
    let finished = submissions.iter().filter(|s| s.finished).count() as i64;
    RecapStats {
        registered,
        finished,
        absent: (registered - finished).max(0),
    }
}

async fn fetch_schedule(state: &AppState, id: i64) -> Result<ExamSchedule, AppError> {
    sqlx::query_as::<_, ExamSchedule>(
        r#"
        SELECT id, event_id, category_id, exam_date, start_time, end_time, quota, created_at
        FROM exam_schedules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.data_pool)
    .await?
    .ok_or(AppError::NotFound("Schedule not found".to_string()))
}

/// Score recapitulation for a schedule.
///
/// Statistics and averages always cover the full completed set; only the
/// table rows are paginated. A schedule without an exam instance yields a
/// zeroed recap rather than an error.
pub async fn recap_schedule(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
    Query(params): Query<RecapParams>,
) -> Result<impl IntoResponse, AppError> {
    let pool = &state.data_pool;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);

    let schedule = fetch_schedule(&state, schedule_id).await?;
    let status = schedule.status_at(Utc::now().naive_utc());
    let schedule = ScheduleResponse { schedule, status };

    let Some(exam) = resolve_instance(pool, schedule_id, None).await? else {
        return Ok(Json(RecapResponse {
            schedule,
            stats: RecapStats::default(),
            averages: RecapAverages::default(),
            rows: Vec::new(),
            page,
            per_page,
            total: 0,
        }));
    };

    let submissions = fetch_submissions(pool, exam.id).await?;
    let entries = recap_entries(&submissions);
    let stats = recap_stats(&submissions);
    let averages = recap_averages(&entries);
    let total = entries.len() as i64;

    let start = ((page - 1) * per_page) as usize;
    let page_entries: Vec<(usize, &RecapEntry)> = entries
        .iter()
        .enumerate()
        .skip(start)
        .take(per_page as usize)
        .collect();

    let page_ids: Vec<i64> = page_entries.iter().map(|(_, e)| e.participant_id).collect();
    let names = fetch_names(pool, &page_ids).await?;

    let rows: Vec<RecapRow> = page_entries
        .into_iter()
        .map(|(index, entry)| RecapRow {
            no: index as i64 + 1,
            participant_id: entry.participant_id,
            name: names
                .get(&entry.participant_id)
                .map(|(name, _)| name.clone())
                .unwrap_or_else(|| format!("#{}", entry.participant_id)),
            total_questions: entry.total_questions,
            correct: entry.correct,
            incorrect: entry.incorrect,
            score: entry.score,
        })
        .collect();

    Ok(Json(RecapResponse {
        schedule,
        stats,
        averages,
        rows,
        page,
        per_page,
        total,
    }))
}

/// Downloads the recap as a spreadsheet, one row per graded attempt.
pub async fn export_recap(
    State(state): State<AppState>,
    Path(schedule_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let pool = &state.data_pool;

    fetch_schedule(&state, schedule_id).await?;

    let entries = match resolve_instance(pool, schedule_id, None).await? {
        Some(exam) => recap_entries(&fetch_submissions(pool, exam.id).await?),
        None => Vec::new(),
    };

    let ids: Vec<i64> = entries.iter().map(|e| e.participant_id).collect();
    let names = fetch_names(pool, &ids).await?;

    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| AppError::InternalServerError("Workbook has no sheet".to_string()))?;
    sheet.set_name("Rekap Nilai");

    let headers = ["No", "Nama", "Jumlah Soal", "Soal Benar", "Soal Salah", "Nilai"];
    for (col, title) in headers.iter().enumerate() {
        let cell = sheet.get_cell_mut(((col as u32) + 1, 1));
        cell.set_value(*title);
        cell.get_style_mut().get_font_mut().set_bold(true);
    }

    for (index, entry) in entries.iter().enumerate() {
        let row = (index as u32) + 2;
        let name = names
            .get(&entry.participant_id)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| format!("#{}", entry.participant_id));

        sheet.get_cell_mut((1, row)).set_value_number((index + 1) as f64);
        sheet.get_cell_mut((2, row)).set_value(name);
        sheet.get_cell_mut((3, row)).set_value_number(entry.total_questions as f64);
        sheet.get_cell_mut((4, row)).set_value_number(entry.correct as f64);
        sheet.get_cell_mut((5, row)).set_value_number(entry.incorrect as f64);
        sheet.get_cell_mut((6, row)).set_value_number(entry.score as f64);
    }

    let mut buf = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buf).map_err(|e| {
        tracing::error!("Failed to build recap export: {:?}", e);
        AppError::InternalServerError("Failed to build recap export".to_string())
    })?;

    let response_headers = [
        (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"rekap-nilai-{}.xlsx\"", schedule_id),
        ),
    ];

    Ok((response_headers, buf.into_inner()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(
        participant_id: i64,
        score: Option<f64>,
        finished: bool,
        total: i64,
        correct: i64,
    ) -> Submission {
        Submission {
            id: participant_id,
            exam_id: 1,
            participant_id,
            started_at: None,
            finished_at: None,
            total_questions: total,
            correct_count: correct,
            incorrect_count: 0,
            score,
            finished,
        }
    }

    #[test]
    fn no_completed_submissions_average_to_zero() {
        let submissions = vec![
            submission(1, None, false, 40, 0),
            submission(2, None, false, 40, 0),
        ];
        let entries = recap_entries(&submissions);
        assert!(entries.is_empty());
        assert_eq!(recap_averages(&entries), RecapAverages::default());
    }

    #[test]
    fn zero_score_still_counts_as_completed() {
        let submissions = vec![submission(1, Some(0.0), true, 40, 0)];
        let entries = recap_entries(&submissions);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].incorrect, 40);
    }

    #[test]
    fn averages_round_to_nearest_integer() {
        let submissions = vec![
            submission(1, Some(80.0), true, 40, 33),
            submission(2, Some(75.0), true, 40, 30),
        ];
        let entries = recap_entries(&submissions);
        let averages = recap_averages(&entries);
        // correct: (33 + 30) / 2 = 31.5 -> 32
        assert_eq!(averages.correct, 32);
        // incorrect: (7 + 10) / 2 = 8.5 -> 9
        assert_eq!(averages.incorrect, 9);
        // score: (80 + 75) / 2 = 77.5 -> 78
        assert_eq!(averages.score, 78);
    }

    #[test]
    fn fractional_scores_round_per_row() {
        let submissions = vec![submission(1, Some(66.6), true, 40, 27)];
        let entries = recap_entries(&submissions);
        assert_eq!(entries[0].score, 67);
    }

    #[test]
    fn attendance_comes_from_submission_rows() {
        // 15 registered rows: 10 finished, 5 graded zero but never
        // flagged finished. Absent is 5 regardless of roster size.
        let mut submissions: Vec<Submission> =
            (1..=10).map(|id| submission(id, Some(80.0), true, 40, 32)).collect();
        submissions.extend((11..=15).map(|id| submission(id, Some(0.0), false, 40, 0)));

        assert_eq!(
            recap_stats(&submissions),
            RecapStats {
                registered: 15,
                finished: 10,
                absent: 5,
            }
        );
    }

    #[test]
    fn absent_never_goes_negative() {
        let submissions = vec![submission(1, Some(10.0), true, 40, 4)];
        let stats = recap_stats(&submissions);
        assert_eq!(stats.absent, 0);
    }
}
