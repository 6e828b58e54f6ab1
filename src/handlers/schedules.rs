// src/handlers/schedules.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::schedule::{CreateScheduleRequest, ExamSchedule, ScheduleResponse},
    state::AppState,
};

fn with_status(schedule: ExamSchedule) -> ScheduleResponse {
    let status = schedule.status_at(Utc::now().naive_utc());
    ScheduleResponse { schedule, status }
}

/// Lists all schedules with their derived status labels, newest first.
pub async fn list_schedules(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let schedules = sqlx::query_as::<_, ExamSchedule>(
        r#"
        SELECT id, event_id, category_id, exam_date, start_time, end_time, quota, created_at
        FROM exam_schedules
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list schedules: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let schedules: Vec<ScheduleResponse> = schedules.into_iter().map(with_status).collect();

    Ok(Json(schedules))
}

/// Retrieves a single schedule by ID, with its derived status.
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let schedule = sqlx::query_as::<_, ExamSchedule>(
        r#"
        SELECT id, event_id, category_id, exam_date, start_time, end_time, quota, created_at
        FROM exam_schedules
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.data_pool)
    .await?
    .ok_or(AppError::NotFound("Schedule not found".to_string()))?;

    Ok(Json(with_status(schedule)))
}

/// Creates a new schedule.
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(payload): Json<CreateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    if let (Some(start), Some(end)) = (payload.start_time, payload.end_time) {
        if end < start {
            return Err(AppError::BadRequest(
                "end_time must not be earlier than start_time".to_string(),
            ));
        }
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO exam_schedules (event_id, category_id, exam_date, start_time, end_time, quota)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(payload.event_id)
    .bind(payload.category_id)
    .bind(payload.exam_date)
    .bind(payload.start_time)
    .bind(payload.end_time)
    .bind(payload.quota)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create schedule: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating a schedule. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateScheduleRequest {
    pub event_id: Option<i64>,
    pub category_id: Option<i64>,
    pub exam_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub quota: Option<i64>,
}

/// Updates a schedule by ID.
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.event_id.is_none()
        && payload.category_id.is_none()
        && payload.exam_date.is_none()
        && payload.start_time.is_none()
        && payload.end_time.is_none()
        && payload.quota.is_none()
    {
        return Ok(StatusCode::OK);
    }

    if let Some(quota) = payload.quota {
        if quota < 0 {
            return Err(AppError::BadRequest("quota must not be negative".to_string()));
        }
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exam_schedules SET ");
    let mut separated = builder.separated(", ");

    if let Some(event_id) = payload.event_id {
        separated.push("event_id = ");
        separated.push_bind_unseparated(event_id);
    }

    if let Some(category_id) = payload.category_id {
        separated.push("category_id = ");
        separated.push_bind_unseparated(category_id);
    }

    if let Some(exam_date) = payload.exam_date {
        separated.push("exam_date = ");
        separated.push_bind_unseparated(exam_date);
    }

    if let Some(start_time) = payload.start_time {
        separated.push("start_time = ");
        separated.push_bind_unseparated(start_time);
    }

    if let Some(end_time) = payload.end_time {
        separated.push("end_time = ");
        separated.push_bind_unseparated(end_time);
    }

    if let Some(quota) = payload.quota {
        separated.push("quota = ");
        separated.push_bind_unseparated(quota);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.data_pool).await.map_err(|e| {
        tracing::error!("Failed to update schedule: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Schedule not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a schedule by ID. Exam instances hanging off it (and their
/// rosters, packages and submissions) go with it.
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_schedules WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete schedule: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Schedule not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
