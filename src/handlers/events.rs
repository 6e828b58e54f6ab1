// src/handlers/events.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::event::{CreateEventRequest, Event},
    state::AppState,
};

/// Lists all exam events, newest first.
pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let events = sqlx::query_as::<_, Event>(
        r#"
        SELECT id, name, starts_on, ends_on, created_at
        FROM events
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list events: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(events))
}

/// Creates a new exam event.
pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO events (name, starts_on, ends_on)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(payload.starts_on)
    .bind(payload.ends_on)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create event: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating an event. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

/// Updates an event by ID.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none() && payload.starts_on.is_none() && payload.ends_on.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE events SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(starts_on) = payload.starts_on {
        separated.push("starts_on = ");
        separated.push_bind_unseparated(starts_on);
    }

    if let Some(ends_on) = payload.ends_on {
        separated.push("ends_on = ");
        separated.push_bind_unseparated(ends_on);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.data_pool).await.map_err(|e| {
        tracing::error!("Failed to update event: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an event by ID. Schedules referencing it keep their rows with a
/// cleared event reference.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete event: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Event not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
