// src/handlers/participants.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::{DEFAULT_PER_PAGE, MAX_PER_PAGE},
    error::AppError,
    models::participant::{CreateParticipantRequest, Participant},
    state::AppState,
};

/// Query parameters for listing participants.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Lists participants, optionally filtered by a name/number search.
pub async fn list_participants(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM participants
        WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR number ILIKE $1)
        "#,
    )
    .bind(&search_pattern)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let participants = sqlx::query_as::<_, Participant>(
        r#"
        SELECT id, name, number, created_at
        FROM participants
        WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR number ILIKE $1)
        ORDER BY name
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(&search_pattern)
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list participants: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "items": participants,
        "page": page,
        "per_page": per_page,
        "total": total
    })))
}

/// Registers a new participant.
pub async fn create_participant(
    State(state): State<AppState>,
    Json(payload): Json<CreateParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO participants (name, number)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.number)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict(format!("Number '{}' is already registered", payload.number))
        } else {
            tracing::error!("Failed to create participant: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating a participant. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateParticipantRequest {
    pub name: Option<String>,
    pub number: Option<String>,
}

/// Updates a participant by ID.
pub async fn update_participant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none() && payload.number.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE participants SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(number) = payload.number {
        separated.push("number = ");
        separated.push_bind_unseparated(number);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.data_pool).await.map_err(|e| {
        if e.to_string().contains("unique constraint") || e.to_string().contains("23505") {
            AppError::Conflict("Number is already registered".to_string())
        } else {
            tracing::error!("Failed to update participant: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Participant not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a participant by ID.
pub async fn delete_participant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM participants WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete participant: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Participant not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
