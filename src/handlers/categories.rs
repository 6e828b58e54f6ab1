// src/handlers/categories.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::AppError,
    models::category::{Category, CreateCategoryRequest},
    state::AppState,
};

/// Query parameters for listing categories.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub kind: Option<String>,
}

/// Lists categories, optionally filtered by kind ('question' or 'exam').
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, kind, created_at
        FROM categories
        WHERE ($1::TEXT IS NULL OR kind = $1)
        ORDER BY name
        "#,
    )
    .bind(params.kind)
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list categories: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(categories))
}

/// Creates a new category.
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO categories (name, kind)
        VALUES ($1, $2)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.kind)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create category: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for renaming a category.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Renames a category by ID. The kind is fixed at creation.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let result = sqlx::query("UPDATE categories SET name = $1 WHERE id = $2")
        .bind(&payload.name)
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a category by ID. Questions and schedules referencing it keep
/// their rows with a cleared category reference.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete category: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
