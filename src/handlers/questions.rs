// src/handlers/questions.rs

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
    models::question::{CreateQuestionRequest, Question},
    state::AppState,
    utils::html::clean_html,
};

/// Query parameters for listing question-bank entries.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub category_id: Option<i64>,
    pub q: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Lists questions with optional category and content filters.
pub async fn list_questions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let search_pattern = params.q.map(|k| format!("%{}%", k));

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM questions
        WHERE ($1::BIGINT IS NULL OR category_id = $1)
          AND ($2::TEXT IS NULL OR content ILIKE $2)
        "#,
    )
    .bind(params.category_id)
    .bind(&search_pattern)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, category_id, type, content, options, answer, explanation, created_at
        FROM questions
        WHERE ($1::BIGINT IS NULL OR category_id = $1)
          AND ($2::TEXT IS NULL OR content ILIKE $2)
        ORDER BY id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(params.category_id)
    .bind(&search_pattern)
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({
        "items": questions,
        "page": page,
        "per_page": per_page,
        "total": total
    })))
}

/// Retrieves a single question by ID.
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, category_id, type, content, options, answer, explanation, created_at
        FROM questions
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.data_pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))?;

    Ok(Json(question))
}

/// Creates a new question-bank entry.
///
/// Content and explanation arrive as rich-text HTML and are sanitized
/// before storage.
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let content = clean_html(&payload.content);
    let explanation = payload.explanation.as_deref().map(clean_html);
    let options_json = serde_json::to_value(payload.options).unwrap_or_default();

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions (category_id, type, content, options, answer, explanation)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(payload.category_id)
    .bind(&payload.question_type)
    .bind(&content)
    .bind(&options_json)
    .bind(&payload.answer)
    .bind(&explanation)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub category_id: Option<i64>,
    pub question_type: Option<String>,
    pub content: Option<String>,
    pub options: Option<Vec<String>>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

/// Updates a question by ID.
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.category_id.is_none()
        && payload.question_type.is_none()
        && payload.content.is_none()
        && payload.options.is_none()
        && payload.answer.is_none()
        && payload.explanation.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(category_id) = payload.category_id {
        separated.push("category_id = ");
        separated.push_bind_unseparated(category_id);
    }

    if let Some(q_type) = payload.question_type {
        separated.push("type = ");
        separated.push_bind_unseparated(q_type);
    }

    if let Some(content) = payload.content {
        separated.push("content = ");
        separated.push_bind_unseparated(clean_html(&content));
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(serde_json::to_value(options).unwrap_or_default());
    }

    if let Some(answer) = payload.answer {
        separated.push("answer = ");
        separated.push_bind_unseparated(answer);
    }

    if let Some(explanation) = payload.explanation {
        separated.push("explanation = ");
        separated.push_bind_unseparated(clean_html(&explanation));
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.data_pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a question by ID.
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
