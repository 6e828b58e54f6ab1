// src/handlers/submissions.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{error::AppError, state::AppState};

/// Clears a participant's progress so the attempt can be retaken: answer
/// rows are removed and counters, score and flags return to their initial
/// state. The submission row itself survives.
pub async fn reset_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = state.data_pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE submissions
        SET started_at = NULL,
            finished_at = NULL,
            correct_count = 0,
            incorrect_count = 0,
            score = NULL,
            finished = FALSE
        WHERE id = $1
        "#,
    )
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to reset submission: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Submission not found".to_string()));
    }

    sqlx::query("DELETE FROM submission_answers WHERE submission_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to clear submission answers: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    tx.commit().await?;

    Ok(StatusCode::OK)
}

/// Deletes a submission entirely, answers included.
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete submission: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Submission not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
