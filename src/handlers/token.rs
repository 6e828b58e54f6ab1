// src/handlers/token.rs

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::FromRow;

use crate::{
    config::{TOKEN_ALPHABET, TOKEN_CODE_LENGTH, TOKEN_ROW_ID},
    error::AppError,
    models::token::ExamToken,
    state::AppState,
};

/// Draws a fresh access code, uniform per character over the uppercase
/// letter and digit alphabet.
fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_CODE_LENGTH)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Returns the current shared access code.
pub async fn get_token(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let token = sqlx::query_as::<_, ExamToken>(
        "SELECT id, code, active, updated_at FROM exam_tokens WHERE id = $1",
    )
    .bind(TOKEN_ROW_ID)
    .fetch_optional(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to read exam token: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Exam token is not provisioned".to_string()))?;

    Ok(Json(token))
}

#[derive(Debug, FromRow)]
struct RotatedToken {
    previous_code: String,
    code: String,
    updated_at: DateTime<Utc>,
}

/// Replaces the shared access code and reports both the previous and the
/// new value for display.
///
/// The overwrite and the read of the previous code happen in one
/// statement, so concurrent rotations serialize on the row instead of
/// racing between a read and a write.
pub async fn rotate_token(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let code = generate_code();

    let rotated = sqlx::query_as::<_, RotatedToken>(
        r#"
        UPDATE exam_tokens AS t
        SET code = $2, active = TRUE, updated_at = NOW()
        FROM (SELECT id, code AS previous_code FROM exam_tokens WHERE id = $1 FOR UPDATE) AS prev
        WHERE t.id = prev.id
        RETURNING prev.previous_code, t.code, t.updated_at
        "#,
    )
    .bind(TOKEN_ROW_ID)
    .bind(&code)
    .fetch_optional(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to rotate exam token: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?
    .ok_or(AppError::NotFound("Exam token is not provisioned".to_string()))?;

    Ok(Json(serde_json::json!({
        "previous_code": rotated.previous_code,
        "code": rotated.code,
        "updated_at": rotated.updated_at
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn code_matches_expected_pattern() {
        let pattern = Regex::new("^[A-Z0-9]{6}$").unwrap();
        for _ in 0..100 {
            let code = generate_code();
            assert!(pattern.is_match(&code), "unexpected code: {}", code);
        }
    }

    #[test]
    fn codes_vary_across_draws() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            seen.insert(generate_code());
        }
        // 36^6 possibilities; 50 draws collapsing to one value would mean
        // the generator is broken.
        assert!(seen.len() > 1);
    }
}
