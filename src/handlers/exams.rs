// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::exam::{CreateExamRequest, ExamInstance, QuestionPackage, SetPackageRequest},
    state::AppState,
    utils::roster::{join_roster, parse_roster},
};

/// Query parameters for listing exam instances.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub schedule_id: Option<i64>,
}

/// Lists exam instances, optionally restricted to one schedule.
pub async fn list_exams(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let exams = sqlx::query_as::<_, ExamInstance>(
        r#"
        SELECT id, schedule_id, name, subject_code, created_at
        FROM exam_instances
        WHERE ($1::BIGINT IS NULL OR schedule_id = $1)
        ORDER BY id DESC
        "#,
    )
    .bind(params.schedule_id)
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exam instances: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(exams))
}

/// Retrieves an exam instance with its roster.
pub async fn get_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = fetch_exam(&state, id).await?;
    let roster = fetch_roster_ids(&state, id).await?;

    Ok(Json(serde_json::json!({
        "exam": exam,
        "participants": roster
    })))
}

/// Creates an exam instance under a schedule.
///
/// An initial roster may be supplied in the legacy comma-separated format;
/// it goes through the roster resolver before landing in the join table.
pub async fn create_exam(
    State(state): State<AppState>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    sqlx::query_scalar::<_, i64>("SELECT id FROM exam_schedules WHERE id = $1")
        .bind(payload.schedule_id)
        .fetch_optional(&state.data_pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or(AppError::BadRequest("schedule_id does not reference a schedule".to_string()))?;

    let roster = payload.participants.as_deref().map(parse_roster).unwrap_or_default();

    let mut tx = state.data_pool.begin().await?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO exam_instances (schedule_id, name, subject_code)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(payload.schedule_id)
    .bind(&payload.name)
    .bind(&payload.subject_code)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exam instance: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if !roster.is_empty() {
        insert_members(&mut tx, id, &roster).await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating an exam instance. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateExamRequest {
    pub name: Option<String>,
    pub subject_code: Option<String>,
}

/// Updates an exam instance by ID.
pub async fn update_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.is_none() && payload.subject_code.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exam_instances SET ");
    let mut separated = builder.separated(", ");

    if let Some(name) = payload.name {
        separated.push("name = ");
        separated.push_bind_unseparated(name);
    }

    if let Some(subject_code) = payload.subject_code {
        separated.push("subject_code = ");
        separated.push_bind_unseparated(subject_code);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&state.data_pool).await.map_err(|e| {
        tracing::error!("Failed to update exam instance: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam instance not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an exam instance. Roster rows, the question package and
/// submissions cascade with it.
pub async fn delete_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM exam_instances WHERE id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete exam instance: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exam instance not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// One roster member joined with the participant register. Name and number
/// are null when the register has no matching row.
#[derive(Debug, Serialize, FromRow)]
pub struct RosterEntry {
    pub participant_id: i64,
    pub name: Option<String>,
    pub number: Option<String>,
}

/// Lists an instance's roster, ascending by participant ID. The response
/// also carries the legacy comma-separated rendering for export tooling.
pub async fn list_roster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_exam(&state, id).await?;

    let entries = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT ep.participant_id, p.name, p.number
        FROM exam_participants ep
        LEFT JOIN participants p ON p.id = ep.participant_id
        WHERE ep.exam_id = $1
        ORDER BY ep.participant_id
        "#,
    )
    .bind(id)
    .fetch_all(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list roster: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let ids: Vec<i64> = entries.iter().map(|e| e.participant_id).collect();

    Ok(Json(serde_json::json!({
        "exam_id": id,
        "participants": entries,
        "raw": join_roster(&ids)
    })))
}

/// Payload for adding roster members: explicit IDs and/or the legacy
/// comma-separated string.
#[derive(Debug, Deserialize)]
pub struct AddRosterRequest {
    pub ids: Option<Vec<i64>>,
    pub raw: Option<String>,
}

/// Adds members to an instance's roster. Already-present members are
/// skipped, so the call is safe to repeat.
pub async fn add_roster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<AddRosterRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_exam(&state, id).await?;

    let mut ids = payload.ids.unwrap_or_default();
    if let Some(raw) = &payload.raw {
        ids.extend(parse_roster(raw));
    }
    ids.retain(|pid| *pid > 0);
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Err(AppError::BadRequest("No participant IDs supplied".to_string()));
    }

    let mut tx = state.data_pool.begin().await?;
    let added = insert_members(&mut tx, id, &ids).await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({"added": added})))
}

/// Removes one member from an instance's roster.
pub async fn remove_roster_member(
    State(state): State<AppState>,
    Path((id, participant_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query(
        "DELETE FROM exam_participants WHERE exam_id = $1 AND participant_id = $2",
    )
    .bind(id)
    .bind(participant_id)
    .execute(&state.data_pool)
    .await
    .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Roster member not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Payload for removing several roster members at once.
#[derive(Debug, Deserialize)]
pub struct BulkRemoveRequest {
    pub ids: Vec<i64>,
}

/// Removes a batch of members from an instance's roster.
pub async fn bulk_remove_roster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<BulkRemoveRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.ids.is_empty() {
        return Err(AppError::BadRequest("No participant IDs supplied".to_string()));
    }

    let result = sqlx::query(
        "DELETE FROM exam_participants WHERE exam_id = $1 AND participant_id = ANY($2)",
    )
    .bind(id)
    .bind(&payload.ids)
    .execute(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to bulk-remove roster members: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({"removed": result.rows_affected()})))
}

/// Clears an instance's roster entirely.
pub async fn clear_roster(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    fetch_exam(&state, id).await?;

    let result = sqlx::query("DELETE FROM exam_participants WHERE exam_id = $1")
        .bind(id)
        .execute(&state.data_pool)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Json(serde_json::json!({"removed": result.rows_affected()})))
}

/// Retrieves an instance's question package.
pub async fn get_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let package = sqlx::query_as::<_, QuestionPackage>(
        r#"
        SELECT id, exam_id, question_ids, total_questions, created_at
        FROM question_packages
        WHERE exam_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.data_pool)
    .await?
    .ok_or(AppError::NotFound("Question package not found".to_string()))?;

    Ok(Json(package))
}

/// Replaces an instance's question package.
///
/// The declared total must equal the number of parsed question IDs; the
/// stored list is normalized to the canonical ascending form.
pub async fn set_package(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SetPackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_exam(&state, id).await?;

    // Question IDs share the legacy comma-separated format, so the roster
    // resolver applies as-is.
    let question_ids = parse_roster(&payload.question_ids);

    if question_ids.is_empty() {
        return Err(AppError::BadRequest("question_ids contains no valid IDs".to_string()));
    }

    if payload.total_questions != question_ids.len() as i64 {
        return Err(AppError::BadRequest(format!(
            "total_questions ({}) does not match the number of question IDs ({})",
            payload.total_questions,
            question_ids.len()
        )));
    }

    let package = sqlx::query_as::<_, QuestionPackage>(
        r#"
        INSERT INTO question_packages (exam_id, question_ids, total_questions)
        VALUES ($1, $2, $3)
        ON CONFLICT (exam_id) DO UPDATE SET
            question_ids = EXCLUDED.question_ids,
            total_questions = EXCLUDED.total_questions
        RETURNING id, exam_id, question_ids, total_questions, created_at
        "#,
    )
    .bind(id)
    .bind(join_roster(&question_ids))
    .bind(question_ids.len() as i64)
    .fetch_one(&state.data_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to set question package: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(package))
}

async fn fetch_exam(state: &AppState, id: i64) -> Result<ExamInstance, AppError> {
    sqlx::query_as::<_, ExamInstance>(
        r#"
        SELECT id, schedule_id, name, subject_code, created_at
        FROM exam_instances
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.data_pool)
    .await?
    .ok_or(AppError::NotFound("Exam instance not found".to_string()))
}

async fn fetch_roster_ids(state: &AppState, exam_id: i64) -> Result<Vec<i64>, AppError> {
    Ok(sqlx::query_scalar::<_, i64>(
        "SELECT participant_id FROM exam_participants WHERE exam_id = $1 ORDER BY participant_id",
    )
    .bind(exam_id)
    .fetch_all(&state.data_pool)
    .await?)
}

async fn insert_members(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    exam_id: i64,
    ids: &[i64],
) -> Result<u64, AppError> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO exam_participants (exam_id, participant_id) ");

    builder.push_values(ids, |mut b, pid| {
        b.push_bind(exam_id).push_bind(*pid);
    });
    builder.push(" ON CONFLICT DO NOTHING");

    let result = builder.build().execute(&mut **tx).await.map_err(|e| {
        tracing::error!("Failed to add roster members: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(result.rows_affected())
}
