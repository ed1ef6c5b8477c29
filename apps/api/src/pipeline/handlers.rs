use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{MAX_LETTER_COUNT, MAX_SKILL_LEVEL, MIN_LETTER_COUNT};
use crate::models::{IntakeForm, Run};
use crate::state::AppState;

/// Intake checks done at the HTTP boundary. The pipeline itself only normalises.
fn validate_intake(intake: &IntakeForm) -> Result<(), AppError> {
    if intake.narrative.trim().is_empty() && intake.skills.is_empty() {
        return Err(AppError::Validation(
            "Provide a narrative or at least one skill".to_string(),
        ));
    }
    let has_rated_skill = intake.skills.values().any(|level| *level >= 1);
    let has_keyword = intake.extra_keywords.iter().any(|k| !k.trim().is_empty());
    if !has_rated_skill && !has_keyword {
        return Err(AppError::Validation(
            "Rate at least one skill above zero or add a keyword to search for".to_string(),
        ));
    }
    if !(MIN_LETTER_COUNT..=MAX_LETTER_COUNT).contains(&intake.letter_count) {
        return Err(AppError::Validation(format!(
            "letter_count must be between {MIN_LETTER_COUNT} and {MAX_LETTER_COUNT}"
        )));
    }
    if let Some((skill, level)) = intake.skills.iter().find(|(_, l)| **l > MAX_SKILL_LEVEL) {
        return Err(AppError::Validation(format!(
            "Skill '{skill}' has level {level}; the maximum is {MAX_SKILL_LEVEL}"
        )));
    }
    Ok(())
}

/// POST /api/v1/runs
pub async fn handle_submit_run(
    State(state): State<AppState>,
    Json(intake): Json<IntakeForm>,
) -> Result<(StatusCode, Json<Run>), AppError> {
    validate_intake(&intake)?;
    let run = state.runs.submit(intake);
    Ok((StatusCode::ACCEPTED, Json(run)))
}

/// GET /api/v1/runs/:id
pub async fn handle_get_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Run>, AppError> {
    Ok(Json(state.runs.status(id)?))
}

/// POST /api/v1/runs/:id/cancel
pub async fn handle_cancel_run(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Run>), AppError> {
    let run = state.runs.cancel(id)?;
    Ok((StatusCode::ACCEPTED, Json(run)))
}

/// GET /api/v1/runs/:id/events
/// Server-Sent Events: the run's backlog, then live events until the run ends.
pub async fn handle_run_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let subscription = state.runs.subscribe(id)?;
    let stream = subscription.into_stream().map(|event| {
        Event::default()
            .event(event.kind.name())
            .id(event.seq.to_string())
            .json_data(&event)
    });
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// GET /api/v1/runs/:id/document
/// Downloads the rendered letters. The run is forgotten afterwards.
pub async fn handle_download_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let document = state.runs.take_document(id)?;
    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, document.content_type.clone()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}
