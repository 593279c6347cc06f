use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{catalog, Catalog};
use crate::errors::AppError;
use crate::models::report::{CourseRequirements, UniversityCourse, WhatIfScenario};
use crate::orchestrator::reveal::Stage;
use crate::orchestrator::view::SessionView;
use crate::orchestrator::{lookup_requirements, Orchestrator};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub subjects: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevealRequest {
    pub stage: Stage,
}

#[derive(Debug, Deserialize)]
pub struct CoursesQuery {
    #[serde(default)]
    pub university: String,
}

#[derive(Debug, Deserialize)]
pub struct WhatIfRequest {
    pub replace: String,
    pub with: String,
}

#[derive(Debug, Deserialize)]
pub struct PromoteRequest {
    pub scenario: WhatIfScenario,
}

#[derive(Debug, Serialize)]
pub struct SnapshotStatus {
    pub exists: bool,
}

#[derive(Debug, Deserialize)]
pub struct RequirementsRequest {
    pub course: String,
    pub university: String,
}

/// A session that already exists. Read paths never create one.
async fn live_session(state: &AppState, id: Uuid) -> Result<Arc<Orchestrator>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// GET /api/v1/catalog
pub async fn handle_catalog() -> Json<Catalog> {
    Json(catalog())
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = live_session(&state, id).await?;
    Ok(Json(session.view().await))
}

/// POST /api/v1/sessions/:id/analysis
pub async fn handle_start_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get_or_create(id).await;
    session.start_analysis(&req.subjects).await?;
    Ok(Json(session.view().await))
}

/// POST /api/v1/sessions/:id/reveal
pub async fn handle_reveal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RevealRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = live_session(&state, id).await?;
    session.reveal_next(req.stage).await?;
    Ok(Json(session.view().await))
}

/// GET /api/v1/sessions/:id/courses?university=
pub async fn handle_courses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<CoursesQuery>,
) -> Result<Json<Vec<UniversityCourse>>, AppError> {
    let session = live_session(&state, id).await?;
    let courses = session.fetch_courses_for(&params.university).await?;
    Ok(Json(courses))
}

/// POST /api/v1/sessions/:id/what-if
pub async fn handle_what_if(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<WhatIfRequest>,
) -> Result<Json<WhatIfScenario>, AppError> {
    let session = live_session(&state, id).await?;
    let scenario = session.run_what_if(&req.replace, &req.with).await?;
    Ok(Json(scenario))
}

/// POST /api/v1/sessions/:id/what-if/promote
pub async fn handle_promote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PromoteRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get_or_create(id).await;
    session.promote_scenario(&req.scenario).await?;
    Ok(Json(session.view().await))
}

/// GET /api/v1/sessions/:id/snapshot
pub async fn handle_snapshot_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SnapshotStatus>, AppError> {
    let session = state.sessions.get_or_create(id).await;
    let exists = session.has_snapshot().await?;
    Ok(Json(SnapshotStatus { exists }))
}

/// POST /api/v1/sessions/:id/snapshot
pub async fn handle_save_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = live_session(&state, id).await?;
    session.save_snapshot().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/snapshot/load
pub async fn handle_load_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get_or_create(id).await;
    Ok(Json(session.load_snapshot().await?))
}

/// POST /api/v1/requirements
pub async fn handle_requirements(
    State(state): State<AppState>,
    Json(req): Json<RequirementsRequest>,
) -> Result<Json<CourseRequirements>, AppError> {
    let found = lookup_requirements(state.sessions.gateway(), &req.course, &req.university).await?;
    Ok(Json(found))
}
