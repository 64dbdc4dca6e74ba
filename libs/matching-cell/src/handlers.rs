// libs/matching-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{AcceptResponse, MatchingError, SearchResponse, SessionView, StartSearchRequest};
use crate::services::search::OpenSearchService;

/// Shared handler state: one search service (and therefore one session
/// registry) for the lifetime of the process.
pub struct MatchingState {
    pub search_service: OpenSearchService,
}

fn map_error(err: MatchingError) -> AppError {
    match err {
        MatchingError::InvalidInput(msg) => AppError::ValidationError(msg),
        MatchingError::InvalidStateTransition(_) => AppError::Conflict(err.to_string()),
        MatchingError::SessionNotFound => {
            AppError::NotFound("Search session not found".to_string())
        }
        MatchingError::SlotStoreError(msg) | MatchingError::CommitError(msg) => {
            AppError::ExternalService(msg)
        }
    }
}

#[axum::debug_handler]
pub async fn start_search(
    State(state): State<Arc<MatchingState>>,
    Json(request): Json<StartSearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = state
        .search_service
        .start_search(request)
        .await
        .map_err(map_error)?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn get_session(
    State(state): State<Arc<MatchingState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .search_service
        .get_session(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn next_proposal(
    State(state): State<Arc<MatchingState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = state
        .search_service
        .next_proposal(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn accept(
    State(state): State<Arc<MatchingState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<AcceptResponse>, AppError> {
    let response = state
        .search_service
        .accept(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn reject(
    State(state): State<Arc<MatchingState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SearchResponse>, AppError> {
    let response = state
        .search_service
        .reject(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn cancel(
    State(state): State<Arc<MatchingState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .search_service
        .cancel(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(view))
}

#[axum::debug_handler]
pub async fn expire(
    State(state): State<Arc<MatchingState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let view = state
        .search_service
        .expire(session_id)
        .await
        .map_err(map_error)?;

    Ok(Json(view))
}
