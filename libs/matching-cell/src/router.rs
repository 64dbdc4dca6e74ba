use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers::{self, MatchingState};
use crate::services::search::OpenSearchService;

pub fn matching_routes(config: Arc<AppConfig>) -> Router {
    let state = Arc::new(MatchingState {
        search_service: OpenSearchService::new(&config),
    });

    Router::new()
        .route("/", post(handlers::start_search))
        .route("/{session_id}", get(handlers::get_session))
        .route("/{session_id}/next", post(handlers::next_proposal))
        .route("/{session_id}/accept", post(handlers::accept))
        .route("/{session_id}/reject", post(handlers::reject))
        .route("/{session_id}/cancel", post(handlers::cancel))
        .route("/{session_id}/expire", post(handlers::expire))
        .with_state(state)
}
