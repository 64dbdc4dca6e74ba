use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use matching_cell::router::matching_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Dental booking API is running!" }))
        .nest("/search", matching_routes(state.clone()))
}
