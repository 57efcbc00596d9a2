pub mod health;

use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::errors::AppError;
use crate::posting::handlers as posting;
use crate::research::handlers as research;
use crate::state::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/research", post(research::handle_research))
        .route("/api/v1/posts/draft", post(posting::handle_draft))
        .route("/api/v1/posts/revise", post(posting::handle_revise))
        .route("/api/v1/posts/publish", post(posting::handle_publish))
        .fallback(not_found)
        .with_state(state)
}
