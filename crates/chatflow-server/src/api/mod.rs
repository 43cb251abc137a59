pub mod chat;
pub mod state;

pub use state::AppState;

use axum::{
    Router,
    routing::{get, post},
};

/// Build the API router over the shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(chat::health))
        .route("/api/chat/stream", post(chat::stream_chat))
        .route("/api/chat", post(chat::chat))
        .with_state(state)
}
