//! Chat endpoints: the streaming turn and its complete-response twin.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::stream;

use chatflow_core::{ChatRequest, Frame};

use crate::delivery;
use crate::framer::FramerOptions;

use super::AppState;

#[derive(serde::Serialize)]
pub struct Health {
    status: String,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        status: "chatflow is working!".to_string(),
    })
}

// POST /api/chat/stream
//
// A pipeline failure before any token is produced still answers with a
// well-formed frame sequence; the client's reader must never hang
// waiting for a terminal marker.
pub async fn stream_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let opts = FramerOptions::new(state.heartbeat_interval);
    match state.pipeline.stream_turn(&request, opts).await {
        Ok(frames) => delivery::respond(state.delivery_mode, frames).await,
        Err(e) => {
            tracing::error!(session_id = %request.session_id, error = %e, "Streaming turn failed to start");
            let frames = stream::iter(vec![
                Frame::Prelude,
                Frame::error(e.to_string()),
                Frame::Done,
            ]);
            delivery::respond(state.delivery_mode, frames).await
        }
    }
}

// POST /api/chat
pub async fn chat(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    match state.pipeline.complete_turn(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(session_id = %request.session_id, error = %e, "Complete turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "status": "error",
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::api::router;
    use crate::delivery::DeliveryMode;
    use crate::providers::{MockConfigStore, MockModel, MockReplyStep, MockRetriever, TenantConfig};
    use crate::service::ChatPipeline;
    use crate::settings::Settings;

    fn app(model: MockModel, mode: DeliveryMode) -> axum::Router {
        let pipeline = Arc::new(ChatPipeline::new(
            Arc::new(MockConfigStore::new(TenantConfig::new("default", "Acme"))),
            Arc::new(MockRetriever::empty()),
            Arc::new(model),
            &Settings::default(),
        ));
        router(AppState::new(pipeline, mode, Duration::from_secs(15)))
    }

    fn chat_body() -> Body {
        Body::from(r#"{"tenant_hash":"t-1","session_id":"s-1","user_input":"hi"}"#)
    }

    async fn response_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn stream_endpoint_produces_framed_body() -> anyhow::Result<()> {
        let app = app(
            MockModel::from_deltas("mock", &["Hello", " world"]),
            DeliveryMode::Streaming,
        );

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/chat/stream")
                    .header("Content-Type", "application/json")
                    .body(chat_body())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.contains("text/event-stream"));

        let body = response_text(response).await;
        assert!(body.starts_with(":ok\n\n"));
        assert!(body.contains("\"content\":\"Hello\""));
        assert!(body.ends_with("data: [DONE]\n\n"));
        Ok(())
    }

    #[tokio::test]
    async fn stream_endpoint_terminates_on_model_error() -> anyhow::Result<()> {
        let app = app(
            MockModel::new("mock", vec![MockReplyStep::error("backend down")]),
            DeliveryMode::Buffered,
        );

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/chat/stream")
                    .header("Content-Type", "application/json")
                    .body(chat_body())?,
            )
            .await?;

        let body = response_text(response).await;
        assert!(body.contains("\"type\":\"error\""));
        assert!(body.ends_with("data: [DONE]\n\n"));
        Ok(())
    }

    #[tokio::test]
    async fn chat_endpoint_returns_complete_json() -> anyhow::Result<()> {
        let app = app(
            MockModel::from_deltas("mock", &["Fallback answer"]),
            DeliveryMode::Streaming,
        );

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header("Content-Type", "application/json")
                    .body(chat_body())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&response_text(response).await)?;
        assert_eq!(body["content"], "Fallback answer");
        assert_eq!(body["session_id"], "s-1");
        Ok(())
    }

    #[tokio::test]
    async fn chat_endpoint_surfaces_model_failure() -> anyhow::Result<()> {
        let app = app(
            MockModel::new("mock", vec![MockReplyStep::error("backend down")]),
            DeliveryMode::Streaming,
        );

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header("Content-Type", "application/json")
                    .body(chat_body())?,
            )
            .await?;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&response_text(response).await)?;
        assert_eq!(body["status"], "error");
        Ok(())
    }
}
