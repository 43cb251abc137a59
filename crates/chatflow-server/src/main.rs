use std::sync::Arc;

use axum::http::{Method, header};
use tower_http::cors::CorsLayer;

use chatflow_server::{
    AppState, ChatPipeline, MockConfigStore, MockModel, MockReplyStep, MockRetriever, Settings,
    TenantConfig, router,
};

#[tokio::main]
async fn main() {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chatflow_server=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting chatflow server");

    let settings = Settings::from_env();
    tracing::info!(mode = ?settings.delivery_mode, "Delivery capability selected");

    // Scripted collaborators stand in for the real config, retrieval
    // and model services; deployments swap these for provider-backed
    // implementations of the same traits.
    let config_store = Arc::new(
        MockConfigStore::new(
            TenantConfig::new("default", "Chatflow Support")
                .with_tone("friendly and concise")
                .with_handoff_contact("support@example.test"),
        ),
    );
    let retriever = Arc::new(MockRetriever::empty());
    let model = Arc::new(MockModel::new(
        "scripted-demo",
        vec![
            MockReplyStep::text("Hello! "),
            MockReplyStep::delay(200),
            MockReplyStep::text("How can I help you today?"),
        ],
    ));

    let pipeline = Arc::new(ChatPipeline::new(config_store, retriever, model, &settings));
    let state = AppState::new(pipeline, settings.delivery_mode, settings.heartbeat_interval);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let app = router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Failed to bind listen address");

    tracing::info!("Chatflow running on http://{}", settings.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
