use std::sync::Arc;
use std::time::Duration;

use crate::delivery::DeliveryMode;
use crate::service::ChatPipeline;

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ChatPipeline>,
    pub delivery_mode: DeliveryMode,
    pub heartbeat_interval: Duration,
}

impl AppState {
    pub fn new(
        pipeline: Arc<ChatPipeline>,
        delivery_mode: DeliveryMode,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            pipeline,
            delivery_mode,
            heartbeat_interval,
        }
    }
}
