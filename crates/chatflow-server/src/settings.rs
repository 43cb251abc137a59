//! Server settings, read once at startup from the environment.

use std::time::Duration;

use crate::delivery::DeliveryMode;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_HEARTBEAT_MS: u64 = 15_000;
const DEFAULT_CONFIG_TTL_SECS: u64 = 600;
const DEFAULT_KNOWLEDGE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Runtime configuration for the server process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    /// Delivery capability, detected once at startup.
    pub delivery_mode: DeliveryMode,
    pub heartbeat_interval: Duration,
    pub config_cache_ttl: Duration,
    pub knowledge_cache_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            delivery_mode: DeliveryMode::Streaming,
            heartbeat_interval: Duration::from_millis(DEFAULT_HEARTBEAT_MS),
            config_cache_ttl: Duration::from_secs(DEFAULT_CONFIG_TTL_SECS),
            knowledge_cache_ttl: Duration::from_secs(DEFAULT_KNOWLEDGE_TTL_SECS),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Settings {
    /// Build settings from `CHATFLOW_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("CHATFLOW_BIND").unwrap_or(defaults.bind_addr),
            delivery_mode: std::env::var("CHATFLOW_DELIVERY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.delivery_mode),
            heartbeat_interval: env_millis("CHATFLOW_HEARTBEAT_MS")
                .unwrap_or(defaults.heartbeat_interval),
            config_cache_ttl: env_secs("CHATFLOW_CONFIG_TTL_SECS")
                .unwrap_or(defaults.config_cache_ttl),
            knowledge_cache_ttl: env_secs("CHATFLOW_KNOWLEDGE_TTL_SECS")
                .unwrap_or(defaults.knowledge_cache_ttl),
            cache_capacity: std::env::var("CHATFLOW_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
}

fn env_secs(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.delivery_mode, DeliveryMode::Streaming);
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(15));
        assert!(settings.config_cache_ttl > settings.knowledge_cache_ttl);
    }
}
