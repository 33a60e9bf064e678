use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::Config;

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Published events, fanned out to every open stream
    pub events: broadcast::Sender<Map<String, Value>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let (events, _) = broadcast::channel(config.stream.channel_capacity);
        Self {
            config: Arc::new(config),
            events,
        }
    }
}
