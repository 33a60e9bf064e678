use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Response,
};
use eventline::{SinkError, SseError, StreamWriter};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::{error::ApiResult, response::sse_response, sink::ChannelSink, state::AppState};

const LAST_EVENT_ID: &str = "last-event-id";

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    pub operation_id: Option<String>,
}

/// Open an SSE stream
///
/// Sends a `connected` event right away, then forwards every published event
/// and keeps the connection warm with heartbeats. A client that falls more
/// than `channel_capacity` events behind gets an `error` event in phase
/// `broadcast` saying how many were dropped.
pub async fn open_stream(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StreamParams>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let operation_id = params
        .operation_id
        .unwrap_or_else(|| format!("op_{}", Uuid::new_v4().simple()));
    let last_event_id = headers
        .get(LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let (tx, rx) = mpsc::channel(state.config.stream.channel_capacity);
    let sink = ChannelSink::new(tx);
    let mut writer = StreamWriter::new(sink.clone());

    writer.write_connection(&operation_id, &last_event_id, None)?;

    tracing::info!(
        operation_id = %operation_id,
        last_event_id = %last_event_id,
        "Stream opened"
    );

    let subscription = state.events.subscribe();
    let heartbeat = Duration::from_millis(state.config.stream.heartbeat_interval_ms);
    tokio::spawn(run_stream(writer, sink, subscription, operation_id, heartbeat));

    Ok(sse_response(rx))
}

async fn run_stream(
    mut writer: StreamWriter<ChannelSink>,
    sink: ChannelSink,
    mut events: broadcast::Receiver<Map<String, Value>>,
    operation_id: String,
    heartbeat: Duration,
) {
    let mut ticker = interval_at(Instant::now() + heartbeat, heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // While the client is behind, published events pile up in the
        // broadcast buffer and the next recv reports how many were skipped.
        if sink.ready().await.is_err() {
            break;
        }

        let result = tokio::select! {
            _ = sink.closed() => break,
            _ = ticker.tick() => writer.write_heartbeat(None),
            received = events.recv() => match received {
                Ok(data) => writer.write_stream_event(data, None, None),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        operation_id = %operation_id,
                        skipped,
                        "Stream lagged behind publishers"
                    );
                    writer.write_error(
                        format!("{} events were dropped", skipped),
                        &operation_id,
                        Some("broadcast"),
                        None,
                    )
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        match result {
            Ok(()) => {}
            Err(SseError::Sink(SinkError::Closed)) => break,
            Err(SseError::Sink(SinkError::Full)) => {
                tracing::warn!(operation_id = %operation_id, "Client channel full, event dropped")
            }
            Err(e) => tracing::error!(operation_id = %operation_id, "Failed to write event: {}", e),
        }
    }

    tracing::info!(operation_id = %operation_id, "Stream closed");
}
