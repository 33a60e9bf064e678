use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Number of open streams the event was handed to
    pub subscribers: usize,
}

/// Publish an event to every open stream
///
/// The body must be a JSON object. Its `type` field, when a string, becomes
/// the SSE event name on the wire.
pub async fn publish_event(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<PublishResponse>)> {
    let Value::Object(data) = body else {
        return Err(ApiError::BadRequest("Event body must be a JSON object".to_string()));
    };

    // send only fails when nobody is listening
    let subscribers = state.events.send(data).unwrap_or(0);
    tracing::debug!(subscribers, "Event published");

    Ok((StatusCode::ACCEPTED, Json(PublishResponse { subscribers })))
}
