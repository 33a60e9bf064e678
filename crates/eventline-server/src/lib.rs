//! HTTP service that streams Server-Sent Events written by `eventline`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod sink;
pub mod state;

use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::{
    handlers::stream,
    routes::{events, health},
    state::AppState,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/events", get(stream::open_stream).post(events::publish_event))
        .layer(axum_middleware::from_fn(middleware::logging::log_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
