use axum::{
    body::{to_bytes, Body, BodyDataStream},
    http::{Request, StatusCode},
    Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tower::ServiceExt;

use eventline_server::{build_router, config::Config, error::ApiError, state::AppState};

fn test_config() -> Config {
    let mut config = Config::default();
    // long enough that no heartbeat shows up unless a test asks for one
    config.stream.heartbeat_interval_ms = 60_000;
    config
}

fn app_with(config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config));
    (build_router(state.clone()), state)
}

fn test_app() -> Router {
    app_with(test_config()).0
}

async fn open_stream(app: Router, uri: &str) -> BodyDataStream {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.into_body().into_data_stream()
}

async fn next_chunk(body: &mut BodyDataStream) -> String {
    let bytes = timeout(Duration::from_secs(5), body.next())
        .await
        .expect("timed out waiting for a chunk")
        .expect("stream ended")
        .expect("body error");
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let response = test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["open_streams"], 0);
}

#[tokio::test]
async fn test_stream_sends_headers_and_connection_event() {
    let request = Request::get("/events?operation_id=op_123")
        .header("Last-Event-ID", "last_456")
        .body(Body::empty())
        .unwrap();

    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    for (name, value) in eventline::SSE_HEADERS {
        assert_eq!(response.headers().get(name).unwrap(), value, "header {}", name);
    }

    let mut body = response.into_body().into_data_stream();
    let chunk = next_chunk(&mut body).await;
    assert!(chunk.starts_with("id: conn_"));
    assert!(chunk.contains("event: connected\n"));
    assert!(chunk.contains(r#""operationId":"op_123""#));
    assert!(chunk.contains(r#""lastEventId":"last_456""#));
    assert!(chunk.ends_with("\n\n"));
}

#[tokio::test]
async fn test_stream_generates_operation_id() {
    let response = test_app()
        .oneshot(Request::get("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let mut body = response.into_body().into_data_stream();
    let chunk = next_chunk(&mut body).await;
    assert!(chunk.contains(r#""operationId":"op_"#));
    assert!(chunk.contains(r#""lastEventId":"""#));
}

#[tokio::test]
async fn test_published_event_reaches_stream() {
    let app = test_app();

    let stream_response = app
        .clone()
        .oneshot(Request::get("/events?operation_id=op_1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let mut body = stream_response.into_body().into_data_stream();
    let _connected = next_chunk(&mut body).await;

    let publish = Request::post("/events")
        .header("content-type", "application/json")
        .body(Body::from(json!({"type": "progress", "pct": 40}).to_string()))
        .unwrap();
    let publish_response = app.oneshot(publish).await.unwrap();
    assert_eq!(publish_response.status(), StatusCode::ACCEPTED);

    let reply = to_bytes(publish_response.into_body(), usize::MAX).await.unwrap();
    let reply: Value = serde_json::from_slice(&reply).unwrap();
    assert_eq!(reply["subscribers"], 1);

    let chunk = next_chunk(&mut body).await;
    assert!(chunk.starts_with("id: event_"));
    assert!(chunk.contains("event: progress\n"));
    assert!(chunk.ends_with("data: {\"type\":\"progress\",\"pct\":40}\n\n"));
}

#[tokio::test]
async fn test_publish_rejects_non_object() {
    let request = Request::post("/events")
        .header("content-type", "application/json")
        .body(Body::from("[1,2,3]"))
        .unwrap();

    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "Invalid request: Event body must be a JSON object");
}

#[tokio::test]
async fn test_publish_without_streams() {
    let request = Request::post("/events")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"foo":"bar"}"#))
        .unwrap();

    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["subscribers"], 0);
}

#[tokio::test]
async fn test_api_error_response() {
    use axum::response::IntoResponse;

    let error = ApiError::BadRequest("Test error".to_string());
    let response = error.into_response();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_idle_stream_gets_heartbeats() {
    let mut config = test_config();
    config.stream.heartbeat_interval_ms = 20;
    let (app, _state) = app_with(config);

    let mut body = open_stream(app, "/events?operation_id=op_hb").await;
    let _connected = next_chunk(&mut body).await;

    for _ in 0..2 {
        let chunk = next_chunk(&mut body).await;
        assert!(chunk.starts_with("id: heartbeat_"));
        assert!(chunk.contains("event: heartbeat\n"));
        assert!(chunk.contains(r#""type":"heartbeat"}"#));
    }
}

#[tokio::test]
async fn test_slow_client_gets_lag_error() {
    let mut config = test_config();
    config.stream.channel_capacity = 1;
    let (app, state) = app_with(config);

    // nothing is read from the body while events are published
    let mut body = open_stream(app, "/events?operation_id=op_slow").await;
    for n in 0..50 {
        let mut data = serde_json::Map::new();
        data.insert("type".to_string(), json!("tick"));
        data.insert("n".to_string(), json!(n));
        state.events.send(data).unwrap();
    }

    let connected = next_chunk(&mut body).await;
    assert!(connected.contains("event: connected\n"));

    let lag = next_chunk(&mut body).await;
    assert!(lag.starts_with("id: error_"));
    assert!(lag.contains("event: error\n"));
    assert!(lag.contains(r#""operationId":"op_slow""#));
    assert!(lag.contains(r#""phase":"broadcast""#));
    assert!(lag.contains(r#""error":"49 events were dropped""#));

    let latest = next_chunk(&mut body).await;
    assert!(latest.contains("event: tick\n"));
    assert!(latest.ends_with("data: {\"type\":\"tick\",\"n\":49}\n\n"));
}

#[tokio::test]
async fn test_stream_task_ends_when_client_disconnects() {
    let (app, state) = app_with(test_config());

    let mut body = open_stream(app, "/events").await;
    let _connected = next_chunk(&mut body).await;
    assert_eq!(state.events.receiver_count(), 1);

    drop(body);

    timeout(Duration::from_secs(5), async {
        while state.events.receiver_count() > 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("stream task kept its subscription after disconnect");
}
