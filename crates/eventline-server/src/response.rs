use axum::{body::Body, response::Response};
use futures::StreamExt;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Build a streaming SSE response whose body is every chunk sent on `chunks`.
pub fn sse_response(chunks: mpsc::Receiver<String>) -> Response {
    let stream = ReceiverStream::new(chunks).map(Ok::<_, Infallible>);

    let mut response = Response::new(Body::from_stream(stream));
    *response.headers_mut() = eventline::build_headers();
    response
}
