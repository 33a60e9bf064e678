//! Server-Sent Events for HTTP streaming responses.
//!
//! - [`format_event`] turns an [`SseEvent`] into its wire text
//! - [`build_headers`] returns the response headers an SSE endpoint needs
//! - [`StreamWriter`] writes connection, heartbeat, stream and error events
//!   into any [`EventSink`]

pub mod clock;
pub mod error;
pub mod event;
pub mod headers;
pub mod payload;
pub mod sink;
pub mod writer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, SinkError, SseError};
pub use event::{format_event, SseEvent};
pub use headers::{build_headers, SSE_HEADERS};
pub use payload::{ConnectionPayload, ErrorPayload, ErrorSource, HeartbeatPayload};
pub use sink::{EventSink, IoSink};
pub use writer::StreamWriter;
