use serde_json::{Map, Value};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::event::{format_event, SseEvent};
use crate::payload::{ConnectionPayload, ErrorPayload, ErrorSource, HeartbeatPayload};
use crate::sink::EventSink;

const DEFAULT_STREAM_EVENT: &str = "stream";
const DEFAULT_ERROR_PHASE: &str = "unknown";

/// Writes semantic SSE events into a sink.
///
/// Every successful call formats exactly one event and hands it to the sink
/// once, in call order. Nothing is buffered between calls. Timestamps that
/// are not given are read from the clock.
pub struct StreamWriter<S, C = SystemClock> {
    sink: S,
    clock: C,
}

impl<S: EventSink> StreamWriter<S> {
    /// Create a writer that timestamps with the system clock.
    pub fn new(sink: S) -> Self {
        Self::with_clock(sink, SystemClock)
    }
}

impl<S: EventSink, C: Clock> StreamWriter<S, C> {
    pub fn with_clock(sink: S, clock: C) -> Self {
        Self { sink, clock }
    }

    /// Format and send an event as is.
    pub fn write_event(&mut self, event: &SseEvent) -> Result<()> {
        let chunk = format_event(event)?;
        self.sink.accept(chunk)?;
        Ok(())
    }

    /// Announce an opened stream.
    pub fn write_connection(
        &mut self,
        operation_id: &str,
        last_event_id: &str,
        timestamp: Option<i64>,
    ) -> Result<()> {
        let timestamp = self.timestamp_or_now(timestamp);
        let payload = ConnectionPayload::new(operation_id, last_event_id, timestamp);
        let event = SseEvent::json(&payload)?
            .event("connected")
            .id(format!("conn_{}", timestamp));
        self.write_event(&event)
    }

    pub fn write_heartbeat(&mut self, timestamp: Option<i64>) -> Result<()> {
        let timestamp = self.timestamp_or_now(timestamp);
        let event = SseEvent::json(&HeartbeatPayload::new(timestamp))?
            .event("heartbeat")
            .id(format!("heartbeat_{}", timestamp));
        self.write_event(&event)
    }

    /// Send a caller-defined event. The data is passed through untouched and
    /// its string `type` entry, if any, names the event.
    pub fn write_stream_event(
        &mut self,
        data: Map<String, Value>,
        event_id: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<()> {
        let id = match event_id {
            Some(id) => id.to_string(),
            None => format!("event_{}", self.timestamp_or_now(timestamp)),
        };
        let name = data
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_STREAM_EVENT)
            .to_string();

        let event = SseEvent::new(Value::Object(data)).event(name).id(id);
        self.write_event(&event)
    }

    /// Report a failure for `operation_id`.
    ///
    /// `err` is anything convertible into an [`ErrorSource`]: `anyhow::Error`,
    /// `&io::Error`, `&serde_json::Error`, `&SseError` or `&dyn Error` become
    /// structured errors; strings and JSON values are stringified. For other
    /// concrete error types use [`ErrorSource::from_error`]. Phase defaults to
    /// `"unknown"`.
    pub fn write_error(
        &mut self,
        err: impl Into<ErrorSource>,
        operation_id: &str,
        phase: Option<&str>,
        timestamp: Option<i64>,
    ) -> Result<()> {
        let source = err.into();
        let timestamp = self.timestamp_or_now(timestamp);
        let phase = phase.unwrap_or(DEFAULT_ERROR_PHASE);

        let payload = ErrorPayload::new(&source, operation_id, phase, timestamp);
        let event = SseEvent::json(&payload)?
            .event("error")
            .id(format!("error_{}", timestamp));
        self.write_event(&event)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_inner(self) -> S {
        self.sink
    }

    fn timestamp_or_now(&self, timestamp: Option<i64>) -> i64 {
        timestamp.unwrap_or_else(|| self.clock.now_millis())
    }
}
