use serde::Serialize;
use serde_json::Value;

use crate::error::Result;

/// One SSE message before serialization.
///
/// Optional fields are rendered whenever they are `Some`, even if the
/// string inside is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub data: Value,
    pub id: Option<String>,
    pub event: Option<String>,
    /// Reconnection delay in milliseconds suggested to the client
    pub retry: Option<u64>,
}

impl SseEvent {
    pub fn new(data: impl Into<Value>) -> Self {
        Self {
            data: data.into(),
            id: None,
            event: None,
            retry: None,
        }
    }

    /// Build an event whose data is the JSON form of `value`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }

    pub fn retry(mut self, retry_ms: u64) -> Self {
        self.retry = Some(retry_ms);
        self
    }
}

/// Serialize an event into SSE wire format.
///
/// Fields are always emitted as `id`, `event`, `retry`, then `data`. String
/// data becomes one `data:` line per `\n`-separated segment; any other value
/// is written as a single line of compact JSON. The block ends with `\n\n`.
pub fn format_event(event: &SseEvent) -> Result<String> {
    let mut out = String::new();

    if let Some(id) = &event.id {
        push_field(&mut out, "id", id);
    }
    if let Some(name) = &event.event {
        push_field(&mut out, "event", name);
    }
    if let Some(retry) = event.retry {
        push_field(&mut out, "retry", &retry.to_string());
    }

    match &event.data {
        Value::String(text) => {
            for line in text.split('\n') {
                push_field(&mut out, "data", line);
            }
        }
        other => {
            let json = serde_json::to_string(other)?;
            push_field(&mut out, "data", &json);
        }
    }

    out.push('\n');
    Ok(out)
}

fn push_field(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}
