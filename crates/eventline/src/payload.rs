use serde::Serialize;
use serde_json::Value;
use std::backtrace::BacktraceStatus;
use std::error::Error as StdError;
use std::io;

use crate::error::SseError;

/// Data of the `connected` event sent when a stream opens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub operation_id: &'a str,
    pub last_event_id: &'a str,
    pub timestamp: i64,
}

impl<'a> ConnectionPayload<'a> {
    pub fn new(operation_id: &'a str, last_event_id: &'a str, timestamp: i64) -> Self {
        Self {
            kind: "connected",
            operation_id,
            last_event_id,
            timestamp,
        }
    }
}

/// Heartbeat data: `timestamp` then `type`, nothing else.
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatPayload {
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl HeartbeatPayload {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            kind: "heartbeat",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub operation_id: &'a str,
    pub error: &'a str,
    pub phase: &'a str,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<&'a str>,
}

impl<'a> ErrorPayload<'a> {
    pub fn new(
        source: &'a ErrorSource,
        operation_id: &'a str,
        phase: &'a str,
        timestamp: i64,
    ) -> Self {
        Self {
            kind: "error",
            operation_id,
            error: source.message(),
            phase,
            timestamp,
            stack: source.stack(),
        }
    }
}

/// What went wrong, normalized for an error event.
///
/// `Structured` errors carry a message and possibly a stack trace; anything
/// else is reduced to its string form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorSource {
    Structured {
        message: String,
        stack: Option<String>,
    },
    Opaque(String),
}

impl ErrorSource {
    pub fn structured(message: impl Into<String>, stack: Option<String>) -> Self {
        Self::Structured {
            message: message.into(),
            stack,
        }
    }

    pub fn opaque(value: impl ToString) -> Self {
        Self::Opaque(value.to_string())
    }

    /// Structured source from any std error; std errors carry no stack.
    pub fn from_error<E: StdError + ?Sized>(err: &E) -> Self {
        Self::structured(err.to_string(), None)
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Structured { message, .. } => message,
            Self::Opaque(text) => text,
        }
    }

    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Structured { stack, .. } => stack.as_deref(),
            Self::Opaque(_) => None,
        }
    }
}

impl From<&anyhow::Error> for ErrorSource {
    fn from(err: &anyhow::Error) -> Self {
        let backtrace = err.backtrace();
        let stack = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };
        Self::structured(err.to_string(), stack)
    }
}

impl From<anyhow::Error> for ErrorSource {
    fn from(err: anyhow::Error) -> Self {
        Self::from(&err)
    }
}

impl<'a> From<&'a (dyn StdError + 'a)> for ErrorSource {
    fn from(err: &'a (dyn StdError + 'a)) -> Self {
        Self::from_error(err)
    }
}

impl From<&io::Error> for ErrorSource {
    fn from(err: &io::Error) -> Self {
        Self::from_error(err)
    }
}

impl From<io::Error> for ErrorSource {
    fn from(err: io::Error) -> Self {
        Self::from_error(&err)
    }
}

impl From<&serde_json::Error> for ErrorSource {
    fn from(err: &serde_json::Error) -> Self {
        Self::from_error(err)
    }
}

impl From<&SseError> for ErrorSource {
    fn from(err: &SseError) -> Self {
        Self::from_error(err)
    }
}

impl From<String> for ErrorSource {
    fn from(text: String) -> Self {
        Self::Opaque(text)
    }
}

impl From<&str> for ErrorSource {
    fn from(text: &str) -> Self {
        Self::Opaque(text.to_string())
    }
}

impl From<Value> for ErrorSource {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Opaque(text),
            other => Self::Opaque(other.to_string()),
        }
    }
}
