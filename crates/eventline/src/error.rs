use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SseError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Failure reported by an [`EventSink`](crate::EventSink) while accepting a chunk.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Sink closed")]
    Closed,

    /// The sink cannot take another chunk right now; the chunk was not sent.
    #[error("Sink full")]
    Full,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SseError>;
