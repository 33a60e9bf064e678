use eventline::{EventSink, SinkError};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Sink feeding an HTTP response body through a bounded channel.
///
/// Writes never block: a full channel yields [`SinkError::Full`], and once the
/// response body is dropped (client disconnected) every write fails with
/// [`SinkError::Closed`]. Await [`ChannelSink::ready`] before writing to wait
/// for the client instead.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<String>) -> Self {
        Self { sender }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Resolves when the receiving side has gone away.
    pub async fn closed(&self) {
        self.sender.closed().await
    }

    /// Wait until the channel has room for one more chunk.
    ///
    /// Only holds while this sink (or a clone) is the sole writer.
    pub async fn ready(&self) -> Result<(), SinkError> {
        self.sender
            .reserve()
            .await
            .map(drop)
            .map_err(|_| SinkError::Closed)
    }
}

impl EventSink for ChannelSink {
    fn accept(&mut self, chunk: String) -> Result<(), SinkError> {
        self.sender.try_send(chunk).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Closed(_) => SinkError::Closed,
        })
    }
}
