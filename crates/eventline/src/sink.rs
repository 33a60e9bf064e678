use std::io::Write;

use crate::error::SinkError;

/// Destination for formatted SSE chunks.
///
/// The sink belongs to the host transport; writers only hand it text.
pub trait EventSink {
    fn accept(&mut self, chunk: String) -> Result<(), SinkError>;
}

/// Records every chunk in order. Mostly useful in tests.
impl EventSink for Vec<String> {
    fn accept(&mut self, chunk: String) -> Result<(), SinkError> {
        self.push(chunk);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn accept(&mut self, chunk: String) -> Result<(), SinkError> {
        (**self).accept(chunk)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn accept(&mut self, chunk: String) -> Result<(), SinkError> {
        (**self).accept(chunk)
    }
}

/// Sink over any [`std::io::Write`], flushed after every chunk so events are
/// not held back by buffering.
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> EventSink for IoSink<W> {
    fn accept(&mut self, chunk: String) -> Result<(), SinkError> {
        self.inner.write_all(chunk.as_bytes())?;
        self.inner.flush()?;
        Ok(())
    }
}
