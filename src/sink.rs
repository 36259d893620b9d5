//! The concrete destinations a session can write into.

use std::io::Write;

use crate::error::Result;
use crate::Sink;

/// Appends the output to a growable buffer.
impl Sink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// Forwards the output to anything that implements [`std::io::Write`], such
/// as a file.
pub struct WriteSink<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Returns the number of bytes forwarded so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes the writer and returns it.
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}

/// Writes the output over an existing buffer, starting at offset zero.
///
/// The sink owns the buffer so that a same-buffer session can read unconsumed
/// input from the region that has not been overwritten yet. Writes past the
/// end of the buffer extend it. The caller is responsible for never writing
/// over bytes it still needs to read.
#[derive(Debug, Default)]
pub struct SameBufferSink {
    buffer: Vec<u8>,
    offset: usize,
}

impl SameBufferSink {
    pub fn new(buffer: Vec<u8>) -> Self {
        Self { buffer, offset: 0 }
    }

    /// The number of bytes written so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The whole buffer, including the tail that was not overwritten yet.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Shrinks the buffer to the bytes that were written.
    pub fn truncate(&mut self) {
        self.buffer.truncate(self.offset);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl Sink for SameBufferSink {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.offset + bytes.len();
        let inside = self.buffer.len().clamp(self.offset, end) - self.offset;
        self.buffer[self.offset..self.offset + inside]
            .copy_from_slice(&bytes[..inside]);
        self.buffer.extend_from_slice(&bytes[inside..]);
        self.offset = end;
        Ok(())
    }
}
