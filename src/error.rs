//! Errors reported by codec sessions and sinks.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The codec could not be set up with the requested parameters.
    #[error("codec initialisation failed: {0}")]
    Init(String),

    /// The compressed stream requires a preset dictionary.
    #[error("stream requires a preset dictionary (adler32 {0:#010x})")]
    NeedDictionary(u32),

    /// The compressed stream is malformed.
    #[error("corrupt compressed stream: {0}")]
    Corrupt(String),

    /// The input ended before the compressed stream was complete.
    #[error("compressed stream is truncated")]
    Truncated,

    /// The compressor failed mid-stream.
    #[error("compression failed: {0}")]
    Compress(String),

    /// The session was used in a state that does not allow the call.
    #[error("session misuse: {0}")]
    Misuse(&'static str),

    /// The buffer already looks like gzip data.
    #[error("buffer already looks gzip-compressed")]
    AlreadyCompressed,

    /// The buffer cannot hold the worst-case compressed output.
    #[error("insufficient headroom: need {needed} bytes of capacity, have {capacity}")]
    InsufficientHeadroom { needed: usize, capacity: usize },

    /// The sink or a stream failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns true for errors that describe bad compressed input.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Error::NeedDictionary(_)
                | Error::Corrupt(_)
                | Error::Truncated
        )
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(inner) => inner,
            other if other.is_data_error() => {
                io::Error::new(io::ErrorKind::InvalidData, other)
            }
            other => io::Error::new(io::ErrorKind::Other, other),
        }
    }
}
