pub mod engine;
pub mod error;
pub mod level;
pub mod pump;
pub mod same_buffer;
pub mod session;
pub mod sink;
pub mod sniff;
pub mod utils;

pub use error::{Error, Result};
pub use level::CompressionLevel;
pub use same_buffer::SameBufferSession;
pub use session::{
    compress_stream, compress_to_vec, decompress_stream, decompress_to_vec,
    CodecSession, Totals,
};
pub use sink::{SameBufferSink, WriteSink};
pub use sniff::{looks_gzip_compressed, peek_gzip_compressed};

/// The default size of the scratch buffer that stages codec output.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// The default size of the blocks read by the stream helpers.
pub const DEFAULT_READ_BLOCK: usize = 1024;

/// Stores information about the environment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Context {
    /// Specifies the compression level.
    pub level: CompressionLevel,
    /// Specifies the size of the internal chunk buffer.
    pub chunk_size: usize,
    /// Specifies the size of each block read by the stream helpers.
    pub read_block: usize,
}

impl Context {
    pub fn new(level: CompressionLevel, chunk_size: usize) -> Self {
        Self {
            level,
            chunk_size,
            read_block: DEFAULT_READ_BLOCK,
        }
    }

    /// Returns a copy of this context with a different read block size.
    pub fn with_read_block(mut self, read_block: usize) -> Self {
        self.read_block = read_block;
        self
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(CompressionLevel::Default, DEFAULT_CHUNK_SIZE)
    }
}

/// The direction of a codec pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

/// The framing around the DEFLATE stream.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Format {
    /// Raw DEFLATE without any header or trailer.
    Deflate,
    /// DEFLATE wrapped in a zlib header and Adler-32 trailer.
    Zlib,
    /// DEFLATE wrapped in a gzip member (header, CRC-32 and length trailer).
    #[default]
    Gzip,
}

impl Format {
    /// The number of bytes the framing adds around the DEFLATE stream, using
    /// a gzip header without optional fields.
    pub fn overhead(self) -> usize {
        match self {
            Format::Deflate => 0,
            Format::Zlib => 6,
            Format::Gzip => 18,
        }
    }
}

/// A destination for codec output.
///
/// A sink accepts byte ranges in order and may be called any number of times
/// during a single pass. Each call continues where the previous one stopped.
pub trait Sink {
    /// Accept the next range of output bytes.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }
}
