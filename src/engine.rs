//! The codec boundary. An [`Engine`] owns the DEFLATE stream state for one
//! direction and one format and exposes a single step function that moves
//! bytes from an input slice into an output slice.
//!
//! All three framings are handled by `flate2` on the zlib-rs backend. Gzip
//! input may hold several concatenated members; each one is decoded by a
//! fresh stream.

use flate2::{
    Compress, Compression, Decompress, DecompressError, FlushCompress, FlushDecompress,
    Status,
};

use crate::error::{Error, Result};
use crate::level::{self, CompressionLevel};
use crate::{Direction, Format};

/// Tells the step function whether more input will follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flush {
    /// More input may follow.
    None,
    /// This is the last input; emit everything, including trailers.
    Finish,
}

/// The outcome of one call to [`Engine::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Step {
    /// Input bytes consumed.
    pub consumed: usize,
    /// Output bytes produced.
    pub produced: usize,
}

impl Step {
    pub fn made_progress(&self) -> bool {
        self.consumed > 0 || self.produced > 0
    }
}

pub struct Engine {
    kind: Kind,
    format: Format,
    read: u64,
    written: u64,
}

enum Kind {
    Deflate(Deflater),
    Inflate(Inflater),
}

impl Engine {
    pub fn new(
        direction: Direction,
        format: Format,
        level: CompressionLevel,
    ) -> Result<Self> {
        let kind = match direction {
            Direction::Compress => {
                Kind::Deflate(Deflater::new(format, level::checked(level)?))
            }
            Direction::Decompress => Kind::Inflate(Inflater::new(format)),
        };
        Ok(Self {
            kind,
            format,
            read: 0,
            written: 0,
        })
    }

    pub fn direction(&self) -> Direction {
        match self.kind {
            Kind::Deflate(_) => Direction::Compress,
            Kind::Inflate(_) => Direction::Decompress,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Returns true once the stream is complete: for compression the trailer
    /// has been emitted, for decompression the end of the last member was
    /// seen and verified.
    pub fn is_finished(&self) -> bool {
        match &self.kind {
            Kind::Deflate(d) => d.is_finished(),
            Kind::Inflate(i) => i.is_finished(),
        }
    }

    /// Returns true if a decompressor stopped in the middle of a stream.
    pub fn is_truncated(&self) -> bool {
        matches!(self.kind, Kind::Inflate(_)) && !self.is_finished()
    }

    /// Fails unless the pass reached the end of its stream.
    pub fn check_complete(&self) -> Result<()> {
        if self.is_truncated() {
            return Err(Error::Truncated);
        }
        if !self.is_finished() {
            return Err(Error::Compress("stream did not end".into()));
        }
        Ok(())
    }

    /// Total input bytes consumed.
    pub fn total_in(&self) -> u64 {
        self.read
    }

    /// Total output bytes produced, framing included.
    pub fn total_out(&self) -> u64 {
        self.written
    }

    /// Runs the codec once over 'input', writing into 'output'.
    pub fn step(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Step> {
        let step = match &mut self.kind {
            Kind::Deflate(d) => d.step(input, output, flush)?,
            Kind::Inflate(i) => i.step(input, output)?,
        };
        self.read += step.consumed as u64;
        self.written += step.produced as u64;
        Ok(step)
    }
}

/// Copies as much of 'bytes[*pos..]' as fits into 'output'.
fn emit(bytes: &[u8], pos: &mut usize, output: &mut [u8]) -> usize {
    let n = (bytes.len() - *pos).min(output.len());
    output[..n].copy_from_slice(&bytes[*pos..*pos + n]);
    *pos += n;
    n
}

/// Runs one compress call and reports the bytes moved and the status.
fn compress_once(
    raw: &mut Compress,
    input: &[u8],
    output: &mut [u8],
    flush: Flush,
) -> Result<(Step, Status)> {
    let before_in = raw.total_in();
    let before_out = raw.total_out();
    let mode = match flush {
        Flush::None => FlushCompress::None,
        Flush::Finish => FlushCompress::Finish,
    };
    let status = raw
        .compress(input, output, mode)
        .map_err(|e| Error::Compress(e.to_string()))?;
    let step = Step {
        consumed: (raw.total_in() - before_in) as usize,
        produced: (raw.total_out() - before_out) as usize,
    };
    Ok((step, status))
}

fn decompress_once(
    raw: &mut Decompress,
    input: &[u8],
    output: &mut [u8],
) -> Result<(Step, Status)> {
    let before_in = raw.total_in();
    let before_out = raw.total_out();
    let status = raw
        .decompress(input, output, FlushDecompress::None)
        .map_err(data_error)?;
    let step = Step {
        consumed: (raw.total_in() - before_in) as usize,
        produced: (raw.total_out() - before_out) as usize,
    };
    Ok((step, status))
}

fn data_error(err: DecompressError) -> Error {
    match err.needs_dictionary() {
        Some(adler) => Error::NeedDictionary(adler),
        None => Error::Corrupt(err.to_string()),
    }
}

/// Window size used for gzip streams, matching zlib's default.
const GZIP_WINDOW_BITS: u8 = 15;

struct Deflater {
    raw: Compress,
    stream_end: bool,
}

impl Deflater {
    fn new(format: Format, level: Compression) -> Self {
        let raw = match format {
            Format::Deflate => Compress::new(level, false),
            Format::Zlib => Compress::new(level, true),
            Format::Gzip => Compress::new_gzip(level, GZIP_WINDOW_BITS),
        };
        Self {
            raw,
            stream_end: false,
        }
    }

    fn is_finished(&self) -> bool {
        self.stream_end
    }

    fn step(&mut self, input: &[u8], output: &mut [u8], flush: Flush) -> Result<Step> {
        if self.stream_end || output.is_empty() {
            return Ok(Step::default());
        }
        let (step, status) = compress_once(&mut self.raw, input, output, flush)?;
        self.stream_end = status == Status::StreamEnd;
        Ok(step)
    }
}

fn new_decompress(format: Format) -> Decompress {
    match format {
        Format::Deflate => Decompress::new(false),
        Format::Zlib => Decompress::new(true),
        Format::Gzip => Decompress::new_gzip(GZIP_WINDOW_BITS),
    }
}

struct Inflater {
    raw: Decompress,
    format: Format,
    stream_end: bool,
    /// Number of complete gzip members decoded so far.
    members: usize,
}

impl Inflater {
    fn new(format: Format) -> Self {
        Self {
            raw: new_decompress(format),
            format,
            stream_end: false,
            members: 0,
        }
    }

    fn is_finished(&self) -> bool {
        self.stream_end
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step> {
        if self.stream_end {
            if self.format != Format::Gzip || input.is_empty() {
                return Ok(Step::default());
            }
            // Another gzip member follows the previous one.
            log::debug!("gzip member {} complete, starting the next", self.members);
            self.raw = new_decompress(self.format);
            self.stream_end = false;
        }
        let (step, status) = decompress_once(&mut self.raw, input, output)?;
        if status == Status::StreamEnd {
            self.stream_end = true;
            self.members += 1;
        }
        Ok(step)
    }
}
