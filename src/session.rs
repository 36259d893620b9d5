//! Codec sessions: one directional pass over any number of input ranges,
//! bound to a [`Sink`] that receives the output as soon as it is available.
//!
//! ```
//! use zstream::{CodecSession, Context, Format};
//!
//! let mut compressed = Vec::new();
//! let mut session =
//!     CodecSession::compressor(&mut compressed, Format::Gzip, Context::default())?;
//! session.add(b"some text that takes up ")?.add(b"too much space")?;
//! let totals = session.finish()?;
//! drop(session);
//! assert_eq!(totals.written, compressed.len() as u64);
//!
//! let mut text = Vec::new();
//! CodecSession::decompressor(&mut text, Format::Gzip, Context::default())?
//!     .decompress(&compressed)?;
//! assert_eq!(text, b"some text that takes up too much space");
//! # Ok::<(), zstream::Error>(())
//! ```

use std::io::{self, Read, Write};

use crate::engine::{Engine, Flush};
use crate::error::{Error, Result};
use crate::pump::Pump;
use crate::sink::WriteSink;
use crate::{CompressionLevel, Context, Direction, Format, Sink};

/// Byte counts for one finished pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Input bytes consumed.
    pub read: u64,
    /// Output bytes written to the sink.
    pub written: u64,
}

impl Totals {
    /// The ratio of input to output size.
    pub fn ratio(&self) -> f64 {
        if self.written == 0 {
            return 0.0;
        }
        self.read as f64 / self.written as f64
    }
}

enum State {
    /// Created, no codec state yet.
    Idle,
    /// Initialised for one direction and format.
    Active(Pump),
    /// Finished; may be initialised again.
    Finished,
    /// A codec or sink error tore the pass down; the session is unusable.
    Failed,
}

/// Reports a precondition violation. Debug builds stop right here.
pub(crate) fn misuse(what: &'static str) -> Error {
    if cfg!(debug_assertions) {
        panic!("session misuse: {}", what);
    }
    log::error!("session misuse: {}", what);
    Error::Misuse(what)
}

/// A single-direction, single-format streaming pass.
///
/// The session borrows its sink for its whole lifetime. Dropping an active
/// session finishes it, so a forgotten [`CodecSession::finish`] never loses
/// the trailing output.
pub struct CodecSession<'s, S: Sink + ?Sized> {
    sink: &'s mut S,
    state: State,
    ctx: Context,
}

impl<'s, S: Sink + ?Sized> CodecSession<'s, S> {
    /// Creates an idle session writing to 'sink'.
    pub fn new(sink: &'s mut S) -> Self {
        Self::with_context(sink, Context::default())
    }

    pub fn with_context(sink: &'s mut S, ctx: Context) -> Self {
        Self {
            sink,
            state: State::Idle,
            ctx,
        }
    }

    /// Creates a session that is already initialised for compression.
    pub fn compressor(sink: &'s mut S, format: Format, ctx: Context) -> Result<Self> {
        let mut session = Self::with_context(sink, ctx);
        session.init(Direction::Compress, format, ctx.level)?;
        Ok(session)
    }

    /// Creates a session that is already initialised for decompression.
    pub fn decompressor(sink: &'s mut S, format: Format, ctx: Context) -> Result<Self> {
        let mut session = Self::with_context(sink, ctx);
        session.init(Direction::Decompress, format, ctx.level)?;
        Ok(session)
    }

    /// Sets up the codec for one pass. A failure leaves the session idle.
    pub fn init(
        &mut self,
        direction: Direction,
        format: Format,
        level: CompressionLevel,
    ) -> Result<&mut Self> {
        if !matches!(self.state, State::Idle | State::Finished) {
            return Err(misuse("init on a session that is active or failed"));
        }
        let engine = Engine::new(direction, format, level)?;
        let pump = Pump::new(engine, self.ctx.chunk_size)?;
        log::debug!(
            "session init: {:?} {:?} level {} chunk {}",
            direction,
            format,
            level.numeric(),
            self.ctx.chunk_size
        );
        self.state = State::Active(pump);
        Ok(self)
    }

    pub fn init_compress(&mut self, format: Format, level: CompressionLevel) -> Result<&mut Self> {
        self.init(Direction::Compress, format, level)
    }

    pub fn is_initialised(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// The direction of the active pass, or None when undecided.
    pub fn direction(&self) -> Option<Direction> {
        match &self.state {
            State::Active(pump) => Some(pump.engine().direction()),
            _ => None,
        }
    }

    pub fn format(&self) -> Option<Format> {
        match &self.state {
            State::Active(pump) => Some(pump.engine().format()),
            _ => None,
        }
    }

    /// Input bytes consumed by the active pass.
    pub fn total_in(&self) -> u64 {
        match &self.state {
            State::Active(pump) => pump.engine().total_in(),
            _ => 0,
        }
    }

    /// Output bytes written by the active pass.
    pub fn total_out(&self) -> u64 {
        match &self.state {
            State::Active(pump) => pump.engine().total_out(),
            _ => 0,
        }
    }

    /// Feeds 'data' into the codec; more input may follow.
    pub fn add(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.pump(data, Flush::None, None)?;
        Ok(self)
    }

    /// Compresses 'data' as the final input and finishes the pass. This is
    /// enough when all the data is already in memory.
    pub fn compress(&mut self, data: &[u8]) -> Result<Totals> {
        self.pump(data, Flush::Finish, Some(Direction::Compress))?;
        self.finish()
    }

    /// Decompresses 'data' as the final input and finishes the pass.
    pub fn decompress(&mut self, data: &[u8]) -> Result<Totals> {
        self.pump(data, Flush::None, Some(Direction::Decompress))?;
        self.finish()
    }

    /// Flushes everything the codec still holds, releases the codec state and
    /// returns the totals for the pass.
    pub fn finish(&mut self) -> Result<Totals> {
        if !self.is_initialised() {
            return Err(misuse("finish without an active pass"));
        }
        self.pump(&[], Flush::Finish, None)?;

        let pump = match std::mem::replace(&mut self.state, State::Failed) {
            State::Active(pump) => pump,
            _ => return Err(misuse("finish without an active pass")),
        };
        let engine = pump.engine();
        if let Err(err) = engine.check_complete() {
            log::error!("session failed: {}", err);
            return Err(err);
        }
        let totals = Totals {
            read: engine.total_in(),
            written: engine.total_out(),
        };
        log::debug!(
            "session finish: {:?} read {} wrote {}",
            engine.direction(),
            totals.read,
            totals.written
        );
        self.state = State::Finished;
        Ok(totals)
    }

    /// Runs the pump loop for 'data'. Any error is fatal for the pass: the
    /// codec state is released and the session is marked failed.
    fn pump(&mut self, data: &[u8], flush: Flush, expect: Option<Direction>) -> Result<()> {
        let pump = match &mut self.state {
            State::Active(pump) => pump,
            _ => return Err(misuse("add before init or after finish")),
        };
        if let Some(direction) = expect {
            if pump.engine().direction() != direction {
                return Err(misuse("call does not match the session direction"));
            }
        }
        let result = pump.drain(data, flush, &mut *self.sink);
        if let Err(err) = &result {
            log::error!("session failed: {}", err);
            self.state = State::Failed;
        }
        result
    }
}

impl<S: Sink + ?Sized> Drop for CodecSession<'_, S> {
    fn drop(&mut self) {
        if self.is_initialised() {
            log::warn!("session dropped while active, finishing");
            if let Err(err) = self.finish() {
                log::error!("finishing on drop failed: {}", err);
            }
        }
    }
}

/// Compresses 'input' into a new [`Vec`].
pub fn compress_to_vec(input: &[u8], format: Format, level: CompressionLevel) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let ctx = Context {
        level,
        ..Context::default()
    };
    CodecSession::compressor(&mut output, format, ctx)?.compress(input)?;
    Ok(output)
}

/// Decompresses 'input' into a new [`Vec`].
pub fn decompress_to_vec(input: &[u8], format: Format) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    CodecSession::decompressor(&mut output, format, Context::default())?.decompress(input)?;
    Ok(output)
}

/// Reads 'reader' in blocks of 'ctx.read_block' bytes and pushes each block
/// through 'session'.
fn pump_reader<R: Read, S: Sink + ?Sized>(
    mut reader: R,
    session: &mut CodecSession<'_, S>,
    read_block: usize,
) -> Result<Totals> {
    let mut block = vec![0u8; read_block.max(1)];
    loop {
        let n = match reader.read(&mut block) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        session.add(&block[..n])?;
    }
    session.finish()
}

/// Compresses everything 'reader' yields into 'writer'.
pub fn compress_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    format: Format,
    ctx: Context,
) -> Result<Totals> {
    let mut sink = WriteSink::new(writer);
    let totals = {
        let mut session = CodecSession::compressor(&mut sink, format, ctx)?;
        pump_reader(reader, &mut session, ctx.read_block)?
    };
    sink.into_inner()?;
    Ok(totals)
}

/// Decompresses everything 'reader' yields into 'writer'.
pub fn decompress_stream<R: Read, W: Write>(
    reader: R,
    writer: W,
    format: Format,
    ctx: Context,
) -> Result<Totals> {
    let mut sink = WriteSink::new(writer);
    let totals = {
        let mut session = CodecSession::decompressor(&mut sink, format, ctx)?;
        pump_reader(reader, &mut session, ctx.read_block)?
    };
    sink.into_inner()?;
    Ok(totals)
}
