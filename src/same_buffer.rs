//! Compressing a buffer into itself.
//!
//! The compressed output is written over the front of the buffer while the
//! codec is still reading the back. That is only sound while the write offset
//! stays at or behind the read cursor, which normally holds because DEFLATE
//! output is smaller than its input and the codec buffers input before it
//! emits anything. Before every write the session checks the offset against
//! the read cursor. If the write would overtake it (long incompressible
//! input), the unread tail is copied aside and compression continues from
//! the copy, so the buffer is never overwritten while still needed.
//!
//! Two guards run before any codec call: data that already looks
//! gzip-compressed is refused, and so is a buffer whose capacity cannot hold
//! the worst-case compressed size.
//!
//! ```
//! use zstream::{same_buffer, Context, Format};
//!
//! let mut data = b"in place, in place, in place, in place".repeat(100);
//! let original = data.clone();
//! same_buffer::reserve_headroom(&mut data, Format::Gzip);
//! same_buffer::compress_in_place(&mut data, Format::Gzip, Context::default())?;
//! assert!(data.len() < original.len());
//!
//! same_buffer::decompress_in_place(&mut data, Format::Gzip, Context::default())?;
//! assert_eq!(data, original);
//! # Ok::<(), zstream::Error>(())
//! ```

use std::mem;

use crate::engine::{Engine, Flush, Step};
use crate::error::{Error, Result};
use crate::pump::Pump;
use crate::session::{misuse, Totals};
use crate::sink::SameBufferSink;
use crate::sniff::looks_gzip_compressed;
use crate::utils::compress_bound;
use crate::{Context, Direction, Format, Sink};

/// Where the codec reads its input from.
enum Source {
    /// The unread region of the shared buffer.
    Buffer { read: usize, end: usize },
    /// A copy of the unread tail, taken when output caught up with input.
    Spilled { data: Vec<u8>, read: usize },
}

/// A pass that reads its input from, and writes its output to, one buffer.
///
/// The buffer is moved into the session and handed back when the session is
/// dropped. Call [`SameBufferSession::finish`] and then
/// [`SameBufferSession::truncate`]; a session dropped before `finish`
/// finishes itself. If the pass fails the buffer contents are unspecified.
pub struct SameBufferSession<'b> {
    home: &'b mut Vec<u8>,
    sink: SameBufferSink,
    pump: Option<Pump>,
    source: Source,
    consumed: usize,
    totals: Option<Totals>,
}

/// Reserves enough capacity in 'buffer' to compress it in place into
/// 'format'. Returns the capacity that is now guaranteed.
pub fn reserve_headroom(buffer: &mut Vec<u8>, format: Format) -> usize {
    let needed = compress_bound(buffer.len(), format);
    buffer.reserve_exact(needed.saturating_sub(buffer.len()));
    needed
}

impl<'b> SameBufferSession<'b> {
    /// Prepares to compress 'buffer' into itself.
    ///
    /// Fails with [`Error::AlreadyCompressed`] if the buffer starts with the
    /// gzip magic and with [`Error::InsufficientHeadroom`] if its capacity is
    /// below the worst-case output size. In both cases the buffer is left
    /// untouched.
    pub fn compressor(buffer: &'b mut Vec<u8>, format: Format, ctx: Context) -> Result<Self> {
        if looks_gzip_compressed(buffer) {
            log::warn!("refusing to compress data that looks gzip-compressed");
            return Err(Error::AlreadyCompressed);
        }
        let needed = compress_bound(buffer.len(), format);
        if buffer.capacity() < needed {
            return Err(Error::InsufficientHeadroom {
                needed,
                capacity: buffer.capacity(),
            });
        }
        Self::start(buffer, Direction::Compress, format, ctx)
    }

    /// Prepares to decompress 'buffer' into itself. The output is larger than
    /// the input, so the unread input is copied aside as soon as the output
    /// reaches it.
    pub fn decompressor(buffer: &'b mut Vec<u8>, format: Format, ctx: Context) -> Result<Self> {
        Self::start(buffer, Direction::Decompress, format, ctx)
    }

    fn start(
        home: &'b mut Vec<u8>,
        direction: Direction,
        format: Format,
        ctx: Context,
    ) -> Result<Self> {
        let pump = Pump::new(Engine::new(direction, format, ctx.level)?, ctx.chunk_size)?;
        let data = mem::take(home);
        let end = data.len();
        log::debug!("same-buffer {:?} of {} bytes as {:?}", direction, end, format);
        Ok(Self {
            home,
            sink: SameBufferSink::new(data),
            pump: Some(pump),
            source: Source::Buffer { read: 0, end },
            consumed: 0,
            totals: None,
        })
    }

    /// Bytes of output written into the buffer so far.
    pub fn write_offset(&self) -> usize {
        self.sink.offset()
    }

    /// Bytes of input the codec has consumed so far.
    pub fn read_position(&self) -> usize {
        self.consumed
    }

    /// Returns true if output caught up with input and the unread tail had
    /// to be copied aside.
    pub fn spilled(&self) -> bool {
        matches!(self.source, Source::Spilled { .. })
    }

    /// Runs the whole buffer through the codec and flushes all output.
    pub fn finish(&mut self) -> Result<Totals> {
        let mut pump = match self.pump.take() {
            Some(pump) => pump,
            None => return Err(misuse("finish on a same-buffer session that is not active")),
        };
        let result = self.drain(&mut pump);
        if let Err(err) = &result {
            log::error!("same-buffer pass failed: {}", err);
        }
        result?;

        let engine = pump.engine();
        engine.check_complete()?;
        let totals = Totals {
            read: engine.total_in(),
            written: engine.total_out(),
        };
        log::debug!(
            "same-buffer finish: read {} wrote {}{}",
            totals.read,
            totals.written,
            if self.spilled() { " (spilled)" } else { "" }
        );
        self.totals = Some(totals);
        Ok(totals)
    }

    /// Shrinks the buffer to the bytes that were written.
    pub fn truncate(&mut self) -> Result<()> {
        if self.totals.is_none() {
            return Err(misuse("truncate before finish"));
        }
        self.sink.truncate();
        Ok(())
    }

    fn drain(&mut self, pump: &mut Pump) -> Result<()> {
        loop {
            let step = match &self.source {
                Source::Buffer { read, end } => {
                    pump.step(&self.sink.buffer()[*read..*end], Flush::Finish)?
                }
                Source::Spilled { data, read } => pump.step(&data[*read..], Flush::Finish)?,
            };
            self.advance(&step);
            if step.produced > 0 {
                self.write(pump.output(&step))?;
            }
            if !pump.wants_more(&step, self.remaining(), Flush::Finish) {
                return Ok(());
            }
        }
    }

    fn advance(&mut self, step: &Step) {
        match &mut self.source {
            Source::Buffer { read, .. } | Source::Spilled { read, .. } => {
                *read += step.consumed
            }
        }
        self.consumed += step.consumed;
    }

    fn remaining(&self) -> usize {
        match &self.source {
            Source::Buffer { read, end } => end - read,
            Source::Spilled { data, read } => data.len() - read,
        }
    }

    /// Writes at the current offset, moving the unread input aside first if
    /// the write would reach it.
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if let Source::Buffer { read, end } = self.source {
            if read < end && self.sink.offset() + bytes.len() > read {
                log::warn!(
                    "output caught up with input at {} of {} bytes, copying the rest aside",
                    read,
                    end
                );
                let data = self.sink.buffer()[read..end].to_vec();
                self.source = Source::Spilled { data, read: 0 };
            }
        }
        self.sink.write(bytes)
    }
}

impl Drop for SameBufferSession<'_> {
    fn drop(&mut self) {
        if self.pump.is_some() {
            log::warn!("same-buffer session dropped while active, finishing");
            if let Err(err) = self.finish() {
                log::error!("finishing on drop failed: {}", err);
            }
        }
        *self.home = mem::take(&mut self.sink).into_inner();
    }
}

/// Compresses 'buffer' into itself and shrinks it to the compressed size.
///
/// The buffer needs spare capacity for the worst case; see
/// [`reserve_headroom`].
pub fn compress_in_place(buffer: &mut Vec<u8>, format: Format, ctx: Context) -> Result<Totals> {
    let mut session = SameBufferSession::compressor(buffer, format, ctx)?;
    let totals = session.finish()?;
    session.truncate()?;
    Ok(totals)
}

/// Decompresses 'buffer' into itself and shrinks it to the decompressed
/// size.
pub fn decompress_in_place(buffer: &mut Vec<u8>, format: Format, ctx: Context) -> Result<Totals> {
    let mut session = SameBufferSession::decompressor(buffer, format, ctx)?;
    let totals = session.finish()?;
    session.truncate()?;
    Ok(totals)
}
