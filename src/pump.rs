//! The chunked pump loop. One push of input may need many chunk-sized output
//! buffers before the codec has emitted everything it can; the pump keeps
//! stepping the engine and flushing each chunk to the sink until nothing is
//! left for the current input.

use crate::engine::{Engine, Flush, Step};
use crate::error::{Error, Result};
use crate::Sink;

pub struct Pump {
    engine: Engine,
    /// Scratch space for codec output. Never handed to callers except as the
    /// slice of one step's output.
    chunk: Vec<u8>,
}

impl Pump {
    pub fn new(engine: Engine, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Init("chunk size must be non-zero".into()));
        }
        Ok(Self {
            engine,
            chunk: vec![0; chunk_size],
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Runs one codec step into the chunk buffer.
    pub fn step(&mut self, input: &[u8], flush: Flush) -> Result<Step> {
        self.engine.step(input, &mut self.chunk, flush)
    }

    /// The bytes produced by 'step'.
    pub fn output(&self, step: &Step) -> &[u8] {
        &self.chunk[..step.produced]
    }

    /// Decides whether the loop must call the codec again after 'step'.
    ///
    /// A full chunk means more output may be queued. Otherwise the codec is
    /// called again only while it is making progress and either input remains
    /// or a finishing stream has not ended yet.
    pub fn wants_more(&self, step: &Step, remaining: usize, flush: Flush) -> bool {
        if step.produced == self.chunk.len() {
            return true;
        }
        if !step.made_progress() {
            return false;
        }
        remaining > 0 || (flush == Flush::Finish && !self.engine.is_finished())
    }

    /// Feeds 'input' to the codec and writes everything it produces to
    /// 'sink'. Returns once all output for this input has been flushed.
    pub fn drain<S: Sink + ?Sized>(
        &mut self,
        input: &[u8],
        flush: Flush,
        sink: &mut S,
    ) -> Result<()> {
        let mut pos = 0;
        loop {
            let step = self.step(&input[pos..], flush)?;
            pos += step.consumed;
            if step.produced > 0 {
                log::trace!("pump: flushing {} bytes", step.produced);
                sink.write(self.output(&step))?;
            }
            if !self.wants_more(&step, input.len() - pos, flush) {
                break;
            }
        }
        if pos < input.len() && self.engine.is_finished() {
            log::warn!(
                "ignoring {} bytes after the end of the stream",
                input.len() - pos
            );
        }
        Ok(())
    }
}
