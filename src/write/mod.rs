//! Streaming writer for classic `.lzma` streams.
//!
//! A [`Writer`] emits the 13-byte header followed by the LZMA payload. It is
//! created cheaply; validation, allocation of the dictionary, and the header
//! write all happen on the first [`write`](Writer::try_write) or
//! [`close`](Writer::close).
//!
//! # Example
//!
//! ```rust
//! use lzclassic::{Parameters, Writer};
//!
//! let mut writer = Writer::with_params(Vec::new(), Parameters::default().with_size(11));
//! writer.try_write(b"hello world")?;
//! let stream = writer.finish()?;
//! assert_eq!(&stream[5..13], &11u64.to_le_bytes());
//! # Ok::<(), lzclassic::Error>(())
//! ```
//!
//! # Declared size
//!
//! When [`Parameters::size`] is non-negative, the writer accepts exactly that
//! many bytes. Input beyond the budget is dropped and reported as
//! [`Error::NoSpace`]; a close with fewer bytes fails with
//! [`Error::SizeMismatch`].

mod sink;

pub use sink::ByteWriter;

use std::fs::File;
use std::io::{self, Write};
use std::mem;
use std::path::Path;

use crate::codec::{EncoderDict, EncoderFlags, LzmaEncoder, LzmaState, MAX_MATCH_LEN};
use crate::format::{HEADER_LEN, MAX_DICT_CAP, MIN_DICT_CAP, Parameters, write_header};
use crate::{Error, Result};

use sink::Output;

/// State of the writer.
#[derive(Debug)]
enum WriterState<W: Write> {
    /// Nothing validated or written yet.
    Uninitialized(Output<W>),
    /// Header written, accepting data.
    Active(Box<LzmaEncoder<Output<W>>>),
    /// Stream finished.
    Closed {
        out: Output<W>,
        processed: u64,
    },
    /// Initialization failed. The sink is kept when it could be recovered.
    Failed(Option<Output<W>>),
}

/// Streaming classic LZMA writer.
#[derive(Debug)]
pub struct Writer<W: Write> {
    params: Parameters,
    state: WriterState<W>,
}

impl<W: Write> Writer<W> {
    /// Creates a writer with default parameters.
    ///
    /// The sink is wrapped in a buffering adapter.
    pub fn new(sink: W) -> Self {
        Self::with_params(sink, Parameters::default())
    }

    /// Creates a writer with the given parameters.
    ///
    /// Every sink is wrapped in a [`BufWriter`](std::io::BufWriter), since
    /// the sink type cannot be inspected here. Sinks implementing
    /// [`ByteWriter`], such as `Vec<u8>` or an existing `BufWriter`, should
    /// go through [`unbuffered`](Self::unbuffered) instead to avoid buffering
    /// twice.
    pub fn with_params(sink: W, params: Parameters) -> Self {
        Self {
            params,
            state: WriterState::Uninitialized(Output::buffered(sink)),
        }
    }

    /// Returns the parameters.
    ///
    /// After initialization these reflect adjustments made by the writer,
    /// such as the end marker forced on for an unknown size.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Number of uncompressed bytes accepted so far.
    pub fn processed(&self) -> u64 {
        match &self.state {
            WriterState::Active(enc) => enc.compressed() + enc.dict().buffered() as u64,
            WriterState::Closed { processed, .. } => *processed,
            WriterState::Uninitialized(_) | WriterState::Failed(_) => 0,
        }
    }

    /// Whether the stream has been closed successfully.
    pub fn is_closed(&self) -> bool {
        matches!(self.state, WriterState::Closed { .. })
    }

    /// Returns a reference to the sink.
    ///
    /// Bytes held by the buffering adapter are not visible until close.
    /// Returns `None` only if initialization failed after taking the sink.
    pub fn get_ref(&self) -> Option<&W> {
        match &self.state {
            WriterState::Uninitialized(out) | WriterState::Closed { out, .. } => {
                Some(out.get_ref())
            }
            WriterState::Active(enc) => Some(enc.get_ref().get_ref()),
            WriterState::Failed(out) => out.as_ref().map(Output::get_ref),
        }
    }

    /// Writes as much of `data` as the declared size allows.
    ///
    /// Returns the number of bytes accepted. When `data` exceeds the
    /// remaining budget, the tail is dropped and
    /// [`Error::NoSpace`] reports how many bytes were taken; an I/O error
    /// from the sink takes precedence.
    ///
    /// # Errors
    ///
    /// Also returns configuration errors from initialization and
    /// [`Error::WriterClosed`] after close or a failed initialization.
    ///
    /// On [`Error::Io`] part of `data` may already sit in the dictionary.
    /// Those bytes count as accepted and are included in
    /// [`processed`](Self::processed).
    pub fn try_write(&mut self, data: &[u8]) -> Result<usize> {
        let declared = self.params.declared_size();
        let encoder = self.active()?;

        let mut input = data;
        if let Some(size) = declared {
            let processed = encoder.compressed() + encoder.dict().buffered() as u64;
            let remaining = size.saturating_sub(processed);
            if input.len() as u64 > remaining {
                input = &input[..remaining as usize];
            }
        }

        let before = encoder.compressed() + encoder.dict().buffered() as u64;
        let accepted = match encoder.write(input) {
            Ok(n) => n,
            Err(e) => {
                let taken = encoder.compressed() + encoder.dict().buffered() as u64 - before;
                log::warn!("sink failed after accepting {} of {} bytes", taken, data.len());
                return Err(e);
            }
        };
        if input.len() < data.len() {
            log::warn!(
                "declared size reached: accepted {} of {} bytes",
                accepted,
                data.len()
            );
            return Err(Error::NoSpace { accepted });
        }
        Ok(accepted)
    }

    /// Finishes the stream.
    ///
    /// Initializes the writer first if nothing was written, so an empty
    /// payload still produces a complete stream. With a declared size, the
    /// number of processed bytes must match it exactly; on
    /// [`Error::SizeMismatch`] the writer stays open and more data may be
    /// supplied. Closing a closed writer does nothing.
    ///
    /// The encoder is finished before the buffering adapter is flushed. The
    /// flush runs even if finishing failed, and the encoder error is the
    /// one reported.
    pub fn close(&mut self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let declared = self.params.declared_size();
        let encoder = self.active()?;

        let processed = encoder.compressed() + encoder.dict().buffered() as u64;
        if let Some(size) = declared {
            if processed != size {
                log::warn!(
                    "size mismatch at close: declared {}, processed {}",
                    size,
                    processed
                );
                return Err(Error::SizeMismatch {
                    declared: size,
                    processed,
                });
            }
        }

        let finished = encoder.close();
        let flushed = encoder.get_mut().flush_adapter().map_err(Error::Io);
        finished.and(flushed)?;

        log::debug!(
            "closed LZMA stream: {} bytes in, {} bytes out",
            processed,
            HEADER_LEN as u64 + encoder.written()
        );

        if let WriterState::Active(enc) = mem::replace(&mut self.state, WriterState::Failed(None))
        {
            self.state = WriterState::Closed {
                out: enc.into_inner(),
                processed,
            };
        }
        Ok(())
    }

    /// Closes the stream and returns the sink.
    pub fn finish(mut self) -> Result<W> {
        self.close()?;
        self.into_inner()
    }

    /// Returns the sink without closing the stream.
    ///
    /// Bytes still held by the encoder or the buffering adapter are lost.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WriterClosed`] if a failed initialization consumed
    /// the sink.
    pub fn into_inner(self) -> Result<W> {
        let out = match self.state {
            WriterState::Uninitialized(out) | WriterState::Closed { out, .. } => out,
            WriterState::Active(enc) => enc.into_inner(),
            WriterState::Failed(out) => out.ok_or(Error::WriterClosed)?,
        };
        Ok(out.into_inner())
    }

    /// Returns the encoder, initializing the writer on first use.
    fn active(&mut self) -> Result<&mut LzmaEncoder<Output<W>>> {
        if matches!(self.state, WriterState::Uninitialized(_)) {
            self.init()?;
        }
        match &mut self.state {
            WriterState::Active(enc) => Ok(&mut **enc),
            _ => Err(Error::WriterClosed),
        }
    }

    fn init(&mut self) -> Result<()> {
        let out = match mem::replace(&mut self.state, WriterState::Failed(None)) {
            WriterState::Uninitialized(out) => out,
            other => {
                self.state = other;
                return Ok(());
            }
        };

        let (state, dict) = match self.prepare() {
            Ok(parts) => parts,
            Err(e) => {
                self.state = WriterState::Failed(Some(out));
                return Err(e);
            }
        };
        let flags = EncoderFlags {
            eos_marker: self.params.eos_marker,
        };
        let buffered = out.is_buffered();
        let mut encoder = LzmaEncoder::new(out, state, dict, flags)?;

        if let Err(e) = write_header(encoder.get_mut(), &self.params) {
            self.state = WriterState::Failed(Some(encoder.into_inner()));
            return Err(e);
        }

        log::debug!(
            "initialized LZMA writer: {}, dict_cap={}, size={}, eos_marker={}, buffered={}",
            self.params.properties,
            self.params.dict_cap,
            self.params.size,
            self.params.eos_marker,
            buffered
        );
        self.state = WriterState::Active(Box::new(encoder));
        Ok(())
    }

    /// Validates the parameters and builds the encoder collaborators.
    fn prepare(&mut self) -> Result<(LzmaState, EncoderDict)> {
        let params = &mut self.params;
        params.properties.verify()?;

        if params.dict_cap < MIN_DICT_CAP || params.dict_cap as u64 > MAX_DICT_CAP {
            return Err(Error::DictCapOutOfRange {
                dict_cap: params.dict_cap,
                min: MIN_DICT_CAP,
                max: MAX_DICT_CAP,
            });
        }
        if params.size < 0 {
            params.eos_marker = true;
        }
        if params.buf_size < MAX_MATCH_LEN {
            return Err(Error::InvalidConfig(format!(
                "lookahead buffer of {} bytes is smaller than the longest match ({})",
                params.buf_size, MAX_MATCH_LEN
            )));
        }
        let total = params.dict_cap.checked_add(params.buf_size).ok_or_else(|| {
            Error::InvalidConfig("dictionary plus lookahead size overflows".into())
        })?;

        let state = LzmaState::new(params.properties);
        let dict = EncoderDict::new(params.dict_cap, total)?;
        Ok((state, dict))
    }
}

impl<W: ByteWriter> Writer<W> {
    /// Creates a writer that writes to `sink` without a buffering adapter.
    pub fn unbuffered(sink: W, params: Parameters) -> Self {
        Self {
            params,
            state: WriterState::Uninitialized(Output::direct(sink)),
        }
    }
}

impl Writer<File> {
    /// Creates the file at `path` and returns a writer for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>, params: Parameters) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        Ok(Self::with_params(file, params))
    }
}

impl<W: Write> Write for Writer<W> {
    /// Writes within the declared size.
    ///
    /// A write truncated by the budget is reported as a short write; a write
    /// with no budget left fails with [`io::ErrorKind::WriteZero`].
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.try_write(buf) {
            Ok(n) => Ok(n),
            Err(Error::NoSpace { accepted }) if accepted > 0 => Ok(accepted),
            Err(e) => Err(e.into()),
        }
    }

    /// Hands finished compressed bytes to the sink.
    ///
    /// Input held as lookahead is not forced out; only [`Writer::close`]
    /// does that.
    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state {
            WriterState::Active(enc) => enc.flush().map_err(io::Error::from),
            _ => Ok(()),
        }
    }
}
