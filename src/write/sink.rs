//! Sink handling for the stream writer.
//!
//! The encoder emits many small writes. Sinks that absorb those cheaply
//! implement [`ByteWriter`] and are used directly; every other sink is
//! wrapped in a [`BufWriter`] that the writer flushes at close.

use std::io::{self, BufWriter, Cursor, LineWriter, Write};

/// Marker for sinks that handle single-byte writes efficiently.
///
/// Implemented for in-memory sinks and for buffered writers. Pass such a
/// sink to [`Writer::unbuffered`](crate::Writer::unbuffered) to skip the
/// extra buffering layer.
pub trait ByteWriter: Write {}

impl ByteWriter for Vec<u8> {}
impl ByteWriter for Cursor<Vec<u8>> {}
impl ByteWriter for Cursor<&mut Vec<u8>> {}
impl ByteWriter for Cursor<&mut [u8]> {}
impl ByteWriter for io::Sink {}
impl<W: Write> ByteWriter for BufWriter<W> {}
impl<W: Write> ByteWriter for LineWriter<W> {}
impl<T: ByteWriter + ?Sized> ByteWriter for &mut T {}
impl<T: ByteWriter + ?Sized> ByteWriter for Box<T> {}

/// The sink as seen by the encoder.
#[derive(Debug)]
pub(crate) enum Output<W: Write> {
    /// The sink is written directly.
    Direct(W),
    /// The sink sits behind a buffering adapter.
    Buffered(BufWriter<W>),
}

impl<W: Write> Output<W> {
    pub(crate) fn direct(sink: W) -> Self {
        Self::Direct(sink)
    }

    pub(crate) fn buffered(sink: W) -> Self {
        Self::Buffered(BufWriter::new(sink))
    }

    pub(crate) fn is_buffered(&self) -> bool {
        matches!(self, Self::Buffered(_))
    }

    pub(crate) fn get_ref(&self) -> &W {
        match self {
            Self::Direct(w) => w,
            Self::Buffered(w) => w.get_ref(),
        }
    }

    /// Flushes the buffering adapter, if any, down to the sink.
    ///
    /// A direct sink is left alone.
    pub(crate) fn flush_adapter(&mut self) -> io::Result<()> {
        match self {
            Self::Direct(_) => Ok(()),
            Self::Buffered(w) => w.flush(),
        }
    }

    /// Returns the sink, discarding anything still held by the adapter.
    pub(crate) fn into_inner(self) -> W {
        match self {
            Self::Direct(w) => w,
            Self::Buffered(w) => {
                let (inner, unflushed) = w.into_parts();
                match unflushed {
                    Ok(buf) if !buf.is_empty() => {
                        log::warn!("discarding {} unflushed bytes", buf.len());
                    }
                    _ => {}
                }
                inner
            }
        }
    }
}

impl<W: Write> Write for Output<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Direct(w) => w.write(buf),
            Self::Buffered(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            Self::Direct(w) => w.write_all(buf),
            Self::Buffered(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Direct(w) => w.flush(),
            Self::Buffered(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_byte_writer<W: ByteWriter>(_: &W) {}

    #[test]
    fn test_byte_writer_impls() {
        let mut vec = Vec::new();
        assert_byte_writer(&vec);
        assert_byte_writer(&Cursor::new(Vec::new()));
        assert_byte_writer(&Cursor::new(&mut vec));
        assert_byte_writer(&BufWriter::new(io::sink()));
        assert_byte_writer(&&mut vec);
    }

    #[test]
    fn test_buffered_holds_until_flush() {
        let mut out = Output::buffered(Vec::new());
        out.write_all(b"abc").unwrap();
        assert!(out.get_ref().is_empty());
        out.flush_adapter().unwrap();
        assert_eq!(out.get_ref(), b"abc");
    }

    #[test]
    fn test_direct_passthrough() {
        let mut out = Output::direct(Vec::new());
        assert!(!out.is_buffered());
        out.write_all(b"abc").unwrap();
        assert_eq!(out.into_inner(), b"abc");
    }
}
