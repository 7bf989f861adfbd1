//! Error types for classic LZMA stream operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when reading headers or writing `.lzma` streams, along with
//! a convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. The
//! declared-size contract produces two distinct variants so callers can tell
//! "your input was truncated" apart from "the sink failed":
//!
//! ```rust
//! use lzclassic::{Error, Parameters, Writer};
//!
//! let params = Parameters::default().with_size(4);
//! let mut writer = Writer::with_params(Vec::new(), params);
//!
//! match writer.try_write(b"hello") {
//!     Err(Error::NoSpace { accepted }) => assert_eq!(accepted, 4),
//!     other => panic!("unexpected result: {:?}", other),
//! }
//! writer.close().unwrap();
//! ```

use std::io;

/// The main error type for classic LZMA operations.
///
/// # Error Categories
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | Sink or source failures |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`InvalidProperties`][Self::InvalidProperties] | Invalid header data |
/// | Configuration | [`DictCapOutOfRange`][Self::DictCapOutOfRange], [`InvalidConfig`][Self::InvalidConfig] | Bad writer parameters |
/// | Budget | [`NoSpace`][Self::NoSpace], [`SizeMismatch`][Self::SizeMismatch] | Declared size violated |
/// | State | [`WriterClosed`][Self::WriterClosed] | Use after close |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred in the underlying sink or source.
    ///
    /// Errors are propagated unchanged and never retried by this crate.
    /// A header read that hits end of input surfaces here with
    /// [`io::ErrorKind::UnexpectedEof`].
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream header is malformed.
    ///
    /// Returned for a dictionary capacity that does not fit the capacity
    /// type or exceeds the maximum, and for an uncompressed size outside the
    /// signed 64-bit range.
    #[error("Invalid LZMA format: {0}")]
    InvalidFormat(String),

    /// The lc/lp/pb triple, or the single byte encoding it, is out of range.
    #[error("Invalid LZMA properties: {0}")]
    InvalidProperties(String),

    /// The writer's dictionary capacity lies outside the supported range.
    #[error("Dictionary capacity {dict_cap} out of range [{min}, {max}]")]
    DictCapOutOfRange {
        /// The requested dictionary capacity.
        dict_cap: usize,
        /// Smallest accepted capacity.
        min: usize,
        /// Largest accepted capacity.
        max: u64,
    },

    /// The writer or encoder configuration is inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input exceeds the declared uncompressed size.
    ///
    /// The writer accepted `accepted` bytes of the call and silently dropped
    /// the rest. The truncated tail is not buffered for a later call.
    #[error("Declared uncompressed size exhausted: accepted {accepted} bytes")]
    NoSpace {
        /// Number of bytes of the call that were accepted.
        accepted: usize,
    },

    /// At close, the number of bytes written differs from the declared size.
    ///
    /// # Recovery
    ///
    /// The writer stays active. Supply the missing bytes and close again.
    #[error("Uncompressed size mismatch: declared {declared}, processed {processed}")]
    SizeMismatch {
        /// The size declared in the header.
        declared: u64,
        /// The number of bytes actually accepted.
        processed: u64,
    },

    /// The writer was closed, or its initialization failed earlier.
    #[error("Writer is closed")]
    WriterClosed,
}

/// A specialized Result type for classic LZMA operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::NoSpace { .. } => io::Error::new(io::ErrorKind::WriteZero, err),
            Error::InvalidFormat(_) | Error::InvalidProperties(_) => {
                io::Error::new(io::ErrorKind::InvalidData, err)
            }
            Error::DictCapOutOfRange { .. } | Error::InvalidConfig(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            other => io::Error::other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_passes_through() {
        let err = Error::Io(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        let io_err: io::Error = err.into();
        assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_no_space_maps_to_write_zero() {
        let io_err: io::Error = Error::NoSpace { accepted: 0 }.into();
        assert_eq!(io_err.kind(), io::ErrorKind::WriteZero);
    }

    #[test]
    fn test_size_mismatch_display() {
        let err = Error::SizeMismatch {
            declared: 10,
            processed: 7,
        };
        assert_eq!(
            err.to_string(),
            "Uncompressed size mismatch: declared 10, processed 7"
        );
    }

    #[test]
    fn test_dict_cap_display() {
        let err = Error::DictCapOutOfRange {
            dict_cap: 4095,
            min: 4096,
            max: u32::MAX as u64,
        };
        assert!(err.to_string().contains("4095"));
    }
}
