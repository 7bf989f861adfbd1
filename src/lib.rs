//! # lzclassic
//!
//! A pure-Rust writer for classic `.lzma` streams.
//!
//! A classic LZMA stream is a 13-byte header (the lc/lp/pb properties byte,
//! the dictionary capacity, and the uncompressed size) followed by the raw
//! range-coded payload. This crate provides:
//!
//! - the header codec ([`read_header`], [`write_header`] and their pure
//!   counterparts in [`format`]),
//! - [`Properties`] and [`Parameters`] with validation and normalization,
//! - the adaptive probability model used by the range coder ([`codec::Prob`],
//!   [`codec::ProbTree`]),
//! - a streaming [`Writer`] that enforces a declared uncompressed size.
//!
//! ## Quick Start
//!
//! ```rust
//! use lzclassic::{Parameters, Result, Writer, read_header};
//!
//! fn main() -> Result<()> {
//!     let data = b"the quick brown fox jumps over the lazy dog";
//!
//!     let params = Parameters::default()
//!         .with_dict_cap(1 << 16)
//!         .with_size(data.len() as i64)
//!         .with_eos_marker(false);
//!     let mut writer = Writer::with_params(Vec::new(), params);
//!     writer.try_write(data)?;
//!     let stream = writer.finish()?;
//!
//!     let header = read_header(&mut stream.as_slice())?;
//!     assert_eq!(header.size, data.len() as i64);
//!     assert_eq!(header.dict_cap, 1 << 16);
//!     Ok(())
//! }
//! ```
//!
//! ## Unknown size
//!
//! With a negative size the header carries the "unknown" sentinel and the
//! writer always terminates the payload with an end-of-stream marker:
//!
//! ```rust
//! use std::io::Write;
//! use lzclassic::Writer;
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_all(b"streamed without a known length")?;
//! let stream = writer.finish()?;
//! assert_eq!(&stream[5..13], &[0xFF; 8]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade: writer setup and close at
//! `debug`, budget truncation and size mismatches at `warn`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod codec;
pub mod error;
pub mod format;
pub mod write;

pub use error::{Error, Result};
pub use format::{
    HEADER_LEN, MAX_DICT_CAP, MIN_DICT_CAP, Parameters, Properties, SIZE_UNKNOWN, decode_header,
    encode_header, read_header, read_params, write_header,
};
pub use write::{ByteWriter, Writer};
