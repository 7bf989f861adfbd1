//! Parameters describing one classic LZMA stream.

use super::properties::Properties;

/// Smallest dictionary capacity accepted by the writer (4 KiB).
pub const MIN_DICT_CAP: usize = 1 << 12;

/// Largest dictionary capacity representable in the header (4 GiB - 1).
pub const MAX_DICT_CAP: u64 = (1 << 32) - 1;

/// Default dictionary capacity used by the writer (8 MiB).
pub const DEFAULT_DICT_CAP: usize = 8 * 1024 * 1024;

/// Default lookahead buffer size used by the writer.
pub const DEFAULT_BUF_SIZE: usize = 4096;

/// Declared size value meaning "unknown, terminated by an end marker".
pub const SIZE_UNKNOWN: i64 = -1;

/// Full description of a classic LZMA stream.
///
/// Used both as writer configuration and as the result of decoding a stream
/// header.
///
/// # Example
///
/// ```rust
/// use lzclassic::{Parameters, Properties};
///
/// let params = Parameters::default()
///     .with_properties(Properties::new(0, 2, 0))
///     .with_dict_cap(1 << 16)
///     .with_size(1024);
///
/// assert_eq!(params.declared_size(), Some(1024));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    /// LZMA model shape.
    pub properties: Properties,
    /// Dictionary capacity in bytes.
    pub dict_cap: usize,
    /// Uncompressed size; negative if unknown.
    pub size: i64,
    /// Minimum size of the lookahead buffer; 0 means unset.
    pub buf_size: usize,
    /// Whether an explicit end-of-stream marker is written.
    pub eos_marker: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            properties: Properties::default(),
            dict_cap: DEFAULT_DICT_CAP,
            size: SIZE_UNKNOWN,
            buf_size: DEFAULT_BUF_SIZE,
            eos_marker: true,
        }
    }
}

impl Parameters {
    /// Creates the default writer parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model properties.
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the dictionary capacity.
    pub fn with_dict_cap(mut self, dict_cap: usize) -> Self {
        self.dict_cap = dict_cap;
        self
    }

    /// Declares the uncompressed size. Pass [`SIZE_UNKNOWN`] for none.
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    /// Sets the lookahead buffer size.
    pub fn with_buf_size(mut self, buf_size: usize) -> Self {
        self.buf_size = buf_size;
        self
    }

    /// Requests or suppresses the end-of-stream marker.
    ///
    /// The marker is always written when the size is unknown.
    pub fn with_eos_marker(mut self, eos_marker: bool) -> Self {
        self.eos_marker = eos_marker;
        self
    }

    /// Returns the declared uncompressed size, if any.
    pub fn declared_size(&self) -> Option<u64> {
        u64::try_from(self.size).ok()
    }

    /// Normalizes parameters freshly decoded from a header for use by a
    /// decoder.
    ///
    /// Raises the dictionary capacity to [`MIN_DICT_CAP`], forces the end
    /// marker on when the size is unknown, and defaults an unset buffer size
    /// to the dictionary capacity. Never fails.
    pub fn normalize_for_decoding(&mut self) {
        if self.dict_cap < MIN_DICT_CAP {
            self.dict_cap = MIN_DICT_CAP;
        }
        if self.size < 0 {
            self.eos_marker = true;
        }
        if self.buf_size == 0 {
            self.buf_size = self.dict_cap;
        }
    }
}
