//! LZMA model properties (lc, lp, pb) and their single-byte encoding.

use std::fmt;

use crate::{Error, Result};

/// Largest supported number of literal context bits.
pub const MAX_LC: u32 = 8;

/// Largest supported number of literal position bits.
pub const MAX_LP: u32 = 4;

/// Largest supported number of position bits.
pub const MAX_PB: u32 = 4;

/// Number of distinct property codes: `(MAX_PB + 1) * (MAX_LP + 1) * (MAX_LC + 1)`.
const NUM_CODES: u32 = (MAX_PB + 1) * (MAX_LP + 1) * (MAX_LC + 1);

/// Shape parameters of the LZMA context model.
///
/// The triple is stored in the stream header as one byte computed as
/// `(pb * 5 + lp) * 9 + lc`, which is losslessly recoverable with
/// [`Properties::from_code`].
///
/// # Example
///
/// ```rust
/// use lzclassic::Properties;
///
/// let props = Properties::default();
/// assert_eq!(props.code(), 0x5D);
/// assert_eq!(Properties::from_code(0x5D).unwrap(), props);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Properties {
    /// Literal context bits (0-8).
    pub lc: u32,
    /// Literal position bits (0-4).
    pub lp: u32,
    /// Position bits (0-4).
    pub pb: u32,
}

impl Properties {
    /// Creates a properties value. The triple is not validated until
    /// [`verify`](Self::verify) is called.
    pub const fn new(lc: u32, lp: u32, pb: u32) -> Self {
        Self { lc, lp, pb }
    }

    /// Checks that every field lies within its supported range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProperties`] naming the first field that is
    /// out of range.
    pub fn verify(&self) -> Result<()> {
        if self.lc > MAX_LC {
            return Err(Error::InvalidProperties(format!(
                "lc {} out of range [0, {}]",
                self.lc, MAX_LC
            )));
        }
        if self.lp > MAX_LP {
            return Err(Error::InvalidProperties(format!(
                "lp {} out of range [0, {}]",
                self.lp, MAX_LP
            )));
        }
        if self.pb > MAX_PB {
            return Err(Error::InvalidProperties(format!(
                "pb {} out of range [0, {}]",
                self.pb, MAX_PB
            )));
        }
        Ok(())
    }

    /// Returns the single-byte code for this triple.
    ///
    /// Only meaningful for properties that pass [`verify`](Self::verify).
    pub fn code(&self) -> u8 {
        ((self.pb * 5 + self.lp) * 9 + self.lc) as u8
    }

    /// Decodes a properties byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProperties`] for codes of 225 and above.
    pub fn from_code(code: u8) -> Result<Self> {
        let mut x = code as u32;
        if x >= NUM_CODES {
            return Err(Error::InvalidProperties(format!(
                "properties code {:#04x} out of range",
                code
            )));
        }
        let lc = x % 9;
        x /= 9;
        let lp = x % 5;
        let pb = x / 5;
        Ok(Self { lc, lp, pb })
    }

    /// Number of position states (`1 << pb`).
    pub(crate) fn num_pos_states(&self) -> usize {
        1 << self.pb
    }
}

impl Default for Properties {
    fn default() -> Self {
        Self::new(3, 0, 2)
    }
}

impl TryFrom<u8> for Properties {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        Self::from_code(code)
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lc={} lp={} pb={}", self.lc, self.lp, self.pb)
    }
}
