//! The 13-byte classic LZMA stream header.
//!
//! Layout (little-endian throughout):
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 1 | Properties code (lc, lp, pb) |
//! | 1 | 4 | Dictionary capacity |
//! | 5 | 8 | Uncompressed size, or `u64::MAX` if unknown |

use std::io::{Read, Write};

use crate::{Error, Result};

use super::params::{MAX_DICT_CAP, Parameters, SIZE_UNKNOWN};
use super::properties::Properties;

/// Length of the classic LZMA header in bytes.
pub const HEADER_LEN: usize = 13;

/// Size field value marking a stream terminated by an end marker.
pub const NO_SIZE: u64 = u64::MAX;

/// Serializes the header for `params`.
///
/// A dictionary capacity of 0 is accepted here; the writer enforces the
/// stricter minimum separately.
///
/// # Errors
///
/// Returns [`Error::InvalidProperties`] if the properties are out of range
/// and [`Error::InvalidFormat`] if the dictionary capacity exceeds
/// [`MAX_DICT_CAP`].
pub fn encode_header(params: &Parameters) -> Result<[u8; HEADER_LEN]> {
    params.properties.verify()?;
    let dict_cap = u32::try_from(params.dict_cap)
        .ok()
        .filter(|&cap| cap as u64 <= MAX_DICT_CAP)
        .ok_or_else(|| {
            Error::InvalidFormat(format!(
                "dictionary capacity {} out of range [0, {}]",
                params.dict_cap, MAX_DICT_CAP
            ))
        })?;
    let size = params.declared_size().unwrap_or(NO_SIZE);

    let mut buf = [0u8; HEADER_LEN];
    buf[0] = params.properties.code();
    buf[1..5].copy_from_slice(&dict_cap.to_le_bytes());
    buf[5..13].copy_from_slice(&size.to_le_bytes());
    Ok(buf)
}

/// Parses a header from its 13 raw bytes.
///
/// The size sentinel decodes to `size == -1` with the end marker set. The
/// buffer size is set to the dictionary capacity.
///
/// # Errors
///
/// Returns [`Error::InvalidProperties`] for an invalid properties byte and
/// [`Error::InvalidFormat`] if the capacity or size do not fit their
/// in-memory representation.
pub fn decode_header(buf: &[u8; HEADER_LEN]) -> Result<Parameters> {
    let properties = Properties::from_code(buf[0])?;

    let raw_cap = u32::from_le_bytes(buf[1..5].try_into().unwrap());
    let dict_cap = usize::try_from(raw_cap).map_err(|_| {
        Error::InvalidFormat(format!(
            "dictionary capacity {} exceeds maximum integer",
            raw_cap
        ))
    })?;

    let raw_size = u64::from_le_bytes(buf[5..13].try_into().unwrap());
    let (size, eos_marker) = if raw_size == NO_SIZE {
        (SIZE_UNKNOWN, true)
    } else {
        let size = i64::try_from(raw_size).map_err(|_| {
            Error::InvalidFormat(format!(
                "uncompressed size {} out of int64 range",
                raw_size
            ))
        })?;
        (size, false)
    };

    Ok(Parameters {
        properties,
        dict_cap,
        size,
        buf_size: dict_cap,
        eos_marker,
    })
}

/// Reads and parses a classic LZMA header.
///
/// # Errors
///
/// A short read is returned as [`Error::Io`] unchanged; otherwise see
/// [`decode_header`].
pub fn read_header<R: Read>(r: &mut R) -> Result<Parameters> {
    let mut buf = [0u8; HEADER_LEN];
    r.read_exact(&mut buf)?;
    let params = decode_header(&buf)?;
    log::debug!(
        "read LZMA header: {}, dict_cap={}, size={}",
        params.properties,
        params.dict_cap,
        params.size
    );
    Ok(params)
}

/// Reads a header and normalizes it for decoding.
///
/// Convenience for decoders: [`read_header`] followed by
/// [`Parameters::normalize_for_decoding`].
pub fn read_params<R: Read>(r: &mut R) -> Result<Parameters> {
    let mut params = read_header(r)?;
    params.normalize_for_decoding();
    Ok(params)
}

/// Writes the header for `params` in a single write.
///
/// # Errors
///
/// See [`encode_header`]; I/O failures are propagated unchanged.
pub fn write_header<W: Write>(w: &mut W, params: &Parameters) -> Result<()> {
    let buf = encode_header(params)?;
    w.write_all(&buf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::params::MIN_DICT_CAP;
    use std::io::Cursor;

    #[test]
    fn test_known_layout() {
        let params = Parameters::default().with_dict_cap(1 << 16).with_size(300);
        let buf = encode_header(&params).unwrap();
        assert_eq!(
            buf,
            [0x5D, 0x00, 0x00, 0x01, 0x00, 0x2C, 0x01, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_unknown_size_uses_sentinel() {
        let params = Parameters::default();
        let buf = encode_header(&params).unwrap();
        assert!(buf[5..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_sentinel_decodes_to_unknown_size() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = 0x5D;
        buf[5..].fill(0xFF);
        let params = decode_header(&buf).unwrap();
        assert_eq!(params.size, SIZE_UNKNOWN);
        assert!(params.eos_marker);
    }

    #[test]
    fn test_size_out_of_i64_range() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = 0x5D;
        buf[5..13].copy_from_slice(&(1u64 << 63).to_le_bytes());
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_properties_byte() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = 225;
        let err = decode_header(&buf).unwrap_err();
        assert!(matches!(err, Error::InvalidProperties(_)));
    }

    #[test]
    fn test_truncated_header() {
        let mut cursor = Cursor::new(vec![0x5D, 0, 0, 1]);
        let err = read_header(&mut cursor).unwrap_err();
        match err {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("expected I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_dict_cap_accepted_by_encoder() {
        let params = Parameters::default().with_dict_cap(0);
        assert!(encode_header(&params).is_ok());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_dict_cap_above_max_rejected() {
        let params = Parameters::default().with_dict_cap(MAX_DICT_CAP as usize + 1);
        let err = encode_header(&params).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }

    #[test]
    fn test_invalid_properties_rejected_before_write() {
        let params = Parameters::default().with_properties(Properties::new(9, 0, 0));
        let mut out = Vec::new();
        let err = write_header(&mut out, &params).unwrap_err();
        assert!(matches!(err, Error::InvalidProperties(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_read_roundtrip() {
        let params = Parameters::default()
            .with_properties(Properties::new(1, 2, 3))
            .with_dict_cap(MIN_DICT_CAP)
            .with_size(12345)
            .with_eos_marker(false);
        let mut out = Vec::new();
        write_header(&mut out, &params).unwrap();
        assert_eq!(out.len(), HEADER_LEN);

        let decoded = read_header(&mut Cursor::new(out)).unwrap();
        assert_eq!(decoded.properties, params.properties);
        assert_eq!(decoded.dict_cap, params.dict_cap);
        assert_eq!(decoded.size, 12345);
        assert!(!decoded.eos_marker);
    }

    #[test]
    fn test_read_params_normalizes() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0] = 0x5D;
        buf[1..5].copy_from_slice(&16u32.to_le_bytes());
        buf[5..].fill(0xFF);
        let params = read_params(&mut Cursor::new(buf)).unwrap();
        assert_eq!(params.dict_cap, MIN_DICT_CAP);
        assert_eq!(params.buf_size, 16);
        assert!(params.eos_marker);
    }
}
