//! Encoder dictionary: the sliding window plus lookahead buffer.
//!
//! The dictionary keeps up to `dict_cap` bytes of history behind the encoding
//! cursor and accepts new input until `buf_size` bytes are held in total.
//! Bytes in front of the cursor are buffered but not yet consumed by the
//! encoder.
//!
//! History that has fallen out of the window is only released once at least
//! `buf_size` bytes of it have piled up, so the backing vector grows to at
//! most twice `buf_size` and every byte is moved a bounded number of times.
//!
//! Matches are located with a hash chain over 3-byte prefixes. The chain
//! window is capped at [`CHAIN_WINDOW`] bytes, so distances never exceed
//! `min(dict_cap, CHAIN_WINDOW)`.

use std::fmt;

use crate::{Error, Result};

use super::lzma_context::MAX_MATCH_LEN;

const HASH_BITS: u32 = 16;
const HASH_SIZE: usize = 1 << HASH_BITS;

/// Largest distance the match finder searches.
pub const CHAIN_WINDOW: usize = 1 << 16;

/// Number of chain links followed per lookup.
const MAX_CHAIN_DEPTH: usize = 32;

/// A match candidate: zero-based distance and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Distance minus one.
    pub dist: u32,
    /// Number of matching bytes.
    pub len: usize,
}

/// Hash chain over absolute stream positions.
///
/// Entries store `position + 1` so that 0 means empty.
struct HashChain {
    head: Vec<u64>,
    chain: Vec<u64>,
}

impl HashChain {
    fn new() -> Self {
        Self {
            head: vec![0; HASH_SIZE],
            chain: vec![0; CHAIN_WINDOW],
        }
    }

    fn hash(bytes: &[u8]) -> usize {
        let v = bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16;
        (v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
    }

    fn insert(&mut self, pos: u64, bytes: &[u8]) {
        let h = Self::hash(bytes);
        self.chain[(pos as usize) & (CHAIN_WINDOW - 1)] = self.head[h];
        self.head[h] = pos + 1;
    }
}

impl fmt::Debug for HashChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashChain")
            .field("head_len", &self.head.len())
            .field("chain_len", &self.chain.len())
            .finish()
    }
}

/// Sliding-window dictionary with lookahead for the LZMA encoder.
#[derive(Debug)]
pub struct EncoderDict {
    buf: Vec<u8>,
    /// Absolute stream position of `buf[0]`.
    base: u64,
    /// Index into `buf` of the next byte to encode.
    cursor: usize,
    /// Absolute position of the first byte not yet in the hash chain.
    next_hash: u64,
    dict_cap: usize,
    buf_size: usize,
    max_dist: usize,
    hc: HashChain,
}

impl EncoderDict {
    /// Creates a dictionary holding `dict_cap` bytes of history within a
    /// total buffer of `buf_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `dict_cap` is 0 or the buffer
    /// leaves less than [`MAX_MATCH_LEN`] bytes of lookahead.
    pub fn new(dict_cap: usize, buf_size: usize) -> Result<Self> {
        if dict_cap == 0 {
            return Err(Error::InvalidConfig(
                "dictionary capacity must be positive".into(),
            ));
        }
        if buf_size < dict_cap.saturating_add(MAX_MATCH_LEN) {
            return Err(Error::InvalidConfig(format!(
                "dictionary buffer size {} too small for capacity {}",
                buf_size, dict_cap
            )));
        }
        Ok(Self {
            buf: Vec::new(),
            base: 0,
            cursor: 0,
            next_hash: 0,
            dict_cap,
            buf_size,
            max_dist: dict_cap.min(CHAIN_WINDOW),
            hc: HashChain::new(),
        })
    }

    /// Number of bytes written but not yet consumed by the encoder.
    pub fn buffered(&self) -> usize {
        self.buf.len() - self.cursor
    }

    /// Absolute stream position of the encoding cursor.
    pub fn pos(&self) -> u64 {
        self.base + self.cursor as u64
    }

    /// Number of bytes that can be written without consuming any.
    ///
    /// Only the last `dict_cap` bytes of history count against the buffer.
    pub fn available(&self) -> usize {
        self.buf_size - self.cursor.min(self.dict_cap) - self.buffered()
    }

    /// Copies as much of `data` as fits and returns the count.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.available());
        if n == 0 {
            return 0;
        }
        self.compact();
        self.buf.extend_from_slice(&data[..n]);
        self.index_consumed();
        n
    }

    /// Drops history older than `dict_cap` bytes behind the cursor once at
    /// least `buf_size` bytes of it have accumulated.
    fn compact(&mut self) {
        let stale = self.cursor.saturating_sub(self.dict_cap);
        if stale >= self.buf_size {
            self.buf.drain(..stale);
            self.base += stale as u64;
            self.cursor -= stale;
        }
    }

    /// Returns the byte at the cursor.
    pub fn current(&self) -> u8 {
        self.buf[self.cursor]
    }

    /// Returns the byte `dist` positions behind the cursor (`dist >= 1`).
    ///
    /// Yields 0 before the start of the stream.
    pub fn byte_back(&self, dist: usize) -> u8 {
        if dist > self.cursor {
            0
        } else {
            self.buf[self.cursor - dist]
        }
    }

    /// Length of the match at zero-based distance `dist`, limited to `limit`.
    pub fn match_len(&self, dist: u32, limit: usize) -> usize {
        let back = dist as usize + 1;
        if back > self.cursor || back > self.dict_cap {
            return 0;
        }
        let src = self.cursor - back;
        let limit = limit.min(self.buffered());
        let mut len = 0;
        while len < limit && self.buf[src + len] == self.buf[self.cursor + len] {
            len += 1;
        }
        len
    }

    /// Searches the hash chain for the longest match at the cursor.
    pub fn find_match(&self, limit: usize) -> Option<Match> {
        let limit = limit.min(self.buffered());
        if limit < 3 {
            return None;
        }
        let pos = self.pos();
        let mut link = self.hc.head[HashChain::hash(&self.buf[self.cursor..])];
        let mut best: Option<Match> = None;

        for _ in 0..MAX_CHAIN_DEPTH {
            if link == 0 {
                break;
            }
            let cand = link - 1;
            if cand >= pos || cand < self.base {
                break;
            }
            let dist = (pos - cand) as usize;
            if dist > self.max_dist {
                break;
            }
            let len = self.match_len((dist - 1) as u32, limit);
            if len > best.map_or(0, |m| m.len) {
                best = Some(Match {
                    dist: (dist - 1) as u32,
                    len,
                });
                if len == limit {
                    break;
                }
            }
            let next = self.hc.chain[(cand as usize) & (CHAIN_WINDOW - 1)];
            if next >= link {
                break;
            }
            link = next;
        }

        best.filter(|m| m.len >= 3)
    }

    /// Consumes `n` bytes at the cursor.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.buffered());
        self.cursor += n;
        self.index_consumed();
    }

    /// Adds every consumed position that has three bytes available to the
    /// hash chain.
    fn index_consumed(&mut self) {
        self.next_hash = self.next_hash.max(self.base);
        let end = self.pos().min((self.base + self.buf.len() as u64).saturating_sub(2));
        while self.next_hash < end {
            let i = (self.next_hash - self.base) as usize;
            self.hc.insert(self.next_hash, &self.buf[i..i + 3]);
            self.next_hash += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_small_buffer() {
        assert!(matches!(
            EncoderDict::new(4096, 4096),
            Err(Error::InvalidConfig(_))
        ));
        assert!(EncoderDict::new(0, 4096).is_err());
        assert!(EncoderDict::new(4096, 4096 + MAX_MATCH_LEN).is_ok());
    }

    #[test]
    fn test_write_and_buffered() {
        let mut dict = EncoderDict::new(4096, 8192).unwrap();
        assert_eq!(dict.write(b"hello"), 5);
        assert_eq!(dict.buffered(), 5);
        assert_eq!(dict.pos(), 0);

        dict.advance(2);
        assert_eq!(dict.buffered(), 3);
        assert_eq!(dict.pos(), 2);
        assert_eq!(dict.current(), b'l');
        assert_eq!(dict.byte_back(1), b'e');
        assert_eq!(dict.byte_back(5), 0);
    }

    #[test]
    fn test_write_stops_at_capacity() {
        let mut dict = EncoderDict::new(4096, 4096 + 300).unwrap();
        let data = vec![7u8; 5000];
        assert_eq!(dict.write(&data), 4396);
        assert_eq!(dict.write(&data), 0);
    }

    #[test]
    fn test_compaction_keeps_history() {
        let mut dict = EncoderDict::new(4096, 4096 + 300).unwrap();
        let data: Vec<u8> = (0..4396u32).map(|i| (i % 251) as u8).collect();
        dict.write(&data);
        dict.advance(4396 - 10);
        assert_eq!(dict.available(), 300 - 10);

        assert_eq!(dict.write(&[1, 2, 3]), 3);
        assert_eq!(dict.pos(), 4386);
        assert_eq!(dict.buffered(), 13);
        // History of dict_cap bytes survives compaction
        assert_eq!(dict.byte_back(4096), data[4386 - 4096]);
    }

    #[test]
    fn test_find_match() {
        let mut dict = EncoderDict::new(4096, 8192).unwrap();
        dict.write(b"abcdefabcdefXYZ");
        dict.advance(6);

        let m = dict.find_match(MAX_MATCH_LEN).unwrap();
        assert_eq!(m.dist, 5);
        assert_eq!(m.len, 6);
    }

    #[test]
    fn test_find_match_none_for_fresh_data() {
        let mut dict = EncoderDict::new(4096, 8192).unwrap();
        dict.write(b"abcdefghijkl");
        dict.advance(6);
        assert_eq!(dict.find_match(MAX_MATCH_LEN), None);
    }

    #[test]
    fn test_overlapping_match() {
        let mut dict = EncoderDict::new(4096, 8192).unwrap();
        dict.write(&[b'a'; 100]);
        dict.advance(1);
        assert_eq!(dict.match_len(0, MAX_MATCH_LEN), 99);
        let m = dict.find_match(MAX_MATCH_LEN);
        // Position 0 was indexed, so distance 1 is found
        assert_eq!(m, Some(Match { dist: 0, len: 99 }));
    }

    #[test]
    fn test_long_stream_moves_each_byte_a_bounded_number_of_times() {
        let dict_cap = 4096;
        let buf_size = dict_cap + MAX_MATCH_LEN;
        let mut dict = EncoderDict::new(dict_cap, buf_size).unwrap();
        let data: Vec<u8> = (0..200_000u32)
            .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
            .collect();

        let mut written = 0;
        let mut moved = 0;
        let mut compactions = 0;
        while written < data.len() {
            let base = dict.base;
            let n = dict.write(&data[written..(written + 7).min(data.len())]);
            if dict.base != base {
                compactions += 1;
                moved += dict.buf.len() - n;
            }
            written += n;
            assert!(dict.buf.len() < 2 * buf_size);
            dict.advance(dict.buffered().min(5));
            if dict.pos() >= dict_cap as u64 {
                assert_eq!(dict.byte_back(dict_cap), data[dict.pos() as usize - dict_cap]);
            }
        }

        assert!(compactions > 0);
        assert!(compactions <= data.len() / buf_size + 1);
        assert!(moved <= 2 * data.len());
    }
}
