//! Streaming classic LZMA encoder.
//!
//! [`LzmaEncoder`] ties the pieces of the codec together: input bytes land in
//! the [`EncoderDict`], a greedy parser turns them into literals, matches and
//! reps coded through [`LzmaState`], and the [`RangeEncoder`] output is
//! drained into the sink after every call.
//!
//! The encoder writes only the compressed payload. The 13-byte stream header
//! is the caller's responsibility.

use std::io::Write;

use crate::{Error, Result};

use super::dict::EncoderDict;
use super::lzma_context::{LzmaState, MAX_MATCH_LEN, MIN_MATCH_LEN};
use super::lzma_rc::RangeEncoder;

/// Options of the encoder that are not part of the model properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderFlags {
    /// Emit the end-of-stream marker when the encoder is closed.
    pub eos_marker: bool,
}

/// Classic LZMA encoder writing raw range-coded data to `W`.
#[derive(Debug)]
pub struct LzmaEncoder<W: Write> {
    out: W,
    state: LzmaState,
    dict: EncoderDict,
    rc: RangeEncoder,
    flags: EncoderFlags,
    finished: bool,
}

impl<W: Write> LzmaEncoder<W> {
    /// Creates an encoder from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the dictionary has already seen
    /// input.
    pub fn new(out: W, state: LzmaState, dict: EncoderDict, flags: EncoderFlags) -> Result<Self> {
        if dict.pos() != 0 || dict.buffered() != 0 {
            return Err(Error::InvalidConfig(
                "encoder dictionary must be empty".into(),
            ));
        }
        Ok(Self {
            out,
            state,
            dict,
            rc: RangeEncoder::new(),
            flags,
            finished: false,
        })
    }

    /// Number of input bytes already coded.
    pub fn compressed(&self) -> u64 {
        self.dict.pos()
    }

    /// Returns the dictionary.
    pub fn dict(&self) -> &EncoderDict {
        &self.dict
    }

    /// Number of compressed bytes handed to the sink so far.
    pub fn written(&self) -> u64 {
        self.rc.written()
    }

    /// Accepts `data` and returns the number of bytes consumed.
    ///
    /// All of `data` is consumed unless the sink fails.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.finished {
            return Err(Error::WriterClosed);
        }

        let mut n = 0;
        while n < data.len() {
            let k = self.dict.write(&data[n..]);
            n += k;
            if k == 0 {
                self.compress(false);
                self.rc.drain_into(&mut self.out)?;
            }
        }
        self.compress(false);
        self.rc.drain_into(&mut self.out)?;
        Ok(n)
    }

    /// Drains finished bytes and flushes the sink.
    ///
    /// Input still held as lookahead stays buffered.
    pub fn flush(&mut self) -> Result<()> {
        self.rc.drain_into(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// Codes all buffered input, writes the end marker if configured and
    /// flushes the range coder.
    ///
    /// Calling `close` again only retries draining output that the sink
    /// previously refused.
    pub fn close(&mut self) -> Result<()> {
        if !self.finished {
            self.compress(true);
            if self.flags.eos_marker {
                self.state.encode_end_marker(&mut self.rc, self.dict.pos());
            }
            self.rc.finish();
            self.finished = true;
        }
        self.rc.drain_into(&mut self.out)?;
        Ok(())
    }

    /// Returns a reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    /// Returns a mutable reference to the sink.
    ///
    /// Writing to the sink directly interleaves with coded output.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Consumes the encoder and returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Codes tokens until less than a full match of lookahead remains, or
    /// until the dictionary is empty when `all` is set.
    fn compress(&mut self, all: bool) {
        loop {
            let avail = self.dict.buffered();
            if avail == 0 || (!all && avail < MAX_MATCH_LEN) {
                break;
            }
            self.encode_token();
        }
    }

    fn encode_token(&mut self) {
        let pos = self.dict.pos();
        let limit = self.dict.buffered().min(MAX_MATCH_LEN);
        let rep0 = self.state.reps()[0];
        let rep_len = self.dict.match_len(rep0, limit);
        let best = self.dict.find_match(limit);

        if rep_len >= MIN_MATCH_LEN && rep_len + 1 >= best.map_or(0, |m| m.len) {
            self.state.encode_rep(&mut self.rc, 0, rep_len as u32, pos);
            self.dict.advance(rep_len);
        } else if let Some(m) = best {
            self.state.encode_match(&mut self.rc, m.dist, m.len as u32, pos);
            self.dict.advance(m.len);
        } else if rep_len == 1 {
            self.state.encode_rep(&mut self.rc, 0, 1, pos);
            self.dict.advance(1);
        } else {
            let byte = self.dict.current();
            let prev_byte = self.dict.byte_back(1);
            let match_byte = (!self.state.is_literal_state())
                .then(|| self.dict.byte_back(rep0 as usize + 1));
            self.state
                .encode_literal(&mut self.rc, byte, pos, prev_byte, match_byte);
            self.dict.advance(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Properties;

    fn encoder(eos: bool) -> LzmaEncoder<Vec<u8>> {
        let dict = EncoderDict::new(4096, 4096 + 4096).unwrap();
        let state = LzmaState::new(Properties::default());
        LzmaEncoder::new(Vec::new(), state, dict, EncoderFlags { eos_marker: eos }).unwrap()
    }

    #[test]
    fn test_rejects_used_dict() {
        let mut dict = EncoderDict::new(4096, 8192).unwrap();
        dict.write(b"x");
        let state = LzmaState::new(Properties::default());
        let result = LzmaEncoder::new(Vec::new(), state, dict, EncoderFlags::default());
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_stream() {
        let mut enc = encoder(false);
        enc.close().unwrap();
        assert_eq!(enc.into_inner(), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_eos_marker_adds_bytes() {
        let mut enc = encoder(true);
        enc.close().unwrap();
        let out = enc.into_inner();
        assert!(out.len() > 5);
        assert_eq!(out[0], 0);
    }

    #[test]
    fn test_short_input_stays_buffered() {
        let mut enc = encoder(false);
        assert_eq!(enc.write(b"hello").unwrap(), 5);
        assert_eq!(enc.compressed(), 0);
        assert_eq!(enc.dict().buffered(), 5);

        enc.close().unwrap();
        assert_eq!(enc.compressed(), 5);
        assert_eq!(enc.dict().buffered(), 0);
    }

    #[test]
    fn test_progress_accounting() {
        let mut enc = encoder(false);
        let data: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 253) as u8).collect();
        assert_eq!(enc.write(&data).unwrap(), data.len());
        assert_eq!(
            enc.compressed() + enc.dict().buffered() as u64,
            data.len() as u64
        );
        assert!(enc.dict().buffered() < MAX_MATCH_LEN);
    }

    #[test]
    fn test_repetitive_input_compresses() {
        let mut enc = encoder(true);
        let data = b"abcabcabc".repeat(1000);
        enc.write(&data).unwrap();
        enc.close().unwrap();
        assert!(enc.into_inner().len() < data.len() / 20);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut enc = encoder(true);
        enc.write(b"some data").unwrap();
        enc.close().unwrap();
        let len = enc.get_ref().len();
        enc.close().unwrap();
        assert_eq!(enc.get_ref().len(), len);
        assert!(matches!(enc.write(b"more"), Err(Error::WriterClosed)));
    }
}
