//! Range encoder for classic LZMA payloads.
//!
//! The coder keeps the interval `[low, low + range)` and narrows it for each
//! coded bit: by the split computed from a [`Prob`] for context-modeled
//! bits, or by halving for direct bits. Whenever `range` drops below 2^24 the
//! top byte of `low` is settled and shifted out. A carry out of bit 32 may
//! still ripple into bytes already settled, so the last settled byte and any
//! run of 0xFF bytes after it are held back until the carry is known.
//!
//! Settled bytes collect in an internal buffer until the owner moves them
//! into its sink with [`RangeEncoder::drain_into`].

use std::io::{self, Write};

use super::prob::{Prob, ProbTree};

/// `range` is renormalized whenever it falls below this value.
const TOP_VALUE: u32 = 1 << 24;

/// Range encoder producing the byte stream of an LZMA payload.
///
/// The first byte written is always 0, as classic decoders expect.
#[derive(Debug)]
pub struct RangeEncoder {
    range: u32,
    low: u64,
    cache: u8,
    cache_size: u32,
    pending: Vec<u8>,
    written: u64,
}

impl RangeEncoder {
    /// Creates an encoder over the full interval.
    pub fn new() -> Self {
        Self {
            range: 0xFFFF_FFFF,
            low: 0,
            cache: 0,
            cache_size: 0,
            pending: Vec::with_capacity(4096),
            written: 0,
        }
    }

    /// Returns the number of bytes already drained to a sink.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the number of finished bytes not yet drained.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Codes `bit` against `prob` and adapts it.
    pub fn encode_bit(&mut self, prob: &mut Prob, bit: bool) {
        let bound = prob.bound(self.range);

        if bit {
            self.low += bound as u64;
            self.range -= bound;
            prob.dec();
        } else {
            self.range = bound;
            prob.inc();
        }

        self.normalize();
    }

    /// Codes `bit` with a fixed even split.
    pub fn encode_direct_bit(&mut self, bit: bool) {
        self.range >>= 1;
        if bit {
            self.low += self.range as u64;
        }
        self.normalize();
    }

    /// Encodes the low `num_bits` of `value` as direct bits, most
    /// significant first.
    pub fn encode_direct_bits(&mut self, value: u32, num_bits: u32) {
        for i in (0..num_bits).rev() {
            self.encode_direct_bit((value >> i) & 1 != 0);
        }
    }

    /// Codes `symbol` through `tree`, most significant bit first.
    ///
    /// The walk starts at slot 1; each coded bit selects the child
    /// `2m + bit` of the current slot `m`.
    pub fn encode_tree(&mut self, tree: &mut ProbTree, symbol: u32) {
        let mut m = 1usize;
        for i in (0..tree.bits()).rev() {
            let bit = (symbol >> i) & 1;
            self.encode_bit(tree.slot_mut(m), bit != 0);
            m = (m << 1) | bit as usize;
        }
    }

    /// Codes `symbol` through `tree`, least significant bit first.
    pub fn encode_reverse_tree(&mut self, tree: &mut ProbTree, symbol: u32) {
        let bits = tree.bits();
        self.encode_reverse_bits(tree.slots_mut(), 1, bits, symbol);
    }

    /// Reverse bit-tree encoding over a shared probability slice.
    ///
    /// Node `m` of the walk uses `probs[offset + m - 1]`, `m` starting at 1.
    pub fn encode_reverse_bits(
        &mut self,
        probs: &mut [Prob],
        offset: usize,
        num_bits: u32,
        symbol: u32,
    ) {
        let mut m = 1usize;
        for i in 0..num_bits {
            let bit = (symbol >> i) & 1;
            self.encode_bit(&mut probs[offset + m - 1], bit != 0);
            m = (m << 1) | bit as usize;
        }
    }

    fn normalize(&mut self) {
        while self.range < TOP_VALUE {
            self.shift_low();
            self.range <<= 8;
        }
    }

    /// Settles the top byte of `low`.
    ///
    /// `cache` holds the last settled byte and `cache_size` counts the 0xFF
    /// bytes pending after it. Both are released once bit 32 of `low` tells
    /// whether a carry reached them.
    fn shift_low(&mut self) {
        let overflow = (self.low >> 32) as u8;
        let low32 = self.low as u32;

        if (low32 < 0xFF00_0000) || (overflow != 0) {
            self.pending.push(self.cache.wrapping_add(overflow));

            // When overflow=1 the pending 0xFF bytes wrap to 0x00
            let carry_byte = 0xFF_u8.wrapping_add(overflow);
            for _ in 0..self.cache_size {
                self.pending.push(carry_byte);
            }

            self.cache = (low32 >> 24) as u8;
            self.cache_size = 0;
        } else {
            // Top byte is 0xFF and no overflow yet
            self.cache_size += 1;
        }

        self.low = low32.wrapping_shl(8) as u64;
    }

    /// Flushes the remaining 5 bytes of state into the pending buffer.
    ///
    /// The encoder must not be used for further bits afterwards.
    pub fn finish(&mut self) {
        for _ in 0..5 {
            self.shift_low();
        }
    }

    /// Writes all pending bytes to `out`.
    pub fn drain_into<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        out.write_all(&self.pending)?;
        self.written += self.pending.len() as u64;
        self.pending.clear();
        Ok(())
    }
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::prob::PROB_INIT;

    fn finish(mut rc: RangeEncoder) -> Vec<u8> {
        rc.finish();
        let mut out = Vec::new();
        rc.drain_into(&mut out).unwrap();
        out
    }

    #[test]
    fn test_bit_adapts_probability() {
        let mut rc = RangeEncoder::new();
        let mut prob = PROB_INIT;

        rc.encode_bit(&mut prob, false);
        assert_eq!(prob.value(), 1056);
        rc.encode_bit(&mut prob, true);
        assert_eq!(prob.value(), 1056 - (1056 >> 5));
    }

    #[test]
    fn test_empty_stream_is_five_zero_bytes() {
        let rc = RangeEncoder::new();
        assert_eq!(finish(rc), vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_first_byte_is_zero() {
        let mut rc = RangeEncoder::new();
        let mut probs = [PROB_INIT; 4];
        for i in 0..1000 {
            rc.encode_bit(&mut probs[i % 4], i % 3 == 0);
        }
        let out = finish(rc);
        assert_eq!(out[0], 0);
        assert!(out.len() > 5);
    }

    #[test]
    fn test_ff_runs_are_released() {
        // Direct 1 bits keep low near the top of the interval, so long runs
        // of 0xFF are held back and must all come out on finish
        let mut rc = RangeEncoder::new();
        for _ in 0..200 {
            rc.encode_direct_bit(true);
        }
        let mut prob = PROB_INIT;
        for _ in 0..50 {
            rc.encode_bit(&mut prob, true);
        }
        let out = finish(rc);
        assert_eq!(out[0], 0);
        assert!(out[1..].iter().any(|&b| b == 0xFF));
    }

    #[test]
    fn test_encode_tree_touches_path_only() {
        let mut rc = RangeEncoder::new();
        let mut tree = ProbTree::new(3);

        // Symbol 5 = 0b101: node 1 (bit 1), node 3 (bit 0), node 6 (bit 1)
        rc.encode_tree(&mut tree, 5);
        assert!(tree.get(1) < PROB_INIT);
        assert!(tree.get(3) > PROB_INIT);
        assert!(tree.get(6) < PROB_INIT);
        assert_eq!(tree.get(2), PROB_INIT);
        assert_eq!(tree.get(0), PROB_INIT);
    }

    #[test]
    fn test_encode_reverse_tree_touches_path_only() {
        let mut rc = RangeEncoder::new();
        let mut tree = ProbTree::new(4);

        // Symbol 10 = 0b1010, LSB first: bits 0,1,0,1 -> nodes 1, 2, 5, 10
        rc.encode_reverse_tree(&mut tree, 10);
        assert!(tree.get(1) > PROB_INIT);
        assert!(tree.get(2) < PROB_INIT);
        assert!(tree.get(5) > PROB_INIT);
        assert!(tree.get(10) < PROB_INIT);
        assert_eq!(tree.get(3), PROB_INIT);
    }

    #[test]
    fn test_reverse_bits_with_offset() {
        let mut rc = RangeEncoder::new();
        let mut probs = [PROB_INIT; 8];

        // Two bits at offset 4: nodes 1 and 3 map to slots 4 and 6
        rc.encode_reverse_bits(&mut probs, 4, 2, 0b11);
        assert!(probs[4] < PROB_INIT);
        assert!(probs[6] < PROB_INIT);
        assert!(probs[..4].iter().all(|&p| p == PROB_INIT));
        assert_eq!(probs[5], PROB_INIT);
    }

    #[test]
    fn test_drain_counts_bytes() {
        let mut rc = RangeEncoder::new();
        rc.encode_direct_bits(0xABCD, 16);
        rc.finish();
        let pending = rc.pending();
        assert!(pending >= 5);

        let mut out = Vec::new();
        rc.drain_into(&mut out).unwrap();
        assert_eq!(rc.written(), pending as u64);
        assert_eq!(out.len(), pending);
        assert_eq!(rc.pending(), 0);
    }
}
