//! The LZMA context model on the encoding side.
//!
//! [`LzmaState`] owns every adaptive probability of a classic stream and the
//! 12-state history of recent token kinds. Each `encode_*` method codes one
//! token (literal, match, rep, or the end marker) through a
//! [`RangeEncoder`] and advances the state.

use crate::format::Properties;

use super::lzma_rc::RangeEncoder;
use super::prob::{PROB_INIT, Prob, ProbTree};

/// Number of repeated distances remembered by the coder.
pub const NUM_REPS: usize = 4;

/// Shortest match the format can express.
pub const MIN_MATCH_LEN: usize = 2;

/// Longest match the format can express.
pub const MAX_MATCH_LEN: usize = 273;

const NUM_STATES: usize = 12;
const NUM_LIT_STATES: usize = 7;
const LITERAL_CODER_SIZE: usize = 0x300;

const NUM_POS_BITS_MAX: u32 = 4;
const NUM_POS_STATES_MAX: usize = 1 << NUM_POS_BITS_MAX;

const LEN_LOW_BITS: u32 = 3;
const LEN_LOW_SYMBOLS: usize = 1 << LEN_LOW_BITS;
const LEN_MID_BITS: u32 = 3;
const LEN_MID_SYMBOLS: usize = 1 << LEN_MID_BITS;
const LEN_HIGH_BITS: u32 = 8;

const NUM_LEN_TO_POS_STATES: usize = 4;
const NUM_POS_SLOT_BITS: u32 = 6;
const NUM_ALIGN_BITS: u32 = 4;
const ALIGN_MASK: u32 = (1 << NUM_ALIGN_BITS) - 1;

const START_POS_MODEL_INDEX: u32 = 4;
const END_POS_MODEL_INDEX: u32 = 14;
const NUM_FULL_DISTANCES: usize = 1 << (END_POS_MODEL_INDEX >> 1);

/// Zero-based distance written by the end-of-stream marker.
const EOS_DISTANCE: u32 = 0xFFFF_FFFF;

// Next state after each token kind, indexed by the current state
const LIT_NEXT_STATES: [usize; NUM_STATES] = [0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 4, 5];
const MATCH_NEXT_STATES: [usize; NUM_STATES] = [7, 7, 7, 7, 7, 7, 7, 10, 10, 10, 10, 10];
const REP_NEXT_STATES: [usize; NUM_STATES] = [8, 8, 8, 8, 8, 8, 8, 11, 11, 11, 11, 11];
const SHORT_REP_NEXT_STATES: [usize; NUM_STATES] = [9, 9, 9, 9, 9, 9, 9, 11, 11, 11, 11, 11];

/// Probabilities for match or rep lengths.
///
/// Lengths 2-9 and 10-17 go through small per-position-state trees,
/// everything up to 273 through one shared 8-bit tree.
#[derive(Debug, Clone)]
pub struct LengthEncoder {
    choice: Prob,
    choice2: Prob,
    low: Vec<ProbTree>,
    mid: Vec<ProbTree>,
    high: ProbTree,
}

impl LengthEncoder {
    /// Creates a length coder with every probability at 0.5.
    pub fn new() -> Self {
        Self {
            choice: PROB_INIT,
            choice2: PROB_INIT,
            low: (0..NUM_POS_STATES_MAX)
                .map(|_| ProbTree::new(LEN_LOW_BITS))
                .collect(),
            mid: (0..NUM_POS_STATES_MAX)
                .map(|_| ProbTree::new(LEN_MID_BITS))
                .collect(),
            high: ProbTree::new(LEN_HIGH_BITS),
        }
    }

    /// Encodes a length value (2-273).
    pub fn encode(&mut self, rc: &mut RangeEncoder, length: u32, pos_state: usize) {
        let len = length - MIN_MATCH_LEN as u32;

        if len < LEN_LOW_SYMBOLS as u32 {
            rc.encode_bit(&mut self.choice, false);
            rc.encode_tree(&mut self.low[pos_state], len);
        } else if len < (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32 {
            rc.encode_bit(&mut self.choice, true);
            rc.encode_bit(&mut self.choice2, false);
            rc.encode_tree(&mut self.mid[pos_state], len - LEN_LOW_SYMBOLS as u32);
        } else {
            rc.encode_bit(&mut self.choice, true);
            rc.encode_bit(&mut self.choice2, true);
            let symbol = len - (LEN_LOW_SYMBOLS + LEN_MID_SYMBOLS) as u32;
            rc.encode_tree(&mut self.high, symbol);
        }
    }
}

impl Default for LengthEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Adaptive model of a classic LZMA stream: token-kind history, the four
/// most recent distances, and all probabilities.
#[derive(Debug, Clone)]
pub struct LzmaState {
    properties: Properties,
    lp_mask: u64,
    pos_mask: u64,

    state: usize,
    reps: [u32; NUM_REPS],

    is_match: [[Prob; NUM_POS_STATES_MAX]; NUM_STATES],
    is_rep: [Prob; NUM_STATES],
    is_rep_g0: [Prob; NUM_STATES],
    is_rep_g1: [Prob; NUM_STATES],
    is_rep_g2: [Prob; NUM_STATES],
    is_rep0_long: [[Prob; NUM_POS_STATES_MAX]; NUM_STATES],

    literal_probs: Vec<Prob>,

    dist_slots: Vec<ProbTree>,
    dist_special: Vec<Prob>,
    dist_align: ProbTree,

    len_encoder: LengthEncoder,
    rep_len_encoder: LengthEncoder,
}

impl LzmaState {
    /// Creates a new encoder state for the given properties.
    ///
    /// The properties must already be verified.
    pub fn new(properties: Properties) -> Self {
        let num_literal_probs = LITERAL_CODER_SIZE << (properties.lc + properties.lp);

        Self {
            properties,
            lp_mask: (1u64 << properties.lp) - 1,
            pos_mask: (properties.num_pos_states() - 1) as u64,
            state: 0,
            reps: [0; NUM_REPS],
            is_match: [[PROB_INIT; NUM_POS_STATES_MAX]; NUM_STATES],
            is_rep: [PROB_INIT; NUM_STATES],
            is_rep_g0: [PROB_INIT; NUM_STATES],
            is_rep_g1: [PROB_INIT; NUM_STATES],
            is_rep_g2: [PROB_INIT; NUM_STATES],
            is_rep0_long: [[PROB_INIT; NUM_POS_STATES_MAX]; NUM_STATES],
            literal_probs: vec![PROB_INIT; num_literal_probs],
            dist_slots: (0..NUM_LEN_TO_POS_STATES)
                .map(|_| ProbTree::new(NUM_POS_SLOT_BITS))
                .collect(),
            // Slots 4..14 use 2^footer_bits - 1 nodes each, walked from node 1
            dist_special: vec![PROB_INIT; NUM_FULL_DISTANCES - END_POS_MODEL_INDEX as usize],
            dist_align: ProbTree::new(NUM_ALIGN_BITS),
            len_encoder: LengthEncoder::new(),
            rep_len_encoder: LengthEncoder::new(),
        }
    }

    /// Returns the current state (0-11).
    pub fn state(&self) -> usize {
        self.state
    }

    /// Returns the repeated distances (zero-based).
    pub fn reps(&self) -> &[u32; NUM_REPS] {
        &self.reps
    }

    /// Whether the last token was a literal.
    pub fn is_literal_state(&self) -> bool {
        self.state < NUM_LIT_STATES
    }

    fn pos_state(&self, pos: u64) -> usize {
        (pos & self.pos_mask) as usize
    }

    /// Returns the offset of the literal coder for `pos` and `prev_byte`.
    fn literal_offset(&self, pos: u64, prev_byte: u8) -> usize {
        let lc = self.properties.lc;
        let pos_bits = (pos & self.lp_mask) as usize;
        let prev_bits = (prev_byte as usize) >> (8 - lc);
        ((pos_bits << lc) + prev_bits) * LITERAL_CODER_SIZE
    }

    /// Codes `byte` as a literal at stream position `pos`.
    ///
    /// `match_byte` is the byte at distance `reps[0] + 1`; it is required
    /// when the previous token was a match or rep.
    pub fn encode_literal(
        &mut self,
        rc: &mut RangeEncoder,
        byte: u8,
        pos: u64,
        prev_byte: u8,
        match_byte: Option<u8>,
    ) {
        let pos_state = self.pos_state(pos);
        rc.encode_bit(&mut self.is_match[self.state][pos_state], false);

        let offset = self.literal_offset(pos, prev_byte);
        match match_byte {
            Some(mb) if !self.is_literal_state() => {
                self.encode_matched_literal(rc, offset, byte, mb)
            }
            _ => self.encode_normal_literal(rc, offset, byte),
        }

        self.state = LIT_NEXT_STATES[self.state];
    }

    fn encode_normal_literal(&mut self, rc: &mut RangeEncoder, offset: usize, byte: u8) {
        let mut symbol = 1usize;
        for i in (0..8).rev() {
            let bit = (byte >> i) & 1;
            rc.encode_bit(&mut self.literal_probs[offset + symbol], bit != 0);
            symbol = (symbol << 1) | bit as usize;
        }
    }

    /// Encodes a literal against the byte at the last match distance.
    ///
    /// While the coded bits agree with `match_byte` the upper two thirds of
    /// the coder are used, selected by the match bit; after the first
    /// disagreement the remaining bits use the plain coder.
    fn encode_matched_literal(
        &mut self,
        rc: &mut RangeEncoder,
        offset: usize,
        byte: u8,
        match_byte: u8,
    ) {
        let mut symbol = 1usize;
        let mut matching = true;

        for i in (0..8).rev() {
            let bit = ((byte >> i) & 1) as usize;
            let index = if matching {
                let match_bit = ((match_byte >> i) & 1) as usize;
                matching = match_bit == bit;
                0x100 + (match_bit << 8) + symbol
            } else {
                symbol
            };
            rc.encode_bit(&mut self.literal_probs[offset + index], bit != 0);
            symbol = (symbol << 1) | bit;
        }
    }

    /// Encodes a match with zero-based distance `dist` and `length` 2-273.
    pub fn encode_match(&mut self, rc: &mut RangeEncoder, dist: u32, length: u32, pos: u64) {
        let pos_state = self.pos_state(pos);

        rc.encode_bit(&mut self.is_match[self.state][pos_state], true);
        rc.encode_bit(&mut self.is_rep[self.state], false);

        self.len_encoder.encode(rc, length, pos_state);
        self.encode_distance(rc, dist, length);

        self.reps[3] = self.reps[2];
        self.reps[2] = self.reps[1];
        self.reps[1] = self.reps[0];
        self.reps[0] = dist;

        self.state = MATCH_NEXT_STATES[self.state];
    }

    /// Encodes a repetition of `reps[rep_index]`.
    ///
    /// A `length` of 1 with `rep_index == 0` is a short rep.
    pub fn encode_rep(&mut self, rc: &mut RangeEncoder, rep_index: usize, length: u32, pos: u64) {
        let pos_state = self.pos_state(pos);

        rc.encode_bit(&mut self.is_match[self.state][pos_state], true);
        rc.encode_bit(&mut self.is_rep[self.state], true);

        if rep_index == 0 {
            rc.encode_bit(&mut self.is_rep_g0[self.state], false);
            if length == 1 {
                rc.encode_bit(&mut self.is_rep0_long[self.state][pos_state], false);
                self.state = SHORT_REP_NEXT_STATES[self.state];
                return;
            }
            rc.encode_bit(&mut self.is_rep0_long[self.state][pos_state], true);
        } else {
            rc.encode_bit(&mut self.is_rep_g0[self.state], true);
            if rep_index == 1 {
                rc.encode_bit(&mut self.is_rep_g1[self.state], false);
            } else {
                rc.encode_bit(&mut self.is_rep_g1[self.state], true);
                rc.encode_bit(&mut self.is_rep_g2[self.state], rep_index == 3);
            }
            let rep_dist = self.reps[rep_index];
            for i in (1..=rep_index).rev() {
                self.reps[i] = self.reps[i - 1];
            }
            self.reps[0] = rep_dist;
        }

        self.rep_len_encoder.encode(rc, length, pos_state);
        self.state = REP_NEXT_STATES[self.state];
    }

    /// Encodes the end-of-stream marker: a match of length 2 at distance
    /// `0xFFFFFFFF`.
    pub fn encode_end_marker(&mut self, rc: &mut RangeEncoder, pos: u64) {
        self.encode_match(rc, EOS_DISTANCE, MIN_MATCH_LEN as u32, pos);
    }

    /// Codes a zero-based distance as its slot plus footer bits.
    ///
    /// Footers of slots 4-13 are modeled with the shared special table;
    /// larger slots send direct bits and model only the low four bits.
    fn encode_distance(&mut self, rc: &mut RangeEncoder, dist: u32, length: u32) {
        let len_state = (length as usize - MIN_MATCH_LEN).min(NUM_LEN_TO_POS_STATES - 1);
        let slot = dist_slot(dist);

        rc.encode_tree(&mut self.dist_slots[len_state], slot);

        if slot < START_POS_MODEL_INDEX {
            return;
        }

        let footer_bits = (slot >> 1) - 1;
        let base = (2 | (slot & 1)) << footer_bits;
        let reduced = dist - base;

        if slot < END_POS_MODEL_INDEX {
            let offset = (base - slot) as usize;
            rc.encode_reverse_bits(&mut self.dist_special, offset, footer_bits, reduced);
        } else {
            rc.encode_direct_bits(reduced >> NUM_ALIGN_BITS, footer_bits - NUM_ALIGN_BITS);
            rc.encode_reverse_tree(&mut self.dist_align, reduced & ALIGN_MASK);
        }
    }
}

/// Maps a zero-based distance to its slot.
///
/// Distances below 4 are their own slot. Above that the slot is twice the
/// index of the highest set bit plus the bit just below it, so every pair of
/// slots covers one power-of-two range.
pub fn dist_slot(dist: u32) -> u32 {
    if dist < START_POS_MODEL_INDEX {
        return dist;
    }
    let n = 31 - dist.leading_zeros();
    (n << 1) | ((dist >> (n - 1)) & 1)
}
