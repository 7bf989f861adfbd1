//! Adaptive binary probabilities for LZMA range coding.
//!
//! A [`Prob`] estimates the probability that the next coded bit is 0, scaled
//! to an 11-bit domain. Every context-modeled bit decision in the range coder
//! splits its interval with [`Prob::bound`] and then adapts the estimate with
//! [`Prob::inc`] (a 0 was coded) or [`Prob::dec`] (a 1 was coded).
//!
//! The constants are part of the format: a different shift or width yields
//! streams no classic decoder can read.

/// Number of bits used for the updates of probability values.
pub const MOVE_BITS: u32 = 5;

/// Number of bits of a probability value.
pub const PROB_BITS: u32 = 11;

/// Probability value representing 1.0 (never reached).
pub const PROB_ONE: u32 = 1 << PROB_BITS;

/// Initial probability value (0.5).
pub const PROB_INIT: Prob = Prob(1 << (PROB_BITS - 1));

/// Adaptive estimate that the next bit is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Prob(u16);

impl Prob {
    /// Creates a probability from a raw value.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not below `2^11`.
    pub fn new(value: u16) -> Self {
        assert!(
            (value as u32) < PROB_ONE,
            "probability {} out of range",
            value
        );
        Self(value)
    }

    /// Returns the raw 11-bit value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// Decreases the probability after a 1 bit. The decrease is
    /// proportional to the probability value.
    #[inline]
    pub fn dec(&mut self) {
        self.0 -= self.0 >> MOVE_BITS;
    }

    /// Increases the probability after a 0 bit. The increase is
    /// proportional to the difference of 1 and the probability value.
    #[inline]
    pub fn inc(&mut self) {
        self.0 += ((PROB_ONE - self.0 as u32) >> MOVE_BITS) as u16;
    }

    /// Width of the 0-branch sub-interval for a coding interval of width
    /// `range`. Shift first, then multiply.
    #[inline]
    pub fn bound(self, range: u32) -> u32 {
        (range >> PROB_BITS) * self.0 as u32
    }
}

impl Default for Prob {
    fn default() -> Self {
        PROB_INIT
    }
}

/// Probabilities for one multi-bit symbol alphabet.
///
/// Holds `2^bits` slots indexed by the running tree-walk index built from the
/// bits coded so far. The walk itself belongs to the range coder, which
/// updates the visited slot through [`inc`](Self::inc) or
/// [`dec`](Self::dec).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbTree {
    bits: u32,
    probs: Box<[Prob]>,
}

impl ProbTree {
    /// Creates a tree for `bits`-bit symbols with every slot at 0.5.
    ///
    /// # Panics
    ///
    /// Panics if `bits` is 0.
    pub fn new(bits: u32) -> Self {
        assert!(bits >= 1, "bits must be positive");
        Self {
            bits,
            probs: vec![PROB_INIT; 1 << bits].into_boxed_slice(),
        }
    }

    /// Symbol width in bits.
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Number of slots (`2^bits`).
    pub fn len(&self) -> usize {
        self.probs.len()
    }

    /// Always false; a tree has at least two slots.
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Returns the probability in slot `index`.
    pub fn get(&self, index: usize) -> Prob {
        self.probs[index]
    }

    /// Returns all slots.
    pub fn probs(&self) -> &[Prob] {
        &self.probs
    }

    /// Adapts slot `index` after a 0 bit.
    pub fn inc(&mut self, index: usize) {
        self.probs[index].inc();
    }

    /// Adapts slot `index` after a 1 bit.
    pub fn dec(&mut self, index: usize) {
        self.probs[index].dec();
    }

    /// Interval bound for slot `index`; see [`Prob::bound`].
    pub fn bound(&self, index: usize, range: u32) -> u32 {
        self.probs[index].bound(range)
    }

    /// Resets every slot to 0.5.
    pub fn reset(&mut self) {
        self.probs.fill(PROB_INIT);
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Prob {
        &mut self.probs[index]
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Prob] {
        &mut self.probs
    }
}
