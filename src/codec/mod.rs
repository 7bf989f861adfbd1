//! Classic LZMA encoding machinery.
//!
//! This module provides the probability model, the range encoder, the
//! context state machine, the sliding-window dictionary, and the streaming
//! [`LzmaEncoder`] that the [`Writer`](crate::Writer) drives.

pub mod dict;
pub mod encoder;
pub mod lzma_context;
pub mod lzma_rc;
pub mod prob;

pub use dict::{CHAIN_WINDOW, EncoderDict, Match};
pub use encoder::{EncoderFlags, LzmaEncoder};
pub use lzma_context::{LengthEncoder, LzmaState, MAX_MATCH_LEN, MIN_MATCH_LEN, NUM_REPS, dist_slot};
pub use lzma_rc::RangeEncoder;
pub use prob::{MOVE_BITS, PROB_BITS, PROB_INIT, PROB_ONE, Prob, ProbTree};
