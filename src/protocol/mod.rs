//! Protocol module for decoding measurement notification frames.

pub mod frame;

pub use frame::{decode, MIN_FRAME_LEN};
