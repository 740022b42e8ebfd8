//! The per-type binary codec contract.
//!
//! For each primitive or composite type `T` this crate implements
//! [`BinaryEncode`] and [`BinaryDecode`]. `calc_size` is derived once, for
//! free, by running `encode` against a counting [`Cursor`], so a size
//! calculation and an encode pass can never disagree about a value's length.

use crate::cursor::{Cursor, Reader};
use crate::error::Result;

/// Encodes a value onto a [`Cursor`], in `Write` or `Count` mode.
pub trait BinaryEncode {
    /// Write `self` onto `cursor`. In `Count` mode this must perform exactly
    /// the same branching `Write` mode would, advancing the position by the
    /// same amount it would have written.
    fn encode(&self, cursor: &mut Cursor<'_>) -> Result<()>;

    /// Number of bytes `encode` would write. Implemented once for every
    /// type via a counting pass; do not override unless a type has a faster
    /// closed-form size (primitives do, below).
    fn calc_size(&self) -> usize {
        let mut counter = Cursor::counter();
        // Count mode never fails on well-formed values: it only tracks a
        // running total and has no capacity to exceed.
        #[allow(clippy::expect_used)]
        self.encode(&mut counter).expect("count-mode encode is infallible");
        counter.position()
    }
}

/// Decodes a value from a [`Reader`].
pub trait BinaryDecode: Sized {
    /// Parse `Self` from the front of `reader`, advancing it past the bytes
    /// consumed.
    fn decode(reader: &mut Reader<'_>) -> Result<Self>;
}
