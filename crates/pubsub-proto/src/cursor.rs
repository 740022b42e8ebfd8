//! The cursor that every binary codec call writes through or counts against.
//!
//! The source mixes a writing encoder with a second "calc-only" path that
//! only advances a counter. We consolidate both as one [`Cursor`] mode so a
//! single `encode` implementation can serve both purposes and can never let
//! the two drift out of lockstep.

use crate::error::{ProtocolError, Result};

/// A write-through or count-only cursor over an encode target.
///
/// `Write` mutates a caller-supplied buffer in place; `Count` only tracks
/// how many bytes would have been written. Both variants fail with
/// [`ProtocolError::BufferTooSmall`] the same way `Write` would run out of
/// room, so `calc_size` and `encode` never disagree about how many bytes a
/// value needs.
pub enum Cursor<'a> {
    /// Writes bytes into `buf` starting at `pos`.
    Write {
        /// Destination buffer.
        buf: &'a mut [u8],
        /// Current write offset into `buf`.
        pos: usize,
    },
    /// Only advances `pos`; never touches memory.
    Count {
        /// Bytes that would have been written so far.
        pos: usize,
    },
}

impl<'a> Cursor<'a> {
    /// Create a write cursor over `buf`.
    #[must_use]
    pub fn writer(buf: &'a mut [u8]) -> Self {
        Self::Write { buf, pos: 0 }
    }

    /// Create a count-only cursor.
    #[must_use]
    pub fn counter() -> Self {
        Self::Count { pos: 0 }
    }

    /// Current position (bytes written or counted so far).
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::Write { pos, .. } | Self::Count { pos } => *pos,
        }
    }

    /// Append `bytes`, failing with [`ProtocolError::BufferTooSmall`] if the
    /// destination (when in `Write` mode) cannot hold them.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Write { buf, pos } => {
                let end = pos.checked_add(bytes.len()).ok_or(ProtocolError::BufferTooSmall {
                    needed: bytes.len(),
                    available: buf.len().saturating_sub(*pos),
                })?;
                if end > buf.len() {
                    return Err(ProtocolError::BufferTooSmall {
                        needed: bytes.len(),
                        available: buf.len().saturating_sub(*pos),
                    });
                }
                buf[*pos..end].copy_from_slice(bytes);
                *pos = end;
                Ok(())
            },
            Self::Count { pos } => {
                *pos += bytes.len();
                Ok(())
            },
        }
    }

    /// Returns true if this cursor only counts bytes (never writes).
    #[must_use]
    pub fn is_counting(&self) -> bool {
        matches!(self, Self::Count { .. })
    }
}

/// A read-only cursor over a decode source.
///
/// Unlike [`Cursor`], a `Reader` always has concrete bytes behind it:
/// decoding never runs in a "count-only" mode because a decoder must
/// inspect the bytes it consumes.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Create a reader over `buf`, starting at offset 0.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Read exactly `n` bytes, advancing the cursor.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProtocolError::BufferTooSmall { needed: n, available: self.remaining() });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a fixed-size array, advancing the cursor.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.take(N)?;
        let mut arr = [0u8; N];
        arr.copy_from_slice(slice);
        Ok(arr)
    }

    /// Peek at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(ProtocolError::BufferTooSmall { needed: 1, available: 0 })
    }

    /// The absolute byte offset of the underlying buffer that `position()`
    /// corresponds to, for use with an external base offset (the offset
    /// table records offsets relative to the start of a publish buffer).
    #[must_use]
    pub fn absolute(&self, base: usize) -> usize {
        base + self.pos
    }
}
