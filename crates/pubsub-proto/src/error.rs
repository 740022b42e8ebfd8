//! Error types for the PubSub NetworkMessage codec.
//!
//! Every codec function returns a [`Result`]; the first non-good status
//! aborts the call. The codec never logs — callers log at their layer.

use thiserror::Error;

/// Errors produced by binary or JSON encode/decode, size calculation, and
/// the realtime offset path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Encode target or decode source exhausted.
    #[error("buffer too small: need at least {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes required to complete the operation.
        needed: usize,
        /// Bytes actually available.
        available: usize,
    },

    /// Reserved bits set, length mismatch, or unknown enum value on decode.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Field encoding is `RESERVED`, or the network message type is not
    /// `DATASET`.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Allocation failure during decode.
    #[error("out of memory decoding {0}")]
    OutOfMemory(String),

    /// A realtime mutation would change a field's encoded length.
    #[error("offset table invalidated: {0}")]
    OffsetInvalidated(String),

    /// Sign/verify mismatch or missing key.
    #[error("security failure: {0}")]
    SecurityFailure(String),

    /// Null where required, or contradictory flags.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result alias used throughout the codec.
pub type Result<T> = std::result::Result<T, ProtocolError>;
