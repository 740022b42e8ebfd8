//! Error types for the realtime publish/subscribe control loops.

use thiserror::Error;

/// Errors raised by the publish fast path, the subscriber demux loop, or
/// their collaborator traits.
#[derive(Debug, Error)]
pub enum RtError {
    /// The codec itself rejected an encode, decode, or offset computation.
    #[error("codec error: {0}")]
    Codec(#[from] pubsub_proto::ProtocolError),

    /// A transport `send`/`recv` call failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A `SecurityPolicy` sign/encrypt/verify/decrypt call failed.
    #[error("security policy error: {0}")]
    Security(String),

    /// No current key was available from the `SecurityKeyService`.
    #[error("no security key available for token id {token_id}")]
    NoKeyAvailable {
        /// The security token id that was requested.
        token_id: u32,
    },

    /// A `PublishedDataSet` was asked to publish before `configure` had run.
    #[error("published dataset is not configured")]
    NotConfigured,
}
