//! Error type for the `pubsub-cli` binary.

use thiserror::Error;

/// Everything that can go wrong running a `pubsub-cli` subcommand.
#[derive(Debug, Error)]
pub enum CliError {
    /// Reading the input file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file's TOML was malformed.
    #[error("invalid config at {path}: {source}")]
    Config {
        /// Path of the offending config file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: toml::de::Error,
    },

    /// Input bytes were not valid UADP binary or JSON for the requested
    /// direction.
    #[error("codec error: {0}")]
    Codec(#[from] pubsub_proto::ProtocolError),

    /// Input JSON failed to parse before it ever reached the codec.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    /// A realtime demo step failed.
    #[error("realtime demo error: {0}")]
    Rt(#[from] pubsub_rt::RtError),

    /// Input bytes were not valid hex.
    #[error("invalid hex input: {0}")]
    Hex(#[from] std::num::ParseIntError),
}
