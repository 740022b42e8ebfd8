//! TOML-loaded configuration for the `pubsub-cli` binary.

use std::path::Path;

use pubsub_proto::CodecConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

/// Top-level config file shape: everything [`CodecConfig`] exposes, loaded
/// once at startup and threaded through every subcommand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubConfig {
    /// Codec tunables, deserialized directly since [`CodecConfig`] is
    /// already `Serialize`/`Deserialize`.
    #[serde(flatten)]
    pub codec: CodecConfig,
}

impl Default for PubSubConfig {
    fn default() -> Self {
        Self { codec: CodecConfig::default() }
    }
}

impl PubSubConfig {
    /// Load from a TOML file, falling back to [`Default::default`] when
    /// `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .map_err(|source| CliError::Io { path: path.display().to_string(), source })?;
        toml::from_str(&text)
            .map_err(|source| CliError::Config { path: path.display().to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = PubSubConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let parsed: PubSubConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.codec.max_json_tokens, cfg.codec.max_json_tokens);
    }

    #[test]
    fn missing_path_uses_defaults() {
        let cfg = PubSubConfig::load(None).unwrap();
        assert!(cfg.codec.use_reversible);
    }
}
