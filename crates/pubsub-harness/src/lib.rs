//! Property-based and snapshot test support for the PubSub codec and its
//! realtime offset-table path.
//!
//! This crate is test infrastructure, not a library consumed by the
//! codec or the control loops themselves: [`strategies`] builds
//! [`proptest`]-driven `NetworkMessage` values, and [`InMemoryKeyService`]
//! is the one concrete [`pubsub_rt::SecurityKeyService`] this repository
//! carries, standing in for a real Security Key Service.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod strategies;

use std::collections::HashMap;
use std::sync::Mutex;

use pubsub_rt::{RtError, SecurityKeyService};
use serde::Serialize;

/// One recorded call to [`InMemoryKeyService::install`], in rotation order.
/// Tests snapshot a service's rotation history through [`InMemoryKeyService::rotation_log`]
/// rather than asserting on internal lock state directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRotationEvent {
    /// The token id the rotation installed.
    pub token_id: u32,
    /// Byte length of the installed key, not the key itself.
    pub key_len: usize,
}

/// A fixed in-memory key table, keyed by security token id. Never rotates
/// on its own; tests call [`Self::install`] to simulate a rotation.
pub struct InMemoryKeyService {
    current: Mutex<u32>,
    keys: Mutex<HashMap<u32, Vec<u8>>>,
    rotations: Mutex<Vec<KeyRotationEvent>>,
}

impl InMemoryKeyService {
    /// Build a service whose current key is `token_id` mapped to `key`.
    #[must_use]
    pub fn new(token_id: u32, key: Vec<u8>) -> Self {
        let mut keys = HashMap::new();
        keys.insert(token_id, key);
        Self { current: Mutex::new(token_id), keys: Mutex::new(keys), rotations: Mutex::new(Vec::new()) }
    }

    /// Register `key` under `token_id` and make it the current key,
    /// simulating a key rotation a real SKS would push out.
    pub fn install(&self, token_id: u32, key: Vec<u8>) {
        tracing::debug!(token_id, key_len = key.len(), "installing rotated key");
        let key_len = key.len();
        self.keys.lock().expect("key table lock poisoned").insert(token_id, key);
        *self.current.lock().expect("current-token lock poisoned") = token_id;
        self.rotations.lock().expect("rotation log lock poisoned").push(KeyRotationEvent { token_id, key_len });
    }

    /// The rotation history recorded by [`Self::install`], oldest first.
    #[must_use]
    pub fn rotation_log(&self) -> Vec<KeyRotationEvent> {
        self.rotations.lock().expect("rotation log lock poisoned").clone()
    }
}

impl SecurityKeyService for InMemoryKeyService {
    fn current_key(&self) -> Result<(u32, Vec<u8>), RtError> {
        let token_id = *self.current.lock().expect("current-token lock poisoned");
        self.key_for_token(token_id).map(|key| (token_id, key))
    }

    fn key_for_token(&self, token_id: u32) -> Result<Vec<u8>, RtError> {
        self.keys.lock().expect("key table lock poisoned").get(&token_id).cloned().ok_or_else(|| {
            tracing::warn!(token_id, "no key installed for token");
            RtError::NoKeyAvailable { token_id }
        })
    }
}
