//! The `SecurityPolicy` and `SecurityKeyService` collaborator traits.
//!
//! Neither certificate handling nor key rotation internals are implemented
//! here (both are spec.md Non-goals); these traits exist so the publish
//! fast path has something concrete to call when a `NetworkMessage` carries
//! a `SecurityHeader`. `pubsub-harness` supplies in-memory stub
//! implementations for its property tests.

use crate::error::RtError;

/// Signs and/or encrypts the region of an encoded `NetworkMessage` buffer
/// between `EncryptStart`/`SignatureStart` and its end, using whatever key
/// a [`SecurityKeyService`] currently hands back for a token id.
pub trait SecurityPolicy {
    /// Encrypt `buf[range_start..]` in place and return the trailing
    /// signature bytes (the `SecurityFooter`), if the policy signs.
    fn seal(&self, buf: &mut [u8], encrypt_start: usize, sign_start: usize, key: &[u8]) -> Result<Vec<u8>, RtError>;

    /// Verify the footer and decrypt `buf[range_start..]` in place.
    fn open(
        &self,
        buf: &mut [u8],
        encrypt_start: usize,
        sign_start: usize,
        footer: &[u8],
        key: &[u8],
    ) -> Result<(), RtError>;
}

/// Looks up the symmetric key material associated with a
/// `SecurityHeader.security_token_id`, supporting the rotating key sets a
/// real deployment's Security Key Service manages.
pub trait SecurityKeyService {
    /// The token id and key bytes currently in use for signing/encrypting
    /// outgoing messages.
    fn current_key(&self) -> Result<(u32, Vec<u8>), RtError>;

    /// Key bytes for a specific token id, needed to verify/decrypt a
    /// message signed under a key that may have since rotated out.
    fn key_for_token(&self, token_id: u32) -> Result<Vec<u8>, RtError>;
}

/// A `SecurityPolicy` that treats the payload as already in its final form:
/// no encryption, no signature footer. Used where a `NetworkMessage` has no
/// `SecurityHeader` at all, and by tests that don't exercise security.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSecurity;

impl SecurityPolicy for NoSecurity {
    fn seal(&self, _buf: &mut [u8], _encrypt_start: usize, _sign_start: usize, _key: &[u8]) -> Result<Vec<u8>, RtError> {
        Ok(Vec::new())
    }

    fn open(
        &self,
        _buf: &mut [u8],
        _encrypt_start: usize,
        _sign_start: usize,
        footer: &[u8],
        _key: &[u8],
    ) -> Result<(), RtError> {
        if !footer.is_empty() {
            return Err(RtError::Security("NoSecurity policy received a non-empty footer".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_security_rejects_unexpected_footer() {
        let mut buf = vec![0u8; 4];
        let policy = NoSecurity;
        assert!(policy.open(&mut buf, 0, 0, &[1, 2, 3], &[]).is_err());
        assert!(policy.open(&mut buf, 0, 0, &[], &[]).is_ok());
    }
}
