//! The realtime publish fast path: encode a `NetworkMessage` shape once,
//! then mutate only the bytes that changed on every subsequent cycle.

use pubsub_proto::{BinaryEncode, Cursor, NetworkMessage, OffsetKind, OffsetTable};
use tracing::{debug, trace};

use crate::error::RtError;
use crate::security::{SecurityKeyService, SecurityPolicy};
use crate::transport::Transport;

/// Drives one published `NetworkMessage` shape through the offset-table
/// fast path: `configure` once per shape, then `publish` every cycle.
///
/// `T`, `P`, and `K` are the transport, security policy, and security key
/// service collaborators; each publish cycle calls through them without
/// allocating beyond what they themselves allocate (a `SecurityPolicy`
/// that signs is free to allocate its signature, but the buffer this
/// struct owns is reused across every cycle).
pub struct PublishedDataSet<T: Transport, P: SecurityPolicy, K: SecurityKeyService> {
    transport: T,
    security: P,
    keys: K,
    offsets: OffsetTable,
    buf: Vec<u8>,
}

impl<T: Transport, P: SecurityPolicy, K: SecurityKeyService> PublishedDataSet<T, P, K> {
    /// Build an unconfigured publisher. Call [`Self::configure`] before the
    /// first [`Self::publish`].
    pub fn new(transport: T, security: P, keys: K) -> Self {
        Self { transport, security, keys, offsets: OffsetTable::new(), buf: Vec::new() }
    }

    /// Fix `message`'s shape: calculate offsets, encode the initial buffer,
    /// and move the offset table to `Operational`. Any later call must
    /// reuse the same shape (flag bytes, writer count, field encodings) or
    /// reconfigure by calling this again.
    pub fn configure(&mut self, message: &NetworkMessage) -> Result<(), RtError> {
        self.offsets.calculate_and_record_offsets(message)?;
        let size = self.offsets.total_size();
        self.buf = vec![0u8; size];
        let mut cursor = Cursor::writer(&mut self.buf);
        message.encode(&mut cursor)?;
        self.offsets.activate()?;
        debug!(total_size = size, "published dataset configured");
        Ok(())
    }

    /// Overwrite a single fixed-width field in the persistent buffer
    /// without touching anything else. `new_bytes.len()` must equal the
    /// field's recorded width or this returns
    /// [`pubsub_proto::ProtocolError::OffsetInvalidated`] via [`RtError::Codec`].
    pub fn update_field(&mut self, kind: OffsetKind, new_bytes: &[u8]) -> Result<(), RtError> {
        self.offsets.write_in_place(&mut self.buf, kind, new_bytes)?;
        Ok(())
    }

    /// Run one publish cycle: seal the buffer (sign/encrypt, if a
    /// `SecurityHeader` was configured) and hand it to the transport.
    ///
    /// Returns [`RtError::NotConfigured`] if [`Self::configure`] hasn't run.
    pub fn publish(&mut self) -> Result<(), RtError> {
        if self.buf.is_empty() {
            return Err(RtError::NotConfigured);
        }
        let encrypt_start = self.offset_for(OffsetKind::EncryptStart);
        let sign_start = self.offset_for(OffsetKind::SignatureStart);
        if let (Some(encrypt_start), Some(sign_start)) = (encrypt_start, sign_start) {
            let (_token_id, key) = self.keys.current_key()?;
            let footer = self.security.seal(&mut self.buf, encrypt_start, sign_start, &key)?;
            self.buf.truncate(sign_start);
            self.buf.extend_from_slice(&footer);
        }
        trace!(bytes = self.buf.len(), "publishing network message");
        self.transport.send(&self.buf)?;
        Ok(())
    }

    /// Drop the offset table, forcing the next cycle through
    /// [`Self::configure`]. Used when the shape can no longer be trusted
    /// (a reconfiguration upstream, a field whose new value would not fit
    /// its recorded width).
    pub fn invalidate(&mut self) {
        self.offsets.dispose();
    }

    fn offset_for(&self, kind: OffsetKind) -> Option<usize> {
        self.offsets.entries().iter().find(|e| e.kind == kind).map(|e| e.offset)
    }
}

#[cfg(test)]
mod tests {
    use pubsub_proto::{
        DataSetMessage, DataSetMessageHeader, DataSetMessagePayload, FieldEncoding, FieldValue,
        ScalarValue, Variant,
    };

    use super::*;
    use crate::security::NoSecurity;
    use crate::transport::InMemoryTransport;

    struct NoKeys;

    impl SecurityKeyService for NoKeys {
        fn current_key(&self) -> Result<(u32, Vec<u8>), RtError> {
            Err(RtError::NoKeyAvailable { token_id: 0 })
        }

        fn key_for_token(&self, token_id: u32) -> Result<Vec<u8>, RtError> {
            Err(RtError::NoKeyAvailable { token_id })
        }
    }

    fn keyframe_message(value: u32) -> NetworkMessage {
        NetworkMessage {
            version: 1,
            publisher_id: None,
            dataset_class_id: None,
            chunk_message: false,
            group_header: None,
            payload_header: None,
            security_header: None,
            timestamp: None,
            picoseconds: None,
            promoted_fields: None,
            dataset_messages: vec![DataSetMessage {
                header: DataSetMessageHeader { valid: true, ..Default::default() },
                field_encoding: FieldEncoding::Variant,
                payload: DataSetMessagePayload::KeyFrame(vec![FieldValue::Variant(
                    Variant::Scalar(ScalarValue::UInt32(value)),
                )]),
            }],
            security_footer: Vec::new(),
        }
    }

    #[test]
    fn publish_without_configure_fails() {
        let (transport, _peer) = InMemoryTransport::pair();
        let mut published = PublishedDataSet::new(transport, NoSecurity, NoKeys);
        assert!(matches!(published.publish(), Err(RtError::NotConfigured)));
    }

    #[test]
    fn configure_then_update_then_publish_round_trips() {
        let (transport, peer) = InMemoryTransport::pair();
        let mut published = PublishedDataSet::new(transport, NoSecurity, NoKeys);
        let message = keyframe_message(1000);
        published.configure(&message).unwrap();
        published.publish().unwrap();

        published
            .update_field(OffsetKind::KeyframeField { index: 0, field: 0 }, &1001u32.to_le_bytes())
            .unwrap();
        published.publish().unwrap();

        let first = peer.try_recv().unwrap().unwrap();
        let second = peer.try_recv().unwrap().unwrap();
        assert_eq!(first.len(), second.len());
        assert_ne!(first, second);
        assert_eq!(&second[second.len() - 4..], &1001u32.to_le_bytes());
    }

    #[test]
    fn update_field_with_wrong_width_fails() {
        let (transport, _peer) = InMemoryTransport::pair();
        let mut published = PublishedDataSet::new(transport, NoSecurity, NoKeys);
        published.configure(&keyframe_message(1)).unwrap();
        let err =
            published.update_field(OffsetKind::KeyframeField { index: 0, field: 0 }, &[0u8; 2]);
        assert!(err.is_err());
    }
}
