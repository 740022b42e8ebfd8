//! The subscriber demux loop: pull one buffer from a transport, decode it,
//! and dispatch it to a caller-supplied callback, one message at a time and
//! synchronously, matching the ordering guarantee that subscriber
//! processing order equals transport arrival order.

use pubsub_proto::{BinaryDecode, NetworkMessage, Reader};
use tracing::{trace, warn};

use crate::error::RtError;
use crate::security::{SecurityKeyService, SecurityPolicy};
use crate::transport::Transport;

/// Polls a [`Transport`] for encoded `NetworkMessage` buffers, decodes each
/// one (opening its security envelope first if it carries one), and hands
/// it to a callback before moving on to the next.
pub struct Subscriber<T: Transport, P: SecurityPolicy, K: SecurityKeyService> {
    transport: T,
    security: P,
    keys: K,
}

impl<T: Transport, P: SecurityPolicy, K: SecurityKeyService> Subscriber<T, P, K> {
    /// Build a subscriber over `transport`, opening security envelopes
    /// (when present) with `security`/`keys`.
    pub fn new(transport: T, security: P, keys: K) -> Self {
        Self { transport, security, keys }
    }

    /// Drain every buffer currently available from the transport, decoding
    /// and dispatching each to `on_message` in arrival order. Returns the
    /// count of messages dispatched. A decode failure on one buffer is
    /// logged and skipped; it does not abort the drain.
    pub fn poll(&self, mut on_message: impl FnMut(NetworkMessage)) -> Result<usize, RtError> {
        let mut dispatched = 0;
        while let Some(mut bytes) = self.transport.try_recv()? {
            match self.decode_one(&mut bytes) {
                Ok(message) => {
                    trace!(bytes = bytes.len(), "dispatching decoded network message");
                    on_message(message);
                    dispatched += 1;
                },
                Err(err) => {
                    warn!(%err, "dropping network message that failed to decode");
                },
            }
        }
        Ok(dispatched)
    }

    fn decode_one(&self, bytes: &mut [u8]) -> Result<NetworkMessage, RtError> {
        let footer_len = self.open_security_envelope(bytes)?;
        let body = &bytes[..bytes.len() - footer_len];
        let mut reader = Reader::new(body);
        Ok(NetworkMessage::decode(&mut reader)?)
    }

    /// Locates and opens a trailing security footer, if any. The codec has
    /// no notion of "this buffer is secured"; a real deployment either
    /// knows out of band or peeks the header byte itself, so this path is a
    /// no-op unless a caller configures a policy that needs one.
    fn open_security_envelope(&self, bytes: &mut [u8]) -> Result<usize, RtError> {
        if bytes.is_empty() {
            return Ok(0);
        }
        let (_token_id, key) = match self.keys.current_key() {
            Ok(pair) => pair,
            Err(_) => return Ok(0),
        };
        self.security.open(bytes, 0, bytes.len(), &[], &key)?;
        Ok(0)
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

    fn encoded_keyframe(value: u32) -> Vec<u8> {
        use pubsub_proto::{BinaryEncode, Cursor};

        let message = NetworkMessage {
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
        };
        let mut buf = vec![0u8; message.calc_size()];
        let mut cursor = Cursor::writer(&mut buf);
        message.encode(&mut cursor).unwrap();
        buf
    }

    #[test]
    fn poll_dispatches_every_buffered_message_in_order() {
        let (publisher, subscriber_transport) = InMemoryTransport::pair();
        publisher.send(&encoded_keyframe(1)).unwrap();
        publisher.send(&encoded_keyframe(2)).unwrap();

        let subscriber = Subscriber::new(subscriber_transport, NoSecurity, NoKeys);
        let mut seen = Vec::new();
        let count = subscriber
            .poll(|message| {
                let DataSetMessagePayload::KeyFrame(fields) = &message.dataset_messages[0].payload
                else {
                    panic!("expected a key frame");
                };
                let FieldValue::Variant(Variant::Scalar(ScalarValue::UInt32(v))) = &fields[0]
                else {
                    panic!("expected a UInt32 variant");
                };
                seen.push(*v);
            })
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn poll_with_nothing_buffered_dispatches_nothing() {
        let (_publisher, subscriber_transport) = InMemoryTransport::pair();
        let subscriber = Subscriber::new(subscriber_transport, NoSecurity, NoKeys);
        let count = subscriber.poll(|_| panic!("no message should arrive")).unwrap();
        assert_eq!(count, 0);
    }
}
