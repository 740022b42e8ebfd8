//! Round-trip and boundary properties for the binary and JSON codecs,
//! generated across a broad slice of `NetworkMessage` shapes rather than
//! hand-picked examples.

use proptest::prelude::*;
use pubsub_harness::strategies::network_message_strategy;
use pubsub_proto::{
    BinaryDecode, BinaryEncode, CodecConfig, Cursor, JsonCodecContext, ProtocolError, Reader,
    decode_network_message, encode_network_message,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// `decode_binary(encode_binary(m))` reproduces `m` structurally.
    #[test]
    fn binary_round_trips(message in network_message_strategy()) {
        let mut buf = vec![0u8; message.calc_size()];
        let mut cursor = Cursor::writer(&mut buf);
        message.encode(&mut cursor).unwrap();

        let mut reader = Reader::new(&buf);
        let decoded = pubsub_proto::NetworkMessage::decode(&mut reader).unwrap();
        prop_assert_eq!(decoded, message);
    }

    /// `calc_size` and the actual encoded length never disagree.
    #[test]
    fn calc_size_matches_encoded_length(message in network_message_strategy()) {
        let predicted = message.calc_size();
        let mut buf = vec![0u8; predicted];
        let mut cursor = Cursor::writer(&mut buf);
        message.encode(&mut cursor).unwrap();
        prop_assert_eq!(cursor.position(), predicted);
    }

    /// Encoding into a buffer one byte short of `calc_size` always fails
    /// with `BufferTooSmall`, never a silent truncated write.
    #[test]
    fn undersized_buffer_always_rejected(message in network_message_strategy()) {
        let needed = message.calc_size();
        prop_assume!(needed > 0);
        let mut buf = vec![0u8; needed - 1];
        let mut cursor = Cursor::writer(&mut buf);
        let result = message.encode(&mut cursor);
        prop_assert!(matches!(result, Err(ProtocolError::BufferTooSmall { .. })));
    }

    /// Decoding any strict prefix of a valid encoding never succeeds.
    #[test]
    fn truncated_prefix_never_decodes(message in network_message_strategy(), cut in 0usize..64) {
        let mut buf = vec![0u8; message.calc_size()];
        let mut cursor = Cursor::writer(&mut buf);
        message.encode(&mut cursor).unwrap();
        prop_assume!(cut > 0 && cut < buf.len());

        let truncated = &buf[..buf.len() - cut];
        let mut reader = Reader::new(truncated);
        prop_assert!(pubsub_proto::NetworkMessage::decode(&mut reader).is_err());
    }

    /// `decode_json(encode_json(m))` reproduces `m` structurally, for
    /// messages whose shape the JSON envelope can carry (a `PayloadHeader`
    /// supplying writer ids whenever more than one dataset message rides
    /// along).
    #[test]
    fn json_round_trips(message in network_message_strategy()) {
        let config = CodecConfig::default();
        let ctx = JsonCodecContext::new(&config);
        let json = encode_network_message(&message, "00000000-0000-0000-0000-000000000000", &ctx).unwrap();

        let writer_ids: Vec<u16> = message
            .payload_header
            .as_ref()
            .map(|h| h.dataset_writer_ids.clone())
            .unwrap_or_else(|| vec![0]);
        let decode_ctx = JsonCodecContext::with_dataset_writer_ids(&config, &writer_ids);
        let decoded = decode_network_message(&json, &decode_ctx).unwrap();

        prop_assert_eq!(decoded.dataset_messages.len(), message.dataset_messages.len());
    }
}
