//! Binary and JSON codec for OPC UA PubSub `NetworkMessage`s.
//!
//! This crate encodes and decodes the UADP binary wire format and the
//! JSON PubSub envelope format for the same underlying data model
//! (`NetworkMessage` → `DataSetMessage` → field values), plus a
//! precomputed offset table that lets a publisher mutate an
//! already-encoded buffer in place on the realtime hot path without
//! re-running the general encoder.
//!
//! Every codec entry point is a plain function over owned or borrowed
//! data; nothing in this crate spawns a thread, opens a socket, or reads
//! the clock. Transport, security key management, and scheduling live one
//! layer up, in `pubsub-rt`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod config;
pub mod cursor;
pub mod dataset_message;
pub mod datavalue;
pub mod error;
pub mod extension_object;
pub mod flags;
pub mod json;
pub mod network_message;
pub mod offsets;
pub mod primitives;
pub mod types;
pub mod variant;

pub use codec::{BinaryDecode, BinaryEncode};
pub use config::{CodecConfig, CustomTypeField, TypeDescriptor};
pub use cursor::{Cursor, Reader};
pub use dataset_message::{
    DataSetMessage, DataSetMessageHeader, DataSetMessagePayload, DataSetMessageType, FieldEncoding, FieldValue,
    RawField,
};
pub use datavalue::DataValue;
pub use error::{ProtocolError, Result};
pub use extension_object::{ExtensionObject, ExtensionObjectEncoding};
pub use json::{decode_network_message, decode_ua_metadata, encode_network_message, JsonCodecContext};
pub use network_message::{GroupHeader, NetworkMessage, NetworkMessageType, PayloadHeader, SecurityHeader};
pub use offsets::{OffsetEntry, OffsetKind, OffsetTable, OffsetTableState};
pub use types::{
    DiagnosticInfo, ExpandedNodeId, Guid, LocalizedText, NodeId, NodeIdIdentifier, PublisherId, PublisherIdKind,
    QualifiedName, StatusCode, UaByteString, UaDateTime, UaString,
};
pub use variant::{BuiltinTypeId, ScalarValue, Variant, VariantDimensions};
