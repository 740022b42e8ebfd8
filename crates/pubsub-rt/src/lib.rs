//! Realtime control loops
//!
//! The offset-table publish fast path and the subscriber demux loop built
//! on top of [`pubsub_proto`]'s codec: a publisher fixes a `NetworkMessage`
//! shape once and mutates a persistent buffer in place on every cycle; a
//! subscriber pulls buffers off a transport and decodes them one at a time.
//!
//! # Architecture
//!
//! Everything in this crate is a thin driver over three collaborator
//! traits — [`Transport`], [`SecurityPolicy`], and [`SecurityKeyService`] —
//! so the control loops stay decoupled from any concrete network stack or
//! security implementation. Neither is provided here beyond
//! [`InMemoryTransport`] and [`NoSecurity`], both test doubles.
//!
//! # Components
//!
//! - [`PublishedDataSet`]: the realtime publish fast path
//! - [`Subscriber`]: the receive-side demultiplex loop
//! - [`Transport`]: send/receive boundary for encoded buffers
//! - [`SecurityPolicy`] / [`SecurityKeyService`]: signing, encryption, and
//!   key lookup boundaries

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod publisher;
mod security;
mod subscriber;
mod transport;

pub use error::RtError;
pub use publisher::PublishedDataSet;
pub use security::{NoSecurity, SecurityKeyService, SecurityPolicy};
pub use subscriber::Subscriber;
pub use transport::{InMemoryTransport, Transport};
