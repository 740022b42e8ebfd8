//! The `Transport` boundary: how encoded `NetworkMessage` bytes actually
//! leave and arrive at a process. No concrete network transport (UDP
//! multicast, MQTT, AMQP) is implemented here — that mapping is left to the
//! embedding application, exactly as spec.md's Non-goals exclude transport
//! framing. [`InMemoryTransport`] is the one concrete implementation this
//! crate carries, used by tests and the CLI's `demo-rt` subcommand.

use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

use crate::error::RtError;

/// Send and receive already-encoded `NetworkMessage` buffers.
///
/// A publisher calls `send` once per publish cycle; a subscriber polls
/// `try_recv` on its own schedule. Neither side interprets the bytes —
/// that's `pubsub-proto`'s job one layer up.
pub trait Transport {
    /// Hand an encoded buffer off to the transport. Errors are
    /// transport-specific (socket closed, queue full, peer unreachable).
    fn send(&self, bytes: &[u8]) -> Result<(), RtError>;

    /// Poll for the next available buffer without blocking. `Ok(None)`
    /// means nothing is currently available, not an error.
    fn try_recv(&self) -> Result<Option<Vec<u8>>, RtError>;
}

/// An unbounded in-process channel pair standing in for a real network
/// transport. Used by `pubsub-harness`'s property tests and by
/// `pubsub-cli demo-rt`, which both run publisher and subscriber in the
/// same process.
pub struct InMemoryTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl InMemoryTransport {
    /// Build a connected publisher/subscriber pair sharing one channel.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = channel();
        let (tx_b, rx_b) = channel();
        (Self { tx: tx_a, rx: rx_b }, Self { tx: tx_b, rx: rx_a })
    }
}

impl Transport for InMemoryTransport {
    fn send(&self, bytes: &[u8]) -> Result<(), RtError> {
        self.tx.send(bytes.to_vec()).map_err(|e| RtError::Transport(e.to_string()))
    }

    fn try_recv(&self) -> Result<Option<Vec<u8>>, RtError> {
        match self.rx.try_recv() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(RtError::Transport("peer transport disconnected".into()))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_delivers_in_both_directions() {
        let (a, b) = InMemoryTransport::pair();
        a.send(&[1, 2, 3]).unwrap();
        assert_eq!(b.try_recv().unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(b.try_recv().unwrap(), None);

        b.send(&[9]).unwrap();
        assert_eq!(a.try_recv().unwrap(), Some(vec![9]));
    }

    #[test]
    fn recv_on_dropped_peer_errors() {
        let (a, b) = InMemoryTransport::pair();
        drop(b);
        assert!(a.try_recv().is_err());
    }
}
