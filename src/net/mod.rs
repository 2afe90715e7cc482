//! Network sync driver
//!
//! Bridges the match to whatever transport carries peer messages:
//! - Inbound: queued by the transport, drained and filtered once per frame
//! - Outbound: local position and ping every frame, bursts, catch attempts, leave
//!
//! The driver never blocks and never retries; a failed send is logged and
//! dropped.

pub mod protocol;
pub mod queue;

use std::collections::BTreeMap;

use glam::Vec2;

use crate::error::{StaleNetworkEvent, TransportError};
use crate::sim::state::RemoteEvent;
use crate::sim::wave::ProbeDescriptor;
use crate::{MatchId, PeerId};
use protocol::{Control, Envelope, PeerMessage, encode};
use queue::{Inbox, InboxSender};

/// Outbound half of a peer connection
pub trait Transport {
    fn send(&mut self, envelope: Envelope) -> Result<(), TransportError>;
}

/// In-process transport delivering encoded messages to a set of inboxes
#[derive(Debug, Clone, Default)]
pub struct LoopbackTransport {
    targets: Vec<InboxSender>,
    closed: bool,
}

impl LoopbackTransport {
    pub fn new(targets: Vec<InboxSender>) -> Self {
        Self {
            targets,
            closed: false,
        }
    }

    pub fn connect(&mut self, target: InboxSender) {
        self.targets.push(target);
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Transport for LoopbackTransport {
    fn send(&mut self, envelope: Envelope) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let data = encode(&envelope).map_err(|e| TransportError::Send(e.to_string()))?;
        for target in &self.targets {
            target
                .push_encoded(&data)
                .map_err(|e| TransportError::Send(e.to_string()))?;
        }
        Ok(())
    }
}

/// Last known state of another player
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RemotePeer {
    pub position: Vec2,
    pub last_ping: Option<u32>,
    /// Caught players are spectators and no longer catchable
    pub caught: bool,
}

pub struct NetworkSyncDriver<T: Transport> {
    match_id: MatchId,
    local_id: PeerId,
    inbox: Inbox,
    transport: T,
    peers: BTreeMap<PeerId, RemotePeer>,
    ping_seq: u32,
    closed: bool,
}

impl<T: Transport> NetworkSyncDriver<T> {
    pub fn new(match_id: MatchId, local_id: PeerId, inbox: Inbox, transport: T) -> Self {
        Self {
            match_id,
            local_id,
            inbox,
            transport,
            peers: BTreeMap::new(),
            ping_seq: 0,
            closed: false,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn peers(&self) -> &BTreeMap<PeerId, RemotePeer> {
        &self.peers
    }

    /// Positions of peers that can still be caught, ordered by id
    pub fn peer_positions(&self) -> Vec<(PeerId, Vec2)> {
        self.peers
            .iter()
            .filter(|(_, p)| !p.caught)
            .map(|(&id, p)| (id, p.position))
            .collect()
    }

    fn accept(&self, envelope: &Envelope) -> Result<(), StaleNetworkEvent> {
        if envelope.match_id == self.match_id {
            Ok(())
        } else {
            Err(StaleNetworkEvent {
                expected: self.match_id,
                found: envelope.match_id,
            })
        }
    }

    /// Drain queued messages into simulation events
    ///
    /// Messages for another match id and our own echoes are discarded. After
    /// [`close`](Self::close) everything is discarded.
    pub fn drain(&mut self) -> Vec<RemoteEvent> {
        let inbound = self.inbox.drain();
        let mut events = Vec::new();
        if self.closed {
            return events;
        }

        for envelope in inbound {
            if let Err(stale) = self.accept(&envelope) {
                log::debug!("{stale}");
                continue;
            }
            if envelope.sender == self.local_id {
                continue;
            }
            if let Some(event) = self.handle(envelope.sender, envelope.message) {
                events.push(event);
            }
        }
        events
    }

    fn handle(&mut self, sender: PeerId, message: PeerMessage) -> Option<RemoteEvent> {
        match message {
            PeerMessage::Position { x, y } => {
                self.peers.entry(sender).or_default().position = Vec2::new(x, y);
                None
            }
            PeerMessage::Ping { seq } => {
                self.peers.entry(sender).or_default().last_ping = Some(seq);
                None
            }
            PeerMessage::BurstEmitted { x, y } => Some(RemoteEvent::Burst(ProbeDescriptor {
                emitter: sender,
                origin: Vec2::new(x, y),
            })),
            PeerMessage::CatchAttempt { targets, .. } => {
                log::debug!("Peer {sender} attempted a catch on {targets:?}");
                None
            }
            PeerMessage::Leave => {
                log::info!("Peer {sender} left the match");
                self.peers.remove(&sender);
                None
            }
            PeerMessage::MatchControl(control) => self.handle_control(control),
        }
    }

    fn handle_control(&mut self, control: Control) -> Option<RemoteEvent> {
        match control {
            Control::Caught { hunter, hidden } if hidden == self.local_id => {
                Some(RemoteEvent::Caught { by: hunter })
            }
            Control::Caught { hunter, hidden } => {
                if let Some(peer) = self.peers.get_mut(&hidden) {
                    peer.caught = true;
                }
                (hunter == self.local_id).then_some(RemoteEvent::CatchSucceeded { target: hidden })
            }
            Control::Finished => Some(RemoteEvent::Finished),
            Control::Eliminated { peer } if peer == self.local_id => Some(RemoteEvent::Eliminated),
            Control::Eliminated { peer } => {
                log::info!("Peer {peer} eliminated from the lobby");
                self.peers.remove(&peer);
                None
            }
            Control::TimeRemaining { secs } => Some(RemoteEvent::TimeRemaining(secs)),
        }
    }

    fn send(&mut self, message: PeerMessage) {
        if self.closed {
            log::debug!("Driver closed, dropping {message:?}");
            return;
        }
        let envelope = Envelope::new(self.match_id, self.local_id, message);
        if let Err(e) = self.transport.send(envelope) {
            log::warn!("Send failed for match {}: {e}", self.match_id);
        }
    }

    /// Per-frame outbound state: position followed by a ping
    pub fn emit_state(&mut self, position: Vec2) {
        if self.closed {
            return;
        }
        self.send(PeerMessage::position(position));
        self.ping_seq = self.ping_seq.wrapping_add(1);
        self.send(PeerMessage::Ping { seq: self.ping_seq });
    }

    pub fn send_burst(&mut self, desc: ProbeDescriptor) {
        self.send(PeerMessage::burst(desc.origin));
    }

    pub fn send_catch_attempt(&mut self, origin: Vec2, targets: Vec<PeerId>) {
        self.send(PeerMessage::CatchAttempt {
            x: origin.x,
            y: origin.y,
            targets,
        });
    }

    pub fn send_leave(&mut self) {
        self.send(PeerMessage::Leave);
    }

    /// Stop sending, discard everything still queued and refuse further
    /// inbound messages. Idempotent.
    pub fn close(&mut self) {
        if !self.closed {
            log::debug!("Closing sync driver for match {}", self.match_id);
            self.closed = true;
            self.inbox.close();
        }
    }

    /// Messages waiting to be drained
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCH: MatchId = 5;
    const LOCAL: PeerId = 1;

    fn driver() -> (NetworkSyncDriver<LoopbackTransport>, InboxSender, Inbox) {
        let inbox = Inbox::new();
        let tx = inbox.sender();
        let outbox = Inbox::new();
        let transport = LoopbackTransport::new(vec![outbox.sender()]);
        (NetworkSyncDriver::new(MATCH, LOCAL, inbox, transport), tx, outbox)
    }

    fn control(c: Control) -> Envelope {
        Envelope::new(MATCH, 0, PeerMessage::MatchControl(c))
    }

    #[test]
    fn test_stale_and_echo_discarded() {
        let (mut d, tx, _) = driver();
        tx.push(Envelope::new(MATCH - 1, 2, PeerMessage::burst(Vec2::ZERO)));
        tx.push(Envelope::new(MATCH, LOCAL, PeerMessage::burst(Vec2::ZERO)));
        tx.push(Envelope::new(MATCH, 2, PeerMessage::burst(Vec2::ONE)));
        let events = d.drain();
        assert_eq!(
            events,
            vec![RemoteEvent::Burst(ProbeDescriptor {
                emitter: 2,
                origin: Vec2::ONE
            })]
        );
    }

    #[test]
    fn test_caught_mapping() {
        let (mut d, tx, _) = driver();
        tx.push(control(Control::Caught { hunter: 9, hidden: LOCAL }));
        tx.push(control(Control::Caught { hunter: LOCAL, hidden: 4 }));
        tx.push(control(Control::Caught { hunter: 9, hidden: 7 }));
        assert_eq!(
            d.drain(),
            vec![
                RemoteEvent::Caught { by: 9 },
                RemoteEvent::CatchSucceeded { target: 4 }
            ]
        );
    }

    #[test]
    fn test_peer_tracking() {
        let (mut d, tx, _) = driver();
        tx.push(Envelope::new(MATCH, 3, PeerMessage::position(Vec2::new(1.0, 2.0))));
        tx.push(Envelope::new(MATCH, 2, PeerMessage::position(Vec2::new(5.0, 5.0))));
        tx.push(Envelope::new(MATCH, 2, PeerMessage::Ping { seq: 4 }));
        assert!(d.drain().is_empty());
        assert_eq!(
            d.peer_positions(),
            vec![(2, Vec2::new(5.0, 5.0)), (3, Vec2::new(1.0, 2.0))]
        );
        assert_eq!(d.peers()[&2].last_ping, Some(4));

        tx.push(control(Control::Caught { hunter: 9, hidden: 2 }));
        tx.push(control(Control::Eliminated { peer: 3 }));
        assert!(d.drain().is_empty());
        assert!(d.peer_positions().is_empty());

        tx.push(control(Control::Eliminated { peer: LOCAL }));
        assert_eq!(d.drain(), vec![RemoteEvent::Eliminated]);
    }

    #[test]
    fn test_emit_state_and_close() {
        let (mut d, tx, outbox) = driver();
        d.emit_state(Vec2::new(3.0, 4.0));
        let sent = outbox.drain();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].message, PeerMessage::Position { x: 3.0, y: 4.0 });
        assert_eq!(sent[1].message, PeerMessage::Ping { seq: 1 });
        assert!(sent.iter().all(|e| e.match_id == MATCH && e.sender == LOCAL));

        d.send_leave();
        d.close();
        d.close();
        d.emit_state(Vec2::ZERO);
        d.send_burst(ProbeDescriptor {
            emitter: LOCAL,
            origin: Vec2::ZERO,
        });
        assert_eq!(outbox.drain().len(), 1);

        tx.push(control(Control::Finished));
        assert_eq!(d.pending(), 0);
        assert!(d.drain().is_empty());
    }

    #[test]
    fn test_close_stops_inbound_growth() {
        let (mut d, tx, _) = driver();
        tx.push(Envelope::new(MATCH, 2, PeerMessage::Ping { seq: 1 }));
        assert_eq!(d.pending(), 1);
        d.close();
        assert_eq!(d.pending(), 0);
        for seq in 0..50 {
            tx.push(Envelope::new(MATCH, 2, PeerMessage::Ping { seq }));
        }
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn test_closed_transport_does_not_panic() {
        let (mut d, _, outbox) = driver();
        let mut transport = LoopbackTransport::new(vec![outbox.sender()]);
        transport.close();
        assert_eq!(
            transport.send(Envelope::new(MATCH, LOCAL, PeerMessage::Leave)),
            Err(TransportError::Closed)
        );
        d.send_catch_attempt(Vec2::ZERO, vec![2]);
        assert_eq!(outbox.drain().len(), 1);
    }
}
