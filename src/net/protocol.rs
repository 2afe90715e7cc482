//! Peer message types and their JSON encoding.
//!
//! Every message travels inside an [`Envelope`] carrying the match id it was
//! produced for, so messages from a previous match can be told apart.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::{MatchId, PeerId};

/// Addressed message as it travels on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope {
    pub match_id: MatchId,
    pub sender: PeerId,
    pub message: PeerMessage,
}

/// Match-level control messages, usually issued by the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Control {
    /// `hunter` caught `hidden`.
    Caught { hunter: PeerId, hidden: PeerId },
    Finished,
    /// `peer` dropped out of the lobby.
    Eliminated { peer: PeerId },
    /// Authoritative remaining match time in seconds.
    TimeRemaining { secs: f32 },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMessage {
    Position { x: f32, y: f32 },
    Ping { seq: u32 },
    BurstEmitted { x: f32, y: f32 },
    CatchAttempt { x: f32, y: f32, targets: Vec<PeerId> },
    Leave,
    MatchControl(Control),
}

impl PeerMessage {
    pub fn position(position: Vec2) -> Self {
        PeerMessage::Position {
            x: position.x,
            y: position.y,
        }
    }

    pub fn burst(origin: Vec2) -> Self {
        PeerMessage::BurstEmitted {
            x: origin.x,
            y: origin.y,
        }
    }
}

impl Envelope {
    pub fn new(match_id: MatchId, sender: PeerId, message: PeerMessage) -> Self {
        Self {
            match_id,
            sender,
            message,
        }
    }
}

pub fn encode(envelope: &Envelope) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(envelope)?)
}

pub fn decode(data: &str) -> Result<Envelope, ProtocolError> {
    Ok(serde_json::from_str(data)?)
}
