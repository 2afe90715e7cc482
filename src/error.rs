//! Error kinds of the match runtime

use thiserror::Error;

use crate::MatchId;
use crate::sim::cooldown::Action;

/// Map could not be turned into a usable wall map. Fatal to match start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapLoadError {
    #[error("unknown map key `{0}`")]
    UnknownMap(String),
    #[error("map `{0}` has no wall segments")]
    Empty(String),
    #[error("map `{map}`: segment {index} has zero length")]
    DegenerateSegment { map: String, index: usize },
    #[error("map `{map}`: segment {index} has a non-finite coordinate")]
    NonFinite { map: String, index: usize },
    #[error("failed to parse map data: {0}")]
    Parse(String),
}

/// A gated action was attempted before its cooldown elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{action:?} is not ready ({remaining} ticks remaining)")]
pub struct NotReadyError {
    pub action: Action,
    pub remaining: u32,
}

/// Inbound event addressed to a match instance that is no longer active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event for match {found} discarded, active match is {expected}")]
pub struct StaleNetworkEvent {
    pub expected: MatchId,
    pub found: MatchId,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid configuration value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// Failure reported by a host collaborator (entity system, screens).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

/// Match could not be started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Map(#[from] MapLoadError),
}
