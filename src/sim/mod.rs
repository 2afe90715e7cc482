//! Deterministic match simulation
//!
//! All gameplay logic lives here. This module must stay presentation-free:
//! - Frame deltas are clamped, cooldowns advance in fixed steps
//! - No rendering, audio or network calls; side effects are returned as events
//! - Probes are kept in spawn order

pub mod cooldown;
pub mod input;
pub mod map;
pub mod segment;
pub mod state;
pub mod tick;
pub mod wave;

pub use cooldown::{Action, CooldownController};
pub use input::{Button, ButtonStates, EdgeDetector, Latch, PressEvent, Presses};
pub use map::{BuiltinMaps, JsonMaps, MAP1_KEY, MAP2_KEY, MapData, MapSource, SegmentMap};
pub use segment::WallSegment;
pub use state::{Hud, HudMessage, MatchEvent, MatchPhase, MatchState, RemoteEvent, Role};
pub use tick::{FrameInput, clamp_delta, tick};
pub use wave::{EmitterId, ExpandingProbe, ProbeDescriptor, WaveEngine};
