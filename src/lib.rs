//! Dark and Silent - client-side match runtime
//!
//! Core modules:
//! - `sim`: Deterministic match simulation (wall map, waves, cooldowns, input edges, phases)
//! - `net`: Network sync driver (inbound queue, outbound position/ping, protocol)
//! - `platform`: Collaborator traits for entities, movement and screen transitions
//! - `session`: Per-frame wiring of the simulation to its collaborators
//! - `settings`: Per-match configuration

pub mod audio;
pub mod error;
pub mod net;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, MapLoadError, NotReadyError, SessionError, StaleNetworkEvent};
pub use session::{FrameReport, MatchSession, RawInput};
pub use settings::MatchConfig;

use glam::Vec2;

/// Identifier of a player connected to the match.
pub type PeerId = u64;

/// Identifier of one match instance.
pub type MatchId = u64;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation steps per second
    pub const TICKS_PER_SECOND: u32 = 60;
    /// Fixed simulation timestep (cooldowns tick once per step)
    pub const SIM_DT: f32 = 1.0 / TICKS_PER_SECOND as f32;
    /// Frame deltas above this are capped before being applied
    pub const MAX_DELTA_TIME: f32 = 1.0 / 20.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Angular distance between two sampled rays of a probe (degrees)
    pub const DEFAULT_STEP_ANGLE_DEG: f32 = 0.3;
    /// Probe radius growth (map units per second, 10 per frame at 60 fps)
    pub const DEFAULT_WAVE_SPEED: f32 = 600.0;
    /// Probes older than this are pruned (seconds)
    pub const DEFAULT_WAVE_LIFETIME: f32 = 3.0;
    /// How close a ray must pass to a target to detect it
    pub const DEFAULT_DETECTION_TOLERANCE: f32 = 8.0;
    /// Interval between two timed bursts of the hidden player (seconds)
    pub const DEFAULT_BURST_INTERVAL: f32 = 2.0;

    /// Cooldowns in fixed steps
    pub const DEFAULT_DASH_COOLDOWN_TICKS: u32 = 3 * TICKS_PER_SECOND;
    pub const DEFAULT_CATCH_COOLDOWN_TICKS: u32 = 5 * TICKS_PER_SECOND;

    pub const DEFAULT_MATCH_DURATION: f32 = 180.0;
    pub const DEFAULT_MESSAGE_DURATION: f32 = 3.0;
    pub const DEFAULT_MOVE_SPEED: f32 = 220.0;
    pub const DEFAULT_DASH_IMPULSE: f32 = 160.0;
    pub const DEFAULT_CATCH_RANGE: f32 = 60.0;

    /// Intersections closer than this to a ray origin are ignored
    pub const ORIGIN_EPSILON: f32 = 1e-3;
    /// Segments shorter than this are rejected at map load
    pub const MIN_SEGMENT_LENGTH: f32 = 1e-3;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Format seconds as a `m:ss` clock
pub fn format_clock(secs: f32) -> String {
    let total = secs.max(0.0).ceil() as u32;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0.0), "0:00");
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(59.2), "1:00");
        assert_eq!(format_clock(125.0), "2:05");
    }

    #[test]
    fn test_polar_to_cartesian() {
        let p = polar_to_cartesian(2.0, std::f32::consts::FRAC_PI_2);
        assert!(p.x.abs() < 1e-5);
        assert!((p.y - 2.0).abs() < 1e-5);
    }
}
