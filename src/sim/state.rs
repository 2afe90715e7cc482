//! Match state and core simulation types
//!
//! Everything that describes one running match lives here. The renderer reads
//! it through [`MatchState::hud`] and never mutates it.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::cooldown::{Action, CooldownController};
use super::input::EdgeDetector;
use super::map::SegmentMap;
use super::wave::{EmitterId, ProbeDescriptor, WaveEngine};
use crate::audio::MusicTrack;
use crate::settings::MatchConfig;
use crate::{PeerId, format_clock};

/// Fixed for the whole match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Hunter,
    Hidden,
}

/// Top-level phase of one played round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Active gameplay
    Playing,
    /// We were caught; spectating until the match ends
    CatchConfirmed,
    /// Exit prompt is showing
    ExitConfirmPending,
    /// Match over, back to the lobby
    Finished,
    /// Dropped from the lobby, back to the menu
    EliminatedFromLobby,
    /// We confirmed the exit prompt
    Left,
}

impl MatchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MatchPhase::Finished | MatchPhase::EliminatedFromLobby | MatchPhase::Left
        )
    }
}

/// Transient HUD message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HudMessage {
    /// "You got caught"
    Caught,
    /// "You caught someone"
    CaughtSomeone,
}

/// Requests the simulation makes to its collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum MatchEvent {
    /// Apply a dash impulse (direction scaled by the configured impulse)
    Dash { impulse: Vec2 },
    /// A timed local burst to broadcast
    LocalBurst(ProbeDescriptor),
    /// Hunter catch attempt with the peers in range
    CatchAttempt { origin: Vec2, targets: Vec<PeerId> },
    ShowMessage(HudMessage),
    HideMessage,
    HideDash,
    ShowExitPrompt,
    HideExitPrompt,
    /// Remove the local player entity
    ReleaseLocalEntity,
    StopAudio,
    PlayTrack(MusicTrack),
    /// Tell the other players we are leaving
    LeaveMatch,
    ReturnToLobby(String),
    ReturnToMenu,
}

/// Inbound events already filtered for this match and this client
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Burst(ProbeDescriptor),
    /// We have been caught
    Caught { by: PeerId },
    /// Our catch attempt succeeded
    CatchSucceeded { target: PeerId },
    Finished,
    /// We have been dropped from the lobby
    Eliminated,
    /// Authoritative remaining match time
    TimeRemaining(f32),
}

/// Snapshot of what the HUD shows
#[derive(Debug, Clone, PartialEq)]
pub struct Hud {
    pub clock: String,
    pub dash_label: String,
    /// Only for the hunter
    pub catch_label: Option<String>,
    pub dash_visible: bool,
    pub message: Option<HudMessage>,
    pub exit_prompt_visible: bool,
    pub danger_nearby: bool,
    pub joystick_left: bool,
}

/// Complete state of one match instance
#[derive(Debug, Clone)]
pub struct MatchState {
    pub config: MatchConfig,
    pub map: SegmentMap,
    pub phase: MatchPhase,
    /// Phase the exit prompt returns to on cancel
    pub resume_phase: MatchPhase,
    pub cooldowns: CooldownController,
    pub edges: EdgeDetector,
    pub waves: WaveEngine,
    /// Seconds left on the match clock
    pub time_remaining: f32,
    /// Visible message and seconds until it hides
    pub message: Option<(HudMessage, f32)>,
    pub caught: bool,
    pub dash_visible: bool,
    pub exit_prompt_visible: bool,
    /// Emitters whose waves reach us this frame
    pub detected: BTreeSet<EmitterId>,
    pub danger_nearby: bool,
    /// Last non-zero joystick direction, used for dashes
    pub facing: Vec2,
    /// Whether the local entity has been released
    pub entity_released: bool,
    /// Frame counter
    pub frames: u64,
    /// Leftover time not yet consumed by fixed steps
    pub(crate) step_accumulator: f32,
}

impl MatchState {
    pub fn new(config: MatchConfig, map: SegmentMap) -> Self {
        let waves = WaveEngine::new(config.waves.clone(), map.max_radius());
        Self {
            cooldowns: CooldownController::new(&config.cooldowns),
            edges: EdgeDetector::new(),
            waves,
            time_remaining: config.match_duration,
            phase: MatchPhase::Playing,
            resume_phase: MatchPhase::Playing,
            message: None,
            caught: false,
            dash_visible: true,
            exit_prompt_visible: false,
            detected: BTreeSet::new(),
            danger_nearby: false,
            facing: Vec2::X,
            entity_released: false,
            frames: 0,
            step_accumulator: 0.0,
            config,
            map,
        }
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn local_id(&self) -> PeerId {
        self.config.local_id
    }

    /// Whether the local player may move and act
    pub fn is_active(&self) -> bool {
        !self.caught && !self.phase.is_terminal()
    }

    pub fn hud(&self) -> Hud {
        let label = |name: &str, action: Action| {
            if self.cooldowns.is_ready(action) {
                format!("{name} Ready")
            } else {
                format!("{name} {}", self.cooldowns.remaining_secs(action))
            }
        };
        Hud {
            clock: format_clock(self.time_remaining),
            dash_label: label("Dash", Action::Dash),
            catch_label: (self.role() == Role::Hunter).then(|| label("CATCH", Action::Catch)),
            dash_visible: self.dash_visible,
            message: self.message.map(|(m, _)| m),
            exit_prompt_visible: self.exit_prompt_visible,
            danger_nearby: self.danger_nearby,
            joystick_left: self.config.joystick_left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::map::{BuiltinMaps, MAP1_KEY};

    fn state(role: Role) -> MatchState {
        let config = MatchConfig {
            role,
            ..Default::default()
        };
        let map = SegmentMap::load(&BuiltinMaps, MAP1_KEY).unwrap();
        MatchState::new(config, map)
    }

    #[test]
    fn test_initial_state() {
        let s = state(Role::Hidden);
        assert_eq!(s.phase, MatchPhase::Playing);
        assert!(s.is_active());
        assert!(s.waves.is_empty());
        assert_eq!(s.time_remaining, s.config.match_duration);
    }

    #[test]
    fn test_hud_labels() {
        let mut hunter = state(Role::Hunter);
        let hud = hunter.hud();
        assert_eq!(hud.clock, "3:00");
        assert_eq!(hud.dash_label, "Dash Ready");
        assert_eq!(hud.catch_label.as_deref(), Some("CATCH Ready"));

        hunter.cooldowns.consume(Action::Catch).unwrap();
        assert_eq!(hunter.hud().catch_label.as_deref(), Some("CATCH 5"));

        assert!(state(Role::Hidden).hud().catch_label.is_none());
    }

    #[test]
    fn test_terminal_phases() {
        assert!(MatchPhase::Finished.is_terminal());
        assert!(MatchPhase::EliminatedFromLobby.is_terminal());
        assert!(MatchPhase::Left.is_terminal());
        assert!(!MatchPhase::ExitConfirmPending.is_terminal());
        assert!(!MatchPhase::CatchConfirmed.is_terminal());
    }
}
