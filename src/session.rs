//! Match session
//!
//! Owns one running match: the simulation state, the sync driver and the host
//! collaborators. Each frame it drains the network, steers the player, runs
//! [`sim::tick`](crate::sim::tick::tick) and carries out the returned events.
//!
//! Terminal cleanup is idempotent. The local entity is removed at most once
//! and at most one lobby/menu request is issued, however many end signals
//! arrive or how often [`MatchSession::dispose`] is called.

use glam::Vec2;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;

use crate::audio::MusicTrack;
use crate::error::{HostError, SessionError};
use crate::net::queue::Inbox;
use crate::net::{NetworkSyncDriver, Transport};
use crate::platform::{EntityId, Host};
use crate::settings::MatchConfig;
use crate::sim::input::ButtonStates;
use crate::sim::map::{MapSource, SegmentMap};
use crate::sim::state::{Hud, MatchEvent, MatchPhase, MatchState, Role};
use crate::sim::tick::{FrameInput, clamp_delta, tick};

/// Raw controls sampled by the host this frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawInput {
    pub buttons: ButtonStates,
    /// Joystick direction, any length
    pub direction: Vec2,
}

/// Outcome of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub phase: MatchPhase,
    /// Simulated frames so far, this one included
    pub frame: u64,
    pub events: Vec<MatchEvent>,
    /// Collaborator failures during cleanup; logged, never blocking
    pub cleanup_errors: Vec<HostError>,
}

pub struct MatchSession<H: Host, T: Transport> {
    state: MatchState,
    host: H,
    driver: NetworkSyncDriver<T>,
    entity: Option<EntityId>,
    /// A lobby or menu request has been issued
    navigated: bool,
    disposed: bool,
}

impl<H: Host, T: Transport> MatchSession<H, T> {
    /// Validate the configuration, load the map and spawn the local player
    ///
    /// Nothing is spawned and no audio changes if the map fails to load.
    pub fn start(
        config: MatchConfig,
        maps: &dyn MapSource,
        mut host: H,
        inbox: Inbox,
        transport: T,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let map = SegmentMap::load(maps, &config.map_key)?;
        let spawn = choose_spawn(&config, &map);

        host.stop();
        host.play(MusicTrack::Match);
        let entity = host.spawn_player(spawn);

        log::info!(
            "Match {} started on `{}` as {:?} (peer {}) at {}",
            config.match_id,
            map.key(),
            config.role,
            config.local_id,
            spawn
        );

        let driver = NetworkSyncDriver::new(config.match_id, config.local_id, inbox, transport);
        Ok(Self {
            state: MatchState::new(config, map),
            host,
            driver,
            entity: Some(entity),
            navigated: false,
            disposed: false,
        })
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    pub fn hud(&self) -> Hud {
        self.state.hud()
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn driver(&self) -> &NetworkSyncDriver<T> {
        &self.driver
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Run one rendered frame
    pub fn frame(&mut self, dt: f32, input: &RawInput) -> FrameReport {
        let mut report = FrameReport {
            phase: self.state.phase,
            frame: self.state.frames,
            events: Vec::new(),
            cleanup_errors: Vec::new(),
        };
        if self.disposed || self.state.phase.is_terminal() {
            return report;
        }

        let dt = clamp_delta(dt);
        let remote = self.driver.drain();

        if self.state.is_active() && self.state.phase == MatchPhase::Playing {
            let direction = input.direction.normalize_or_zero();
            self.host
                .apply_direction(direction, self.state.config.move_speed, dt);
        }

        let frame = FrameInput {
            buttons: input.buttons,
            position: self.host.position(),
            move_direction: input.direction,
            remote,
            peers: self.driver.peer_positions(),
        };
        report.events = tick(&mut self.state, &frame, dt);

        for event in &report.events {
            self.apply(event, &mut report.cleanup_errors);
        }

        if self.state.phase.is_terminal() {
            self.driver.close();
        } else {
            self.driver.emit_state(self.host.position());
        }
        report.phase = self.state.phase;
        report.frame = self.state.frames;
        report
    }

    fn apply(&mut self, event: &MatchEvent, errors: &mut Vec<HostError>) {
        match event {
            MatchEvent::Dash { impulse } => self.host.dash(*impulse),
            MatchEvent::LocalBurst(desc) => self.driver.send_burst(*desc),
            MatchEvent::CatchAttempt { origin, targets } => {
                self.driver.send_catch_attempt(*origin, targets.clone())
            }
            MatchEvent::ReleaseLocalEntity => self.release_entity(errors),
            MatchEvent::StopAudio => self.host.stop(),
            MatchEvent::PlayTrack(track) => self.host.play(*track),
            MatchEvent::LeaveMatch => self.driver.send_leave(),
            MatchEvent::ReturnToLobby(lobby_id) => {
                if self.begin_navigation() {
                    if let Err(e) = self.host.go_to_lobby(lobby_id) {
                        log::error!("Return to lobby `{lobby_id}` failed: {e}");
                        errors.push(e);
                    }
                }
            }
            MatchEvent::ReturnToMenu => {
                if self.begin_navigation() {
                    if let Err(e) = self.host.go_to_menu() {
                        log::error!("Return to menu failed: {e}");
                        errors.push(e);
                    }
                }
            }
            // HUD changes are read back through `hud()`
            MatchEvent::ShowMessage(_)
            | MatchEvent::HideMessage
            | MatchEvent::HideDash
            | MatchEvent::ShowExitPrompt
            | MatchEvent::HideExitPrompt => {}
        }
    }

    fn begin_navigation(&mut self) -> bool {
        !std::mem::replace(&mut self.navigated, true)
    }

    fn release_entity(&mut self, errors: &mut Vec<HostError>) {
        if let Some(id) = self.entity.take() {
            if let Err(e) = self.host.remove_entity(id) {
                log::error!("Failed to remove local entity {id}: {e}");
                errors.push(e);
            }
        }
    }

    /// Tear the match down without navigating. Safe to call repeatedly and
    /// after a terminal phase.
    pub fn dispose(&mut self) -> Vec<HostError> {
        let mut errors = Vec::new();
        if self.disposed {
            return errors;
        }
        self.disposed = true;

        self.release_entity(&mut errors);
        self.state.entity_released = true;
        self.state.waves.clear();
        if !self.state.phase.is_terminal() {
            self.host.stop();
        }
        self.driver.close();
        log::debug!("Match {} disposed", self.state.config.match_id);
        errors
    }
}

fn choose_spawn(config: &MatchConfig, map: &SegmentMap) -> Vec2 {
    match config.role {
        Role::Hunter => map.hunter_spawn(),
        Role::Hidden => {
            let mut rng = Pcg32::seed_from_u64(config.seed ^ config.local_id);
            map.hidden_spawns()
                .choose(&mut rng)
                .copied()
                .unwrap_or_else(|| map.hunter_spawn())
        }
    }
}
