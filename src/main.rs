//! Dark and Silent headless demo
//!
//! Runs one hunter and one hidden session in-process, linked by loopback
//! transports, with a small referee standing in for the match server. Pass a
//! JSON `MatchConfig` path as the first argument to override the tuning.

use std::collections::BTreeSet;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use dark_and_silent::net::protocol::{Control, Envelope, PeerMessage};
use dark_and_silent::net::queue::Inbox;
use dark_and_silent::net::{LoopbackTransport, Transport};
use dark_and_silent::platform::HeadlessHost;
use dark_and_silent::sim::{BuiltinMaps, Button, ButtonStates, Role, SegmentMap};
use dark_and_silent::{MatchConfig, MatchId, MatchSession, PeerId, RawInput, polar_to_cartesian};

const REFEREE_ID: PeerId = 0;
const HUNTER_ID: PeerId = 1;
const HIDDEN_ID: PeerId = 2;
const FRAME_DT: f32 = 1.0 / 60.0;

type Session = MatchSession<HeadlessHost, LoopbackTransport>;

/// Resolves catch attempts and owns the authoritative clock
struct Referee {
    match_id: MatchId,
    inbox: Inbox,
    transport: LoopbackTransport,
    hidden: BTreeSet<PeerId>,
    time_remaining: f32,
    since_sync: f32,
    finished: bool,
}

impl Referee {
    fn step(&mut self, dt: f32) {
        for envelope in self.inbox.drain() {
            if envelope.match_id != self.match_id {
                continue;
            }
            match envelope.message {
                PeerMessage::CatchAttempt { targets, .. } => {
                    for target in targets {
                        if self.hidden.remove(&target) {
                            log::info!("Referee: {} caught {}", envelope.sender, target);
                            self.broadcast(Control::Caught {
                                hunter: envelope.sender,
                                hidden: target,
                            });
                        }
                    }
                }
                PeerMessage::Leave => {
                    self.hidden.remove(&envelope.sender);
                }
                _ => {}
            }
        }

        if self.finished {
            return;
        }
        self.time_remaining = (self.time_remaining - dt).max(0.0);
        self.since_sync += dt;
        if self.since_sync >= 1.0 {
            self.since_sync = 0.0;
            self.broadcast(Control::TimeRemaining {
                secs: self.time_remaining,
            });
        }
        if self.hidden.is_empty() || self.time_remaining <= 0.0 {
            self.finished = true;
            self.broadcast(Control::Finished);
        }
    }

    fn broadcast(&mut self, control: Control) {
        let envelope = Envelope::new(self.match_id, REFEREE_ID, PeerMessage::MatchControl(control));
        if let Err(e) = self.transport.send(envelope) {
            log::warn!("Referee broadcast failed: {e}");
        }
    }
}

/// Wanders, turning at random
fn hidden_bot(rng: &mut Pcg32, heading: &mut f32, frame: u64) -> RawInput {
    if rng.random_bool(0.02) {
        *heading = rng.random_range(0.0..std::f32::consts::TAU);
    }
    let mut buttons = ButtonStates::default();
    buttons.set(Button::Dash, frame % 90 == 0 && rng.random_bool(0.5));
    RawInput {
        buttons,
        direction: polar_to_cartesian(1.0, *heading),
    }
}

/// Chases the closest known peer and swings when in range
fn hunter_bot(session: &Session, frame: u64) -> RawInput {
    let position = session.host().position;
    let target = session
        .driver()
        .peer_positions()
        .into_iter()
        .map(|(_, p)| p)
        .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));

    let mut input = RawInput::default();
    if let Some(target) = target {
        input.direction = (target - position).normalize_or_zero();
        let in_range = target.distance(position) <= session.state().config.catch_range;
        input.buttons.set(Button::Catch, in_range && frame % 2 == 0);
        input.buttons.set(Button::Dash, !in_range && frame % 120 == 0);
    }
    input
}

fn load_base_config() -> Result<MatchConfig, Box<dyn std::error::Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            Ok(MatchConfig::from_json(&json)?)
        }
        None => Ok(MatchConfig {
            match_id: 1,
            lobby_id: "demo-lobby".to_string(),
            match_duration: 60.0,
            seed: 7,
            ..Default::default()
        }),
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let base = load_base_config()?;
    let bounds = SegmentMap::load(&BuiltinMaps, &base.map_key)?.bounds();

    let hunter_inbox = Inbox::new();
    let hidden_inbox = Inbox::new();
    let referee_inbox = Inbox::new();

    let hunter_transport =
        LoopbackTransport::new(vec![hidden_inbox.sender(), referee_inbox.sender()]);
    let hidden_transport =
        LoopbackTransport::new(vec![hunter_inbox.sender(), referee_inbox.sender()]);
    let referee_transport =
        LoopbackTransport::new(vec![hunter_inbox.sender(), hidden_inbox.sender()]);

    let mut hunter = MatchSession::start(
        MatchConfig {
            role: Role::Hunter,
            local_id: HUNTER_ID,
            ..base.clone()
        },
        &BuiltinMaps,
        HeadlessHost::new("hunter", bounds),
        hunter_inbox,
        hunter_transport,
    )?;
    let mut hidden = MatchSession::start(
        MatchConfig {
            role: Role::Hidden,
            local_id: HIDDEN_ID,
            ..base.clone()
        },
        &BuiltinMaps,
        HeadlessHost::new("hidden", bounds),
        hidden_inbox,
        hidden_transport,
    )?;

    let mut referee = Referee {
        match_id: base.match_id,
        inbox: referee_inbox,
        transport: referee_transport,
        hidden: BTreeSet::from([HIDDEN_ID]),
        time_remaining: base.match_duration,
        since_sync: 0.0,
        finished: false,
    };

    let mut rng = Pcg32::seed_from_u64(base.seed);
    let mut heading = 0.0;
    let max_frames = ((base.match_duration + 5.0) / FRAME_DT) as u64;

    for frame in 0..max_frames {
        let hidden_input = hidden_bot(&mut rng, &mut heading, frame);
        let hunter_input = hunter_bot(&hunter, frame);

        let hidden_report = hidden.frame(FRAME_DT, &hidden_input);
        let hunter_report = hunter.frame(FRAME_DT, &hunter_input);
        referee.step(FRAME_DT);

        if frame % 60 == 0 {
            let hud = hidden.hud();
            log::info!(
                "[{}] hidden {:?} danger={} | hunter {:?} {}",
                hud.clock,
                hidden_report.phase,
                hud.danger_nearby,
                hunter_report.phase,
                hunter.hud().catch_label.unwrap_or_default(),
            );
        }

        if hidden_report.phase.is_terminal() && hunter_report.phase.is_terminal() {
            log::info!(
                "Both clients left the match after {} frames (hunter simulated {}, hidden {})",
                frame + 1,
                hunter_report.frame,
                hidden_report.frame
            );
            break;
        }
    }

    for errors in [hunter.dispose(), hidden.dispose()] {
        for e in errors {
            log::error!("Cleanup failed: {e}");
        }
    }
    log::info!(
        "Final screens: hunter={:?} hidden={:?}",
        hunter.host().screen,
        hidden.host().screen
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Dark and Silent headless demo starting...");

    if let Err(e) = run() {
        log::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
