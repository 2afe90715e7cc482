//! Per-frame match evaluation
//!
//! One call per rendered frame. Inbound events are applied first, then waves
//! advance, buttons are edge-detected, cooldowns step, and finally the phase
//! logic runs in a fixed order. Everything the outside world has to do is
//! returned as a list of [`MatchEvent`]s.

use glam::Vec2;

use super::cooldown::Action;
use super::input::{Button, ButtonStates, Presses};
use super::state::{HudMessage, MatchEvent, MatchPhase, MatchState, RemoteEvent, Role};
use crate::PeerId;
use crate::audio::MusicTrack;
use crate::consts::*;

/// Everything the simulation needs from the outside for one frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub buttons: ButtonStates,
    /// Current local position (from the movement collaborator)
    pub position: Vec2,
    /// Raw joystick direction
    pub move_direction: Vec2,
    /// Remote events drained at the start of the frame
    pub remote: Vec<RemoteEvent>,
    /// Last known positions of the other players
    pub peers: Vec<(PeerId, Vec2)>,
}

/// Cap a frame delta so a stall does not turn into one huge step
pub fn clamp_delta(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_DELTA_TIME)
    } else {
        0.0
    }
}

#[derive(Debug, Default)]
struct Signals {
    caught_by: Option<PeerId>,
    caught_target: Option<PeerId>,
    finished: bool,
    eliminated: bool,
}

/// Advance the match by one frame
pub fn tick(state: &mut MatchState, input: &FrameInput, dt: f32) -> Vec<MatchEvent> {
    let mut events = Vec::new();
    if state.phase.is_terminal() {
        return events;
    }

    let dt = clamp_delta(dt);
    state.frames += 1;

    let signals = apply_remote(state, &input.remote);

    state.waves.tick(dt);
    state.waves.prune();

    // Every button is sampled every frame, even while its widget is hidden
    let presses = state.edges.update(&input.buttons);

    advance_fixed_steps(state, dt);
    state.time_remaining = (state.time_remaining - dt).max(0.0);
    expire_message(state, dt, &mut events);

    if state.is_active() && input.move_direction.length_squared() > f32::EPSILON {
        state.facing = input.move_direction.normalize();
    }

    if state.phase == MatchPhase::Playing && presses.contains(Button::Dash) {
        try_dash(state, &mut events);
    }

    emit_timed_burst(state, input.position, dt, &mut events);

    if state.phase == MatchPhase::Playing
        && state.role() == Role::Hunter
        && presses.contains(Button::Catch)
    {
        try_catch(state, input, &mut events);
    }

    state.detected = state.waves.query_detection(&state.map, input.position);
    let local_id = state.local_id();
    state.danger_nearby = state.detected.iter().any(|&e| e != local_id);

    if let Some(by) = signals.caught_by {
        enter_caught(state, by, &mut events);
    }

    if let Some(target) = signals.caught_target {
        log::info!("Catch of peer {} confirmed", target);
        show_message(state, HudMessage::CaughtSomeone, &mut events);
    }

    if signals.finished || state.time_remaining <= 0.0 {
        enter_terminal(state, MatchPhase::Finished, &mut events);
        return events;
    }

    if signals.eliminated {
        enter_terminal(state, MatchPhase::EliminatedFromLobby, &mut events);
        return events;
    }

    handle_exit_prompt(state, &presses, &mut events);

    events
}

fn apply_remote(state: &mut MatchState, remote: &[RemoteEvent]) -> Signals {
    let mut signals = Signals::default();
    for event in remote {
        match *event {
            RemoteEvent::Burst(desc) => state.waves.ingest_remote(desc),
            RemoteEvent::Caught { by } => signals.caught_by = Some(by),
            RemoteEvent::CatchSucceeded { target } => signals.caught_target = Some(target),
            RemoteEvent::Finished => signals.finished = true,
            RemoteEvent::Eliminated => signals.eliminated = true,
            RemoteEvent::TimeRemaining(secs) => {
                if secs.is_finite() {
                    state.time_remaining = secs.max(0.0);
                }
            }
        }
    }
    signals
}

fn advance_fixed_steps(state: &mut MatchState, dt: f32) {
    state.step_accumulator += dt;
    let mut substeps = 0;
    while state.step_accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
        state.cooldowns.tick();
        state.step_accumulator -= SIM_DT;
        substeps += 1;
    }
}

fn expire_message(state: &mut MatchState, dt: f32, events: &mut Vec<MatchEvent>) {
    if let Some((_, remaining)) = state.message.as_mut() {
        *remaining -= dt;
    }
    if matches!(state.message, Some((_, remaining)) if remaining <= 0.0) {
        state.message = None;
        events.push(MatchEvent::HideMessage);
    }
}

fn show_message(state: &mut MatchState, message: HudMessage, events: &mut Vec<MatchEvent>) {
    state.message = Some((message, state.config.message_duration));
    events.push(MatchEvent::ShowMessage(message));
}

fn try_dash(state: &mut MatchState, events: &mut Vec<MatchEvent>) {
    match state.cooldowns.consume(Action::Dash) {
        Ok(()) => events.push(MatchEvent::Dash {
            impulse: state.facing * state.config.dash_impulse,
        }),
        Err(e) => log::debug!("Dash ignored: {e}"),
    }
}

fn try_catch(state: &mut MatchState, input: &FrameInput, events: &mut Vec<MatchEvent>) {
    if let Err(e) = state.cooldowns.consume(Action::Catch) {
        log::debug!("Catch ignored: {e}");
        return;
    }
    let range = state.config.catch_range;
    let mut targets: Vec<PeerId> = input
        .peers
        .iter()
        .filter(|(_, pos)| pos.distance(input.position) <= range)
        .map(|&(id, _)| id)
        .collect();
    targets.sort_unstable();
    log::info!("Catch attempt with {} peer(s) in range", targets.len());
    events.push(MatchEvent::CatchAttempt {
        origin: input.position,
        targets,
    });
}

fn emit_timed_burst(state: &mut MatchState, origin: Vec2, dt: f32, events: &mut Vec<MatchEvent>) {
    if state.role() != Role::Hidden {
        return;
    }
    if state.caught && !state.config.caught_emits_bursts {
        return;
    }
    if state.waves.burst_due(dt) {
        let desc = state.waves.spawn_local(state.local_id(), origin);
        events.push(MatchEvent::LocalBurst(desc));
    }
}

fn release_entity(state: &mut MatchState, events: &mut Vec<MatchEvent>) {
    if !state.entity_released {
        state.entity_released = true;
        events.push(MatchEvent::ReleaseLocalEntity);
    }
}

fn enter_caught(state: &mut MatchState, by: PeerId, events: &mut Vec<MatchEvent>) {
    if state.caught {
        return;
    }
    if state.role() == Role::Hunter {
        log::warn!("Ignoring caught notification from {by}: the hunter cannot be caught");
        return;
    }

    log::info!("Caught by peer {by}");
    state.caught = true;
    state.phase = MatchPhase::CatchConfirmed;
    state.resume_phase = MatchPhase::CatchConfirmed;
    if state.exit_prompt_visible {
        state.exit_prompt_visible = false;
        events.push(MatchEvent::HideExitPrompt);
    }
    release_entity(state, events);
    state.dash_visible = false;
    events.push(MatchEvent::HideDash);
    show_message(state, HudMessage::Caught, events);
}

/// Move to a terminal phase, releasing everything the match owns. No-op if
/// the match already ended.
fn enter_terminal(state: &mut MatchState, phase: MatchPhase, events: &mut Vec<MatchEvent>) {
    if state.phase.is_terminal() {
        log::debug!("Already in {:?}, ignoring {:?}", state.phase, phase);
        return;
    }

    log::info!("Match {} ended: {:?}", state.config.match_id, phase);
    state.phase = phase;
    state.waves.clear();
    state.message = None;
    state.exit_prompt_visible = false;
    state.detected.clear();
    state.danger_nearby = false;

    if phase == MatchPhase::Left {
        events.push(MatchEvent::LeaveMatch);
    }
    release_entity(state, events);
    events.push(MatchEvent::StopAudio);
    events.push(MatchEvent::PlayTrack(MusicTrack::Menu));
    events.push(match phase {
        MatchPhase::Finished => MatchEvent::ReturnToLobby(state.config.lobby_id.clone()),
        _ => MatchEvent::ReturnToMenu,
    });
}

fn handle_exit_prompt(state: &mut MatchState, presses: &Presses, events: &mut Vec<MatchEvent>) {
    match state.phase {
        MatchPhase::Playing | MatchPhase::CatchConfirmed if presses.contains(Button::Exit) => {
            state.resume_phase = state.phase;
            state.phase = MatchPhase::ExitConfirmPending;
            state.exit_prompt_visible = true;
            events.push(MatchEvent::ShowExitPrompt);
        }
        MatchPhase::ExitConfirmPending => {
            if presses.contains(Button::Confirm) {
                enter_terminal(state, MatchPhase::Left, events);
            } else if presses.contains(Button::Cancel) {
                state.phase = state.resume_phase;
                state.exit_prompt_visible = false;
                events.push(MatchEvent::HideExitPrompt);
            }
        }
        _ => {}
    }
}
