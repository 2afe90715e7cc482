//! Platform abstraction layer
//!
//! The match runtime does not own rendering, physics or navigation. It talks to
//! the host application through these traits:
//! - Entities: spawning and removing the local player entity
//! - Movement: position, steering and dash impulses
//! - Screens: leaving the match for the lobby or the menu
//!
//! Audio lives in [`crate::audio`].

use glam::Vec2;

use crate::audio::AudioService;
use crate::error::HostError;

/// Handle of an entity owned by the host
pub type EntityId = u64;

pub trait Entities {
    fn spawn_player(&mut self, position: Vec2) -> EntityId;
    fn remove_entity(&mut self, id: EntityId) -> Result<(), HostError>;
}

pub trait Movement {
    /// Current position of the local player
    fn position(&self) -> Vec2;
    /// Steer along `direction` (unit or zero) at `speed` units per second
    fn apply_direction(&mut self, direction: Vec2, speed: f32, dt: f32);
    fn dash(&mut self, impulse: Vec2);
}

pub trait Screens {
    fn go_to_lobby(&mut self, lobby_id: &str) -> Result<(), HostError>;
    fn go_to_menu(&mut self) -> Result<(), HostError>;
}

/// Everything a match session needs from its host
pub trait Host: Entities + Movement + AudioService + Screens {}

impl<T: Entities + Movement + AudioService + Screens> Host for T {}

/// Minimal host with point-mass movement inside a rectangle
///
/// Used by the headless demo. Dashes displace the player immediately.
#[derive(Debug)]
pub struct HeadlessHost {
    pub name: String,
    pub position: Vec2,
    pub bounds: (Vec2, Vec2),
    pub entity: Option<EntityId>,
    pub audio: crate::audio::LogAudio,
    pub screen: Option<String>,
    next_entity: EntityId,
}

impl HeadlessHost {
    pub fn new(name: impl Into<String>, bounds: (Vec2, Vec2)) -> Self {
        Self {
            name: name.into(),
            position: Vec2::ZERO,
            bounds,
            entity: None,
            audio: Default::default(),
            screen: None,
            next_entity: 1,
        }
    }

    fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.bounds.0, self.bounds.1)
    }
}

impl Entities for HeadlessHost {
    fn spawn_player(&mut self, position: Vec2) -> EntityId {
        let id = self.next_entity;
        self.next_entity += 1;
        self.position = self.clamp(position);
        self.entity = Some(id);
        log::debug!("[{}] spawned entity {} at {}", self.name, id, position);
        id
    }

    fn remove_entity(&mut self, id: EntityId) -> Result<(), HostError> {
        match self.entity {
            Some(current) if current == id => {
                self.entity = None;
                Ok(())
            }
            _ => Err(HostError(format!("no entity {id}"))),
        }
    }
}

impl Movement for HeadlessHost {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn apply_direction(&mut self, direction: Vec2, speed: f32, dt: f32) {
        self.position = self.clamp(self.position + direction * speed * dt);
    }

    fn dash(&mut self, impulse: Vec2) {
        self.position = self.clamp(self.position + impulse);
    }
}

impl AudioService for HeadlessHost {
    fn stop(&mut self) {
        self.audio.stop();
    }

    fn play(&mut self, track: crate::audio::MusicTrack) {
        self.audio.play(track);
    }
}

impl Screens for HeadlessHost {
    fn go_to_lobby(&mut self, lobby_id: &str) -> Result<(), HostError> {
        log::info!("[{}] back to lobby `{}`", self.name, lobby_id);
        self.screen = Some(format!("lobby:{lobby_id}"));
        Ok(())
    }

    fn go_to_menu(&mut self) -> Result<(), HostError> {
        log::info!("[{}] back to menu", self.name);
        self.screen = Some("menu".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> HeadlessHost {
        HeadlessHost::new("test", (Vec2::ZERO, Vec2::splat(100.0)))
    }

    #[test]
    fn test_movement_stays_in_bounds() {
        let mut h = host();
        h.spawn_player(Vec2::new(50.0, 50.0));
        h.apply_direction(Vec2::X, 1000.0, 1.0);
        assert_eq!(h.position(), Vec2::new(100.0, 50.0));
        h.dash(Vec2::new(0.0, -500.0));
        assert_eq!(h.position(), Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_remove_entity_once() {
        let mut h = host();
        let id = h.spawn_player(Vec2::ZERO);
        assert!(h.remove_entity(id).is_ok());
        assert!(h.remove_entity(id).is_err());
    }
}
