//! Audio collaborator
//!
//! The match only ever switches music tracks; playback itself belongs to the
//! host application.

use serde::{Deserialize, Serialize};

/// Music tracks the match switches between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MusicTrack {
    /// Menu and lobby music
    Menu,
    /// In-match music
    Match,
}

impl MusicTrack {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicTrack::Menu => "menu",
            MusicTrack::Match => "match",
        }
    }
}

/// Fire-and-forget music control
pub trait AudioService {
    fn stop(&mut self);
    fn play(&mut self, track: MusicTrack);
}

/// Audio service that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogAudio {
    pub current: Option<MusicTrack>,
}

impl AudioService for LogAudio {
    fn stop(&mut self) {
        if let Some(track) = self.current.take() {
            log::debug!("Stopped track `{}`", track.as_str());
        }
    }

    fn play(&mut self, track: MusicTrack) {
        log::debug!("Playing track `{}`", track.as_str());
        self.current = Some(track);
    }
}
