//! Per-match configuration
//!
//! Everything a match needs to know up front is passed in here at
//! construction, including the joystick handedness preference.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::map::MAP1_KEY;
use crate::sim::state::Role;
use crate::{MatchId, PeerId};

/// Tuning for wave expansion and detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveSettings {
    /// Angle between sampled rays in degrees (smaller = finer, more expensive)
    pub step_angle_deg: f32,
    /// Radius growth in map units per second
    pub speed: f32,
    /// Maximum probe age in seconds
    pub max_lifetime: f32,
    /// Max distance between a ray and a target for the target to be detected
    pub detection_tolerance: f32,
    /// Seconds between two timed local bursts
    pub burst_interval: f32,
}

impl Default for WaveSettings {
    fn default() -> Self {
        Self {
            step_angle_deg: DEFAULT_STEP_ANGLE_DEG,
            speed: DEFAULT_WAVE_SPEED,
            max_lifetime: DEFAULT_WAVE_LIFETIME,
            detection_tolerance: DEFAULT_DETECTION_TOLERANCE,
            burst_interval: DEFAULT_BURST_INTERVAL,
        }
    }
}

impl WaveSettings {
    /// Number of rays sampled around a probe origin, evenly spread over a full turn
    pub fn ray_count(&self) -> usize {
        (360.0 / self.step_angle_deg).round().max(1.0) as usize
    }
}

/// Cooldown durations in fixed simulation steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooldownSettings {
    pub dash_ticks: u32,
    pub catch_ticks: u32,
}

impl Default for CooldownSettings {
    fn default() -> Self {
        Self {
            dash_ticks: DEFAULT_DASH_COOLDOWN_TICKS,
            catch_ticks: DEFAULT_CATCH_COOLDOWN_TICKS,
        }
    }
}

/// Configuration of one match instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub match_id: MatchId,
    /// Our own peer id, also the emitter id of our bursts
    pub local_id: PeerId,
    /// Lobby to return to when the match finishes
    pub lobby_id: String,
    pub role: Role,
    pub map_key: String,
    /// Joystick on the left side of the screen (left-hand mode)
    pub joystick_left: bool,
    /// Match length in seconds
    pub match_duration: f32,
    /// Seed for spawn selection
    pub seed: u64,
    /// Whether a caught hidden player keeps emitting timed bursts
    pub caught_emits_bursts: bool,
    pub waves: WaveSettings,
    pub cooldowns: CooldownSettings,
    pub move_speed: f32,
    pub dash_impulse: f32,
    pub catch_range: f32,
    /// How long a HUD message stays visible (seconds)
    pub message_duration: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            match_id: 0,
            local_id: 0,
            lobby_id: String::new(),
            role: Role::Hidden,
            map_key: MAP1_KEY.to_string(),
            joystick_left: false,
            match_duration: DEFAULT_MATCH_DURATION,
            seed: 0,
            caught_emits_bursts: false,
            waves: WaveSettings::default(),
            cooldowns: CooldownSettings::default(),
            move_speed: DEFAULT_MOVE_SPEED,
            dash_impulse: DEFAULT_DASH_IMPULSE,
            catch_range: DEFAULT_CATCH_RANGE,
            message_duration: DEFAULT_MESSAGE_DURATION,
        }
    }
}

impl MatchConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> String {
        // Plain data with string keys, serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn is_hunter(&self) -> bool {
        self.role == Role::Hunter
    }

    /// Check that every tuning value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("waves.step_angle_deg", self.waves.step_angle_deg)?;
        positive("waves.speed", self.waves.speed)?;
        positive("waves.max_lifetime", self.waves.max_lifetime)?;
        positive("waves.burst_interval", self.waves.burst_interval)?;
        non_negative("waves.detection_tolerance", self.waves.detection_tolerance)?;
        positive("match_duration", self.match_duration)?;
        non_negative("move_speed", self.move_speed)?;
        non_negative("dash_impulse", self.dash_impulse)?;
        non_negative("catch_range", self.catch_range)?;
        non_negative("message_duration", self.message_duration)?;
        if self.map_key.is_empty() {
            return Err(ConfigError::Invalid {
                field: "map_key",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn test_ray_count_from_step() {
        let waves = WaveSettings {
            step_angle_deg: 90.0,
            ..Default::default()
        };
        assert_eq!(waves.ray_count(), 4);
        assert_eq!(WaveSettings::default().ray_count(), 1200);
    }

    #[test]
    fn test_from_json_partial() {
        let config = MatchConfig::from_json(
            r#"{"role": "Hunter", "joystick_left": true, "waves": {"speed": 300.0}}"#,
        )
        .unwrap();
        assert!(config.is_hunter());
        assert!(config.joystick_left);
        assert_eq!(config.waves.speed, 300.0);
        assert_eq!(config.waves.max_lifetime, DEFAULT_WAVE_LIFETIME);
        assert_eq!(config.map_key, MAP1_KEY);
    }

    #[test]
    fn test_json_round_trip() {
        let config = MatchConfig {
            match_id: 7,
            lobby_id: "lobby-3".into(),
            ..Default::default()
        };
        assert_eq!(MatchConfig::from_json(&config.to_json()).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = MatchConfig::default();
        config.waves.step_angle_deg = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "waves.step_angle_deg",
                ..
            })
        ));

        assert!(matches!(
            MatchConfig::from_json(r#"{"match_duration": -1.0}"#),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            MatchConfig::from_json("[1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }
}
