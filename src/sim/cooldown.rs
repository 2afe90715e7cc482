//! Action cooldowns
//!
//! One integer timer per gated action, counted in fixed simulation steps.
//! A timer only leaves zero through a successful `consume`.

use serde::{Deserialize, Serialize};

use crate::consts::TICKS_PER_SECOND;
use crate::error::NotReadyError;
use crate::settings::CooldownSettings;

/// Cooldown-gated actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Dash,
    /// Hunter only
    Catch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownTimer {
    remaining: u32,
    duration: u32,
}

impl CooldownTimer {
    pub fn new(duration: u32) -> Self {
        Self {
            remaining: 0,
            duration,
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    fn tick(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

/// Dash and catch timers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownController {
    dash: CooldownTimer,
    catch: CooldownTimer,
}

impl CooldownController {
    pub fn new(settings: &CooldownSettings) -> Self {
        Self {
            dash: CooldownTimer::new(settings.dash_ticks),
            catch: CooldownTimer::new(settings.catch_ticks),
        }
    }

    fn timer(&self, action: Action) -> &CooldownTimer {
        match action {
            Action::Dash => &self.dash,
            Action::Catch => &self.catch,
        }
    }

    fn timer_mut(&mut self, action: Action) -> &mut CooldownTimer {
        match action {
            Action::Dash => &mut self.dash,
            Action::Catch => &mut self.catch,
        }
    }

    /// Advance every timer by one fixed step
    pub fn tick(&mut self) {
        self.dash.tick();
        self.catch.tick();
    }

    pub fn is_ready(&self, action: Action) -> bool {
        self.timer(action).is_ready()
    }

    pub fn remaining(&self, action: Action) -> u32 {
        self.timer(action).remaining()
    }

    /// Remaining cooldown in whole seconds, rounded up (for the HUD)
    pub fn remaining_secs(&self, action: Action) -> u32 {
        self.remaining(action).div_ceil(TICKS_PER_SECOND)
    }

    /// Use the action, restarting its cooldown
    pub fn consume(&mut self, action: Action) -> Result<(), NotReadyError> {
        let timer = self.timer_mut(action);
        if !timer.is_ready() {
            return Err(NotReadyError {
                action,
                remaining: timer.remaining,
            });
        }
        timer.remaining = timer.duration;
        Ok(())
    }
}
