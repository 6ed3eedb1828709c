use lane_schema::{HealthMode, Milliseconds};

use crate::gameplay::judge::HitWindow;

pub const MAX_HEALTH: f64 = 100.0;

/// Lower bound of the drain rate (health per second).
pub const DRAIN_RATE_FLOOR: f64 = -1.0;

/// Drain rate gained per elapsed millisecond.
pub const DRAIN_ACCELERATION: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthProcessor {
    mode: HealthMode,
    health: f64,
    drain_rate: f64,
}

impl HealthProcessor {
    pub fn new(mode: HealthMode) -> Self {
        let health = match mode {
            HealthMode::Requirement => 0.0,
            HealthMode::Normal | HealthMode::Drain => MAX_HEALTH,
        };

        Self {
            mode,
            health,
            drain_rate: 0.0,
        }
    }

    pub fn mode(&self) -> HealthMode {
        self.mode
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn drain_rate(&self) -> f64 {
        self.drain_rate
    }

    pub fn apply_judgement(&mut self, window: &HitWindow) {
        match self.mode {
            HealthMode::Normal => self.set_health(self.health + window.health),
            HealthMode::Requirement => {
                if window.health > 0.0 {
                    self.set_health(self.health + window.health);
                }
            }
            HealthMode::Drain => self.drain_rate -= window.drain_rate,
        }
    }

    /// Continuous drain for one frame. No-op outside drain mode.
    pub fn drain(&mut self, elapsed: Milliseconds) {
        if self.mode != HealthMode::Drain || elapsed <= 0.0 {
            return;
        }

        self.drain_rate = self.drain_rate.max(DRAIN_RATE_FLOOR);
        self.set_health(self.health - self.drain_rate * elapsed / 1000.0);
        self.drain_rate += DRAIN_ACCELERATION * elapsed;
    }

    /// Whether health can kill the player in this mode and has run out.
    pub fn is_depleted(&self) -> bool {
        self.mode != HealthMode::Requirement && self.health <= 0.0
    }

    pub(crate) fn restore(&mut self, health: f64, drain_rate: f64) {
        self.health = health;
        self.drain_rate = drain_rate;
    }

    fn set_health(&mut self, health: f64) {
        self.health = health.clamp(0.0, MAX_HEALTH);
    }
}
