pub mod health;
pub mod judge;
pub mod lifecycle;
pub mod performance;
pub mod resolver;
pub mod session;

use lane_schema::{HealthMode, Mod};

pub use health::HealthProcessor;
pub use judge::{HitResult, HitWindow, HitWindows, JudgeMachine};
pub use lifecycle::{DisplayObject, LaneColumn, LaneCounts, NoteLifecycle, Phase, Transition};
pub use performance::{DeathCause, HitStat, PerformanceState};
pub use resolver::{InputResolver, Resolution};
pub use session::{FrameReport, GameplaySession};

/// Playfield geometry used to decide whether an object is on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollWindow {
    /// y of the receptor line, measured from the top of the playfield
    pub hit_position: f64,
    pub scroll_speed: f64,
    pub visual_offset: f64,
}

impl Default for ScrollWindow {
    fn default() -> Self {
        Self {
            hit_position: 950.0,
            scroll_speed: 3.0,
            visual_offset: 0.0,
        }
    }
}

impl ScrollWindow {
    /// Playfield y for a scroll position, given the lane's current position.
    pub fn y_for(&self, position: f64, current: f64) -> f64 {
        self.hit_position - 0.5 * (position - (current + self.visual_offset)) * self.scroll_speed
    }

    pub fn is_visible(&self, position: f64, current: f64) -> bool {
        self.y_for(position, current) >= 0.0
    }
}

/// Session settings, resolved from the modifier list once at load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameplayConfig {
    pub autoplay: bool,
    /// Any Miss kills the session.
    pub fail_on_miss: bool,
    /// Any judgement below Flawless kills the session.
    pub flawless_only: bool,
    pub no_fail: bool,
    pub health_mode: HealthMode,
    pub scroll_velocity_enabled: bool,
    pub hold_notes_enabled: bool,
    /// Whether a backward clock reverts judgements instead of being ignored.
    pub allow_reverting: bool,
    pub scroll: ScrollWindow,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            autoplay: false,
            fail_on_miss: false,
            flawless_only: false,
            no_fail: false,
            health_mode: HealthMode::Normal,
            scroll_velocity_enabled: true,
            hold_notes_enabled: true,
            allow_reverting: false,
            scroll: ScrollWindow::default(),
        }
    }
}

impl GameplayConfig {
    pub fn from_mods(mods: &[Mod]) -> Self {
        let has = |m: Mod| mods.contains(&m);

        let health_mode = if has(Mod::Hard) {
            HealthMode::Drain
        } else if has(Mod::Easy) {
            HealthMode::Requirement
        } else {
            HealthMode::Normal
        };

        let autoplay = has(Mod::Autoplay);

        Self {
            autoplay,
            fail_on_miss: has(Mod::Fragile),
            flawless_only: has(Mod::Flawless),
            no_fail: has(Mod::NoFail),
            health_mode,
            scroll_velocity_enabled: !has(Mod::NoSv),
            hold_notes_enabled: !has(Mod::NoLn),
            allow_reverting: autoplay,
            scroll: ScrollWindow::default(),
        }
    }

    pub fn with_reverting(mut self, allow: bool) -> Self {
        self.allow_reverting = allow;
        self
    }

    pub fn with_scroll(mut self, scroll: ScrollWindow) -> Self {
        self.scroll = scroll;
        self
    }
}
