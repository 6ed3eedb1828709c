pub mod chart;
pub mod error;
pub mod gameplay;
pub mod input;
pub mod time;

pub use chart::{Chart, ObjectId, TimedObject};
pub use error::{LoadError, LoadErrorKind};
pub use gameplay::{FrameReport, GameplayConfig, GameplaySession, ScrollWindow};
pub use input::events::{FrameInput, InputEvent};
pub use time::{GameplayClock, ManualClock};
