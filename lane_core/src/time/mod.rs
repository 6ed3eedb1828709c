pub mod conductor;
pub mod scroll_velocity;
pub mod timing;

pub use conductor::{Conductor, GameplayClock, ManualClock};
pub use scroll_velocity::{MapperCursor, ScrollVelocityMapper, ScrollVelocitySegment};
pub use timing::TimingPoints;
