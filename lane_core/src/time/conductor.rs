use std::sync::Arc;
use atomic_float::AtomicF64;
use std::sync::atomic::Ordering;

/// Source of gameplay time. All times are milliseconds.
pub trait GameplayClock {
    fn current_time(&self) -> f64;

    fn rate(&self) -> f64 {
        1.0
    }
}

/// Follows the playback position published by the audio thread and
/// extrapolates between audio updates using the system clock.
pub struct Conductor {
    audio_time_source: Arc<AtomicF64>,
    last_audio_time: f64,
    last_update_time: f64,
    frame_time: f64,
    rate: f64,
}

impl Conductor {
    pub fn new(audio_time_source: Arc<AtomicF64>) -> Self {
        Self {
            audio_time_source,
            last_audio_time: 0.0,
            last_update_time: 0.0,
            frame_time: 0.0,
            rate: 1.0,
        }
    }

    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    /// Samples the audio position. Call once per frame before updating gameplay.
    pub fn update(&mut self, current_system_time: f64) {
        self.last_audio_time = self.audio_time_source.load(Ordering::Acquire);
        self.last_update_time = current_system_time;
        self.frame_time = self.last_audio_time;
    }

    pub fn get_time(&self, current_system_time: f64) -> f64 {
        let elapsed = current_system_time - self.last_update_time;
        self.last_audio_time + elapsed * self.rate
    }

    /// Advances the frame time from the system clock without resampling audio.
    pub fn interpolate(&mut self, current_system_time: f64) {
        self.frame_time = self.get_time(current_system_time);
    }
}

impl GameplayClock for Conductor {
    fn current_time(&self) -> f64 {
        self.frame_time
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}

/// Clock driven explicitly by the caller. Used for replays, autoplay runs and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualClock {
    time: f64,
    rate: f64,
}

impl ManualClock {
    pub fn new(time: f64, rate: f64) -> Self {
        Self { time, rate }
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn advance(&mut self, elapsed: f64) {
        self.time += elapsed;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl GameplayClock for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn rate(&self) -> f64 {
        self.rate
    }
}
