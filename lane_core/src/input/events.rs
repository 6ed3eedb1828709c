#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    /// Gameplay time (ms) when the event occurred
    pub timestamp: f64,
    /// 0-based lane index, already resolved by the key binding layer
    pub lane: usize,
    pub pressed: bool,
}

/// Per-lane edges for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameInput {
    pub just_pressed: Vec<bool>,
    pub held: Vec<bool>,
    pub just_released: Vec<bool>,
}

impl FrameInput {
    pub fn idle(lanes: usize) -> Self {
        Self {
            just_pressed: vec![false; lanes],
            held: vec![false; lanes],
            just_released: vec![false; lanes],
        }
    }

    pub fn lanes(&self) -> usize {
        self.held.len()
    }

    pub fn pressed(&self, lane: usize) -> bool {
        self.just_pressed.get(lane).copied().unwrap_or(false)
    }

    pub fn is_held(&self, lane: usize) -> bool {
        self.held.get(lane).copied().unwrap_or(false)
    }

    pub fn released(&self, lane: usize) -> bool {
        self.just_released.get(lane).copied().unwrap_or(false)
    }

    pub fn any_pressed(&self) -> bool {
        self.just_pressed.contains(&true)
    }

    pub fn any_held(&self) -> bool {
        self.held.contains(&true)
    }

    pub fn any_released(&self) -> bool {
        self.just_released.contains(&true)
    }
}
