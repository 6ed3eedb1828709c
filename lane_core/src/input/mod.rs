pub mod events;
pub mod replay;

use self::events::{FrameInput, InputEvent};
use crossbeam_channel::{unbounded, Receiver, Sender};

pub use self::replay::{ReplayInput, ReplayRecorder};

pub struct InputQueue {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Pushes an event into the queue.
    /// This can be called from multiple threads (e.g. input polling thread).
    pub fn push(&self, event: InputEvent) {
        let _ = self.sender.send(event);
    }

    /// Pops an event from the queue.
    /// Non-blocking. Returns None if queue is empty.
    pub fn pop(&self) -> Option<InputEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns a clone of the sender, allowing it to be passed to other threads/structs.
    pub fn sender(&self) -> Sender<InputEvent> {
        self.sender.clone()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates held-state transitions between frames and turns them into
/// edge arrays. Live input and replays both feed this, so a recording
/// produces exactly the edges the live session saw.
#[derive(Debug, Clone)]
pub struct InputState {
    held: Vec<bool>,
    just_pressed: Vec<bool>,
    just_released: Vec<bool>,
}

impl InputState {
    pub fn new(lanes: usize) -> Self {
        Self {
            held: vec![false; lanes],
            just_pressed: vec![false; lanes],
            just_released: vec![false; lanes],
        }
    }

    pub fn lanes(&self) -> usize {
        self.held.len()
    }

    pub fn held(&self) -> &[bool] {
        &self.held
    }

    /// Sets a lane's held state. Repeated presses (key repeat) and releases of
    /// an idle lane produce no edge. Unknown lanes are ignored.
    pub fn set(&mut self, lane: usize, down: bool) {
        let Some(current) = self.held.get_mut(lane) else {
            return;
        };

        if *current == down {
            return;
        }

        *current = down;
        if down {
            self.just_pressed[lane] = true;
        } else {
            self.just_released[lane] = true;
        }
    }

    pub fn apply(&mut self, event: &InputEvent) {
        self.set(event.lane, event.pressed);
    }

    /// Drains every pending event from the queue.
    pub fn collect(&mut self, queue: &InputQueue) -> Vec<InputEvent> {
        let mut events = Vec::new();
        while let Some(event) = queue.pop() {
            self.apply(&event);
            events.push(event);
        }
        events
    }

    /// Replaces the held state without producing edges (used after seeking).
    pub fn reset_to(&mut self, held: &[bool]) {
        for (lane, slot) in self.held.iter_mut().enumerate() {
            *slot = held.get(lane).copied().unwrap_or(false);
        }
        self.just_pressed.fill(false);
        self.just_released.fill(false);
    }

    /// Returns this frame's edges and clears them.
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = FrameInput {
            just_pressed: self.just_pressed.clone(),
            held: self.held.clone(),
            just_released: self.just_released.clone(),
        };
        self.just_pressed.fill(false);
        self.just_released.fill(false);
        frame
    }
}
