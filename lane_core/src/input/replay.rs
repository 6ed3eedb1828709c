use lane_schema::{Milliseconds, Mod, Replay, ReplayFrame};

use super::events::{FrameInput, InputEvent};
use super::InputState;

/// Deterministic input source backed by a recorded replay.
pub struct ReplayInput {
    frames: Vec<ReplayFrame>,
    cursor: usize,
    state: InputState,
}

impl ReplayInput {
    pub fn new(replay: &Replay, lanes: usize) -> Self {
        let mut frames = replay.frames.clone();
        frames.sort_by(|a, b| a.time.total_cmp(&b.time));

        Self {
            frames,
            cursor: 0,
            state: InputState::new(lanes),
        }
    }

    /// Applies every recorded frame up to `time` and returns the edges they produced.
    pub fn frame_at(&mut self, time: Milliseconds) -> FrameInput {
        while let Some(frame) = self.frames.get(self.cursor) {
            if frame.time > time {
                break;
            }

            for lane in 0..self.state.lanes() {
                self.state.set(lane, is_down(frame, lane));
            }
            self.cursor += 1;
        }

        self.state.take_frame()
    }

    /// Repositions the cursor. The held state at `time` is restored without edges.
    pub fn seek(&mut self, time: Milliseconds) {
        self.cursor = self.frames.partition_point(|f| f.time <= time);

        let held: Vec<bool> = match self.cursor.checked_sub(1).and_then(|i| self.frames.get(i)) {
            Some(frame) => (0..self.state.lanes()).map(|lane| is_down(frame, lane)).collect(),
            None => vec![false; self.state.lanes()],
        };
        self.state.reset_to(&held);
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.frames.len()
    }

    pub fn last_time(&self) -> Option<Milliseconds> {
        self.frames.last().map(|f| f.time)
    }
}

fn is_down(frame: &ReplayFrame, lane: usize) -> bool {
    frame.actions.iter().any(|&a| usize::from(a) == lane + 1)
}

/// Records held-state snapshots whenever they change.
#[derive(Debug, Clone, Default)]
pub struct ReplayRecorder {
    frames: Vec<ReplayFrame>,
    last: Vec<bool>,
}

impl ReplayRecorder {
    pub fn new(lanes: usize) -> Self {
        Self {
            frames: Vec::new(),
            last: vec![false; lanes],
        }
    }

    pub fn record(&mut self, time: Milliseconds, held: &[bool]) {
        if held == self.last.as_slice() {
            return;
        }

        self.last = held.to_vec();
        self.frames.push(ReplayFrame {
            time,
            actions: held
                .iter()
                .enumerate()
                .filter(|(_, down)| **down)
                .map(|(lane, _)| (lane + 1) as u8)
                .collect(),
        });
    }

    /// Applies a live event to `state` and records the resulting snapshot.
    pub fn record_event(&mut self, event: &InputEvent, state: &mut InputState) {
        state.apply(event);
        self.record(event.timestamp, state.held());
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn finish(self, player: impl Into<String>, mods: Vec<Mod>) -> Replay {
        Replay {
            player: player.into(),
            mods,
            frames: self.frames,
        }
    }
}
