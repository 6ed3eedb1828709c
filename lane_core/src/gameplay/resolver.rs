use lane_schema::{Judgement, Milliseconds};
use log::debug;

use crate::chart::{Chart, ObjectId};
use crate::gameplay::judge::{HitResult, JudgeMachine};
use crate::gameplay::lifecycle::NoteLifecycle;
use crate::input::events::FrameInput;

/// A result the resolver attached to an object end this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub id: ObjectId,
    pub tail: bool,
    pub result: HitResult,
}

/// Turns per-lane edges into head and tail judgements on active objects.
/// Results are written into the lifecycle's result store and returned.
#[derive(Debug, Clone, Default)]
pub struct InputResolver {
    judge: JudgeMachine,
}

impl InputResolver {
    pub fn new(judge: JudgeMachine) -> Self {
        Self { judge }
    }

    pub fn judge(&self) -> &JudgeMachine {
        &self.judge
    }

    pub fn resolve(
        &self,
        frame: &FrameInput,
        now: Milliseconds,
        rate: f64,
        chart: &Chart,
        lifecycle: &mut NoteLifecycle,
    ) -> Vec<Resolution> {
        let mut resolutions = Vec::new();

        for lane in 0..chart.lane_count() {
            // A lane that is down again at the end of the frame was released first.
            if frame.is_held(lane) {
                self.release(lane, frame, now, rate, chart, lifecycle, &mut resolutions);
                self.press(lane, frame, now, rate, chart, lifecycle, &mut resolutions);
            } else {
                self.press(lane, frame, now, rate, chart, lifecycle, &mut resolutions);
                self.release(lane, frame, now, rate, chart, lifecycle, &mut resolutions);
            }

            for id in lifecycle.active(lane) {
                if awaiting_release(chart, lifecycle, id) {
                    lifecycle.results_mut().set_held(id, frame.is_held(lane));
                }
            }
        }

        resolutions
    }

    #[allow(clippy::too_many_arguments)]
    fn press(
        &self,
        lane: usize,
        frame: &FrameInput,
        now: Milliseconds,
        rate: f64,
        chart: &Chart,
        lifecycle: &mut NoteLifecycle,
        out: &mut Vec<Resolution>,
    ) {
        if !frame.pressed(lane) {
            return;
        }

        let windows = self.judge.windows(false);
        for id in lifecycle.active(lane) {
            if lifecycle.results().head(id).is_some() {
                continue;
            }

            let object = chart.object(id);
            let offset = self.judge.head_offset(object, now, rate);
            if windows.is_missed(offset) {
                // left for the forced-miss pass
                continue;
            }
            if !windows.is_hittable(offset) {
                break;
            }

            let result = self.judge.judge_head(object, now, rate);
            if lifecycle.results_mut().set(id, false, result) {
                if object.is_hold && result.judgement != Judgement::Miss {
                    lifecycle.results_mut().set_held(id, true);
                }
                out.push(Resolution { id, tail: false, result });
            }
            break;
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn release(
        &self,
        lane: usize,
        frame: &FrameInput,
        now: Milliseconds,
        rate: f64,
        chart: &Chart,
        lifecycle: &mut NoteLifecycle,
        out: &mut Vec<Resolution>,
    ) {
        if !frame.released(lane) {
            return;
        }

        let Some(id) = lifecycle
            .active(lane)
            .into_iter()
            .find(|&id| awaiting_release(chart, lifecycle, id))
        else {
            return;
        };

        let result = self.judge.judge_tail(chart.object(id), now, rate);
        let results = lifecycle.results_mut();
        if results.set(id, true, result) {
            results.set_held(id, false);
            out.push(Resolution { id, tail: true, result });
        }
    }

    /// Judges everything due at `now` at offset 0. Returns the resolutions and
    /// which lanes an ideal player would be holding down this frame.
    pub fn autoplay(
        &self,
        now: Milliseconds,
        chart: &Chart,
        lifecycle: &mut NoteLifecycle,
    ) -> (Vec<Resolution>, Vec<bool>) {
        let mut resolutions = Vec::new();
        let mut lanes_down = vec![false; chart.lane_count()];

        for (lane, down) in lanes_down.iter_mut().enumerate() {
            for id in lifecycle.active(lane) {
                let object = chart.object(id);
                if object.start_time > now {
                    break;
                }

                let results = lifecycle.results_mut();
                let pressed = results.head(id).is_none();
                if pressed {
                    let result = self.judge.perfect(now, false);
                    results.set(id, false, result);
                    resolutions.push(Resolution { id, tail: false, result });
                    *down = true;
                }

                if !object.is_hold || results.tail(id).is_some() {
                    continue;
                }

                if object.end_time <= now {
                    let result = self.judge.perfect(now, true);
                    results.set(id, true, result);
                    results.set_held(id, false);
                    resolutions.push(Resolution { id, tail: true, result });

                    // The key is up on the tail frame. Later objects in this lane
                    // wait a frame so their press is a separate edge.
                    *down = pressed;
                    break;
                }

                *down = true;
                results.set_held(id, true);
            }
        }

        (resolutions, lanes_down)
    }

    /// Misses every head and tail whose window has passed without input.
    pub fn force_misses(
        &self,
        now: Milliseconds,
        rate: f64,
        chart: &Chart,
        lifecycle: &mut NoteLifecycle,
    ) -> Vec<Resolution> {
        let mut resolutions = Vec::new();
        let hit = self.judge.windows(false);
        let release = self.judge.windows(true);

        for lane in 0..chart.lane_count() {
            for id in lifecycle.active(lane) {
                let object = chart.object(id);

                if lifecycle.results().head(id).is_none() {
                    if !hit.is_missed(self.judge.head_offset(object, now, rate)) {
                        // later objects in the lane are not due either
                        break;
                    }

                    let result = self.judge.forced_miss(now);
                    lifecycle.results_mut().set(id, false, result);
                    resolutions.push(Resolution { id, tail: false, result });
                    debug!("missed head of object {} in lane {}", id.0, object.lane_number());
                }

                if !object.is_hold || lifecycle.results().tail(id).is_some() {
                    continue;
                }

                if release.is_missed(self.judge.tail_offset(object, now, rate)) {
                    let result = self.judge.forced_miss(now);
                    let results = lifecycle.results_mut();
                    results.set(id, true, result);
                    results.set_held(id, false);
                    resolutions.push(Resolution { id, tail: true, result });
                    debug!("missed tail of object {} in lane {}", id.0, object.lane_number());
                }
            }
        }

        resolutions
    }
}

/// Hold whose head was hit and whose tail is still open.
fn awaiting_release(chart: &Chart, lifecycle: &NoteLifecycle, id: ObjectId) -> bool {
    let results = lifecycle.results();
    chart.object(id).is_hold
        && results.head(id).is_some_and(|r| r.judgement != Judgement::Miss)
        && results.tail(id).is_none()
}
