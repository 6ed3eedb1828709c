use lane_schema::{HitWindowTable, JudgementEvent, Milliseconds, ScoreSnapshot};
use log::{debug, info, warn};

use crate::chart::Chart;
use crate::error::LoadError;
use crate::gameplay::judge::JudgeMachine;
use crate::gameplay::lifecycle::{DisplayObject, NoteLifecycle, Transition};
use crate::gameplay::performance::{DeathCause, PerformanceState};
use crate::gameplay::resolver::{InputResolver, Resolution};
use crate::gameplay::GameplayConfig;
use crate::input::events::FrameInput;
use crate::time::GameplayClock;

/// Gaps of at least this long before the next object pause health drain.
pub const BREAK_THRESHOLD: Milliseconds = 2000.0;

/// Everything that happened during one `update` call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameReport {
    pub time: Milliseconds,
    pub events: Vec<JudgementEvent>,
    /// Lanes held down this frame (autoplay's ideal input in autoplay mode).
    pub lanes_down: Vec<bool>,
    pub died: Option<DeathCause>,
    pub finished: bool,
    /// Results removed because the clock moved backwards.
    pub reverted: usize,
}

/// One play of one chart. Owns the lifecycle and the performance state and
/// advances both once per frame.
pub struct GameplaySession {
    chart: Chart,
    config: GameplayConfig,
    resolver: InputResolver,
    lifecycle: NoteLifecycle,
    performance: PerformanceState,
    time: Option<Milliseconds>,
    key_count: u8,
    finished: bool,
}

impl GameplaySession {
    pub fn new(chart: Chart, config: GameplayConfig, windows: &HitWindowTable) -> Result<Self, LoadError> {
        let judge = JudgeMachine::from_table(windows)?;
        let lifecycle = NoteLifecycle::new(&chart);
        let performance = PerformanceState::new(chart.max_combo(), &config);
        let key_count = chart.initial_key_count();

        info!(
            "session ready: {} objects, {} keys, {:?} health, autoplay={}",
            chart.objects().len(),
            chart.key_count(),
            config.health_mode,
            config.autoplay
        );

        Ok(Self {
            chart,
            config,
            resolver: InputResolver::new(judge),
            lifecycle,
            performance,
            time: None,
            key_count,
            finished: false,
        })
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn judge(&self) -> &JudgeMachine {
        self.resolver.judge()
    }

    pub fn lifecycle(&self) -> &NoteLifecycle {
        &self.lifecycle
    }

    pub fn performance(&self) -> &PerformanceState {
        &self.performance
    }

    /// Time of the last processed frame.
    pub fn time(&self) -> Option<Milliseconds> {
        self.time
    }

    pub fn is_dead(&self) -> bool {
        self.performance.is_dead()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_key_count(&self) -> u8 {
        self.key_count
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        self.performance.snapshot(self.finished)
    }

    pub fn display_objects(&self) -> impl Iterator<Item = DisplayObject> + '_ {
        self.lifecycle.display_objects(&self.chart, &self.config.scroll)
    }

    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        self.lifecycle.drain_transitions()
    }

    pub fn time_until_next_object(&self) -> Option<Milliseconds> {
        let next = self.lifecycle.next_object_time(&self.chart)?;
        Some(next - self.time.unwrap_or(0.0))
    }

    /// True while the next unretired object is at least `BREAK_THRESHOLD` away.
    /// A chart with nothing left to play is one long break.
    pub fn is_break(&self) -> bool {
        self.time_until_next_object()
            .map_or(true, |until| until >= BREAK_THRESHOLD)
    }

    pub fn update_with_clock(&mut self, clock: &impl GameplayClock, frame: &FrameInput) -> FrameReport {
        self.update(clock.current_time(), clock.rate(), frame)
    }

    /// Advances the session to `time`.
    pub fn update(&mut self, time: Milliseconds, rate: f64, frame: &FrameInput) -> FrameReport {
        let lanes = self.chart.lane_count();
        let mut report = FrameReport {
            time,
            lanes_down: vec![false; lanes],
            finished: self.finished,
            ..Default::default()
        };

        if self.is_dead() {
            return report;
        }
        if !time.is_finite() {
            warn!("ignoring frame with non-finite time");
            return report;
        }

        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            warn!("invalid playback rate {rate}, using 1.0");
            1.0
        };

        let elapsed = match self.time {
            Some(prev) if time < prev => {
                if !self.config.allow_reverting {
                    warn!("clock went backwards ({prev:.0}ms -> {time:.0}ms), frame ignored");
                    return report;
                }
                report.reverted = self.revert_to(time);
                0.0
            }
            Some(prev) => time - prev,
            None => 0.0,
        };
        self.time = Some(time);

        let key_count = self.chart.key_count_at(time);
        if key_count != self.key_count {
            debug!("key count {} -> {} at {time:.0}ms", self.key_count, key_count);
            self.key_count = key_count;
        }

        self.lifecycle.update_positions(time);
        self.lifecycle.update_visibility(&self.chart, &self.config.scroll);

        let mut resolutions = if self.config.autoplay {
            let (resolutions, lanes_down) = self.resolver.autoplay(time, &self.chart, &mut self.lifecycle);
            report.lanes_down = lanes_down;
            resolutions
        } else {
            for (lane, down) in report.lanes_down.iter_mut().enumerate() {
                *down = frame.is_held(lane);
            }
            self.resolver
                .resolve(frame, time, rate, &self.chart, &mut self.lifecycle)
        };
        resolutions.extend(
            self.resolver
                .force_misses(time, rate, &self.chart, &mut self.lifecycle),
        );

        for (index, resolution) in resolutions.iter().enumerate() {
            if let Some(event) = self.apply(resolution) {
                report.events.push(event);
            }
            if let Some(cause) = self.performance.death() {
                report.died.get_or_insert(cause);
                self.discard(&resolutions[index + 1..]);
                break;
            }
        }

        self.lifecycle.retire_judged(&self.chart);

        if report.died.is_none() && !self.finished && !self.is_break() {
            report.died = self.performance.drain(time, elapsed);
        }

        if !self.finished && self.lifecycle.is_finished() {
            info!(
                "chart finished at {time:.0}ms, score {:.0}, accuracy {:.2}%",
                self.performance.score(),
                self.performance.accuracy()
            );
            self.finished = true;
        }
        report.finished = self.finished;

        report
    }

    /// Moves the session to `target`. Moving backwards reverts every result
    /// judged after `target`. Returns the number of reverted results.
    pub fn seek(&mut self, target: Milliseconds) -> usize {
        if self.is_dead() || !target.is_finite() {
            return 0;
        }

        let reverted = match self.time {
            Some(prev) if target < prev => self.revert_to(target),
            _ => 0,
        };
        self.time = Some(target);
        reverted
    }

    fn revert_to(&mut self, target: Milliseconds) -> usize {
        let reverted = self.lifecycle.revert_after(&self.chart, target);
        self.performance.revert_after(target);

        self.lifecycle.update_positions(target);
        self.lifecycle.update_visibility(&self.chart, &self.config.scroll);
        self.key_count = self.chart.key_count_at(target);

        if !reverted.is_empty() {
            self.finished = self.lifecycle.is_finished();
        }

        debug!("reverted {} results after {target:.0}ms", reverted.len());
        reverted.len()
    }

    /// Takes back results the resolver stored but the player never got, so
    /// the lifecycle does not retire objects the tallies never counted.
    fn discard(&mut self, undelivered: &[Resolution]) {
        let results = self.lifecycle.results_mut();
        for resolution in undelivered {
            results.clear(resolution.id, resolution.tail);
            results.set_held(resolution.id, false);
        }
        if !undelivered.is_empty() {
            debug!("dropped {} results resolved after death", undelivered.len());
        }
    }

    fn apply(&mut self, resolution: &Resolution) -> Option<JudgementEvent> {
        if self.performance.is_dead() {
            return None;
        }

        let object = self.chart.object(resolution.id);
        let window = self
            .resolver
            .judge()
            .windows(resolution.tail)
            .window_for(resolution.result.judgement);
        let object_time = if resolution.tail {
            object.end_time
        } else {
            object.start_time
        };

        self.performance
            .apply(&resolution.result, window, object_time, resolution.tail);

        Some(JudgementEvent {
            object_id: resolution.id.0,
            lane: object.lane_number(),
            judgement: resolution.result.judgement,
            time: resolution.result.time,
            offset: resolution.result.offset,
            tail: resolution.tail,
        })
    }
}
