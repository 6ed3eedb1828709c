use std::collections::BTreeMap;

use lane_schema::{HealthMode, Judgement, Milliseconds, ScoreSnapshot};
use log::info;

use crate::gameplay::health::HealthProcessor;
use crate::gameplay::judge::{HitResult, HitWindow};
use crate::gameplay::GameplayConfig;

pub const MAX_SCORE: f64 = 1_000_000.0;
const ACCURACY_SHARE: f64 = 0.9;
const COMBO_SHARE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    HealthDepleted,
    /// Miss with fail-on-miss enabled
    Miss,
    /// Anything below Flawless with flawless-only enabled
    NotFlawless,
}

/// One judged end, kept in judgement order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitStat {
    pub time: Milliseconds,
    pub object_time: Milliseconds,
    pub offset: Milliseconds,
    pub judgement: Judgement,
    pub tail: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HistoryEntry {
    stat: HitStat,
    accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HealthCheckpoint {
    time: Milliseconds,
    health: f64,
    drain_rate: f64,
    drain: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FailPolicy {
    fail_on_miss: bool,
    flawless_only: bool,
    no_fail: bool,
}

/// Combo, tallies, score and health. Mutated only by judgements, drain and reverts.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceState {
    combo: u32,
    max_combo: u32,
    counts: BTreeMap<Judgement, u32>,
    accuracy_sum: f64,
    max_possible_combo: u32,
    health: HealthProcessor,
    initial_health: HealthProcessor,
    history: Vec<HistoryEntry>,
    checkpoints: Vec<HealthCheckpoint>,
    /// Keep one checkpoint per drained frame. Otherwise consecutive drain
    /// checkpoints collapse into one, bounding the list by the judgement count.
    frame_checkpoints: bool,
    policy: FailPolicy,
    death: Option<DeathCause>,
}

impl PerformanceState {
    pub fn new(max_possible_combo: u32, config: &GameplayConfig) -> Self {
        let health = HealthProcessor::new(config.health_mode);

        Self {
            combo: 0,
            max_combo: 0,
            counts: Judgement::ALL.iter().map(|&j| (j, 0)).collect(),
            accuracy_sum: 0.0,
            max_possible_combo,
            health,
            initial_health: health,
            history: Vec::new(),
            checkpoints: Vec::new(),
            frame_checkpoints: config.allow_reverting,
            policy: FailPolicy {
                fail_on_miss: config.fail_on_miss,
                flawless_only: config.flawless_only,
                no_fail: config.no_fail,
            },
            death: None,
        }
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    pub fn count(&self, judgement: Judgement) -> u32 {
        self.counts.get(&judgement).copied().unwrap_or(0)
    }

    pub fn judgement_counts(&self) -> &BTreeMap<Judgement, u32> {
        &self.counts
    }

    pub fn judged(&self) -> usize {
        self.history.len()
    }

    pub fn hit_stats(&self) -> impl Iterator<Item = &HitStat> + '_ {
        self.history.iter().map(|e| &e.stat)
    }

    pub fn health(&self) -> f64 {
        self.health.health()
    }

    pub fn drain_rate(&self) -> f64 {
        self.health.drain_rate()
    }

    pub fn health_mode(&self) -> HealthMode {
        self.health.mode()
    }

    pub fn is_dead(&self) -> bool {
        self.death.is_some()
    }

    pub fn death(&self) -> Option<DeathCause> {
        self.death
    }

    /// Weighted accuracy in percent. 100 before anything is judged.
    pub fn accuracy(&self) -> f64 {
        if self.history.is_empty() {
            return 100.0;
        }
        self.accuracy_sum / self.history.len() as f64 * 100.0
    }

    pub fn score(&self) -> f64 {
        if self.max_possible_combo == 0 {
            return 0.0;
        }

        let max = f64::from(self.max_possible_combo);
        MAX_SCORE
            * (ACCURACY_SHARE * self.accuracy_sum / max + COMBO_SHARE * f64::from(self.max_combo) / max)
    }

    /// Applies one judged end. Ignored once dead. Returns the cause if this kills the player.
    pub fn apply(
        &mut self,
        result: &HitResult,
        window: &HitWindow,
        object_time: Milliseconds,
        tail: bool,
    ) -> Option<DeathCause> {
        if self.is_dead() {
            return None;
        }

        let entry = HistoryEntry {
            stat: HitStat {
                time: result.time,
                object_time,
                offset: result.offset,
                judgement: result.judgement,
                tail,
            },
            accuracy: window.accuracy,
        };
        self.tally(&entry);
        self.history.push(entry);

        self.health.apply_judgement(window);
        self.checkpoint(result.time, false);

        let cause = if self.policy.fail_on_miss && result.judgement == Judgement::Miss {
            Some(DeathCause::Miss)
        } else if self.policy.flawless_only && result.judgement != Judgement::Flawless {
            Some(DeathCause::NotFlawless)
        } else {
            self.depletion()
        };

        self.kill(cause, result.time)
    }

    /// Continuous health drain over `elapsed` ms ending at `time`.
    pub fn drain(&mut self, time: Milliseconds, elapsed: Milliseconds) -> Option<DeathCause> {
        if self.is_dead() || self.health.mode() != HealthMode::Drain {
            return None;
        }

        self.health.drain(elapsed);
        self.checkpoint(time, true);

        let cause = self.depletion();
        self.kill(cause, time)
    }

    /// Drops every judgement made after `target` and rebuilds the derived state.
    /// Health goes back to the last value recorded at or before `target`.
    /// Death is terminal and is not undone.
    pub fn revert_after(&mut self, target: Milliseconds) -> usize {
        let keep = self.history.partition_point(|e| e.stat.time <= target);
        let removed = self.history.len() - keep;
        self.history.truncate(keep);

        let keep = self.checkpoints.partition_point(|c| c.time <= target);
        self.checkpoints.truncate(keep);
        match self.checkpoints.last() {
            Some(c) => self.health.restore(c.health, c.drain_rate),
            None => self.health = self.initial_health,
        }

        self.combo = 0;
        self.max_combo = 0;
        self.accuracy_sum = 0.0;
        self.counts.values_mut().for_each(|c| *c = 0);

        let history = std::mem::take(&mut self.history);
        for entry in &history {
            self.tally(entry);
        }
        self.history = history;

        removed
    }

    pub fn snapshot(&self, finished: bool) -> ScoreSnapshot {
        ScoreSnapshot {
            combo: self.combo,
            max_combo: self.max_combo,
            score: self.score(),
            accuracy: self.accuracy(),
            health: self.health(),
            judgements: self.counts.clone(),
            dead: self.is_dead(),
            finished,
        }
    }

    fn tally(&mut self, entry: &HistoryEntry) {
        *self.counts.entry(entry.stat.judgement).or_insert(0) += 1;
        self.accuracy_sum += entry.accuracy;

        if entry.stat.judgement == Judgement::Miss {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
    }

    fn checkpoint(&mut self, time: Milliseconds, drain: bool) {
        let checkpoint = HealthCheckpoint {
            time,
            health: self.health.health(),
            drain_rate: self.health.drain_rate(),
            drain,
        };

        match self.checkpoints.last_mut() {
            Some(last) if drain && last.drain && !self.frame_checkpoints => *last = checkpoint,
            _ => self.checkpoints.push(checkpoint),
        }
    }

    fn depletion(&self) -> Option<DeathCause> {
        (!self.policy.no_fail && self.health.is_depleted()).then_some(DeathCause::HealthDepleted)
    }

    fn kill(&mut self, cause: Option<DeathCause>, time: Milliseconds) -> Option<DeathCause> {
        let cause = cause?;
        info!("player died at {time:.0}ms: {cause:?}");
        self.death = Some(cause);
        Some(cause)
    }
}
