use lane_schema::{HitWindowSpec, HitWindowTable, Judgement, Milliseconds};

use crate::chart::TimedObject;
use crate::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitWindow {
    pub judgement: Judgement,
    pub timing: f64,
    pub health: f64,
    pub drain_rate: f64,
    pub accuracy: f64,
}

impl From<&HitWindowSpec> for HitWindow {
    fn from(spec: &HitWindowSpec) -> Self {
        Self {
            judgement: spec.judgement,
            timing: spec.timing,
            health: spec.health,
            drain_rate: spec.drain_rate,
            accuracy: spec.accuracy,
        }
    }
}

/// Ascending window table. `windows` holds the non-miss tiers, tightest
/// first; `miss` bounds the range in which a press is judged at all.
#[derive(Debug, Clone, PartialEq)]
pub struct HitWindows {
    windows: Vec<HitWindow>,
    miss: HitWindow,
}

impl HitWindows {
    pub fn from_table(table: &HitWindowTable) -> Result<Self, LoadError> {
        let Some((last, rest)) = table.windows.split_last() else {
            return Err(LoadError::new("E5001", "hit window table is empty"));
        };
        if last.judgement != Judgement::Miss {
            return Err(LoadError::new("E5001", "last hit window must be the miss tier")
                .with_context(last.judgement.to_string()));
        }

        let mut prev = 0.0;
        for (index, spec) in table.windows.iter().enumerate() {
            if !spec.timing.is_finite() || spec.timing <= 0.0 {
                return Err(LoadError::new("E5003", "hit window timing must be > 0")
                    .with_index(index)
                    .with_context(spec.judgement.to_string()));
            }
            if spec.timing <= prev {
                return Err(LoadError::new("E5002", "hit windows must be strictly nested")
                    .with_index(index)
                    .with_context(spec.judgement.to_string()));
            }
            if table.windows[..index].iter().any(|w| w.judgement == spec.judgement) {
                return Err(LoadError::new("E5005", "duplicate judgement tier")
                    .with_index(index)
                    .with_context(spec.judgement.to_string()));
            }
            prev = spec.timing;
        }

        if !table.release_multiplier.is_finite() || table.release_multiplier <= 0.0 {
            return Err(LoadError::new("E5004", "release multiplier must be > 0"));
        }

        Ok(Self {
            windows: rest.iter().map(HitWindow::from).collect(),
            miss: HitWindow::from(last),
        })
    }

    /// Same tiers with every timing scaled. Used for hold tails.
    pub fn scaled(&self, multiplier: f64) -> Self {
        let scale = |w: &HitWindow| HitWindow {
            timing: w.timing * multiplier,
            ..*w
        };

        Self {
            windows: self.windows.iter().map(scale).collect(),
            miss: scale(&self.miss),
        }
    }

    /// Tightest window containing `|offset|`, otherwise Miss.
    pub fn judgement_for(&self, offset: Milliseconds) -> Judgement {
        let abs = offset.abs();
        self.windows
            .iter()
            .find(|w| abs <= w.timing)
            .map_or(Judgement::Miss, |w| w.judgement)
    }

    pub fn window_for(&self, judgement: Judgement) -> &HitWindow {
        self.windows
            .iter()
            .find(|w| w.judgement == judgement)
            .unwrap_or(&self.miss)
    }

    pub fn windows(&self) -> &[HitWindow] {
        &self.windows
    }

    pub fn miss(&self) -> &HitWindow {
        &self.miss
    }

    pub fn miss_boundary(&self) -> f64 {
        self.miss.timing
    }

    pub fn is_hittable(&self, offset: Milliseconds) -> bool {
        offset.abs() <= self.miss.timing
    }

    /// Late beyond the hittable range.
    pub fn is_missed(&self, offset: Milliseconds) -> bool {
        offset > self.miss.timing
    }
}

impl Default for HitWindows {
    fn default() -> Self {
        let table = HitWindowTable::default();
        let (last, rest) = table
            .windows
            .split_last()
            .map(|(l, r)| (HitWindow::from(l), r.iter().map(HitWindow::from).collect()))
            .unwrap_or((
                HitWindow {
                    judgement: Judgement::Miss,
                    timing: 0.0,
                    health: 0.0,
                    drain_rate: 0.0,
                    accuracy: 0.0,
                },
                Vec::new(),
            ));

        Self {
            windows: rest,
            miss: last,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResult {
    /// Clock time at which the judgement happened
    pub time: Milliseconds,
    pub offset: Milliseconds,
    pub judgement: Judgement,
}

/// Rate-adjusted signed offset: positive when late.
pub fn offset_for(clock_time: Milliseconds, object_time: Milliseconds, rate: f64) -> Milliseconds {
    (clock_time - object_time) / rate
}

/// Judges object heads and tails. Pure: results are returned, never applied.
#[derive(Debug, Clone, PartialEq)]
pub struct JudgeMachine {
    pub hit_windows: HitWindows,
    pub release_windows: HitWindows,
}

impl Default for JudgeMachine {
    fn default() -> Self {
        let hit_windows = HitWindows::default();
        let release_windows = hit_windows.scaled(HitWindowTable::default().release_multiplier);
        Self {
            hit_windows,
            release_windows,
        }
    }
}

impl JudgeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_table(table: &HitWindowTable) -> Result<Self, LoadError> {
        let hit_windows = HitWindows::from_table(table)?;
        let release_windows = hit_windows.scaled(table.release_multiplier);
        Ok(Self {
            hit_windows,
            release_windows,
        })
    }

    pub fn windows(&self, tail: bool) -> &HitWindows {
        if tail {
            &self.release_windows
        } else {
            &self.hit_windows
        }
    }

    pub fn head_offset(&self, object: &TimedObject, now: Milliseconds, rate: f64) -> Milliseconds {
        offset_for(now, object.start_time, rate)
    }

    pub fn tail_offset(&self, object: &TimedObject, now: Milliseconds, rate: f64) -> Milliseconds {
        offset_for(now, object.end_time, rate)
    }

    pub fn judge_head(&self, object: &TimedObject, now: Milliseconds, rate: f64) -> HitResult {
        let offset = self.head_offset(object, now, rate);
        HitResult {
            time: now,
            offset,
            judgement: self.hit_windows.judgement_for(offset),
        }
    }

    pub fn judge_tail(&self, object: &TimedObject, now: Milliseconds, rate: f64) -> HitResult {
        let offset = self.tail_offset(object, now, rate);
        HitResult {
            time: now,
            offset,
            judgement: self.release_windows.judgement_for(offset),
        }
    }

    /// Autoplay judgement: always offset 0.
    pub fn perfect(&self, now: Milliseconds, tail: bool) -> HitResult {
        HitResult {
            time: now,
            offset: 0.0,
            judgement: self.windows(tail).judgement_for(0.0),
        }
    }

    /// Object passed its window without input.
    pub fn forced_miss(&self, now: Milliseconds) -> HitResult {
        HitResult {
            time: now,
            offset: 0.0,
            judgement: Judgement::Miss,
        }
    }
}
