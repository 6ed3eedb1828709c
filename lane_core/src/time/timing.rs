use std::collections::BTreeMap;

use lane_schema::{Milliseconds, TimingPoint};

/// Beat divisions, coarsest first. A time whose beat index is divisible by
/// `SNAPS[i]` gets snap index `i`.
pub const SNAPS: [i64; 8] = [48, 24, 16, 12, 8, 6, 4, 3];

const SNAP_TOLERANCE_MS: i64 = 10;

#[derive(Debug, Clone, Default)]
pub struct TimingPoints {
    points: Vec<TimingPoint>,
    snap_indices: BTreeMap<i64, usize>,
}

impl TimingPoints {
    pub fn new(points: Vec<TimingPoint>) -> Self {
        Self {
            points,
            snap_indices: BTreeMap::new(),
        }
    }

    pub fn points(&self) -> &[TimingPoint] {
        &self.points
    }

    /// Timing point in effect at `time`. Times before the first point use the
    /// earliest point instead of failing.
    pub fn point_at(&self, time: Milliseconds) -> Option<&TimingPoint> {
        let index = self.points.partition_point(|tp| tp.time <= time);
        match index {
            0 => self.points.first(),
            i => self.points.get(i - 1),
        }
    }

    /// Precomputes snap indices for the given object times.
    pub fn index_snaps(&mut self, times: impl IntoIterator<Item = Milliseconds>) {
        for time in times {
            let key = time as i64;
            if self.snap_indices.contains_key(&key) {
                continue;
            }

            if let Some(index) = self.compute_snap(key) {
                self.snap_indices.insert(key, index);
            }
        }
    }

    pub fn snap_index(&self, time: Milliseconds) -> Option<usize> {
        let key = time as i64;
        if let Some(&index) = self.snap_indices.get(&key) {
            return Some(index);
        }

        let below = self.snap_indices.range(..=key).next_back();
        let above = self.snap_indices.range(key..).next();

        let closest = match (below, above) {
            (Some(b), Some(a)) => {
                if (key - b.0).abs() <= (a.0 - key).abs() {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };

        ((closest.0 - key).abs() <= SNAP_TOLERANCE_MS).then_some(*closest.1)
    }

    fn compute_snap(&self, time: i64) -> Option<usize> {
        let tp = self.point_at(time as f64)?;
        let diff = time as f64 - tp.time;
        let index = (SNAPS[0] as f64 * diff / tp.ms_per_beat()).round() as i64;

        Some(
            SNAPS
                .iter()
                .position(|snap| index % snap == 0)
                .unwrap_or(SNAPS.len() - 1),
        )
    }
}
