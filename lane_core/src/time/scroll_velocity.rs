use lane_schema::{Milliseconds, ScrollVelocity};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollVelocitySegment {
    pub time: Milliseconds,
    pub multiplier: f64,
}

impl From<&ScrollVelocity> for ScrollVelocitySegment {
    fn from(sv: &ScrollVelocity) -> Self {
        Self {
            time: sv.time,
            multiplier: sv.multiplier,
        }
    }
}

/// Piecewise-linear time -> scroll position transform.
///
/// Segments must be sorted by time; `Chart` guarantees this at load.
/// Anchors are accumulated with the elapsed span of each segment truncated
/// toward zero, so positions are reproducible instead of drifting with
/// floating-point accumulation.
#[derive(Debug, Clone, Default)]
pub struct ScrollVelocityMapper {
    segments: Vec<ScrollVelocitySegment>,
    anchors: Vec<f64>,
}

/// Cached segment index for monotonically increasing queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperCursor {
    index: usize,
}

impl ScrollVelocityMapper {
    pub fn new(segments: Vec<ScrollVelocitySegment>) -> Self {
        let mut anchors = Vec::with_capacity(segments.len());

        if let Some(first) = segments.first() {
            let mut position = first.time;
            anchors.push(position);

            for pair in segments.windows(2) {
                let (prev, current) = (pair[0], pair[1]);
                position += ((current.time - prev.time) * prev.multiplier).trunc();
                anchors.push(position);
            }
        }

        Self { segments, anchors }
    }

    /// Mapper used when scroll velocities are disabled: position == time.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Builds the mapper for one lane (1-based) from the chart's full list.
    pub fn for_lane(scroll_velocities: &[ScrollVelocity], lane: u8) -> Self {
        Self::new(
            scroll_velocities
                .iter()
                .filter(|sv| sv.valid_for(lane))
                .map(ScrollVelocitySegment::from)
                .collect(),
        )
    }

    pub fn is_identity(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[ScrollVelocitySegment] {
        &self.segments
    }

    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    pub fn position_at(&self, time: Milliseconds) -> f64 {
        let index = self.segments.partition_point(|s| s.time <= time);
        self.position_in(index, time)
    }

    /// Same as [`position_at`](Self::position_at), but walks forward from the
    /// cursor instead of searching. Falls back to a search when time went back.
    pub fn position_with_cursor(&self, cursor: &mut MapperCursor, time: Milliseconds) -> f64 {
        if cursor.index > self.segments.len()
            || (cursor.index > 0 && self.segments[cursor.index - 1].time > time)
        {
            cursor.index = self.segments.partition_point(|s| s.time <= time);
        }

        while cursor.index < self.segments.len() && self.segments[cursor.index].time <= time {
            cursor.index += 1;
        }

        self.position_in(cursor.index, time)
    }

    /// `index` is the number of segments starting at or before `time`.
    fn position_in(&self, index: usize, time: Milliseconds) -> f64 {
        if index == 0 {
            return time;
        }

        let segment = self.segments[index - 1];
        self.anchors[index - 1] + (time - segment.time) * segment.multiplier
    }
}
