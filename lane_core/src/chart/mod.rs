use lane_schema::{LaneSwitch, MapChart, Milliseconds, ScrollVelocity};
use log::info;

use crate::error::LoadError;
use crate::gameplay::GameplayConfig;
use crate::time::{ScrollVelocityMapper, TimingPoints};

pub const MAX_KEY_COUNT: u8 = 10;

/// Index of an object in [`Chart::objects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedObject {
    pub id: ObjectId,
    /// 0-based lane
    pub lane: usize,
    pub start_time: Milliseconds,
    pub end_time: Milliseconds,
    pub is_hold: bool,
}

impl TimedObject {
    /// Lane number as written in chart files and judgement events.
    pub fn lane_number(&self) -> u8 {
        (self.lane + 1) as u8
    }
}

/// Immutable, validated note data for one play session.
#[derive(Debug, Clone)]
pub struct Chart {
    objects: Vec<TimedObject>,
    lanes: Vec<Vec<ObjectId>>,
    scroll_velocities: Vec<ScrollVelocity>,
    timing: TimingPoints,
    lane_switches: Vec<LaneSwitch>,
    key_count: u8,
    initial_key_count: u8,
}

impl Chart {
    /// Validates a sorted chart. Unsorted input is rejected, never reordered.
    pub fn from_map(map: &MapChart, config: &GameplayConfig) -> Result<Self, LoadError> {
        if map.hit_objects.is_empty() {
            return Err(LoadError::new("E1001", "chart has no hit objects"));
        }
        if map.timing_points.is_empty() {
            return Err(LoadError::new("E1002", "chart has no timing points"));
        }

        let mut key_count = 0u8;
        let mut objects = Vec::with_capacity(map.hit_objects.len());
        let mut prev_time = f64::NEG_INFINITY;

        for (index, hit) in map.hit_objects.iter().enumerate() {
            if !hit.time.is_finite() || !hit.hold_time.is_finite() {
                return Err(LoadError::new("E2003", "hit object time is not finite")
                    .with_index(index)
                    .with_lane(hit.lane));
            }
            if hit.lane == 0 || hit.lane > MAX_KEY_COUNT {
                return Err(LoadError::new(
                    "E2001",
                    format!("lane {} is outside 1..={MAX_KEY_COUNT}", hit.lane),
                )
                .with_index(index)
                .with_lane(hit.lane)
                .with_time(hit.time));
            }
            if hit.hold_time < 0.0 {
                return Err(LoadError::new("E2002", "hold time must not be negative")
                    .with_index(index)
                    .with_lane(hit.lane)
                    .with_time(hit.time));
            }
            if hit.time < prev_time {
                return Err(LoadError::new("E3001", "hit objects are not sorted by time")
                    .with_index(index)
                    .with_time(hit.time)
                    .with_context(format!("previous object at {prev_time}")));
            }
            prev_time = hit.time;
            key_count = key_count.max(hit.lane);

            let hold_time = if config.hold_notes_enabled { hit.hold_time } else { 0.0 };
            objects.push(TimedObject {
                id: ObjectId(index),
                lane: usize::from(hit.lane - 1),
                start_time: hit.time,
                end_time: hit.time + hold_time,
                is_hold: hold_time > 0.0,
            });
        }

        let mut prev_time = f64::NEG_INFINITY;
        for (index, tp) in map.timing_points.iter().enumerate() {
            if !tp.bpm.is_finite() || tp.bpm <= 0.0 {
                return Err(LoadError::new("E4001", format!("bpm must be > 0 (got {})", tp.bpm))
                    .with_index(index)
                    .with_time(tp.time));
            }
            if !tp.time.is_finite() || tp.time < 0.0 {
                return Err(LoadError::new("E4002", "timing point time must be >= 0")
                    .with_index(index)
                    .with_time(tp.time));
            }
            if tp.time < prev_time {
                return Err(LoadError::new("E3002", "timing points are not sorted by time")
                    .with_index(index)
                    .with_time(tp.time));
            }
            prev_time = tp.time;
        }

        let mut prev_time = f64::NEG_INFINITY;
        for (index, sv) in map.scroll_velocities.iter().enumerate() {
            if !sv.time.is_finite() || !sv.multiplier.is_finite() {
                return Err(LoadError::new("E4003", "scroll velocity is not finite")
                    .with_index(index));
            }
            if sv.time < prev_time {
                return Err(LoadError::new("E3003", "scroll velocities are not sorted by time")
                    .with_index(index)
                    .with_time(sv.time));
            }
            prev_time = sv.time;
        }

        let mut initial_key_count = 0u8;
        let mut prev_time = f64::NEG_INFINITY;
        for (index, switch) in map.lane_switches.iter().enumerate() {
            if switch.count == 0 || switch.count > MAX_KEY_COUNT {
                return Err(LoadError::new(
                    "E2004",
                    format!("lane switch count {} is outside 1..={MAX_KEY_COUNT}", switch.count),
                )
                .with_index(index)
                .with_time(switch.time));
            }
            if switch.time < prev_time {
                return Err(LoadError::new("E3004", "lane switches are not sorted by time")
                    .with_index(index)
                    .with_time(switch.time));
            }
            prev_time = switch.time;

            if initial_key_count == 0 {
                initial_key_count = switch.count;
            }
            key_count = key_count.max(switch.count);
        }

        if initial_key_count == 0 {
            initial_key_count = key_count;
        }

        let mut lanes = vec![Vec::new(); usize::from(key_count)];
        for object in &objects {
            lanes[object.lane].push(object.id);
        }

        let mut timing = TimingPoints::new(map.timing_points.clone());
        timing.index_snaps(objects.iter().flat_map(|o| [o.start_time, o.end_time]));

        let scroll_velocities = if config.scroll_velocity_enabled {
            map.scroll_velocities.clone()
        } else {
            Vec::new()
        };

        info!(
            "loaded chart '{}': {} objects, {} keys, {} scroll velocities",
            map.metadata.title,
            objects.len(),
            key_count,
            scroll_velocities.len()
        );

        Ok(Self {
            objects,
            lanes,
            scroll_velocities,
            timing,
            lane_switches: map.lane_switches.clone(),
            key_count,
            initial_key_count,
        })
    }

    pub fn objects(&self) -> &[TimedObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> &TimedObject {
        &self.objects[id.0]
    }

    pub fn get(&self, id: ObjectId) -> Option<&TimedObject> {
        self.objects.get(id.0)
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Object ids of one lane, ascending by start time.
    pub fn lane_objects(&self, lane: usize) -> &[ObjectId] {
        self.lanes.get(lane).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn key_count(&self) -> u8 {
        self.key_count
    }

    pub fn initial_key_count(&self) -> u8 {
        self.initial_key_count
    }

    /// Key count in effect at `time` according to lane switch events.
    pub fn key_count_at(&self, time: Milliseconds) -> u8 {
        self.lane_switches
            .iter()
            .take_while(|s| s.time <= time)
            .last()
            .map_or(self.initial_key_count, |s| s.count)
    }

    pub fn lane_switches(&self) -> &[LaneSwitch] {
        &self.lane_switches
    }

    pub fn timing(&self) -> &TimingPoints {
        &self.timing
    }

    /// Mapper for a 0-based lane. Identity when scroll velocities are disabled.
    pub fn mapper_for_lane(&self, lane: usize) -> ScrollVelocityMapper {
        ScrollVelocityMapper::for_lane(&self.scroll_velocities, (lane + 1) as u8)
    }

    /// Judged ends in the chart: holds count twice.
    pub fn max_combo(&self) -> u32 {
        self.objects
            .iter()
            .map(|o| if o.is_hold { 2 } else { 1 })
            .sum()
    }
}
