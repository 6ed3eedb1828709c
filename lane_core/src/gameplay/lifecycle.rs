use std::collections::VecDeque;

use lane_schema::Milliseconds;

use crate::chart::{Chart, ObjectId, TimedObject};
use crate::gameplay::judge::HitResult;
use crate::gameplay::ScrollWindow;
use crate::time::{MapperCursor, ScrollVelocityMapper};

/// Upcoming objects kept active per lane even when not yet visible.
pub const MINIMUM_ACTIVE_OBJECTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Future,
    Active,
    Past,
}

/// Lifecycle changes, queued for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Future -> Active
    Shown(ObjectId),
    /// Active -> Future
    Hidden(ObjectId),
    /// Active -> Past
    Retired(ObjectId),
    /// Past -> Active (seek)
    Restored(ObjectId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LaneCounts {
    pub future: usize,
    pub active: usize,
    pub past: usize,
}

impl LaneCounts {
    pub fn total(&self) -> usize {
        self.future + self.active + self.past
    }
}

/// Judgement results attached to objects by id.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    head: Vec<Option<HitResult>>,
    tail: Vec<Option<HitResult>>,
    held: Vec<bool>,
}

impl ResultStore {
    pub fn new(objects: usize) -> Self {
        Self {
            head: vec![None; objects],
            tail: vec![None; objects],
            held: vec![false; objects],
        }
    }

    pub fn head(&self, id: ObjectId) -> Option<&HitResult> {
        self.head.get(id.0).and_then(Option::as_ref)
    }

    pub fn tail(&self, id: ObjectId) -> Option<&HitResult> {
        self.tail.get(id.0).and_then(Option::as_ref)
    }

    pub fn result(&self, id: ObjectId, tail: bool) -> Option<&HitResult> {
        if tail {
            self.tail(id)
        } else {
            self.head(id)
        }
    }

    /// Attaches a result. Returns false (and changes nothing) if one is already there.
    pub fn set(&mut self, id: ObjectId, tail: bool, result: HitResult) -> bool {
        let slots = if tail { &mut self.tail } else { &mut self.head };
        match slots.get_mut(id.0) {
            Some(slot @ None) => {
                *slot = Some(result);
                true
            }
            _ => false,
        }
    }

    /// Removes a result. Reverting an unjudged end is a no-op.
    pub fn clear(&mut self, id: ObjectId, tail: bool) -> Option<HitResult> {
        let slots = if tail { &mut self.tail } else { &mut self.head };
        slots.get_mut(id.0).and_then(Option::take)
    }

    pub fn is_held(&self, id: ObjectId) -> bool {
        self.held.get(id.0).copied().unwrap_or(false)
    }

    pub fn set_held(&mut self, id: ObjectId, held: bool) {
        if let Some(slot) = self.held.get_mut(id.0) {
            *slot = held;
        }
    }

    pub fn has_any(&self, id: ObjectId) -> bool {
        self.head(id).is_some() || self.tail(id).is_some()
    }

    /// Latest judgement time on the object, if any.
    pub fn latest_time(&self, id: ObjectId) -> Option<Milliseconds> {
        match (self.head(id), self.tail(id)) {
            (Some(h), Some(t)) => Some(h.time.max(t.time)),
            (Some(r), None) | (None, Some(r)) => Some(r.time),
            (None, None) => None,
        }
    }

    pub fn is_complete(&self, object: &TimedObject) -> bool {
        self.head(object.id).is_some() && (!object.is_hold || self.tail(object.id).is_some())
    }
}

/// What a renderer needs to draw one active object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayObject {
    pub id: ObjectId,
    pub lane: usize,
    pub start_position: f64,
    pub end_position: f64,
    /// Playfield y of the head; the receptor sits at `hit_position`.
    pub y: f64,
    pub end_y: f64,
    pub snap_index: Option<usize>,
    pub being_held: bool,
    pub head_judged: bool,
}

#[derive(Debug, Clone)]
pub struct LaneColumn {
    lane: usize,
    mapper: ScrollVelocityMapper,
    cursor: MapperCursor,
    current_position: f64,
    future: VecDeque<ObjectId>,
    active: VecDeque<ObjectId>,
    past: Vec<ObjectId>,
}

impl LaneColumn {
    fn new(chart: &Chart, lane: usize) -> Self {
        Self {
            lane,
            mapper: chart.mapper_for_lane(lane),
            cursor: MapperCursor::default(),
            current_position: 0.0,
            future: chart.lane_objects(lane).iter().copied().collect(),
            active: VecDeque::new(),
            past: Vec::new(),
        }
    }

    pub fn lane(&self) -> usize {
        self.lane
    }

    pub fn mapper(&self) -> &ScrollVelocityMapper {
        &self.mapper
    }

    pub fn current_position(&self) -> f64 {
        self.current_position
    }

    pub fn future(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.future.iter().copied()
    }

    pub fn active(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.active.iter().copied()
    }

    pub fn past(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.past.iter().copied()
    }

    pub fn counts(&self) -> LaneCounts {
        LaneCounts {
            future: self.future.len(),
            active: self.active.len(),
            past: self.past.len(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.future.is_empty() && self.active.is_empty()
    }

    /// Earliest object not yet retired.
    pub fn next_up(&self) -> Option<ObjectId> {
        self.active.front().or(self.future.front()).copied()
    }

    fn y_at(&self, time: Milliseconds, scroll: &ScrollWindow) -> f64 {
        scroll.y_for(self.mapper.position_at(time), self.current_position)
    }

    fn should_display(&self, time: Milliseconds, scroll: &ScrollWindow) -> bool {
        self.y_at(time, scroll) >= 0.0
    }

    fn insert_active_sorted(&mut self, chart: &Chart, id: ObjectId) {
        let key = (chart.object(id).start_time, id);
        let index = self
            .active
            .iter()
            .position(|&other| {
                let o = chart.object(other);
                (o.start_time, other) > key
            })
            .unwrap_or(self.active.len());
        self.active.insert(index, id);
    }
}

/// Owns the per-lane Future / Active / Past collections and the results
/// attached to every object.
#[derive(Debug, Clone)]
pub struct NoteLifecycle {
    columns: Vec<LaneColumn>,
    results: ResultStore,
    transitions: Vec<Transition>,
}

impl NoteLifecycle {
    pub fn new(chart: &Chart) -> Self {
        Self {
            columns: (0..chart.lane_count()).map(|lane| LaneColumn::new(chart, lane)).collect(),
            results: ResultStore::new(chart.objects().len()),
            transitions: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[LaneColumn] {
        &self.columns
    }

    pub fn column(&self, lane: usize) -> Option<&LaneColumn> {
        self.columns.get(lane)
    }

    pub fn results(&self) -> &ResultStore {
        &self.results
    }

    pub fn results_mut(&mut self) -> &mut ResultStore {
        &mut self.results
    }

    pub fn counts(&self, lane: usize) -> LaneCounts {
        self.columns.get(lane).map(LaneColumn::counts).unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        self.columns.iter().all(LaneColumn::is_finished)
    }

    pub fn phase_of(&self, id: ObjectId) -> Option<Phase> {
        self.columns.iter().find_map(|c| {
            if c.active.contains(&id) {
                Some(Phase::Active)
            } else if c.future.contains(&id) {
                Some(Phase::Future)
            } else if c.past.contains(&id) {
                Some(Phase::Past)
            } else {
                None
            }
        })
    }

    /// Active ids of a lane, earliest first.
    pub fn active(&self, lane: usize) -> Vec<ObjectId> {
        self.columns
            .get(lane)
            .map(|c| c.active.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Start time of the earliest object that is not retired yet, over all lanes.
    pub fn next_object_time(&self, chart: &Chart) -> Option<Milliseconds> {
        self.columns
            .iter()
            .filter_map(LaneColumn::next_up)
            .map(|id| chart.object(id).start_time)
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn drain_transitions(&mut self) -> Vec<Transition> {
        std::mem::take(&mut self.transitions)
    }

    /// Recomputes each lane's current scroll position.
    pub fn update_positions(&mut self, time: Milliseconds) {
        for column in &mut self.columns {
            column.current_position = column.mapper.position_with_cursor(&mut column.cursor, time);
        }
    }

    /// Moves objects between Future and Active based on visibility.
    pub fn update_visibility(&mut self, chart: &Chart, scroll: &ScrollWindow) {
        for column in &mut self.columns {
            while let Some(&next) = column.future.front() {
                let visible = column.should_display(chart.object(next).start_time, scroll);
                if !visible && column.active.len() >= MINIMUM_ACTIVE_OBJECTS {
                    break;
                }

                column.future.pop_front();
                column.active.push_back(next);
                self.transitions.push(Transition::Shown(next));
            }

            while column.active.len() > MINIMUM_ACTIVE_OBJECTS {
                let Some(&last) = column.active.back() else {
                    break;
                };

                if self.results.has_any(last)
                    || self.results.is_held(last)
                    || column.should_display(chart.object(last).start_time, scroll)
                {
                    break;
                }

                column.active.pop_back();
                column.future.push_front(last);
                self.transitions.push(Transition::Hidden(last));
            }
        }
    }

    /// Moves every fully judged active object to Past.
    pub fn retire_judged(&mut self, chart: &Chart) -> usize {
        let mut retired = 0;

        for column in &mut self.columns {
            let mut index = 0;
            while index < column.active.len() {
                let id = column.active[index];
                if !self.results.is_complete(chart.object(id)) {
                    index += 1;
                    continue;
                }

                column.active.remove(index);
                column.past.push(id);
                self.results.set_held(id, false);
                self.transitions.push(Transition::Retired(id));
                retired += 1;
            }
        }

        retired
    }

    /// Clears every result judged after `target`. Retired objects whose last
    /// judgement is reverted go back to Active. Returns the removed results.
    pub fn revert_after(
        &mut self,
        chart: &Chart,
        target: Milliseconds,
    ) -> Vec<(ObjectId, bool, HitResult)> {
        let mut reverted = Vec::new();

        for column in &mut self.columns {
            for &id in &column.active {
                revert_object(&mut self.results, id, target, &mut reverted);
            }

            while let Some(&top) = column.past.last() {
                match self.results.latest_time(top) {
                    Some(time) if time > target => {}
                    _ => break,
                }

                column.past.pop();
                revert_object(&mut self.results, top, target, &mut reverted);
                column.insert_active_sorted(chart, top);
                self.transitions.push(Transition::Restored(top));
            }
        }

        reverted
    }

    /// Active objects in display form, lane by lane.
    pub fn display_objects<'a>(
        &'a self,
        chart: &'a Chart,
        scroll: &'a ScrollWindow,
    ) -> impl Iterator<Item = DisplayObject> + 'a {
        self.columns.iter().flat_map(move |column| {
            column.active.iter().map(move |&id| {
                let object = chart.object(id);
                let start_position = column.mapper.position_at(object.start_time);
                let end_position = column.mapper.position_at(object.end_time);

                DisplayObject {
                    id,
                    lane: column.lane,
                    start_position,
                    end_position,
                    y: scroll.y_for(start_position, column.current_position),
                    end_y: scroll.y_for(end_position, column.current_position),
                    snap_index: chart.timing().snap_index(object.start_time),
                    being_held: self.results.is_held(id),
                    head_judged: self.results.head(id).is_some(),
                }
            })
        })
    }
}

fn revert_object(
    results: &mut ResultStore,
    id: ObjectId,
    target: Milliseconds,
    reverted: &mut Vec<(ObjectId, bool, HitResult)>,
) {
    for tail in [true, false] {
        if !results.result(id, tail).is_some_and(|r| r.time > target) {
            continue;
        }

        if let Some(result) = results.clear(id, tail) {
            results.set_held(id, false);
            reverted.push((id, tail, result));
        }
    }
}
