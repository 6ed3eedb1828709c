use lane_core::chart::Chart;
use lane_core::gameplay::{DeathCause, GameplayConfig, GameplaySession, Phase};
use lane_core::input::events::FrameInput;
use lane_core::input::{InputState, ReplayInput, ReplayRecorder};
use lane_schema::{
    HitObject, HitWindowSpec, HitWindowTable, Judgement, JudgementEvent, MapChart, Mod, ScrollVelocity, TimingPoint,
};

fn map(objects: &[(f64, u8, f64)]) -> MapChart {
    MapChart {
        hit_objects: objects
            .iter()
            .map(|&(time, lane, hold_time)| HitObject { time, lane, hold_time })
            .collect(),
        timing_points: vec![TimingPoint { time: 0.0, bpm: 120.0, signature: 4 }],
        ..Default::default()
    }
}

fn session(map: &MapChart, config: GameplayConfig) -> GameplaySession {
    let chart = Chart::from_map(map, &config).unwrap();
    GameplaySession::new(chart, config, &HitWindowTable::default()).unwrap()
}

/// Runs frames from `from` to `to` (inclusive) with no input.
fn run(session: &mut GameplaySession, from: f64, to: f64, step: f64) -> Vec<JudgementEvent> {
    let idle = FrameInput::idle(session.chart().lane_count());
    let mut events = Vec::new();
    let mut time = from;
    while time <= to {
        events.extend(session.update(time, 1.0, &idle).events);
        time += step;
    }
    events
}

fn busy_map() -> MapChart {
    let mut map = map(&[
        (500.0, 1, 0.0),
        (750.0, 2, 400.0),
        (1000.0, 3, 0.0),
        (1000.0, 4, 0.0),
        (1250.0, 1, 0.0),
        (1500.0, 2, 0.0),
        (1600.0, 3, 800.0),
        (2000.0, 1, 0.0),
        (2500.0, 4, 0.0),
        (3000.0, 2, 0.0),
        (3250.0, 1, 250.0),
        (3750.0, 4, 0.0),
    ]);
    map.scroll_velocities = vec![
        ScrollVelocity { time: 0.0, multiplier: 1.0, lanes: vec![] },
        ScrollVelocity { time: 1200.0, multiplier: 0.5, lanes: vec![] },
        ScrollVelocity { time: 2400.0, multiplier: 2.0, lanes: vec![1, 2] },
    ];
    map
}

#[test]
fn press_then_forced_miss_scenario() {
    let table = HitWindowTable {
        windows: vec![
            HitWindowSpec { judgement: Judgement::Flawless, timing: 18.0, health: 0.5, drain_rate: 0.1, accuracy: 1.0 },
            HitWindowSpec { judgement: Judgement::Miss, timing: 160.0, health: -5.0, drain_rate: -0.2, accuracy: 0.0 },
        ],
        release_multiplier: 1.5,
    };
    let map = map(&[(1000.0, 1, 0.0), (1500.0, 1, 0.0), (2000.0, 1, 0.0)]);
    let config = GameplayConfig::default();
    let chart = Chart::from_map(&map, &config).unwrap();
    let mut session = GameplaySession::new(chart, config, &table).unwrap();

    let mut input = InputState::new(1);
    let mut events = Vec::new();
    let mut time = 0.0;
    while time <= 1700.0 {
        if time == 1005.0 {
            input.set(0, true);
        }
        if time == 1050.0 {
            input.set(0, false);
        }
        let report = session.update(time, 1.0, &input.take_frame());
        events.extend(report.events);

        if time == 1005.0 {
            assert_eq!(session.performance().combo(), 1);
        }
        time += 5.0;
    }

    assert_eq!(events.len(), 2);

    assert_eq!(events[0].object_id, 0);
    assert_eq!(events[0].judgement, Judgement::Flawless);
    assert_eq!(events[0].offset, 5.0);
    assert_eq!(events[0].lane, 1);

    assert_eq!(events[1].object_id, 1);
    assert_eq!(events[1].judgement, Judgement::Miss);
    assert_eq!(events[1].offset, 0.0);
    assert_eq!(events[1].time, 1665.0);

    assert_eq!(session.performance().combo(), 0);
    assert_eq!(session.performance().max_combo(), 1);
    assert_eq!(session.lifecycle().phase_of(lane_core::ObjectId(1)), Some(Phase::Past));
    assert_eq!(session.lifecycle().phase_of(lane_core::ObjectId(2)), Some(Phase::Active));
}

#[test]
fn press_too_early_is_ignored() {
    let map = map(&[(1000.0, 1, 0.0)]);
    let mut session = session(&map, GameplayConfig::default());
    let mut input = InputState::new(1);

    session.update(0.0, 1.0, &input.take_frame());
    input.set(0, true);
    let report = session.update(500.0, 1.0, &input.take_frame());

    assert!(report.events.is_empty());
    assert_eq!(session.lifecycle().results().head(lane_core::ObjectId(0)), None);
}

#[test]
fn hold_is_judged_on_release() {
    let map = map(&[(1000.0, 1, 500.0)]);
    let mut session = session(&map, GameplayConfig::default());
    let mut input = InputState::new(1);

    session.update(0.0, 1.0, &input.take_frame());

    input.set(0, true);
    let head = session.update(1010.0, 1.0, &input.take_frame());
    assert_eq!(head.events.len(), 1);
    assert_eq!(head.events[0].judgement, Judgement::Flawless);
    assert!(!head.events[0].tail);

    let held = session.update(1200.0, 1.0, &input.take_frame());
    assert!(held.events.is_empty());
    assert!(session.display_objects().any(|d| d.being_held));

    input.set(0, false);
    let tail = session.update(1530.0, 1.0, &input.take_frame());
    assert_eq!(tail.events.len(), 1);
    assert!(tail.events[0].tail);
    // release windows are 1.5x: 30ms late is still Perfect (40 * 1.5 = 60)
    assert_eq!(tail.events[0].judgement, Judgement::Perfect);
    assert!(tail.finished);
    assert_eq!(session.performance().combo(), 2);
}

#[test]
fn early_release_misses_the_tail() {
    let map = map(&[(1000.0, 1, 1000.0)]);
    let mut session = session(&map, GameplayConfig::default());
    let mut input = InputState::new(1);

    session.update(0.0, 1.0, &input.take_frame());
    input.set(0, true);
    session.update(1000.0, 1.0, &input.take_frame());
    input.set(0, false);
    let report = session.update(1300.0, 1.0, &input.take_frame());

    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].judgement, Judgement::Miss);
    assert!(report.events[0].tail);
    assert_eq!(session.performance().combo(), 0);
}

#[test]
fn missed_head_forces_tail_miss_after_the_end() {
    let map = map(&[(1000.0, 1, 500.0)]);
    let mut session = session(&map, GameplayConfig::default());

    let events = run(&mut session, 0.0, 2000.0, 10.0);

    assert_eq!(events.len(), 2);
    assert!(!events[0].tail);
    assert_eq!(events[0].judgement, Judgement::Miss);
    assert!(events[1].tail);
    assert_eq!(events[1].judgement, Judgement::Miss);
    // 1500 + 160 * 1.5
    assert!(events[1].time > 1740.0);
    assert!(session.is_finished());
}

#[test]
fn one_judgement_per_press_edge() {
    let map = map(&[(1000.0, 1, 0.0), (1010.0, 1, 0.0)]);
    let mut session = session(&map, GameplayConfig::default());
    let mut input = InputState::new(1);

    session.update(0.0, 1.0, &input.take_frame());
    input.set(0, true);
    let report = session.update(1005.0, 1.0, &input.take_frame());
    assert_eq!(report.events.len(), 1);
    assert_eq!(report.events[0].object_id, 0);

    // still held, no new edge
    let report = session.update(1010.0, 1.0, &input.take_frame());
    assert!(report.events.is_empty());
}

#[test]
fn autoplay_is_deterministic_and_perfect() {
    let map = busy_map();
    let config = GameplayConfig::from_mods(&[Mod::Autoplay]);

    let mut first = session(&map, config);
    let mut second = session(&map, config);
    let a = run(&mut first, 0.0, 5000.0, 1000.0 / 60.0);
    let b = run(&mut second, 0.0, 5000.0, 1000.0 / 60.0);

    assert_eq!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    assert_eq!(first.snapshot(), second.snapshot());

    assert_eq!(a.len() as u32, first.chart().max_combo());
    assert!(a.iter().all(|e| e.judgement == Judgement::Flawless && e.offset == 0.0));

    let snapshot = first.snapshot();
    assert!(snapshot.finished);
    assert!((snapshot.score - 1_000_000.0).abs() < 1e-6);
    assert_eq!(snapshot.max_combo, first.chart().max_combo());
}

#[test]
fn seeking_back_and_replaying_is_idempotent() {
    let map = busy_map();
    let config = GameplayConfig::from_mods(&[Mod::Autoplay]);
    let mut session = session(&map, config);
    let step = 1000.0 / 60.0;

    run(&mut session, 0.0, 4000.0, step);

    let mut results = Vec::new();
    for _ in 0..2 {
        assert!(session.seek(1500.0) > 0);
        run(&mut session, 1500.0, 4000.0, step);

        let phases: Vec<_> = (0..session.chart().objects().len())
            .map(|i| session.lifecycle().phase_of(lane_core::ObjectId(i)))
            .collect();
        results.push((session.snapshot(), phases, session.performance().clone()));
    }

    assert_eq!(results[0], results[1]);
}

#[test]
fn backward_clock_is_ignored_without_reverting() {
    let map = map(&[(1000.0, 1, 0.0), (3000.0, 1, 0.0)]);
    let mut session = session(&map, GameplayConfig::default());

    run(&mut session, 0.0, 1500.0, 100.0);
    assert_eq!(session.performance().judged(), 1);

    let report = session.update(500.0, 1.0, &FrameInput::idle(1));
    assert_eq!(report.reverted, 0);
    assert_eq!(session.time(), Some(1500.0));
    assert_eq!(session.performance().judged(), 1);
}

#[test]
fn backward_clock_reverts_when_allowed() {
    let map = map(&[(1000.0, 1, 0.0), (3000.0, 1, 0.0)]);
    let config = GameplayConfig::default().with_reverting(true);
    let mut session = session(&map, config);

    run(&mut session, 0.0, 1500.0, 100.0);
    assert_eq!(session.performance().count(Judgement::Miss), 1);

    let report = session.update(500.0, 1.0, &FrameInput::idle(1));
    assert_eq!(report.reverted, 1);
    assert_eq!(session.performance().judged(), 0);
    assert_eq!(session.performance().health(), 100.0);
    assert_eq!(session.lifecycle().phase_of(lane_core::ObjectId(0)), Some(Phase::Active));
}

#[test]
fn fragile_dies_on_first_miss() {
    let map = map(&[(1000.0, 1, 0.0), (1100.0, 1, 0.0), (1200.0, 1, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Fragile]);
    let mut session = session(&map, config);
    let idle = FrameInput::idle(1);

    let mut died = None;
    let mut time = 0.0;
    while time <= 2000.0 {
        let report = session.update(time, 1.0, &idle);
        if report.died.is_some() {
            died = report.died;
            break;
        }
        time += 10.0;
    }

    assert_eq!(died, Some(DeathCause::Miss));
    assert!(session.is_dead());

    // frozen
    let report = session.update(5000.0, 1.0, &idle);
    assert!(report.events.is_empty());
    assert_eq!(report.died, None);
    assert_eq!(session.performance().judged(), 1);
    assert!(session.snapshot().dead);
}

#[test]
fn flawless_mod_dies_on_anything_less() {
    let map = map(&[(1000.0, 1, 0.0), (2000.0, 1, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Flawless]);
    let mut session = session(&map, config);
    let mut input = InputState::new(1);

    session.update(0.0, 1.0, &input.take_frame());
    input.set(0, true);
    let report = session.update(1030.0, 1.0, &input.take_frame());

    assert_eq!(report.events[0].judgement, Judgement::Perfect);
    assert_eq!(report.died, Some(DeathCause::NotFlawless));
}

#[test]
fn normal_health_runs_out_after_twenty_misses() {
    let objects: Vec<_> = (0..25).map(|i| (1000.0 + f64::from(i) * 100.0, 1, 0.0)).collect();
    let map = map(&objects);
    let mut session = session(&map, GameplayConfig::default());

    let events = run(&mut session, 0.0, 5000.0, 10.0);

    assert_eq!(events.len(), 20);
    assert!(session.is_dead());
    assert_eq!(session.performance().death(), Some(DeathCause::HealthDepleted));
    assert_eq!(session.performance().health(), 0.0);
}

#[test]
fn drain_is_bounded_by_the_current_rate() {
    let map = map(&[(1500.0, 1, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Hard]);
    let mut session = session(&map, config);

    run(&mut session, 0.0, 1000.0, 10.0);

    let performance = session.performance();
    let lost = 100.0 - performance.health();
    assert!(lost > 0.0);
    assert!(lost <= 1000.0 * performance.drain_rate() / 1000.0);
    assert!(performance.health() >= 0.0);
    assert!((performance.drain_rate() - 1.0).abs() < 1e-9);
}

#[test]
fn drain_pauses_during_breaks() {
    let map = map(&[(5000.0, 1, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Hard]);
    let mut session = session(&map, config);

    run(&mut session, 0.0, 1000.0, 10.0);

    assert!(session.is_break());
    assert_eq!(session.performance().health(), 100.0);
    assert_eq!(session.performance().drain_rate(), 0.0);
}

#[test]
fn requirement_mode_never_dies_from_health() {
    let map = map(&[(1000.0, 1, 0.0), (1200.0, 1, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Easy]);
    let mut session = session(&map, config);

    run(&mut session, 0.0, 2000.0, 10.0);

    assert!(!session.is_dead());
    assert_eq!(session.performance().health(), 0.0);
    assert!(session.is_finished());
}

#[test]
fn lane_switches_change_key_count() {
    let mut map = map(&[(1000.0, 1, 0.0), (3000.0, 6, 0.0)]);
    map.lane_switches = vec![
        lane_schema::LaneSwitch { time: 0.0, count: 4 },
        lane_schema::LaneSwitch { time: 2000.0, count: 6 },
    ];
    let mut session = session(&map, GameplayConfig::default());

    session.update(0.0, 1.0, &FrameInput::idle(6));
    assert_eq!(session.current_key_count(), 4);

    session.update(2500.0, 1.0, &FrameInput::idle(6));
    assert_eq!(session.current_key_count(), 6);
    assert_eq!(session.chart().key_count(), 6);
}

#[test]
fn rate_scales_offsets() {
    let map = map(&[(1000.0, 1, 0.0)]);
    let mut session = session(&map, GameplayConfig::default());
    let mut input = InputState::new(1);

    session.update(0.0, 2.0, &input.take_frame());
    input.set(0, true);
    let report = session.update(1060.0, 2.0, &input.take_frame());

    assert_eq!(report.events[0].offset, 30.0);
    assert_eq!(report.events[0].judgement, Judgement::Perfect);
}

#[test]
fn drain_stops_once_the_chart_is_finished() {
    let map = map(&[(500.0, 1, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Hard, Mod::Autoplay]);
    let mut session = session(&map, config);

    let mut died = None;
    let mut time = 0.0;
    while time <= 30_000.0 {
        died = died.or(session.update(time, 1.0, &FrameInput::idle(1)).died);
        time += 10.0;
    }

    assert!(session.is_finished());
    assert!(session.is_break());
    assert_eq!(session.time_until_next_object(), None);
    assert_eq!(died, None);
    assert!(!session.is_dead());
    assert!(session.performance().health() > 0.0);
}

#[test]
fn results_after_a_fatal_miss_are_not_kept() {
    let map = map(&[(1000.0, 1, 0.0), (1000.0, 2, 0.0)]);
    let config = GameplayConfig::from_mods(&[Mod::Fragile]);
    let mut session = session(&map, config);
    let idle = FrameInput::idle(2);

    session.update(0.0, 1.0, &idle);
    // both heads pass the miss boundary in the same frame
    let report = session.update(1500.0, 1.0, &idle);

    assert_eq!(report.died, Some(DeathCause::Miss));
    assert_eq!(report.events.len(), 1);
    assert_eq!(session.performance().count(Judgement::Miss), 1);

    let retired: usize = (0..2).map(|lane| session.lifecycle().counts(lane).past).sum();
    assert_eq!(retired, 1);
    assert_eq!(session.lifecycle().results().head(lane_core::ObjectId(1)), None);
    assert_eq!(session.lifecycle().phase_of(lane_core::ObjectId(1)), Some(Phase::Active));
}

#[test]
fn recorded_autoplay_separates_a_tail_from_the_next_press() {
    // the tap comes one frame after the hold ends
    let map = map(&[(1000.0, 1, 500.0), (1510.0, 1, 0.0)]);
    let step = 10.0;

    let config = GameplayConfig::from_mods(&[Mod::Autoplay]);
    let mut auto = session(&map, config);
    let mut recorder = ReplayRecorder::new(1);
    let mut time = 0.0;
    while time <= 2500.0 {
        let report = auto.update(time, 1.0, &FrameInput::idle(1));
        if time == 1500.0 {
            assert_eq!(report.lanes_down, vec![false]);
        }
        recorder.record(time, &report.lanes_down);
        time += step;
    }
    let replay = recorder.finish("auto", vec![]);
    assert_eq!(replay.frames.len(), 4);

    let mut played = session(&map, GameplayConfig::default());
    let mut input = ReplayInput::new(&replay, 1);
    let mut events = Vec::new();
    let mut time = 0.0;
    while time <= 2500.0 {
        events.extend(played.update(time, 1.0, &input.frame_at(time)).events);
        time += step;
    }

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.judgement == Judgement::Flawless));
    assert_eq!(played.performance().count(Judgement::Miss), 0);
}
