use std::io::Write;

use anyhow::Context;
use lane_core::gameplay::GameplaySession;
use lane_core::input::events::FrameInput;
use lane_core::input::{ReplayInput, ReplayRecorder};
use lane_core::time::{GameplayClock, ManualClock};
use log::info;
use serde_json::json;

/// Lead-in before the first object and run-out after the last one.
const PADDING_MS: f64 = 1000.0;

pub struct SimulationOptions {
    pub rate: f64,
    pub fps: u32,
}

pub enum InputSource {
    Autoplay,
    Replay(ReplayInput),
}

/// Drives the session frame by frame at a fixed frame rate until it finishes,
/// dies or runs past the chart. Judgement events go to `out` as JSON lines,
/// followed by one snapshot line. Returns what was held down each frame.
pub fn run(
    session: &mut GameplaySession,
    mut source: InputSource,
    options: &SimulationOptions,
    out: &mut impl Write,
) -> anyhow::Result<ReplayRecorder> {
    let lanes = session.chart().lane_count();
    let objects = session.chart().objects();
    let first = objects.first().map_or(0.0, |o| o.start_time);
    let last = objects.iter().map(|o| o.end_time).fold(first, f64::max);
    let end = last + session.judge().release_windows.miss_boundary() + PADDING_MS;

    let mut clock = ManualClock::new(first.min(0.0) - PADDING_MS, options.rate);
    let step = 1000.0 / f64::from(options.fps) * options.rate;
    let idle = FrameInput::idle(lanes);
    let mut recorder = ReplayRecorder::new(lanes);

    loop {
        let frame = match &mut source {
            InputSource::Autoplay => idle.clone(),
            InputSource::Replay(replay) => replay.frame_at(clock.current_time()),
        };

        let report = session.update_with_clock(&clock, &frame);
        recorder.record(report.time, &report.lanes_down);

        for event in &report.events {
            writeln!(out, "{}", json!({ "event": event })).context("failed to write event")?;
        }

        if let Some(cause) = report.died {
            info!("run ended by death at {:.0}ms ({cause:?})", report.time);
            break;
        }
        if report.finished || clock.current_time() > end {
            break;
        }

        clock.advance(step);
    }

    writeln!(out, "{}", json!({ "snapshot": session.snapshot() })).context("failed to write snapshot")?;
    Ok(recorder)
}
