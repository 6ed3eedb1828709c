use std::{fs, path::Path};

use anyhow::Context;
use lane_core::chart::Chart;
use lane_core::gameplay::{GameplayConfig, GameplaySession};
use lane_schema::{HitWindowTable, MapChart, Mod, Replay};
use log::debug;

/// Reads a chart file and sorts every list by time.
pub fn load_map_from_path(path: impl AsRef<Path>) -> anyhow::Result<MapChart> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read chart: {}", path.display()))?;
    let mut map: MapChart = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse chart json: {}", path.display()))?;
    map.sort();
    Ok(map)
}

pub fn load_map_from_str(json: &str) -> anyhow::Result<MapChart> {
    let mut map: MapChart = serde_json::from_str(json).context("failed to parse chart json")?;
    map.sort();
    Ok(map)
}

pub fn load_replay_from_path(path: impl AsRef<Path>) -> anyhow::Result<Replay> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read replay: {}", path.display()))?;
    let replay: Replay = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse replay json: {}", path.display()))?;
    Ok(replay)
}

pub fn load_replay_from_str(json: &str) -> anyhow::Result<Replay> {
    let replay: Replay = serde_json::from_str(json).context("failed to parse replay json")?;
    Ok(replay)
}

pub fn load_windows_from_path(path: impl AsRef<Path>) -> anyhow::Result<HitWindowTable> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read hit windows: {}", path.display()))?;
    let table: HitWindowTable = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse hit windows json: {}", path.display()))?;
    Ok(table)
}

/// Validates the chart and builds a session for the given modifiers.
pub fn build_session(map: &MapChart, mods: &[Mod], windows: &HitWindowTable) -> anyhow::Result<GameplaySession> {
    let config = GameplayConfig::from_mods(mods);
    debug!("mods {:?} -> {:?}", mods, config);

    let chart = Chart::from_map(map, &config).context("invalid chart")?;
    let session = GameplaySession::new(chart, config, windows).context("invalid hit windows")?;
    Ok(session)
}
