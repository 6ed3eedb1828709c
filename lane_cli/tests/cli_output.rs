use std::{
    env, fs,
    path::{Path, PathBuf},
    process::Command,
};

fn norm_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "")
}

const CHART: &str = r#"{
    "metadata": { "title": "T", "artist": "A" },
    "hit_objects": [
        { "time": 500, "lane": 1 },
        { "time": 750, "lane": 2, "hold_time": 300 },
        { "time": 1000, "lane": 3 },
        { "time": 1250, "lane": 4 },
        { "time": 1500, "lane": 1 }
    ],
    "timing_points": [ { "time": 0, "bpm": 120 } ],
    "scroll_velocities": [ { "time": 0, "multiplier": 1.0 }, { "time": 1000, "multiplier": 1.5 } ]
}"#;

fn temp_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("lane_cli_{name}_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_chart(dir: &Path, json: &str) -> PathBuf {
    let path = dir.join("chart.json");
    fs::write(&path, json).unwrap();
    path
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    norm_newlines(&String::from_utf8_lossy(stdout))
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn check_reports_summary() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let dir = temp_dir("check");
    let chart = write_chart(&dir, CHART);

    let output = Command::new(exe).args(["check", chart.to_str().unwrap()]).output().unwrap();

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("ok: 5 objects, 4 keys, max combo 6"));
}

#[test]
fn check_error_output_format_is_stable() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let dir = temp_dir("check_error");
    let chart = write_chart(
        &dir,
        r#"{ "hit_objects": [ { "time": 0, "lane": 11 } ], "timing_points": [ { "time": 0, "bpm": 120 } ] }"#,
    );

    let output = Command::new(exe).args(["check", chart.to_str().unwrap()]).output().unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));

    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: check failed: "));
    assert!(stderr.contains("Caused by:"));
    assert!(stderr.contains("E2001: lane 11 is outside 1..=10"));
}

#[test]
fn missing_chart_is_reported() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let missing = env::temp_dir().join(format!("lane_cli_missing_{}.json", std::process::id()));
    let _ = fs::remove_file(&missing);

    let output = Command::new(exe).args(["autoplay", missing.to_str().unwrap()]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = norm_newlines(&String::from_utf8_lossy(&output.stderr));
    assert!(stderr.contains("Error: failed to read chart: "));
}

#[test]
fn autoplay_prints_events_and_snapshot() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let dir = temp_dir("autoplay");
    let chart = write_chart(&dir, CHART);

    let output = Command::new(exe).args(["autoplay", chart.to_str().unwrap()]).output().unwrap();
    assert!(output.status.success());

    let lines = json_lines(&output.stdout);
    assert_eq!(lines.len(), 7);
    for line in &lines[..6] {
        assert_eq!(line["event"]["judgement"], "flawless");
        assert_eq!(line["event"]["offset"], 0.0);
    }

    let snapshot = &lines[6]["snapshot"];
    assert_eq!(snapshot["max_combo"], 6);
    assert_eq!(snapshot["finished"], true);
    assert_eq!(snapshot["dead"], false);
    assert_eq!(snapshot["judgements"]["flawless"], 6);

    // same output every time
    let again = Command::new(exe).args(["autoplay", chart.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.stdout, again.stdout);
}

#[test]
fn recorded_autoplay_replays_cleanly() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let dir = temp_dir("record");
    let chart = write_chart(&dir, CHART);
    let replay = dir.join("replay.json");

    let out = Command::new(exe)
        .args(["autoplay", chart.to_str().unwrap(), "--record", replay.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());
    assert!(replay.exists());

    let out = Command::new(exe)
        .args(["replay", chart.to_str().unwrap(), replay.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    let snapshot = &lines[lines.len() - 1]["snapshot"];
    assert_eq!(snapshot["max_combo"], 6);
    assert_eq!(snapshot["judgements"]["miss"], 0);
    assert_eq!(snapshot["finished"], true);
}

#[test]
fn empty_replay_misses_everything() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let dir = temp_dir("empty_replay");
    let chart = write_chart(&dir, CHART);
    let replay = dir.join("empty.json");
    fs::write(&replay, r#"{ "frames": [] }"#).unwrap();

    let out = Command::new(exe)
        .args(["replay", chart.to_str().unwrap(), replay.to_str().unwrap(), "--mods", "nf"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    let snapshot = &lines[lines.len() - 1]["snapshot"];
    assert_eq!(snapshot["judgements"]["miss"], 6);
    assert_eq!(snapshot["combo"], 0);
}

#[test]
fn unknown_mod_is_rejected() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");
    let dir = temp_dir("bad_mod");
    let chart = write_chart(&dir, CHART);

    let out = Command::new(exe)
        .args(["autoplay", chart.to_str().unwrap(), "--mods", "hd,zz"])
        .output()
        .unwrap();

    assert!(!out.status.success());
    let stderr = norm_newlines(&String::from_utf8_lossy(&out.stderr));
    assert!(stderr.contains("unknown mod: zz"));
}

#[test]
fn help_mentions_subcommands() {
    let exe = env!("CARGO_BIN_EXE_lane_cli");

    let output = Command::new(exe).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = norm_newlines(&String::from_utf8_lossy(&output.stdout));
    assert!(stdout.contains("check"));
    assert!(stdout.contains("autoplay"));
    assert!(stdout.contains("replay"));
}
