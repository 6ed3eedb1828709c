use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub type Milliseconds = f64;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MapChart {
    #[serde(default)]
    pub metadata: Metadata,
    pub hit_objects: Vec<HitObject>,
    pub timing_points: Vec<TimingPoint>,
    #[serde(default)]
    pub scroll_velocities: Vec<ScrollVelocity>,
    #[serde(default)]
    pub lane_switches: Vec<LaneSwitch>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub mapper: String,
    #[serde(default)]
    pub difficulty: String,
}

/// A note as stored in the chart file. Lanes are 1-based.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HitObject {
    pub time: Milliseconds,
    pub lane: u8,
    #[serde(default)]
    pub hold_time: Milliseconds,
}

impl HitObject {
    pub fn end_time(&self) -> Milliseconds {
        self.time + self.hold_time
    }

    pub fn is_long_note(&self) -> bool {
        self.hold_time > 0.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimingPoint {
    pub time: Milliseconds,
    pub bpm: f64,
    #[serde(default = "default_signature")]
    pub signature: u32,
}

fn default_signature() -> u32 {
    4
}

impl TimingPoint {
    pub fn ms_per_beat(&self) -> f64 {
        60_000.0 / self.bpm
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrollVelocity {
    pub time: Milliseconds,
    pub multiplier: f64,
    /// Lanes (1-based) this segment applies to. Empty means every lane.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lanes: Vec<u8>,
}

impl ScrollVelocity {
    pub fn valid_for(&self, lane: u8) -> bool {
        self.lanes.is_empty() || self.lanes.contains(&lane)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LaneSwitch {
    pub time: Milliseconds,
    pub count: u8,
}

impl MapChart {
    /// Load-time normalization. Gameplay never reorders anything.
    pub fn sort(&mut self) {
        self.hit_objects
            .sort_by(|a, b| a.time.total_cmp(&b.time).then(a.lane.cmp(&b.lane)));
        self.timing_points.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.scroll_velocities.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.lane_switches.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Number of judged ends in the chart: taps count once, long notes twice.
    pub fn max_combo(&self) -> u32 {
        self.hit_objects
            .iter()
            .map(|h| if h.is_long_note() { 2 } else { 1 })
            .sum()
    }

    pub fn start_time(&self) -> Option<Milliseconds> {
        self.hit_objects.first().map(|h| h.time)
    }

    pub fn end_time(&self) -> Option<Milliseconds> {
        self.hit_objects
            .iter()
            .map(HitObject::end_time)
            .max_by(|a, b| a.total_cmp(b))
    }
}

/// Judgement tiers, loosest first so that `Ord` follows accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Judgement {
    Miss,
    Okay,
    Alright,
    Great,
    Perfect,
    Flawless,
}

impl Judgement {
    pub const ALL: [Judgement; 6] = [
        Judgement::Flawless,
        Judgement::Perfect,
        Judgement::Great,
        Judgement::Alright,
        Judgement::Okay,
        Judgement::Miss,
    ];
}

impl fmt::Display for Judgement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Judgement::Miss => "miss",
            Judgement::Okay => "okay",
            Judgement::Alright => "alright",
            Judgement::Great => "great",
            Judgement::Perfect => "perfect",
            Judgement::Flawless => "flawless",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct HitWindowSpec {
    pub judgement: Judgement,
    /// Maximum absolute offset in ms. For the miss tier this is the hittable boundary.
    pub timing: f64,
    pub health: f64,
    pub drain_rate: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HitWindowTable {
    pub windows: Vec<HitWindowSpec>,
    #[serde(default = "default_release_multiplier")]
    pub release_multiplier: f64,
}

fn default_release_multiplier() -> f64 {
    1.5
}

impl Default for HitWindowTable {
    fn default() -> Self {
        let w = |judgement, timing, health, drain_rate, accuracy| HitWindowSpec {
            judgement,
            timing,
            health,
            drain_rate,
            accuracy,
        };

        Self {
            windows: vec![
                w(Judgement::Flawless, 18.0, 0.5, 0.1, 1.0),
                w(Judgement::Perfect, 40.0, 0.2, 0.05, 0.98),
                w(Judgement::Great, 75.0, 0.0, 0.0, 0.65),
                w(Judgement::Alright, 100.0, -1.0, -0.05, 0.25),
                w(Judgement::Okay, 140.0, -3.0, -0.1, 0.1),
                w(Judgement::Miss, 160.0, -5.0, -0.2, 0.0),
            ],
            release_multiplier: default_release_multiplier(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthMode {
    #[default]
    Normal,
    Drain,
    Requirement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mod {
    Autoplay,
    NoFail,
    Easy,
    Hard,
    Fragile,
    Flawless,
    NoSv,
    NoLn,
}

impl Mod {
    pub fn acronym(&self) -> &'static str {
        match self {
            Mod::Autoplay => "AP",
            Mod::NoFail => "NF",
            Mod::Easy => "EZ",
            Mod::Hard => "HD",
            Mod::Fragile => "FR",
            Mod::Flawless => "FL",
            Mod::NoSv => "NSV",
            Mod::NoLn => "NLN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMod(pub String);

impl fmt::Display for UnknownMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mod: {}", self.0)
    }
}

impl std::error::Error for UnknownMod {}

impl FromStr for Mod {
    type Err = UnknownMod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let m = match s.trim().to_ascii_lowercase().as_str() {
            "ap" | "autoplay" => Mod::Autoplay,
            "nf" | "no_fail" | "nofail" => Mod::NoFail,
            "ez" | "easy" => Mod::Easy,
            "hd" | "hard" => Mod::Hard,
            "fr" | "fragile" => Mod::Fragile,
            "fl" | "flawless" => Mod::Flawless,
            "nsv" | "no_sv" | "nosv" => Mod::NoSv,
            "nln" | "no_ln" | "noln" => Mod::NoLn,
            _ => return Err(UnknownMod(s.to_string())),
        };
        Ok(m)
    }
}

/// Recorded input. Each frame lists the lanes (1-based) held from `time` on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Replay {
    #[serde(default)]
    pub player: String,
    #[serde(default)]
    pub mods: Vec<Mod>,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayFrame {
    pub time: Milliseconds,
    #[serde(default)]
    pub actions: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct JudgementEvent {
    pub object_id: usize,
    /// 1-based, matching the chart file.
    pub lane: u8,
    pub judgement: Judgement,
    pub time: Milliseconds,
    pub offset: Milliseconds,
    #[serde(default)]
    pub tail: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreSnapshot {
    pub combo: u32,
    pub max_combo: u32,
    pub score: f64,
    pub accuracy: f64,
    pub health: f64,
    pub judgements: BTreeMap<Judgement, u32>,
    pub dead: bool,
    pub finished: bool,
}
