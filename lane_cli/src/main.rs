mod simulate;

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use lane_schema::{HitWindowTable, Mod};

use crate::simulate::{InputSource, SimulationOptions};

#[derive(Debug, Parser)]
#[command(name = "lanes")]
#[command(about = "Scrolling-lane timing and judgement runner", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a chart and print a summary
    Check { chart: PathBuf },
    /// Play a chart with autoplay and print judgement events as JSON lines
    Autoplay {
        #[command(flatten)]
        play: PlayArgs,
        /// Write the autoplay input as a replay file
        #[arg(long)]
        record: Option<PathBuf>,
    },
    /// Play a chart from a recorded replay
    Replay {
        #[command(flatten)]
        play: PlayArgs,
        replay: PathBuf,
    },
}

#[derive(Debug, Args)]
struct PlayArgs {
    chart: PathBuf,
    /// Comma separated modifiers, e.g. `hd,nf`
    #[arg(long, value_delimiter = ',')]
    mods: Vec<Mod>,
    #[arg(long, default_value_t = 1.0)]
    rate: f64,
    #[arg(long, default_value_t = 240)]
    fps: u32,
    /// Hit window table (JSON) replacing the built-in one
    #[arg(long)]
    windows: Option<PathBuf>,
}

impl PlayArgs {
    fn windows(&self) -> anyhow::Result<HitWindowTable> {
        match &self.windows {
            Some(path) => lane_runner::load_windows_from_path(path),
            None => Ok(HitWindowTable::default()),
        }
    }

    fn options(&self) -> anyhow::Result<SimulationOptions> {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            anyhow::bail!("rate must be > 0 (got {})", self.rate);
        }
        if self.fps == 0 {
            anyhow::bail!("fps must be > 0");
        }

        Ok(SimulationOptions {
            rate: self.rate,
            fps: self.fps,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).try_init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Check { chart } => {
            let map = lane_runner::load_map_from_path(&chart)?;
            let session = lane_runner::build_session(&map, &[], &HitWindowTable::default())
                .with_context(|| format!("check failed: {}", chart.display()))?;

            let chart = session.chart();
            writeln!(
                out,
                "ok: {} objects, {} keys, max combo {}, {} timing points",
                chart.objects().len(),
                chart.key_count(),
                chart.max_combo(),
                chart.timing().points().len()
            )?;
        }
        Command::Autoplay { play, record } => {
            let map = lane_runner::load_map_from_path(&play.chart)?;
            let mut mods = play.mods.clone();
            if !mods.contains(&Mod::Autoplay) {
                mods.push(Mod::Autoplay);
            }

            let mut session = lane_runner::build_session(&map, &mods, &play.windows()?)
                .with_context(|| format!("failed to prepare: {}", play.chart.display()))?;
            let recorded = simulate::run(&mut session, InputSource::Autoplay, &play.options()?, &mut out)?;

            if let Some(path) = record {
                let replay = recorded.finish("autoplay", mods);
                let json = serde_json::to_string_pretty(&replay).context("failed to serialize replay")?;
                fs::write(&path, json).with_context(|| format!("failed to write: {}", path.display()))?;
            }
        }
        Command::Replay { play, replay } => {
            let map = lane_runner::load_map_from_path(&play.chart)?;
            let recorded = lane_runner::load_replay_from_path(&replay)?;

            let mut mods = recorded.mods.clone();
            for m in &play.mods {
                if !mods.contains(m) {
                    mods.push(*m);
                }
            }
            mods.retain(|m| *m != Mod::Autoplay);

            let mut session = lane_runner::build_session(&map, &mods, &play.windows()?)
                .with_context(|| format!("failed to prepare: {}", play.chart.display()))?;
            let lanes = session.chart().lane_count();
            let source = InputSource::Replay(lane_core::input::ReplayInput::new(&recorded, lanes));
            simulate::run(&mut session, source, &play.options()?, &mut out)?;
        }
    }

    Ok(())
}
