use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let map = lane_runner::load_map_from_path(args.path)?;
    println!("title={}", map.metadata.title);
    println!("artist={}", map.metadata.artist);
    println!("difficulty={}", map.metadata.difficulty);
    println!("objects={}", map.hit_objects.len());
    println!("max_combo={}", map.max_combo());
    println!("end_time_ms={}", map.end_time().unwrap_or(0.0));
    Ok(())
}
