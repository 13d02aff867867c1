//! tileworld - A deterministic tile-based world simulation
//!
//! Headless runner: loads the config, replays scripted input for a fixed
//! number of ticks and saves the player profile on exit.

mod config;
mod headless;
mod scripted_input;

use anyhow::Result;
use clap::Parser;
use config::TileworldConfig;
use headless::HeadlessConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run the tile world headless for a fixed number of ticks",
    long_about = None
)]
struct Args {
    /// Config file (TOML)
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// World seed; overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Real seconds per in-game day; overrides the config file
    #[arg(long)]
    day_length: Option<f64>,

    /// Ticks to simulate; overrides the config file
    #[arg(long)]
    ticks: Option<u64>,

    /// Seconds per frame fed to the fixed-step accumulator; overrides the config file
    #[arg(long)]
    frame_secs: Option<f64>,

    /// Scripted input file (JSON list of timed steps)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Write every simulation event to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write a metrics report to this JSON file
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Directory for profile saves; overrides the config file
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Profile save name; overrides the config file
    #[arg(long)]
    profile: Option<String>,

    /// Do not read or write a profile save
    #[arg(long)]
    no_save: bool,

    /// Ignore an existing save and start a new profile
    #[arg(long)]
    fresh: bool,

    /// Write the effective config back to --config and exit
    #[arg(long)]
    write_config: bool,
}

fn main() -> Result<()> {
    // WARN by default; RUST_LOG=debug prints a line per tick
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    info!("Starting tileworld v{}", env!("CARGO_PKG_VERSION"));

    let mut config = TileworldConfig::load_from_path(&args.config);
    if let Some(seed) = args.seed {
        config.sim.seed = seed;
    }
    if let Some(day_length) = args.day_length {
        if day_length > 0.0 {
            config.sim.day_length_secs = day_length;
        } else {
            tracing::warn!(day_length, "--day-length must be positive; keeping the config value");
        }
    }
    if let Some(ticks) = args.ticks {
        config.run.ticks = ticks;
    }
    if let Some(frame_secs) = args.frame_secs {
        config.run.frame_secs = frame_secs;
    }
    if let Some(save_dir) = args.save_dir {
        config.run.save_dir = save_dir;
    }
    if let Some(profile) = args.profile {
        config.run.profile = profile;
    }

    if args.write_config {
        config.save_to_path(&args.config)?;
        println!("config written to {}", args.config.display());
        return Ok(());
    }

    let summary = headless::run(HeadlessConfig {
        sim: config.sim,
        ticks: config.run.ticks,
        tick_secs: config.run.tick_secs,
        frame_secs: config.run.frame_secs,
        scripted_input: args.script,
        events: args.events,
        metrics: args.metrics,
        save_dir: config.run.save_dir,
        profile: config.run.profile,
        no_save: args.no_save,
        fresh: args.fresh,
    })?;

    println!(
        "{} ticks, {} gathers, {} kills, {} deaths, state {}",
        summary.gameplay.ticks,
        summary.gameplay.gathers,
        summary.gameplay.kills,
        summary.gameplay.deaths,
        summary.state_hash
    );
    if let Some(path) = summary.save_path {
        println!("profile saved to {}", path.display());
    }
    Ok(())
}
