//! TickLab CLI — replay recorded ticks through a strategy against the
//! simulated venue.

mod ticks;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ticklab_core::config::ReplayConfig;
use ticklab_core::sim::{Replay, ReplaySummary, SimVenue};

#[derive(Parser)]
#[command(name = "ticklab", about = "TickLab — tick-driven order management replay")]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "ticklab_core=trace".
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs and results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay one or more tick files through the configured strategy
    Replay {
        /// Path to the replay TOML config
        #[arg(long)]
        config: PathBuf,

        /// Tick CSV files; merged and ordered by timestamp
        #[arg(long, required = true, num_args = 1..)]
        ticks: Vec<PathBuf>,
    },

    /// Validate a config and print the effective options
    Check {
        /// Path to the replay TOML config
        #[arg(long)]
        config: PathBuf,
    },
}

fn init_tracing(level: Option<&str>, json: bool) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref(), cli.json)?;

    match cli.command {
        Commands::Replay { config, ticks } => run_replay(&config, &ticks, cli.json),
        Commands::Check { config } => run_check(&config),
    }
}

fn load_config(path: &Path) -> Result<ReplayConfig> {
    ReplayConfig::from_file(path).with_context(|| format!("load config {}", path.display()))
}

fn run_replay(config_path: &Path, tick_paths: &[PathBuf], json: bool) -> Result<()> {
    let config = load_config(config_path)?;

    let mut all_ticks = Vec::new();
    for path in tick_paths {
        all_ticks.extend(ticks::load_ticks(path)?);
    }
    tracing::info!(
        strategy = %config.name,
        files = tick_paths.len(),
        ticks = all_ticks.len(),
        "starting replay"
    );

    let strategy = config.strategy.build(&config.name)?;
    let venue = SimVenue::new(config.instruments.clone(), &config.venue);
    let summary = Replay::new(venue, strategy)
        .run(all_ticks)
        .context("replay failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn run_check(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    // Construction runs the strategy's own checks on top of config validation.
    config.strategy.build(&config.name)?;
    tracing::info!(strategy = %config.name, "config ok");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn print_summary(summary: &ReplaySummary) {
    println!("strategy:        {}", summary.strategy);
    println!("sessions:        {}", summary.sessions);
    println!(
        "ticks:           {} ({} skipped)",
        summary.ticks, summary.ticks_skipped
    );
    println!(
        "orders:          {} submitted, {} rejected",
        summary.submitted, summary.rejected
    );
    println!(
        "fills:           {} ({} lots)",
        summary.fills, summary.filled_qty
    );
    println!(
        "cancels:         {} confirmed, {} pending",
        summary.cancels, summary.pending_cancels
    );
    println!("open orders:     {}", summary.open_orders);
    if summary.positions.is_empty() {
        println!("positions:       flat");
    } else {
        println!("positions:");
        for (code, qty) in &summary.positions {
            println!("  {code:<20} {qty:>8}");
        }
    }
}
