mod accumulator;
mod battery;
mod config;
mod error;
mod estimate;
mod logger;
mod render;
mod sampler;
mod time_utils;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::battery::BatteryReader;
use crate::config::{BatwatchConfig, OutputFormat};
use crate::logger::DailyLog;
use crate::sampler::Sampler;

#[derive(Parser, Debug)]
#[command(name = "batwatch", version, about = "Battery status line for status bars, with daily sample logs")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds between battery reads
    #[arg(long, env = "BATWATCH_READ_INTERVAL", value_name = "SECS")]
    read_interval: Option<u64>,

    /// Seconds between printed lines (a multiple of the read interval)
    #[arg(long, env = "BATWATCH_PRINT_INTERVAL", value_name = "SECS")]
    print_interval: Option<u64>,

    /// Output format
    #[arg(long, env = "BATWATCH_FORMAT", value_enum)]
    format: Option<OutputFormat>,

    /// Colour the output with polybar tags (same as --format polybar; an explicit --format wins)
    #[arg(long, env = "BATWATCH_COLOR", action = ArgAction::SetTrue, value_parser = FalseyValueParser::new())]
    color: bool,

    /// Append the discharge wattage to the line
    #[arg(long)]
    wattage: bool,

    /// Directory for the daily CSV logs
    #[arg(long, env = "BATWATCH_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Don't log samples
    #[arg(long)]
    no_log: bool,

    /// Power supply to monitor, e.g. BAT1
    #[arg(long, env = "BATWATCH_BATTERY")]
    battery: Option<String>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Read the battery once and print the sample as JSON
    Sample,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "batwatch", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;
    apply_overrides(&mut config, &cli);
    config.sampling.validate()?;

    let reader = BatteryReader::discover(&config.battery.sysfs_root, config.battery.name.as_deref())?;
    log::info!("Using battery at {}", reader.dir().display());

    match cli.command {
        Some(CliCommand::Sample) => print_sample(&reader),
        None => {
            let daily_log = open_daily_log(&config);
            Sampler::new(reader, daily_log, &config).run()
        }
    }
}

fn apply_overrides(config: &mut BatwatchConfig, cli: &Cli) {
    if let Some(secs) = cli.read_interval {
        config.sampling.read_interval = secs;
    }
    if let Some(secs) = cli.print_interval {
        config.sampling.print_interval = secs;
    }
    match (cli.format, cli.color) {
        (Some(format), _) => config.output.format = format,
        (None, true) => config.output.format = OutputFormat::Polybar,
        (None, false) => {}
    }
    if cli.wattage {
        config.output.show_wattage = true;
    }
    if let Some(dir) = &cli.log_dir {
        config.log.dir = Some(dir.clone());
    }
    if cli.no_log {
        config.log.enabled = false;
    }
    if let Some(name) = &cli.battery {
        config.battery.name = Some(name.clone());
    }
}

/// Logging is best effort: without a usable directory the monitor still runs.
fn open_daily_log(config: &BatwatchConfig) -> Option<DailyLog> {
    if !config.log.enabled {
        return None;
    }
    match config.log.resolved_dir().and_then(DailyLog::open) {
        Ok(daily_log) => {
            log::info!("Sample log directory: {}", daily_log.dir().display());
            Some(daily_log)
        }
        Err(e) => {
            log::warn!("Sample logging disabled: {:#}", e);
            None
        }
    }
}

fn print_sample(reader: &BatteryReader) -> Result<()> {
    let sample = reader.sample(time_utils::now())?;
    let json = serde_json::to_string_pretty(&sample).context("Failed to serialise sample")?;
    println!("{}", json);
    Ok(())
}
