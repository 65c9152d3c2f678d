use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::battery::POWER_SUPPLY_ROOT;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatwatchConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub battery: BatteryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Seconds between battery reads.
    #[serde(default = "default_read_interval")]
    pub read_interval: u64,
    /// Seconds between printed lines; 0 means "same as read_interval".
    #[serde(default)]
    pub print_interval: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub show_wattage: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    /// `%{F#rrggbb}` colour tags.
    Polybar,
    /// One JSON object per line for waybar custom modules.
    Waybar,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Defaults to `~/.cache/battery`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Power supply name such as `BAT0`; auto-detected when unset.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: PathBuf,
}

// Defaults

fn default_read_interval() -> u64 { 5 }
fn default_true() -> bool { true }
fn default_sysfs_root() -> PathBuf { PathBuf::from(POWER_SUPPLY_ROOT) }

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            read_interval: default_read_interval(),
            print_interval: 0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            name: None,
            sysfs_root: default_sysfs_root(),
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.read_interval >= 1, "read_interval must be at least 1 second");
        Ok(())
    }

    pub fn effective_print_interval(&self) -> u64 {
        if self.print_interval == 0 {
            self.read_interval
        } else {
            self.print_interval
        }
    }

    /// Number of read ticks folded into one printed line, never less than one.
    pub fn ticks_per_window(&self) -> u32 {
        let read = self.read_interval.max(1);
        let print = self.effective_print_interval();
        if print % read != 0 {
            log::warn!(
                "print_interval {}s is not a multiple of read_interval {}s, rounding down",
                print,
                read
            );
        }
        (print / read).clamp(1, u32::MAX as u64) as u32
    }
}

impl LogConfig {
    pub fn resolved_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        let home = std::env::var("HOME").context("Can't find $HOME for the log directory")?;
        Ok(PathBuf::from(home).join(".cache").join("battery"))
    }
}

pub fn default_config_path() -> PathBuf {
    dirs_path().join("config.toml")
}

fn dirs_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(".config")
        });
    base.join("batwatch")
}

pub fn parse_config(content: &str) -> Result<BatwatchConfig> {
    Ok(toml::from_str(content)?)
}

pub fn load_config(path: &Path) -> Result<BatwatchConfig> {
    if !path.exists() {
        log::info!("Config file not found at {}, generating default", path.display());
        let content = generate_default_config();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::write(path, &content) {
            Ok(()) => log::info!("Created default config at {}", path.display()),
            Err(e) => log::warn!("Failed to write default config: {}", e),
        }
        return Ok(BatwatchConfig::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
}

fn generate_default_config() -> String {
    r#"# batwatch - battery status line for status bars
# Configuration file, generated automatically on first run.
# Uncomment and edit values to customise. Defaults are shown.
# BATWATCH_* environment variables and command-line flags override these.

[sampling]
# Seconds between battery reads
read_interval = 5
# Seconds between printed lines, averaged over the reads in between.
# 0 = same as read_interval. Should be a multiple of read_interval.
print_interval = 0

[output]
# "plain" | "polybar" | "waybar"
format = "plain"
# Append the discharge wattage to the line
show_wattage = false

[log]
# Append every read to a daily CSV file
enabled = true
# Log directory (default: ~/.cache/battery)
# dir = "/home/me/.cache/battery"

[battery]
# Power supply to monitor (default: first BAT* entry)
# name = "BAT0"
sysfs_root = "/sys/class/power_supply"
"#.to_string()
}
