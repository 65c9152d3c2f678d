use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReadError, ReadResult};
use crate::estimate;

pub const POWER_SUPPLY_ROOT: &str = "/sys/class/power_supply";

/// sysfs reports charge, current, energy and power in micro-units.
/// Dividing by this once gives milli-units; voltage takes it twice to reach volts.
const SCALE: f64 = 1000.0;

/// Charging state as reported by the `status` attribute.
///
/// Anything the kernel reports besides the three states the monitor acts
/// on ("Not charging", "Unknown", ...) is kept verbatim in `Other` and
/// rendered like `Full`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Charging,
    Discharging,
    Full,
    Other(String),
}

impl Status {
    pub fn from_sysfs(s: &str) -> Self {
        match s {
            "Charging" => Status::Charging,
            "Discharging" => Status::Discharging,
            "Full" => Status::Full,
            other => Status::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Status::Charging => "Charging",
            Status::Discharging => "Discharging",
            Status::Full => "Full",
            Status::Other(s) => s,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One point-in-time reading of the battery.
///
/// Charges are in mAh, current in mA, voltage in V. `capacity` is the
/// kernel's own percentage, not derived from the charge ratio.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub status: Status,
    pub charge_full: f64,
    pub charge_now: f64,
    pub current_now: f64,
    pub voltage_now: f64,
    pub capacity: u8,
}

impl Sample {
    /// Instantaneous draw in watts; `None` unless discharging.
    pub fn wattage(&self) -> Option<f64> {
        estimate::wattage(&self.status, self.current_now, self.voltage_now)
    }
}

/// Reads attributes of a single power supply directory.
#[derive(Debug, Clone)]
pub struct BatteryReader {
    dir: PathBuf,
}

impl BatteryReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Locate the battery to monitor under `root`.
    ///
    /// With an explicit `name` that entry must exist. Otherwise the first
    /// `BAT*` entry in name order is used.
    pub fn discover(root: &Path, name: Option<&str>) -> Result<Self> {
        if let Some(name) = name {
            let dir = root.join(name);
            anyhow::ensure!(dir.is_dir(), "Battery {} not found under {}", name, root.display());
            return Ok(Self::new(dir));
        }

        let entries = fs::read_dir(root)
            .with_context(|| format!("Failed to list power supplies in {}", root.display()))?;
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("BAT"))
            .collect();
        names.sort();

        match names.first() {
            Some(name) => Ok(Self::new(root.join(name))),
            None => anyhow::bail!("No battery found under {}", root.display()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Attribute contents with the trailing newline stripped.
    pub fn read_string(&self, attribute: &str) -> ReadResult<String> {
        let raw = fs::read_to_string(self.dir.join(attribute)).map_err(|source| ReadError::Io {
            attribute: attribute.to_string(),
            source,
        })?;
        Ok(raw.trim_end_matches(['\n', '\r']).to_string())
    }

    pub fn read_int(&self, attribute: &str) -> ReadResult<i64> {
        let value = self.read_string(attribute)?;
        value.trim().parse::<i64>().map_err(|_| ReadError::Parse {
            attribute: attribute.to_string(),
            value,
        })
    }

    /// Numeric attribute scaled from micro- to milli-units.
    pub fn read_scaled(&self, attribute: &str) -> ReadResult<f64> {
        Ok(self.read_int(attribute)? as f64 / SCALE)
    }

    fn has(&self, attribute: &str) -> bool {
        self.dir.join(attribute).exists()
    }

    pub fn sample(&self, timestamp: NaiveDateTime) -> ReadResult<Sample> {
        let status = Status::from_sysfs(&self.read_string("status")?);
        let voltage_now = self.read_scaled("voltage_now")? / SCALE;

        let (charge_full, charge_now, current_now) = match self.read_scaled("charge_now") {
            Ok(charge_now) => (
                self.read_scaled("charge_full")?,
                charge_now,
                self.read_scaled("current_now")?,
            ),
            Err(e) if e.is_missing() && self.has("energy_now") => self.energy_as_charge(voltage_now)?,
            Err(e) => return Err(e),
        };

        let capacity = self.read_int("capacity")?.clamp(0, 100) as u8;

        Ok(Sample {
            timestamp,
            status,
            charge_full,
            charge_now,
            // Some drivers report discharge current as negative.
            current_now: current_now.abs(),
            voltage_now,
            capacity,
        })
    }

    /// Convert `energy_*`/`power_now` (mWh, mW after scaling) into charge
    /// units at the present voltage.
    fn energy_as_charge(&self, voltage_now: f64) -> ReadResult<(f64, f64, f64)> {
        if voltage_now <= 0.0 {
            return Err(ReadError::NotPositive {
                attribute: "voltage_now".to_string(),
                value: voltage_now,
            });
        }
        let energy_full = self.read_scaled("energy_full")?;
        let energy_now = self.read_scaled("energy_now")?;
        let power_now = self.read_scaled("power_now")?;
        Ok((
            energy_full / voltage_now,
            energy_now / voltage_now,
            power_now / voltage_now,
        ))
    }
}
