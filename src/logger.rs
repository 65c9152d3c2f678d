//! Append-only daily CSV log of raw samples.
//!
//! Each calendar day gets its own `<YYYY-MM-DD>.csv` in the log directory.
//! Rows are written with a single append per sample and prior content is
//! never rewritten.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::battery::{Sample, Status};
use crate::time_utils;

pub const HEADER: &str = "timestamp,charge_full,charge_now,current_now,capacity,voltage_now,wattage,status";

/// On-disk wattage for rows where it does not apply.
const WATTAGE_NOT_APPLICABLE: f64 = -1.0;

const COLUMNS: usize = 8;

/// One sample flattened for the log, plus its derived wattage.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub timestamp: NaiveDateTime,
    pub charge_full: f64,
    pub charge_now: f64,
    pub current_now: f64,
    pub capacity: u8,
    pub voltage_now: f64,
    pub wattage: Option<f64>,
    pub status: Status,
}

impl From<&Sample> for LogRow {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp,
            charge_full: sample.charge_full,
            charge_now: sample.charge_now,
            current_now: sample.current_now,
            capacity: sample.capacity,
            voltage_now: sample.voltage_now,
            wattage: sample.wattage(),
            status: sample.status.clone(),
        }
    }
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn unquote(s: &str) -> String {
    match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => s.to_string(),
    }
}

// f64 Display is the shortest representation that parses back to the same value.
impl fmt::Display for LogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{},{}",
            time_utils::format_timestamp(&self.timestamp),
            self.charge_full,
            self.charge_now,
            self.current_now,
            self.capacity,
            self.voltage_now,
            self.wattage.unwrap_or(WATTAGE_NOT_APPLICABLE),
            csv_field(self.status.as_str()),
        )
    }
}

impl FromStr for LogRow {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).splitn(COLUMNS, ',').collect();
        anyhow::ensure!(fields.len() == COLUMNS, "Expected {} columns, got {}", COLUMNS, fields.len());

        let number = |i: usize| -> Result<f64> {
            fields[i]
                .parse::<f64>()
                .with_context(|| format!("Bad number in column {}: {:?}", i + 1, fields[i]))
        };

        let timestamp = time_utils::parse_timestamp(fields[0])
            .with_context(|| format!("Bad timestamp: {:?}", fields[0]))?;
        let capacity = fields[4]
            .parse::<u8>()
            .with_context(|| format!("Bad capacity: {:?}", fields[4]))?;
        let wattage = number(6)?;

        Ok(Self {
            timestamp,
            charge_full: number(1)?,
            charge_now: number(2)?,
            current_now: number(3)?,
            capacity,
            voltage_now: number(5)?,
            wattage: (wattage != WATTAGE_NOT_APPLICABLE).then_some(wattage),
            status: Status::from_sysfs(&unquote(fields[7])),
        })
    }
}

/// Day-partitioned append-only sample log.
///
/// Keeps the current day's file open and swaps it when a row for a new
/// date arrives.
#[derive(Debug)]
pub struct DailyLog {
    dir: PathBuf,
    current: Option<(NaiveDate, File)>,
}

impl DailyLog {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        Ok(Self { dir, current: None })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(time_utils::log_file_name(date))
    }

    pub fn append(&mut self, row: &LogRow) -> Result<()> {
        let date = row.timestamp.date();
        let line = format!("{}\n", row);
        let result = self.file_for(date).and_then(|file| {
            file.write_all(line.as_bytes())
                .context("Failed to append log row")
        });
        if result.is_err() {
            // Reopen on the next row rather than keep a handle in an unknown state.
            self.current = None;
        }
        result
    }

    fn file_for(&mut self, date: NaiveDate) -> Result<&mut File> {
        let stale = !matches!(&self.current, Some((day, _)) if *day == date);
        if stale {
            self.current = None;
            let file = self.open_day(date)?;
            self.current = Some((date, file));
        }
        let (_, file) = self.current.as_mut().context("Daily log file is not open")?;
        Ok(file)
    }

    fn open_day(&self, date: NaiveDate) -> Result<File> {
        let path = self.path_for(date);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let len = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        if len == 0 {
            writeln!(file, "{}", HEADER)
                .with_context(|| format!("Failed to write header to {}", path.display()))?;
        }
        log::info!("Logging samples to {}", path.display());
        Ok(file)
    }
}
