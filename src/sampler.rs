use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

use crate::accumulator::AccumulationWindow;
use crate::battery::{BatteryReader, Sample};
use crate::config::{BatwatchConfig, OutputFormat};
use crate::estimate;
use crate::logger::{DailyLog, LogRow};
use crate::render;
use crate::time_utils;

/// The read, log, accumulate and print cycle.
///
/// Single threaded: one tick per read interval, a blocking sleep in
/// between, and no shutdown path besides the process being signalled.
pub struct Sampler {
    reader: BatteryReader,
    daily_log: Option<DailyLog>,
    window: AccumulationWindow,
    read_interval: Duration,
    format: OutputFormat,
    show_wattage: bool,
}

impl Sampler {
    pub fn new(reader: BatteryReader, daily_log: Option<DailyLog>, config: &BatwatchConfig) -> Self {
        Self {
            reader,
            daily_log,
            window: AccumulationWindow::new(config.sampling.ticks_per_window()),
            read_interval: Duration::from_secs(config.sampling.read_interval.max(1)),
            format: config.output.format,
            show_wattage: config.output.show_wattage,
        }
    }

    /// Run one tick. Returns the status line when it closes a window.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<String> {
        match self.reader.sample(now) {
            Ok(sample) => {
                log::debug!("{:?}", sample);
                self.record(&sample);
                self.window.fold(&sample);
            }
            Err(e) => log::warn!("Skipping tick: {}", e),
        }

        let average = self.window.advance()?;
        log::debug!("Window closed over {} sample(s)", average.samples);
        let estimate = estimate::estimate(&average);
        let line = render::status_line(&average, &estimate, self.show_wattage);
        Some(line.render(self.format))
    }

    fn record(&mut self, sample: &Sample) {
        if let Some(daily_log) = self.daily_log.as_mut() {
            if let Err(e) = daily_log.append(&LogRow::from(sample)) {
                log::warn!("Sample not logged: {:#}", e);
            }
        }
    }

    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Sampling {} every {}s, printing every {} read(s)",
            self.reader.dir().display(),
            self.read_interval.as_secs(),
            self.window.ticks_per_window()
        );
        let stdout = std::io::stdout();
        loop {
            let started = Instant::now();
            if let Some(line) = self.tick(time_utils::now()) {
                let mut out = stdout.lock();
                writeln!(out, "{}", line)
                    .and_then(|_| out.flush())
                    .context("Failed to write status line")?;
            }
            thread::sleep(self.read_interval.saturating_sub(started.elapsed()));
        }
    }
}
