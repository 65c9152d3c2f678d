use crate::battery::{Sample, Status};

/// Values averaged over one reporting window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowAverage {
    /// Status of the most recent sample; categorical, never averaged.
    pub status: Status,
    /// Full-charge capacity of the most recent sample.
    pub charge_full: f64,
    pub charge_now: f64,
    pub current_now: f64,
    pub voltage_now: f64,
    pub capacity: f64,
    pub samples: u32,
}

impl WindowAverage {
    /// Averaged capacity as a whole percentage, truncated.
    pub fn capacity_percent(&self) -> u8 {
        self.capacity.floor().clamp(0.0, 100.0) as u8
    }
}

/// Accumulates samples across the ticks of one print interval.
///
/// The window closes every `ticks_per_window` ticks, whether or not every
/// tick produced a sample. Means are kept incrementally, so N identical
/// samples average back to exactly that sample.
#[derive(Debug)]
pub struct AccumulationWindow {
    ticks_per_window: u32,
    ticks: u32,
    samples: u32,
    charge_now: f64,
    current_now: f64,
    voltage_now: f64,
    capacity: f64,
    latest: Option<(Status, f64)>,
}

impl AccumulationWindow {
    pub fn new(ticks_per_window: u32) -> Self {
        Self {
            ticks_per_window: ticks_per_window.max(1),
            ticks: 0,
            samples: 0,
            charge_now: 0.0,
            current_now: 0.0,
            voltage_now: 0.0,
            capacity: 0.0,
            latest: None,
        }
    }

    pub fn ticks_per_window(&self) -> u32 {
        self.ticks_per_window
    }

    pub fn fold(&mut self, sample: &Sample) {
        self.samples += 1;
        let n = self.samples as f64;
        self.charge_now += (sample.charge_now - self.charge_now) / n;
        self.current_now += (sample.current_now - self.current_now) / n;
        self.voltage_now += (sample.voltage_now - self.voltage_now) / n;
        self.capacity += (sample.capacity as f64 - self.capacity) / n;
        self.latest = Some((sample.status.clone(), sample.charge_full));
    }

    /// Count one elapsed tick. When this closes the window, returns the
    /// averages (or `None` if every read in the window failed) and resets.
    pub fn advance(&mut self) -> Option<WindowAverage> {
        self.ticks += 1;
        if self.ticks < self.ticks_per_window {
            return None;
        }
        let average = self.average();
        self.reset();
        average
    }

    fn average(&self) -> Option<WindowAverage> {
        let (status, charge_full) = self.latest.clone()?;
        Some(WindowAverage {
            status,
            charge_full,
            charge_now: self.charge_now,
            current_now: self.current_now,
            voltage_now: self.voltage_now,
            capacity: self.capacity,
            samples: self.samples,
        })
    }

    fn reset(&mut self) {
        self.ticks = 0;
        self.samples = 0;
        self.charge_now = 0.0;
        self.current_now = 0.0;
        self.voltage_now = 0.0;
        self.capacity = 0.0;
        self.latest = None;
    }
}
