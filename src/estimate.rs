//! Time-remaining and power-draw estimation.
//!
//! Inputs are in the reader's units: charge in mAh, current in mA,
//! voltage in V. Every estimate guards against a zero current so that
//! NaN or infinity never reaches the rendered line.

use std::fmt;

use crate::accumulator::WindowAverage;
use crate::battery::Status;
use crate::time_utils;

/// A duration split into whole hours and whole minutes, truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursMinutes {
    pub hours: u64,
    pub minutes: u64,
}

impl HoursMinutes {
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        let total = seconds.floor() as u64;
        Some(Self {
            hours: total / 3600,
            minutes: total % 3600 / 60,
        })
    }
}

impl fmt::Display for HoursMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&time_utils::format_hm(self.hours, self.minutes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    ToFull(HoursMinutes),
    ToEmpty(HoursMinutes),
    /// Charging or discharging, but the current is zero.
    Unknown,
    /// Full, or a status the monitor does not estimate for.
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub remaining: Remaining,
    pub wattage: Option<f64>,
}

pub fn seconds_to_full(charge_full: f64, charge_now: f64, current_now: f64) -> Option<f64> {
    if current_now <= 0.0 {
        return None;
    }
    let seconds = 3600.0 * (charge_full - charge_now).max(0.0) / current_now;
    seconds.is_finite().then_some(seconds)
}

pub fn seconds_to_empty(charge_now: f64, current_now: f64) -> Option<f64> {
    if current_now <= 0.0 {
        return None;
    }
    let seconds = 3600.0 * charge_now.max(0.0) / current_now;
    seconds.is_finite().then_some(seconds)
}

/// Watts drawn from the battery. Only meaningful while discharging.
pub fn wattage(status: &Status, current_now: f64, voltage_now: f64) -> Option<f64> {
    if *status != Status::Discharging {
        return None;
    }
    let watts = current_now * voltage_now / 1000.0;
    watts.is_finite().then_some(watts)
}

pub fn remaining(status: &Status, charge_full: f64, charge_now: f64, current_now: f64) -> Remaining {
    let split = |seconds: Option<f64>| seconds.and_then(HoursMinutes::from_seconds);
    match status {
        Status::Charging => split(seconds_to_full(charge_full, charge_now, current_now))
            .map_or(Remaining::Unknown, Remaining::ToFull),
        Status::Discharging => split(seconds_to_empty(charge_now, current_now))
            .map_or(Remaining::Unknown, Remaining::ToEmpty),
        Status::Full | Status::Other(_) => Remaining::NotApplicable,
    }
}

pub fn estimate(avg: &WindowAverage) -> Estimate {
    Estimate {
        remaining: remaining(&avg.status, avg.charge_full, avg.charge_now, avg.current_now),
        wattage: wattage(&avg.status, avg.current_now, avg.voltage_now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(hours: u64, minutes: u64) -> HoursMinutes {
        HoursMinutes { hours, minutes }
    }

    #[test]
    fn charging_time_to_full() {
        // 3600 * 25 / 5 = 18000s
        assert_eq!(seconds_to_full(50.0, 25.0, 5.0), Some(18000.0));
        assert_eq!(
            remaining(&Status::Charging, 50.0, 25.0, 5.0),
            Remaining::ToFull(hm(5, 0))
        );
    }

    #[test]
    fn discharging_time_to_empty() {
        assert_eq!(seconds_to_empty(10.0, 2.0), Some(18000.0));
        assert_eq!(
            remaining(&Status::Discharging, 50.0, 10.0, 2.0),
            Remaining::ToEmpty(hm(5, 0))
        );
    }

    #[test]
    fn zero_current_is_unknown() {
        assert_eq!(seconds_to_full(50.0, 25.0, 0.0), None);
        assert_eq!(seconds_to_empty(10.0, 0.0), None);
        assert_eq!(remaining(&Status::Charging, 50.0, 25.0, 0.0), Remaining::Unknown);
        assert_eq!(remaining(&Status::Discharging, 50.0, 10.0, 0.0), Remaining::Unknown);
    }

    #[test]
    fn full_and_other_have_no_estimate() {
        assert_eq!(remaining(&Status::Full, 50.0, 50.0, 1.0), Remaining::NotApplicable);
        assert_eq!(
            remaining(&Status::Other("Not charging".into()), 50.0, 40.0, 1.0),
            Remaining::NotApplicable
        );
    }

    #[test]
    fn overfull_charge_does_not_go_negative() {
        assert_eq!(seconds_to_full(50.0, 52.0, 5.0), Some(0.0));
    }

    #[test]
    fn wattage_only_while_discharging() {
        assert_eq!(wattage(&Status::Discharging, 1250.0, 12.0), Some(15.0));
        assert_eq!(wattage(&Status::Charging, 1250.0, 12.0), None);
        assert_eq!(wattage(&Status::Full, 1250.0, 12.0), None);
    }

    #[test]
    fn hours_minutes_truncate() {
        assert_eq!(HoursMinutes::from_seconds(3599.9), Some(hm(0, 59)));
        assert_eq!(HoursMinutes::from_seconds(3660.0), Some(hm(1, 1)));
        assert_eq!(HoursMinutes::from_seconds(-1.0), None);
        assert_eq!(HoursMinutes::from_seconds(f64::INFINITY), None);
        assert_eq!(HoursMinutes::from_seconds(f64::NAN), None);
        assert_eq!(hm(5, 0).to_string(), "05:00");
    }

    #[test]
    fn decomposition_brackets_seconds() {
        let mut full = 1.0;
        while full < 200.0 {
            for current in [0.3, 1.0, 2.7, 9.0] {
                let seconds = seconds_to_full(full, 0.5, current).unwrap();
                let t = HoursMinutes::from_seconds(seconds).unwrap();
                let lower = (3600 * t.hours + 60 * t.minutes) as f64;
                let upper = (3600 * t.hours + 60 * (t.minutes + 1)) as f64;
                assert!(lower <= seconds && seconds < upper, "{} not in [{}, {})", seconds, lower, upper);
            }
            full += 7.3;
        }
    }
}
