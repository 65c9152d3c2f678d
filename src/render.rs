//! Severity tiers and status line rendering.
//!
//! Classification is table driven and independent of the output format;
//! a [`StatusLine`] is built once per window and then formatted as plain
//! text, polybar colour tags or a waybar JSON object.

use serde_json::json;

use crate::accumulator::WindowAverage;
use crate::battery::Status;
use crate::config::OutputFormat;
use crate::estimate::{Estimate, Remaining};

/// Severity bucket, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Critical,
    Warning,
    Caution,
    Normal,
    Good,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::Warning => "warning",
            Tier::Caution => "caution",
            Tier::Normal => "normal",
            Tier::Good => "good",
        }
    }

    /// Polybar foreground colour; the two calm tiers are left uncoloured.
    pub fn color(self) -> Option<&'static str> {
        match self {
            Tier::Critical => Some("#ff4500"),
            Tier::Warning => Some("#ffa500"),
            Tier::Caution => Some("#ffff00"),
            Tier::Normal | Tier::Good => None,
        }
    }
}

/// Colour for charging and full lines.
const CHARGE_COLOR: &str = "#00fa9a";

struct CapacityBand {
    below: u8,
    tier: Tier,
    bar: &'static str,
}

static CAPACITY_BANDS: [CapacityBand; 5] = [
    CapacityBand { below: 10, tier: Tier::Critical, bar: "▮▯▯▯▯" },
    CapacityBand { below: 20, tier: Tier::Warning, bar: "▮▮▯▯▯" },
    CapacityBand { below: 40, tier: Tier::Caution, bar: "▮▮▮▯▯" },
    CapacityBand { below: 80, tier: Tier::Normal, bar: "▮▮▮▮▯" },
    CapacityBand { below: u8::MAX, tier: Tier::Good, bar: "▮▮▮▮▮" },
];

static WATTAGE_BANDS: [(f64, Tier); 3] = [
    (10.0, Tier::Critical),
    (8.0, Tier::Warning),
    (6.0, Tier::Caution),
];

fn capacity_band(capacity: u8) -> &'static CapacityBand {
    CAPACITY_BANDS
        .iter()
        .find(|band| capacity < band.below)
        .unwrap_or(&CAPACITY_BANDS[CAPACITY_BANDS.len() - 1])
}

pub fn wattage_tier(watts: f64) -> Tier {
    WATTAGE_BANDS
        .iter()
        .find(|(above, _)| watts > *above)
        .map_or(Tier::Normal, |(_, tier)| *tier)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Option<&'static str>,
}

impl Segment {
    fn new(text: impl Into<String>, color: Option<&'static str>) -> Self {
        Self { text: text.into(), color }
    }
}

/// A rendered status line before output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub segments: Vec<Segment>,
    /// Tier label, or "charging"/"full".
    pub class: &'static str,
    pub percentage: u8,
}

impl StatusLine {
    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn polybar(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s.color {
                Some(color) => format!("%{{F{}}}{}%{{F-}}", color, s.text),
                None => s.text.clone(),
            })
            .collect()
    }

    pub fn waybar(&self) -> String {
        json!({
            "text": self.plain(),
            "class": self.class,
            "percentage": self.percentage,
        })
        .to_string()
    }

    pub fn render(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Plain => self.plain(),
            OutputFormat::Polybar => self.polybar(),
            OutputFormat::Waybar => self.waybar(),
        }
    }
}

fn full_line(percentage: u8) -> StatusLine {
    StatusLine {
        segments: vec![Segment::new("FULL", Some(CHARGE_COLOR))],
        class: "full",
        percentage,
    }
}

pub fn status_line(avg: &WindowAverage, estimate: &Estimate, show_wattage: bool) -> StatusLine {
    let percentage = avg.capacity_percent();
    match avg.status {
        Status::Charging if percentage >= 100 => full_line(percentage),
        Status::Charging => {
            let time = match estimate.remaining {
                Remaining::ToFull(t) => t.to_string(),
                _ => "--:--".to_string(),
            };
            StatusLine {
                segments: vec![
                    Segment::new(format!("{}% ", percentage), Some(CHARGE_COLOR)),
                    Segment::new(time, None),
                ],
                class: "charging",
                percentage,
            }
        }
        Status::Discharging => {
            let band = capacity_band(percentage);
            let mut text = band.bar.to_string();
            // Below 10% the time is shown only once it drops under an hour.
            if band.tier == Tier::Critical {
                if let Remaining::ToEmpty(t) = estimate.remaining {
                    if t.hours < 1 {
                        text = format!("{} {}", text, t);
                    }
                }
            }
            let mut segments = vec![Segment::new(text, band.tier.color())];
            if show_wattage {
                if let Some(watts) = estimate.wattage {
                    segments.push(Segment::new(" ", None));
                    segments.push(Segment::new(
                        format!("{:.1}W", watts),
                        wattage_tier(watts).color(),
                    ));
                }
            }
            StatusLine {
                segments,
                class: band.tier.label(),
                percentage,
            }
        }
        Status::Full | Status::Other(_) => full_line(percentage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate;

    fn avg(status: Status, charge_full: f64, charge_now: f64, current_now: f64, capacity: f64) -> WindowAverage {
        WindowAverage {
            status,
            charge_full,
            charge_now,
            current_now,
            voltage_now: 12.0,
            capacity,
            samples: 1,
        }
    }

    fn line(a: &WindowAverage, format: OutputFormat) -> String {
        status_line(a, &estimate::estimate(a), false).render(format)
    }

    #[test]
    fn charging_at_full_capacity_is_full() {
        let a = avg(Status::Charging, 50.0, 40.0, 5.0, 100.0);
        assert_eq!(line(&a, OutputFormat::Plain), "FULL");
    }

    #[test]
    fn charging_shows_time_to_full() {
        let a = avg(Status::Charging, 50.0, 25.0, 5.0, 80.0);
        assert_eq!(line(&a, OutputFormat::Plain), "80% 05:00");
        assert_eq!(line(&a, OutputFormat::Polybar), "%{F#00fa9a}80% %{F-}05:00");
    }

    #[test]
    fn charging_with_zero_current_has_unknown_time() {
        let a = avg(Status::Charging, 50.0, 25.0, 0.0, 80.0);
        let out = line(&a, OutputFormat::Plain);
        assert_eq!(out, "80% --:--");
        assert!(!out.contains("NaN") && !out.contains("inf"));
    }

    #[test]
    fn critical_hides_time_over_an_hour() {
        let a = avg(Status::Discharging, 50.0, 10.0, 2.0, 8.0);
        assert_eq!(line(&a, OutputFormat::Plain), "▮▯▯▯▯");
        assert_eq!(line(&a, OutputFormat::Polybar), "%{F#ff4500}▮▯▯▯▯%{F-}");
    }

    #[test]
    fn critical_shows_time_under_an_hour() {
        // 3600 * 1.5 / 2 = 2700s = 45m
        let a = avg(Status::Discharging, 50.0, 1.5, 2.0, 3.0);
        assert_eq!(line(&a, OutputFormat::Plain), "▮▯▯▯▯ 00:45");
        assert_eq!(line(&a, OutputFormat::Polybar), "%{F#ff4500}▮▯▯▯▯ 00:45%{F-}");
    }

    #[test]
    fn critical_with_zero_current_is_bar_only() {
        let a = avg(Status::Discharging, 50.0, 1.5, 0.0, 3.0);
        assert_eq!(line(&a, OutputFormat::Plain), "▮▯▯▯▯");
    }

    #[test]
    fn discharging_bars() {
        let cases = [
            (15.0, "▮▮▯▯▯"),
            (39.0, "▮▮▮▯▯"),
            (40.0, "▮▮▮▮▯"),
            (79.9, "▮▮▮▮▯"),
            (80.0, "▮▮▮▮▮"),
            (100.0, "▮▮▮▮▮"),
        ];
        for (capacity, bar) in cases {
            let a = avg(Status::Discharging, 50.0, 30.0, 2.0, capacity);
            assert_eq!(line(&a, OutputFormat::Plain), bar, "capacity {}", capacity);
        }
        let a = avg(Status::Discharging, 50.0, 30.0, 2.0, 60.0);
        assert_eq!(line(&a, OutputFormat::Polybar), "▮▮▮▮▯");
    }

    #[test]
    fn full_and_unknown_statuses_are_full() {
        for status in [Status::Full, Status::Other("Not charging".into())] {
            let a = avg(status, 50.0, 12.0, 0.0, 23.0);
            assert_eq!(line(&a, OutputFormat::Plain), "FULL");
            assert_eq!(line(&a, OutputFormat::Polybar), "%{F#00fa9a}FULL%{F-}");
        }
    }

    #[test]
    fn capacity_tiers_are_monotonic() {
        for c in 0..100u8 {
            let (lower, upper) = (capacity_band(c).tier, capacity_band(c + 1).tier);
            assert!(lower <= upper, "tier({}) {:?} is calmer than tier({}) {:?}", c, lower, c + 1, upper);
        }
        assert_eq!(capacity_band(9).tier, Tier::Critical);
        assert_eq!(capacity_band(10).tier, Tier::Warning);
        assert_eq!(capacity_band(100).tier, Tier::Good);
    }

    #[test]
    fn wattage_tiers() {
        assert_eq!(wattage_tier(10.5), Tier::Critical);
        assert_eq!(wattage_tier(10.0), Tier::Warning);
        assert_eq!(wattage_tier(8.1), Tier::Warning);
        assert_eq!(wattage_tier(6.5), Tier::Caution);
        assert_eq!(wattage_tier(6.0), Tier::Normal);
        assert_eq!(wattage_tier(0.0), Tier::Normal);
    }

    #[test]
    fn wattage_annotation_while_discharging() {
        // 1000 mA * 12 V = 12 W
        let a = avg(Status::Discharging, 5000.0, 2500.0, 1000.0, 50.0);
        let est = estimate::estimate(&a);
        let line = status_line(&a, &est, true);
        assert_eq!(line.plain(), "▮▮▮▮▯ 12.0W");
        assert_eq!(line.polybar(), "▮▮▮▮▯ %{F#ff4500}12.0W%{F-}");

        let charging = avg(Status::Charging, 5000.0, 2500.0, 1000.0, 50.0);
        let est = estimate::estimate(&charging);
        assert!(!status_line(&charging, &est, true).plain().contains('W'));
    }

    #[test]
    fn waybar_json() {
        let a = avg(Status::Discharging, 50.0, 10.0, 2.0, 15.0);
        let out = line(&a, OutputFormat::Waybar);
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["text"], "▮▮▯▯▯");
        assert_eq!(v["class"], "warning");
        assert_eq!(v["percentage"], 15);
        assert!(!out.contains('\n'));
    }
}
