//! Daily aggregation and flood-risk classification.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    error::{SummaryError, ThresholdError},
    model::{DailySummary, FloodRisk, HourlyReading, Outlook},
};

pub const DEFAULT_MEDIUM_FROM_MM: f64 = 10.0;
pub const DEFAULT_HIGH_FROM_MM: f64 = 30.0;

/// Daily rainfall bands: `Low < medium_from_mm <= Medium < high_from_mm <= High`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloodThresholds {
    medium_from_mm: f64,
    high_from_mm: f64,
}

impl FloodThresholds {
    pub fn new(medium_from_mm: f64, high_from_mm: f64) -> Result<Self, ThresholdError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(medium_from_mm) || !valid(high_from_mm) {
            return Err(ThresholdError::OutOfRange { medium_from_mm, high_from_mm });
        }
        if medium_from_mm >= high_from_mm {
            return Err(ThresholdError::NotIncreasing { medium_from_mm, high_from_mm });
        }
        Ok(Self { medium_from_mm, high_from_mm })
    }

    pub fn medium_from_mm(&self) -> f64 {
        self.medium_from_mm
    }

    pub fn high_from_mm(&self) -> f64 {
        self.high_from_mm
    }

    pub fn classify(&self, rainfall_mm: f64) -> FloodRisk {
        if rainfall_mm >= self.high_from_mm {
            FloodRisk::High
        } else if rainfall_mm >= self.medium_from_mm {
            FloodRisk::Medium
        } else {
            FloodRisk::Low
        }
    }
}

impl Default for FloodThresholds {
    fn default() -> Self {
        Self { medium_from_mm: DEFAULT_MEDIUM_FROM_MM, high_from_mm: DEFAULT_HIGH_FROM_MM }
    }
}

#[derive(Debug)]
struct DayAccumulator {
    rain: f64,
    temp_min: f64,
    temp_max: f64,
    temp_sum: f64,
    wind_max: f64,
    humidity_sum: f64,
    count: usize,
}

impl DayAccumulator {
    fn new() -> Self {
        Self {
            rain: 0.0,
            temp_min: f64::INFINITY,
            temp_max: f64::NEG_INFINITY,
            temp_sum: 0.0,
            wind_max: 0.0,
            humidity_sum: 0.0,
            count: 0,
        }
    }

    fn push(&mut self, reading: &HourlyReading) {
        self.rain += reading.rainfall_mm.max(0.0);
        self.temp_min = self.temp_min.min(reading.temperature_c);
        self.temp_max = self.temp_max.max(reading.temperature_c);
        self.temp_sum += reading.temperature_c;
        self.wind_max = self.wind_max.max(reading.wind_kmh);
        self.humidity_sum += f64::from(reading.humidity_pct);
        self.count += 1;
    }

    fn finish(self, date: NaiveDate, thresholds: &FloodThresholds) -> DailySummary {
        let n = self.count as f64;
        DailySummary {
            date,
            rainfall_total_mm: self.rain,
            temp_min_c: self.temp_min,
            temp_max_c: self.temp_max,
            temp_mean_c: self.temp_sum / n,
            wind_max_kmh: self.wind_max,
            humidity_mean_pct: self.humidity_sum / n,
            readings: self.count,
            flood_risk: thresholds.classify(self.rain),
        }
    }
}

/// Groups readings by calendar date and produces one summary per date,
/// in ascending date order.
///
/// Readings may arrive in any order. Negative rainfall counts as zero.
pub fn summarize(
    readings: &[HourlyReading],
    thresholds: &FloodThresholds,
) -> Result<Vec<DailySummary>, SummaryError> {
    if readings.is_empty() {
        return Err(SummaryError::EmptyInput);
    }

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for reading in readings {
        days.entry(reading.date()).or_insert_with(DayAccumulator::new).push(reading);
    }

    Ok(days.into_iter().map(|(date, acc)| acc.finish(date, thresholds)).collect())
}

/// Headline numbers across the summarized period, or `None` when there are no days.
pub fn outlook(summary: &[DailySummary]) -> Option<Outlook> {
    let first = summary.first()?;
    let n = summary.len() as f64;

    let mean_temp_c = summary.iter().map(|d| d.temp_mean_c).sum::<f64>() / n;
    let mean_humidity_pct = summary.iter().map(|d| d.humidity_mean_pct).sum::<f64>() / n;
    let peak_risk = summary.iter().map(|d| d.flood_risk).max().unwrap_or(FloodRisk::Low);

    Some(Outlook {
        today_rain_mm: first.rainfall_total_mm,
        mean_temp_c,
        mean_humidity_pct,
        peak_risk,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    pub(crate) fn reading(ts: &str, rain: f64, temp: f64) -> HourlyReading {
        HourlyReading {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            rainfall_mm: rain,
            temperature_c: temp,
            wind_kmh: 10.0,
            humidity_pct: 60,
            condition: "Light rain".into(),
        }
    }

    #[test]
    fn summarizes_single_day() {
        let readings = vec![
            reading("2024-06-01 06:00", 2.0, 24.0),
            reading("2024-06-01 15:00", 3.0, 29.0),
        ];

        let days = summarize(&readings, &FloodThresholds::default()).unwrap();

        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert_eq!(day.rainfall_total_mm, 5.0);
        assert_eq!(day.temp_min_c, 24.0);
        assert_eq!(day.temp_max_c, 29.0);
        assert_eq!(day.temp_mean_c, 26.5);
        assert_eq!(day.readings, 2);
        assert_eq!(day.flood_risk, FloodRisk::Low);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = summarize(&[], &FloodThresholds::default()).unwrap_err();
        assert_eq!(err, SummaryError::EmptyInput);
    }

    #[test]
    fn groups_unordered_readings_by_ascending_date() {
        let readings = vec![
            reading("2024-06-03 00:00", 1.0, 20.0),
            reading("2024-06-01 00:00", 1.0, 20.0),
            reading("2024-06-02 12:00", 1.0, 20.0),
            reading("2024-06-01 21:00", 1.0, 22.0),
        ];

        let days = summarize(&readings, &FloodThresholds::default()).unwrap();
        let dates: Vec<_> = days.iter().map(|d| d.date.to_string()).collect();

        assert_eq!(dates, ["2024-06-01", "2024-06-02", "2024-06-03"]);
        assert_eq!(days[0].readings, 2);
        assert_eq!(days[0].rainfall_total_mm, 2.0);
    }

    #[test]
    fn max_wind_is_tracked_per_day() {
        let mut a = reading("2024-06-01 00:00", 0.0, 20.0);
        let mut b = reading("2024-06-01 03:00", 0.0, 20.0);
        a.wind_kmh = 12.5;
        b.wind_kmh = 31.0;

        let days = summarize(&[a, b], &FloodThresholds::default()).unwrap();
        assert_eq!(days[0].wind_max_kmh, 31.0);
    }

    #[test]
    fn negative_rain_counts_as_zero() {
        let readings = vec![reading("2024-06-01 00:00", -4.0, 20.0)];
        let days = summarize(&readings, &FloodThresholds::default()).unwrap();
        assert_eq!(days[0].rainfall_total_mm, 0.0);
    }

    #[test]
    fn heavy_rain_is_high_risk() {
        let thresholds = FloodThresholds::new(10.0, 50.0).unwrap();
        assert_eq!(thresholds.classify(80.0), FloodRisk::High);
        assert_eq!(thresholds.classify(50.0), FloodRisk::High);
        assert_eq!(thresholds.classify(10.0), FloodRisk::Medium);
        assert_eq!(thresholds.classify(9.9), FloodRisk::Low);
    }

    #[test]
    fn thresholds_must_increase() {
        assert!(matches!(
            FloodThresholds::new(50.0, 50.0),
            Err(ThresholdError::NotIncreasing { .. })
        ));
        assert!(matches!(
            FloodThresholds::new(-1.0, 5.0),
            Err(ThresholdError::OutOfRange { .. })
        ));
        assert!(matches!(
            FloodThresholds::new(1.0, f64::NAN),
            Err(ThresholdError::OutOfRange { .. })
        ));
    }

    #[test]
    fn outlook_uses_first_day_rain_and_peak_risk() {
        let readings = vec![
            reading("2024-06-01 00:00", 4.0, 20.0),
            reading("2024-06-02 00:00", 40.0, 30.0),
        ];
        let days = summarize(&readings, &FloodThresholds::default()).unwrap();

        let outlook = outlook(&days).unwrap();
        assert_eq!(outlook.today_rain_mm, 4.0);
        assert_eq!(outlook.mean_temp_c, 25.0);
        assert_eq!(outlook.mean_humidity_pct, 60.0);
        assert_eq!(outlook.peak_risk, FloodRisk::High);
    }

    #[test]
    fn outlook_of_nothing_is_none() {
        assert!(outlook(&[]).is_none());
    }
}
