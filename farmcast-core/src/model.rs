use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ParseChoiceError;

/// One timestamped weather observation or forecast step.
///
/// `timestamp` is wall-clock time at the forecast location, so its date is
/// the location's local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyReading {
    pub timestamp: NaiveDateTime,
    pub rainfall_mm: f64,
    pub temperature_c: f64,
    pub wind_kmh: f64,
    pub humidity_pct: u8,
    pub condition: String,
}

impl HourlyReading {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Flood-risk classification derived from daily rainfall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloodRisk {
    Low,
    Medium,
    High,
}

impl FloodRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloodRisk::Low => "low",
            FloodRisk::Medium => "medium",
            FloodRisk::High => "high",
        }
    }

    /// Badge colour used by dashboards: green, yellow, red.
    pub fn color(&self) -> &'static str {
        match self {
            FloodRisk::Low => "green",
            FloodRisk::Medium => "yellow",
            FloodRisk::High => "red",
        }
    }
}

impl fmt::Display for FloodRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated statistics for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub rainfall_total_mm: f64,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub temp_mean_c: f64,
    pub wind_max_kmh: f64,
    pub humidity_mean_pct: f64,
    pub readings: usize,
    pub flood_risk: FloodRisk,
}

/// Headline numbers for the whole forecast period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outlook {
    /// Rainfall of the first summarized day.
    pub today_rain_mm: f64,
    pub mean_temp_c: f64,
    pub mean_humidity_pct: f64,
    pub peak_risk: FloodRisk,
}

/// A city as resolved by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.country.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}, {}", self.name, self.country)
        }
    }
}

/// Raw time series returned by a weather provider for one city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub provider: String,
    pub location: Location,
    pub readings: Vec<HourlyReading>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Gujarati,
}

impl Language {
    /// ISO 639-1 code, used for transcription hints and speech.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Gujarati => "gu",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Gujarati => "Gujarati",
        }
    }

    pub const fn all() -> &'static [Language] {
        &[Language::English, Language::Hindi, Language::Gujarati]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi" | "hi" => Ok(Language::Hindi),
            "gujarati" | "gu" => Ok(Language::Gujarati),
            _ => Err(ParseChoiceError::new("language", s, "english, hindi, gujarati")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crop {
    Wheat,
    Rice,
    Maize,
}

impl Crop {
    pub fn name(&self) -> &'static str {
        match self {
            Crop::Wheat => "Wheat",
            Crop::Rice => "Rice",
            Crop::Maize => "Maize",
        }
    }

    pub const fn all() -> &'static [Crop] {
        &[Crop::Wheat, Crop::Rice, Crop::Maize]
    }
}

impl fmt::Display for Crop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Crop {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wheat" => Ok(Crop::Wheat),
            "rice" => Ok(Crop::Rice),
            "maize" | "corn" => Ok(Crop::Maize),
            _ => Err(ParseChoiceError::new("crop", s, "wheat, rice, maize")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flood_risk_is_ordered_by_severity() {
        assert!(FloodRisk::Low < FloodRisk::Medium);
        assert!(FloodRisk::Medium < FloodRisk::High);
        assert_eq!(FloodRisk::High.color(), "red");
    }

    #[test]
    fn language_parses_names_and_codes() {
        assert_eq!("Hindi".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!("gu".parse::<Language>().unwrap(), Language::Gujarati);
        for lang in Language::all() {
            assert_eq!(lang.code().parse::<Language>().unwrap(), *lang);
        }
    }

    #[test]
    fn unknown_crop_lists_choices() {
        let err = "barley".parse::<Crop>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("barley"));
        assert!(msg.contains("wheat, rice, maize"));
    }

    #[test]
    fn location_display_omits_empty_country() {
        let loc = Location {
            name: "Ahmedabad".into(),
            country: String::new(),
            latitude: 23.0,
            longitude: 72.6,
        };
        assert_eq!(loc.to_string(), "Ahmedabad");
    }
}
