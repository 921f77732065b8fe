//! Error taxonomy shared by the dashboard components.
//!
//! Every variant is caught at the render boundary ([`crate::dashboard`]) and
//! turned into a message for the user; nothing here is retried.

use thiserror::Error;

/// Aggregation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SummaryError {
    #[error("No forecast readings to summarize")]
    EmptyInput,
}

/// Invalid flood-risk thresholds.
#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("Flood thresholds must be finite and non-negative (got {medium_from_mm}, {high_from_mm})")]
    OutOfRange { medium_from_mm: f64, high_from_mm: f64 },

    #[error("Medium threshold ({medium_from_mm} mm) must be below high threshold ({high_from_mm} mm)")]
    NotIncreasing { medium_from_mm: f64, high_from_mm: f64 },
}

/// Weather fetch failures.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("City '{city}' was not found by the weather provider")]
    CityNotFound { city: String },

    #[error("Weather provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// Advisory, transcription and speech failures.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Advisory assistant unavailable: {0}")]
    Unavailable(String),

    #[error("No advisory assistant configured.\nHint: run `farmcast configure assistant`.")]
    NotConfigured,

    #[error("Unsupported audio: {0}")]
    UnsupportedAudio(String),
}

/// Anything that can stop a dashboard interaction.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Please enter a city name")]
    EmptyCity,

    #[error(transparent)]
    Summary(#[from] SummaryError),

    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Assistant(#[from] AssistantError),
}

impl DashboardError {
    /// Text shown to the user in place of the failed view.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::EmptyCity => "Please enter a city name.".to_string(),
            DashboardError::Summary(SummaryError::EmptyInput) => {
                "No forecast data available for this city.".to_string()
            }
            DashboardError::Weather(WeatherError::CityNotFound { city }) => {
                format!("Could not find a city named '{city}'. Check the spelling and try again.")
            }
            DashboardError::Weather(WeatherError::ProviderUnavailable(_)) => {
                "The weather service is unavailable right now. Please try again later.".to_string()
            }
            DashboardError::Assistant(AssistantError::UnsupportedAudio(reason)) => {
                format!("That audio file cannot be used: {reason}")
            }
            DashboardError::Assistant(AssistantError::NotConfigured) => {
                "Voice features need an advisory assistant. Run `farmcast configure assistant`."
                    .to_string()
            }
            DashboardError::Assistant(AssistantError::Unavailable(_)) => {
                "The advisory assistant is unavailable right now. Please try again later."
                    .to_string()
            }
        }
    }
}

/// A string that does not name one of the accepted choices.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'. Supported values: {expected}.")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl ParseChoiceError {
    pub(crate) fn new(kind: &'static str, value: &str, expected: &'static str) -> Self {
        Self { kind, value: value.to_string(), expected }
    }
}
