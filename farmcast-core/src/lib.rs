//! Core library for the `farmcast` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over weather providers
//! - Daily aggregation and flood-risk classification
//! - Farming advice (hosted language model with offline rules as fallback)
//! - Session state and event handling for the presentation layer
//!
//! It is used by `farmcast-cli`, but can also be reused by other binaries or services.

pub mod advisory;
pub mod aggregate;
pub mod audio;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod provider;
pub mod radar;

pub use aggregate::{FloodThresholds, outlook, summarize};
pub use config::{AssistantConfig, Config, DashboardConfig, FloodConfig, ProviderConfig};
pub use dashboard::{Advice, Dashboard, Event, Level, Report, Session, View, VoiceReply};
pub use error::{AssistantError, DashboardError, SummaryError, WeatherError};
pub use model::{Crop, DailySummary, FloodRisk, Forecast, HourlyReading, Language, Location, Outlook};
pub use provider::{ProviderId, WeatherProvider};
