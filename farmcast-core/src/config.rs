use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::{
    aggregate::{DEFAULT_HIGH_FROM_MM, DEFAULT_MEDIUM_FROM_MM, FloodThresholds},
    model::{Crop, Language},
    provider::ProviderId,
};

/// Configuration for a single weather provider (e.g., API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Hosted language-model settings used for advice, transcription and speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Without a key the dashboard falls back to rule-based advice.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub stt_model: String,
    pub tts_model: String,
    pub voice: String,
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            stt_model: "whisper-1".to_string(),
            tts_model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            timeout_secs: 60,
        }
    }
}

impl AssistantConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Daily rainfall (mm) at which each flood-risk band starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodConfig {
    pub medium_from_mm: f64,
    pub high_from_mm: f64,
}

impl Default for FloodConfig {
    fn default() -> Self {
        Self { medium_from_mm: DEFAULT_MEDIUM_FROM_MM, high_from_mm: DEFAULT_HIGH_FROM_MM }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub default_city: Option<String>,
    pub language: Language,
    pub crop: Option<Crop>,
    /// Days requested from providers that take a day count.
    pub forecast_days: u8,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { default_city: None, language: Language::English, crop: None, forecast_days: 5 }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Optional default provider id, e.g. "openweather" or "weatherapi".
    pub default_provider: Option<String>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    pub providers: HashMap<String, ProviderConfig>,

    pub assistant: AssistantConfig,
    pub flood: FloodConfig,
    pub dashboard: DashboardConfig,
}

impl Config {
    /// Return the default provider as a strongly-typed ProviderId.
    pub fn default_provider_id(&self) -> Result<ProviderId> {
        let s = self.default_provider.as_ref().ok_or_else(|| {
            anyhow!(
                "No default provider configured.\n\
                 Hint: run `farmcast configure <provider>` (e.g. `farmcast configure openweather`) first."
            )
        })?;

        ProviderId::try_from(s.as_str())
    }

    /// Store default provider as string.
    pub fn set_default_provider(&mut self, id: ProviderId) {
        self.default_provider = Some(id.as_str().to_string());
    }

    /// Validated flood thresholds from the `[flood]` section.
    pub fn flood_thresholds(&self) -> Result<FloodThresholds> {
        FloodThresholds::new(self.flood.medium_from_mm, self.flood.high_from_mm)
            .context("Invalid [flood] section in config")
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "farmcast", "farmcast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set/replace a provider API key; the first configured provider becomes the default.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });

        if self.default_provider.is_none() {
            self.default_provider = Some(provider_id.to_string());
        }
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers.get(provider_id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderId;

    #[test]
    fn default_provider_id_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_provider_id().unwrap_err();

        assert!(err.to_string().contains("No default provider configured"));
    }

    #[test]
    fn first_api_key_becomes_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());

        let default = cfg.default_provider_id().expect("default provider must exist");
        assert_eq!(default, ProviderId::OpenWeather);
        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("OPEN_KEY"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn upsert_does_not_override_existing_default() {
        let mut cfg = Config::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OPEN_KEY".into());
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WEATHER_KEY".into());

        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::OpenWeather);

        cfg.set_default_provider(ProviderId::WeatherApi);
        assert_eq!(cfg.default_provider_id().unwrap(), ProviderId::WeatherApi);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg = Config::from_toml(
            r#"
            default_provider = "weatherapi"

            [providers.weatherapi]
            api_key = "WA"

            [flood]
            high_from_mm = 50.0

            [dashboard]
            default_city = "Ahmedabad"
            crop = "rice"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.provider_api_key(ProviderId::WeatherApi), Some("WA"));
        assert!(!cfg.assistant.is_enabled());
        assert_eq!(cfg.assistant.model, "gpt-4o-mini");
        assert_eq!(cfg.dashboard.crop, Some(Crop::Rice));
        assert_eq!(cfg.dashboard.language, Language::English);
        assert_eq!(cfg.dashboard.forecast_days, 5);

        let thresholds = cfg.flood_thresholds().unwrap();
        assert_eq!(thresholds.medium_from_mm(), 10.0);
        assert_eq!(thresholds.high_from_mm(), 50.0);
    }

    #[test]
    fn inverted_flood_thresholds_are_rejected() {
        let mut cfg = Config::default();
        cfg.flood.medium_from_mm = 40.0;
        cfg.flood.high_from_mm = 20.0;

        let err = cfg.flood_thresholds().unwrap_err();
        assert!(err.to_string().contains("[flood]"));
    }

    #[test]
    fn blank_assistant_key_counts_as_disabled() {
        let mut cfg = Config::default();
        cfg.assistant.api_key = Some("  ".into());
        assert!(!cfg.assistant.is_enabled());

        cfg.assistant.api_key = Some("sk-test".into());
        assert!(cfg.assistant.is_enabled());
    }

    #[test]
    fn config_survives_toml_round_trip() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "K".into());
        cfg.dashboard.crop = Some(Crop::Wheat);

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.provider_api_key(ProviderId::OpenWeather), Some("K"));
        assert_eq!(back.dashboard.crop, Some(Crop::Wheat));
    }
}
