use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::WeatherError,
    model::{Forecast, HourlyReading, Location},
};

use super::{WeatherProvider, http_client, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com";

/// WeatherAPI.com error code for an unknown `q` parameter.
const NO_MATCHING_LOCATION: u32 = 1006;

/// WeatherAPI.com hourly forecast (`forecast.json`).
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    days: u8,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            days: 5,
            http: http_client()?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Forecast length; WeatherAPI serves 1 to 14 days.
    pub fn with_days(mut self, days: u8) -> Self {
        self.days = days.clamp(1, 14);
        self
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    #[serde(default)]
    country: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaForecastHour {
    /// Local time at the location, `YYYY-MM-DD HH:MM`.
    time: String,
    temp_c: f64,
    #[serde(default)]
    humidity: u8,
    #[serde(default)]
    wind_kph: f64,
    #[serde(default)]
    precip_mm: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    hour: Vec<WaForecastHour>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    forecast: WaForecast,
}

#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WaErrorDetail {
    code: u32,
    message: String,
}

fn parse_hour(hour: WaForecastHour) -> Result<HourlyReading, WeatherError> {
    let timestamp = NaiveDateTime::parse_from_str(&hour.time, "%Y-%m-%d %H:%M").map_err(|e| {
        WeatherError::ProviderUnavailable(format!("Invalid WeatherAPI time '{}': {e}", hour.time))
    })?;

    Ok(HourlyReading {
        timestamp,
        rainfall_mm: hour.precip_mm,
        temperature_c: hour.temp_c,
        wind_kmh: hour.wind_kph,
        humidity_pct: hour.humidity,
        condition: hour.condition.text,
    })
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    #[instrument(skip(self), fields(days = self.days))]
    async fn fetch(&self, city: &str) -> Result<Forecast, WeatherError> {
        let url = format!("{}/v1/forecast.json", self.base_url);
        let days = self.days.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("days", days.as_str())])
            .send()
            .await
            .map_err(|e| {
                WeatherError::ProviderUnavailable(format!("WeatherAPI forecast request failed: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::ProviderUnavailable(format!("Failed to read WeatherAPI forecast body: {e}"))
        })?;

        debug!(%status, "WeatherAPI response");

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<WaErrorBody>(&body)
                && (err.error.code == NO_MATCHING_LOCATION
                    || err.error.message.contains("No matching location"))
            {
                return Err(WeatherError::CityNotFound { city: city.to_string() });
            }
            return Err(WeatherError::ProviderUnavailable(format!(
                "WeatherAPI forecast failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        let parsed: WaForecastResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::ProviderUnavailable(format!("Failed to parse WeatherAPI forecast JSON: {e}"))
        })?;

        let readings = parsed
            .forecast
            .forecastday
            .into_iter()
            .flat_map(|day| day.hour)
            .map(parse_hour)
            .collect::<Result<Vec<_>, _>>()?;

        let location = Location {
            name: parsed.location.name,
            country: parsed.location.country,
            latitude: parsed.location.lat,
            longitude: parsed.location.lon,
        };

        Ok(Forecast { provider: "weatherapi".to_string(), location, readings })
    }
}
