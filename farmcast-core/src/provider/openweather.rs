use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::WeatherError,
    model::{Forecast, HourlyReading, Location},
};

use super::{WeatherProvider, http_client, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// OpenWeather geocoding + 5-day/3-hour forecast.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, WeatherError> {
        Ok(Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: http_client()? })
    }

    /// Point the provider at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<(StatusCode, String), WeatherError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                WeatherError::ProviderUnavailable(format!("OpenWeather {what} request failed: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::ProviderUnavailable(format!("Failed to read OpenWeather {what} body: {e}"))
        })?;

        debug!(%status, what, "OpenWeather response");
        Ok((status, body))
    }

    #[instrument(skip(self))]
    async fn geocode(&self, city: &str) -> Result<Location, WeatherError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let (status, body) = self.get_json(&url, &[("q", city), ("limit", "1")], "geocoding").await?;

        if !status.is_success() {
            return Err(WeatherError::ProviderUnavailable(format!(
                "OpenWeather geocoding failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        let places: Vec<OwPlace> = serde_json::from_str(&body).map_err(|e| {
            WeatherError::ProviderUnavailable(format!("Failed to parse OpenWeather geocoding JSON: {e}"))
        })?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::CityNotFound { city: city.to_string() })?;

        Ok(Location {
            name: place.name,
            country: place.country.unwrap_or_default(),
            latitude: place.lat,
            longitude: place.lon,
        })
    }

    #[instrument(skip(self, location), fields(lat = location.latitude, lon = location.longitude))]
    async fn fetch_forecast(&self, city: &str, location: Location) -> Result<Forecast, WeatherError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let lat = location.latitude.to_string();
        let lon = location.longitude.to_string();

        let (status, body) = self
            .get_json(
                &url,
                &[("lat", lat.as_str()), ("lon", lon.as_str()), ("units", "metric")],
                "forecast",
            )
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::CityNotFound { city: city.to_string() });
        }
        if !status.is_success() {
            return Err(WeatherError::ProviderUnavailable(format!(
                "OpenWeather forecast failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::ProviderUnavailable(format!("Failed to parse OpenWeather forecast JSON: {e}"))
        })?;

        let offset = parsed.city.timezone.unwrap_or(0);
        let readings = parsed
            .list
            .into_iter()
            .filter_map(|entry| entry.into_reading(offset))
            .collect::<Vec<_>>();

        debug!(count = readings.len(), "Parsed OpenWeather forecast");

        Ok(Forecast { provider: "openweather".to_string(), location, readings })
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwRain {
    #[serde(rename = "3h", default)]
    three_hours: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    rain: Option<OwRain>,
}

impl OwForecastEntry {
    fn into_reading(self, utc_offset_secs: i64) -> Option<HourlyReading> {
        let timestamp = local_time(self.dt, utc_offset_secs)?;
        let condition = self
            .weather
            .first()
            .map(|w| capitalize(&w.description))
            .unwrap_or_else(|| "Unknown".to_string());

        Some(HourlyReading {
            timestamp,
            rainfall_mm: self.rain.map(|r| r.three_hours).unwrap_or(0.0),
            temperature_c: self.main.temp,
            wind_kmh: (self.wind.speed * 3.6 * 10.0).round() / 10.0,
            humidity_pct: self.main.humidity,
            condition,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwCity {
    /// Shift in seconds from UTC.
    timezone: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    list: Vec<OwForecastEntry>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, city: &str) -> Result<Forecast, WeatherError> {
        let location = self.geocode(city).await?;
        self.fetch_forecast(city, location).await
    }
}

fn local_time(ts: i64, utc_offset_secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts.checked_add(utc_offset_secs)?, 0).map(|dt| dt.naive_utc())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
