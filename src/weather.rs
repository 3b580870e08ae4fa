//! # Weather Fetching and Caching
//!
//! This module handles all network operations for fetching current weather
//! from the OpenWeatherMap API. It includes a staleness-based cache so the
//! radio is used at most once per refresh interval, and robust error
//! handling for unreliable network conditions.
//!
//! ## Data Source
//!
//! ### OpenWeatherMap current weather
//! - **URL**: https://api.openweathermap.org/data/2.5/weather
//! - **Query**: city string, API key and units from the config file
//! - **Format**: JSON, deserialized into typed structs
//!
//! ## Caching Strategy
//!
//! The cache is a single in-memory [`WeatherSnapshot`] owned by
//! [`WeatherStore`]:
//! - **Refresh interval**: configurable, default 60 minutes
//! - **Eager first fetch**: one fetch as soon as connectivity appears
//! - **Re-arm on every attempt**: success or failure both restart the
//!   interval; there is no backoff escalation, just the next scheduled retry
//!
//! ## Error Handling
//!
//! The module degrades instead of failing:
//! - **No connectivity**: the last valid snapshot is kept; with no previous
//!   data the snapshot becomes an explicit "No WiFi" placeholder
//! - **HTTP / transport errors**: same degrade path, description
//!   "Weather unavailable"
//! - **Parse / malformed payload**: same degrade path
//!
//! The weather screen always has something to render; `valid` tells the
//! renderer whether it is live data or a placeholder.

use crate::config::WeatherConfig;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching or decoding weather data.
///
/// Every variant is non-fatal: callers keep the cached snapshot and retry
/// at the next interval.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// Network is down or unreachable
    #[error("no connectivity")]
    NoConnectivity,

    /// HTTP request failed (transport, timeout, or non-2xx status)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON for the expected schema
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON decoded but required fields were missing
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// The cached weather state handed to the renderer on weather-screen ticks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in the configured units; `None` for placeholders
    pub temperature: Option<f32>,
    /// Human-readable condition ("scattered clouds", or a degrade marker)
    pub description: String,
    /// Provider icon code (e.g. "04d"); empty for placeholders
    pub icon: String,
    /// Monotonic stamp of the successful fetch that produced this data
    pub fetched_at_ms: Option<u64>,
    /// False while this snapshot is a placeholder rather than live data
    pub valid: bool,
}

impl WeatherSnapshot {
    /// Placeholder used before any fetch has succeeded without connectivity.
    pub fn placeholder() -> Self {
        WeatherSnapshot {
            temperature: None,
            description: "No WiFi".to_string(),
            icon: String::new(),
            fetched_at_ms: None,
            valid: false,
        }
    }

    /// Placeholder for fetch/parse failures with connectivity present.
    pub fn unavailable() -> Self {
        WeatherSnapshot {
            temperature: None,
            description: "Weather unavailable".to_string(),
            icon: String::new(),
            fetched_at_ms: None,
            valid: false,
        }
    }
}

// -- OpenWeatherMap response schema (only the fields we use) --

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmCondition>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f32,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

impl OwmResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let condition = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::Malformed("empty weather condition list".to_string()))?;
        Ok(WeatherSnapshot {
            temperature: Some(self.main.temp),
            description: condition.description,
            icon: condition.icon,
            fetched_at_ms: None, // stamped by the store
            valid: true,
        })
    }
}

/// Fetch current weather from OpenWeatherMap.
///
/// The body is decoded in two steps (text, then `serde_json`) so transport
/// failures and schema failures surface as distinct error kinds.
pub async fn fetch(
    client: &reqwest::Client,
    config: &WeatherConfig,
) -> Result<WeatherSnapshot, WeatherError> {
    let response = client
        .get(&config.api_url)
        .query(&[
            ("q", config.city.as_str()),
            ("appid", config.api_key.as_str()),
            ("units", config.units.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let body = response.text().await?;
    let decoded: OwmResponse = serde_json::from_str(&body)?;
    decoded.into_snapshot()
}

/// Owns the cached snapshot and its staleness policy.
///
/// The driver loop asks [`WeatherStore::due`] every tick and awaits
/// [`WeatherStore::refresh`] when it says so; the scheduler only ever sees
/// [`WeatherStore::snapshot`].
pub struct WeatherStore {
    config: WeatherConfig,
    client: reqwest::Client,
    snapshot: WeatherSnapshot,
    /// Monotonic stamp of the last fetch attempt, success or not
    last_attempt_ms: Option<u64>,
}

impl WeatherStore {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(WeatherStore {
            config,
            client,
            snapshot: WeatherSnapshot::placeholder(),
            last_attempt_ms: None,
        })
    }

    pub fn snapshot(&self) -> &WeatherSnapshot {
        &self.snapshot
    }

    /// Should the driver fetch this tick?
    ///
    /// True only with connectivity and either no attempt yet (the eager
    /// fetch after WiFi first comes up) or a refresh interval elapsed since
    /// the last attempt. An empty API key disables fetching outright.
    pub fn due(&self, now_ms: u64, wifi_connected: bool) -> bool {
        if !wifi_connected || self.config.api_key.is_empty() {
            return false;
        }
        match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms(),
        }
    }

    /// Fetch once and fold the result into the cache.
    ///
    /// Transport-level connect and timeout failures are folded into
    /// [`WeatherError::NoConnectivity`]: the link probe can report "up"
    /// while the route to the API is already gone.
    pub async fn refresh(&mut self, now_ms: u64) {
        self.last_attempt_ms = Some(now_ms);
        let result = fetch(&self.client, &self.config)
            .await
            .map_err(|error| match error {
                WeatherError::Http(e) if e.is_connect() || e.is_timeout() => {
                    WeatherError::NoConnectivity
                }
                other => other,
            });
        self.apply(result, now_ms);
    }

    /// Fold a fetch result into the cache.
    ///
    /// Success replaces the snapshot and stamps it. Failure keeps a previous
    /// valid snapshot (stale beats absent); with nothing cached, the
    /// placeholder matching the error kind is installed.
    pub fn apply(&mut self, result: Result<WeatherSnapshot, WeatherError>, now_ms: u64) {
        match result {
            Ok(mut snapshot) => {
                snapshot.fetched_at_ms = Some(now_ms);
                info!(
                    "weather refreshed: {} {}",
                    snapshot
                        .temperature
                        .map(|t| format!("{:.1}", t))
                        .unwrap_or_else(|| "--".to_string()),
                    snapshot.description
                );
                self.snapshot = snapshot;
            }
            Err(error) => {
                warn!("weather fetch failed: {}", error);
                if !self.snapshot.valid {
                    self.snapshot = match error {
                        WeatherError::NoConnectivity => WeatherSnapshot::placeholder(),
                        _ => WeatherSnapshot::unavailable(),
                    };
                }
                // A valid cached snapshot is retained untouched.
            }
        }
    }

    fn interval_ms(&self) -> u64 {
        self.config.refresh_minutes * 60 * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn make_store() -> WeatherStore {
        let mut config = Config::default().weather;
        config.api_key = "test-key".to_string();
        WeatherStore::new(config).unwrap()
    }

    fn live_snapshot(temp: f32) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: Some(temp),
            description: "clear sky".to_string(),
            icon: "01d".to_string(),
            fetched_at_ms: None,
            valid: true,
        }
    }

    #[test]
    fn test_placeholder_semantics() {
        let placeholder = WeatherSnapshot::placeholder();
        assert!(!placeholder.valid);
        assert_eq!(placeholder.temperature, None);
        assert_eq!(placeholder.description, "No WiFi");
    }

    #[test]
    fn test_due_requires_connectivity_and_key() {
        let store = make_store();
        assert!(!store.due(0, false), "due without connectivity");
        assert!(store.due(0, true), "eager first fetch expected");

        let keyless = WeatherStore::new(Config::default().weather).unwrap();
        assert!(!keyless.due(0, true), "due with empty API key");
    }

    #[test]
    fn test_interval_rearms_on_every_attempt() {
        let mut store = make_store();
        let interval = store.interval_ms();

        // A failed attempt still re-arms the interval (no hot retry loop).
        store.last_attempt_ms = Some(1_000);
        store.apply(Err(WeatherError::NoConnectivity), 1_000);
        assert!(!store.due(1_000 + interval - 1, true));
        assert!(store.due(1_000 + interval, true));
    }

    #[test]
    fn test_success_installs_and_stamps_snapshot() {
        let mut store = make_store();
        store.apply(Ok(live_snapshot(21.5)), 42_000);

        let snapshot = store.snapshot();
        assert!(snapshot.valid);
        assert_eq!(snapshot.temperature, Some(21.5));
        assert_eq!(snapshot.fetched_at_ms, Some(42_000));
    }

    #[test]
    fn test_failure_retains_last_good_snapshot() {
        // A connectivity error after a valid fetch keeps the
        // previous values rather than blanking the screen.
        let mut store = make_store();
        store.apply(Ok(live_snapshot(18.0)), 10_000);
        store.apply(Err(WeatherError::NoConnectivity), 20_000);

        let snapshot = store.snapshot();
        assert!(snapshot.valid);
        assert_eq!(snapshot.temperature, Some(18.0));
        assert_eq!(snapshot.description, "clear sky");
    }

    #[test]
    fn test_failure_without_history_installs_placeholder() {
        let mut store = make_store();
        store.apply(Err(WeatherError::NoConnectivity), 5_000);
        assert_eq!(store.snapshot().description, "No WiFi");
        assert!(!store.snapshot().valid);

        let mut other = make_store();
        let parse_error = serde_json::from_str::<OwmResponse>("not json").unwrap_err();
        other.apply(Err(WeatherError::Parse(parse_error)), 5_000);
        assert_eq!(other.snapshot().description, "Weather unavailable");
    }

    #[test]
    fn test_response_schema_decodes() {
        let body = r#"{
            "main": { "temp": 17.3, "humidity": 60 },
            "weather": [ { "id": 802, "description": "scattered clouds", "icon": "03d" } ],
            "name": "Portland"
        }"#;
        let decoded: OwmResponse = serde_json::from_str(body).unwrap();
        let snapshot = decoded.into_snapshot().unwrap();
        assert_eq!(snapshot.temperature, Some(17.3));
        assert_eq!(snapshot.description, "scattered clouds");
        assert_eq!(snapshot.icon, "03d");
        assert!(snapshot.valid);
    }

    #[test]
    fn test_empty_condition_list_is_malformed() {
        let body = r#"{ "main": { "temp": 10.0 }, "weather": [] }"#;
        let decoded: OwmResponse = serde_json::from_str(body).unwrap();
        let error = decoded.into_snapshot().unwrap_err();
        assert!(matches!(error, WeatherError::Malformed(_)));
    }
}
