//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! deskclock-config.toml file. It provides a centralized way to configure
//! screen durations and rotation order, the night window, special-screen
//! behavior, weather fetching, and display hardware options.

use crate::scheduler::RegularScreen;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Application configuration loaded from deskclock-config.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Regular rotation: durations, order, static quote text
    pub screens: ScreensConfig,
    /// Night window bounds
    pub night: NightConfig,
    /// Hourly hydration reminder
    pub hydration: HydrationConfig,
    /// Randomized flavor-text quote
    pub random_quote: RandomQuoteConfig,
    /// Weather provider settings
    pub weather: WeatherConfig,
    /// Display and driver-loop configuration
    pub display: DisplayConfig,
}

/// Regular screen rotation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScreensConfig {
    /// Rotation order; screens may repeat (e.g. time between every other screen)
    pub order: Vec<RegularScreen>,
    /// Time screen duration in milliseconds
    pub time_ms: u64,
    /// Date screen duration in milliseconds
    pub date_ms: u64,
    /// Weather screen duration in milliseconds
    pub weather_ms: u64,
    /// Static quote screen duration in milliseconds
    pub quote_ms: u64,
    /// Text shown on the regular (non-random) quote screen
    pub static_quote: String,
}

/// Night-mode window configuration.
///
/// The window wraps midnight when `start_hour > end_hour`
/// (the default 23..7 means 23:00 through 06:59).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NightConfig {
    /// Master switch for the night window
    pub enabled: bool,
    /// First night hour, 0-23
    pub start_hour: u32,
    /// First morning hour, 0-23 (exclusive end of the window)
    pub end_hour: u32,
}

/// Hydration reminder configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HydrationConfig {
    /// Master switch; disabling never interrupts the rotation
    pub enabled: bool,
    /// How long the reminder owns the screen, in milliseconds
    pub duration_ms: u64,
}

/// Random-quote trigger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RandomQuoteConfig {
    /// Master switch
    pub enabled: bool,
    /// How long a triggered quote owns the screen, in milliseconds
    pub duration_ms: u64,
    /// Minimum spacing between triggers, measured trigger-to-trigger
    pub min_interval_ms: u64,
    /// Trigger probability per eligible tick: fires one tick in `one_in`
    pub one_in: u32,
    /// Quote pool; empty list uses the built-in pool
    pub pool: Vec<String>,
}

/// Weather provider configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeatherConfig {
    /// Cache refresh interval in minutes
    pub refresh_minutes: u64,
    /// API base URL (OpenWeatherMap current-weather endpoint)
    pub api_url: String,
    /// API key; empty disables real fetches
    pub api_key: String,
    /// City query, e.g. "Portland,ME,US"
    pub city: String,
    /// "metric" or "imperial"
    pub units: String,
}

/// Display and driver-loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    /// OLED width in pixels
    pub width: i32,
    /// OLED height in pixels
    pub height: i32,
    /// Scheduler tick cadence in milliseconds
    pub tick_ms: u64,
    /// I2C bus device path (hardware builds)
    pub i2c_bus: String,
    /// I2C address of the SSD1306 controller
    pub i2c_addr: u8,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            screens: ScreensConfig {
                order: vec![
                    RegularScreen::Time,
                    RegularScreen::Date,
                    RegularScreen::Weather,
                    RegularScreen::Quote,
                ],
                time_ms: 10_000,
                date_ms: 5_000,
                weather_ms: 10_000,
                quote_ms: 8_000,
                static_quote: "Stay curious.".to_string(),
            },
            night: NightConfig {
                enabled: true,
                start_hour: 23,
                end_hour: 7,
            },
            hydration: HydrationConfig {
                enabled: true,
                duration_ms: 20_000,
            },
            random_quote: RandomQuoteConfig {
                enabled: true,
                duration_ms: 15_000,
                min_interval_ms: 10 * 60 * 1000,
                one_in: 4,
                pool: Vec::new(), // built-in pool
            },
            weather: WeatherConfig {
                refresh_minutes: 60,
                api_url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
                api_key: String::new(),
                city: "Portland,ME,US".to_string(),
                units: "metric".to_string(),
            },
            display: DisplayConfig {
                width: 128, // SSD1306 0.96" module
                height: 64,
                tick_ms: 500,
                i2c_bus: "/dev/i2c-1".to_string(),
                i2c_addr: 0x3C,
            },
        }
    }
}

impl Config {
    /// Load configuration from deskclock-config.toml file.
    /// Falls back to default configuration if file doesn't exist or is invalid.
    pub fn load() -> Self {
        Self::load_from_path("deskclock-config.toml")
    }

    /// Load configuration from specified path.
    /// Falls back to default configuration if file doesn't exist or is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("loaded configuration from {}", path.as_ref().display());
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {}", e);
                    warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration as pretty TOML, e.g. to generate a
    /// starter deskclock-config.toml.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Per-screen display duration in milliseconds.
    pub fn screen_duration_ms(&self, screen: RegularScreen) -> u64 {
        match screen {
            RegularScreen::Time => self.screens.time_ms,
            RegularScreen::Date => self.screens.date_ms,
            RegularScreen::Weather => self.screens.weather_ms,
            RegularScreen::Quote => self.screens.quote_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.screens.order.len(), 4);
        assert_eq!(config.screens.order[0], RegularScreen::Time);
        assert_eq!(config.night.start_hour, 23);
        assert_eq!(config.night.end_hour, 7);
        assert_eq!(config.random_quote.one_in, 4);
        assert_eq!(config.weather.refresh_minutes, 60);
        assert_eq!(config.display.tick_ms, 500);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.screens.order, config.screens.order);
        assert_eq!(parsed.screens.static_quote, config.screens.static_quote);
        assert_eq!(parsed.weather.city, config.weather.city);
        assert_eq!(parsed.display.i2c_addr, config.display.i2c_addr);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fall back to default
        assert_eq!(config.night.start_hour, 23);
    }

    #[test]
    fn test_load_custom_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let custom = r#"
[screens]
order = ["time", "weather"]
time_ms = 4000
date_ms = 4000
weather_ms = 12000
quote_ms = 6000
static_quote = "Make it so."

[night]
enabled = true
start_hour = 22
end_hour = 6

[hydration]
enabled = false
duration_ms = 10000

[random_quote]
enabled = true
duration_ms = 9000
min_interval_ms = 300000
one_in = 3
pool = ["one", "two"]

[weather]
refresh_minutes = 30
api_url = "https://api.openweathermap.org/data/2.5/weather"
api_key = "abc123"
city = "Boston,MA,US"
units = "imperial"

[display]
width = 128
height = 64
tick_ms = 250
i2c_bus = "/dev/i2c-0"
i2c_addr = 61
"#;
        file.write_all(custom.as_bytes()).unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(
            config.screens.order,
            vec![RegularScreen::Time, RegularScreen::Weather]
        );
        assert!(!config.hydration.enabled);
        assert_eq!(config.random_quote.pool, vec!["one", "two"]);
        assert_eq!(config.night.start_hour, 22);
        assert_eq!(config.weather.units, "imperial");
    }

    #[test]
    fn test_screen_durations() {
        let config = Config::default();
        assert_eq!(config.screen_duration_ms(RegularScreen::Time), 10_000);
        assert_eq!(config.screen_duration_ms(RegularScreen::Date), 5_000);
        assert_eq!(config.screen_duration_ms(RegularScreen::Weather), 10_000);
        assert_eq!(config.screen_duration_ms(RegularScreen::Quote), 8_000);
    }
}
