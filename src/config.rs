//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! prayer-config.toml file. It covers the location override, provider
//! endpoints and pacing, playback speeds, and the cache file location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::provider::DEFAULT_METHOD;
use crate::simulation::{PlaybackPeriods, SimulationOptions};
use crate::Coordinates;

/// Application configuration loaded from prayer-config.toml
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Fixed location override (skips geolocation when set)
    pub location: LocationConfig,
    /// Prayer-time provider configuration
    pub provider: ProviderConfig,
    /// Year-simulation playback speeds
    pub playback: PlaybackConfig,
    /// Cache file location
    pub cache: CacheConfig,
}

/// Fixed location override. Leave latitude/longitude unset to use the
/// host's location (or the built-in default).
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Label shown under the clock; a reverse-geocoded name is used
    /// when this is unset.
    pub label: Option<String>,
}

/// Prayer-time provider configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// AlAdhan API base URL
    pub base_url: String,
    /// Calculation method (4 = Umm al-Qura, Makkah)
    pub method: u8,
    /// Delay between sequential yearly-fetch requests, in milliseconds
    pub request_delay_ms: u64,
    /// Per-request HTTP timeout, in seconds
    pub timeout_secs: u64,
}

/// Year-simulation playback speeds, in milliseconds per day
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub forward_ms: u64,
    pub pause_ms: u64,
    pub reverse_ms: u64,
}

/// Cache file location
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            location: LocationConfig::default(),
            provider: ProviderConfig::default(),
            playback: PlaybackConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://api.aladhan.com".to_string(),
            method: DEFAULT_METHOD,
            request_delay_ms: 60,
            timeout_secs: 10,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            forward_ms: 200,
            pause_ms: 1000,
            reverse_ms: 5,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            path: "prayer-cache.json".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from prayer-config.toml
    /// Falls back to default configuration if the file is missing or invalid
    pub fn load() -> Self {
        Self::load_from_path("prayer-config.toml")
    }

    /// Load configuration from the specified path
    /// Falls back to default configuration if the file is missing or invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("invalid config file format: {e}; using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Fixed coordinates from the config, when both components are set.
    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            periods: PlaybackPeriods {
                forward: Duration::from_millis(self.playback.forward_ms),
                pause: Duration::from_millis(self.playback.pause_ms),
                reverse: Duration::from_millis(self.playback.reverse_ms),
            },
            fetch_delay: Duration::from_millis(self.provider.request_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.base_url, "https://api.aladhan.com");
        assert_eq!(config.provider.method, 4);
        assert_eq!(config.playback.forward_ms, 200);
        assert_eq!(config.playback.pause_ms, 1000);
        assert_eq!(config.playback.reverse_ms, 5);
        assert!(config.fixed_coordinates().is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.provider.base_url, parsed.provider.base_url);
        assert_eq!(config.cache.path, parsed.cache.path);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [location]
            latitude = 24.71
            longitude = 46.68
            label = "Riyadh"

            [playback]
            forward_ms = 50
            "#,
        )
        .unwrap();
        let coords = parsed.fixed_coordinates().unwrap();
        assert_eq!(coords.lat, 24.71);
        assert_eq!(parsed.playback.forward_ms, 50);
        // Unset fields keep their defaults.
        assert_eq!(parsed.playback.pause_ms, 1000);
        assert_eq!(parsed.provider.method, 4);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fall back to default
        assert_eq!(config.provider.base_url, "https://api.aladhan.com");
    }
}
