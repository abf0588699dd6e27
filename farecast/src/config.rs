//! Configuration management for the fare estimator.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarecastConfig {
    /// Fare prediction service
    pub api: ApiConfig,
    /// Place search service
    pub places: PlaceSearchConfig,
    /// Timers driving the screens
    pub timings: Timings,
}

/// Fare prediction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; `/api/predict`, `/api/smart-predict` and `/health` hang off it
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// User agent sent to both services
    pub user_agent: String,
}

impl ApiConfig {
    /// Manual prediction endpoint
    #[must_use]
    pub fn predict_url(&self) -> String {
        format!("{}/api/predict", self.base_url.trim_end_matches('/'))
    }

    /// Smart prediction endpoint
    #[must_use]
    pub fn smart_predict_url(&self) -> String {
        format!("{}/api/smart-predict", self.base_url.trim_end_matches('/'))
    }

    /// Health probe
    #[must_use]
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url.trim_end_matches('/'))
    }

    /// Request timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 15,
            user_agent: concat!("farecast/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Place search (Nominatim-compatible) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceSearchConfig {
    /// Base URL; queries go to `{base_url}/search`
    pub base_url: String,
    /// ISO country code results are restricted to
    pub country: String,
    /// Maximum number of candidates per query
    pub limit: u32,
}

impl PlaceSearchConfig {
    /// Search endpoint
    #[must_use]
    pub fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

impl Default for PlaceSearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            country: "in".to_string(),
            limit: 5,
        }
    }
}

/// Timer settings for the booking screens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    /// Cadence of the progress narration
    pub narration_interval: Duration,
    /// Pause between "Finalizing..." and showing the result
    pub settle_delay: Duration,
    /// Grace period before a blurred field hides its suggestions
    pub dismiss_grace: Duration,
    /// Quiet time before a suggestion query is sent
    pub suggestion_debounce: Duration,
    /// Shortest query that triggers a lookup, in characters
    pub min_query_len: usize,
    /// Ride stage offsets from activation: searching, assigned, arriving, closed
    pub ride_timeline: [Duration; 4],
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            narration_interval: Duration::from_millis(800),
            settle_delay: Duration::from_millis(600),
            dismiss_grace: Duration::from_millis(200),
            suggestion_debounce: Duration::from_millis(250),
            min_query_len: 3,
            ride_timeline: [
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(6),
                Duration::from_secs(8),
            ],
        }
    }
}

impl FarecastConfig {
    /// Load configuration from environment variables
    ///
    /// Malformed values are logged and replaced by their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok(), false).unwrap_or_default()
    }

    /// Load configuration from environment variables, rejecting malformed values
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first variable that is set but
    /// cannot be parsed.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok(), true)
    }

    /// Load configuration from an arbitrary key/value source
    ///
    /// # Errors
    ///
    /// In `strict` mode, returns [`ConfigError::Invalid`] for unparsable values
    /// and for a zero narration interval.
    pub fn from_lookup<F>(lookup: F, strict: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let setting = Settings { lookup, strict };

        let timings = Timings {
            narration_interval: setting.period("FARECAST_NARRATION_MS", defaults.timings.narration_interval)?,
            settle_delay: setting.millis("FARECAST_SETTLE_MS", defaults.timings.settle_delay)?,
            dismiss_grace: setting.millis("FARECAST_DISMISS_GRACE_MS", defaults.timings.dismiss_grace)?,
            suggestion_debounce: setting.millis("FARECAST_DEBOUNCE_MS", defaults.timings.suggestion_debounce)?,
            min_query_len: setting.parse("FARECAST_MIN_QUERY_LEN", defaults.timings.min_query_len)?,
            ride_timeline: defaults.timings.ride_timeline,
        };

        Ok(Self {
            api: ApiConfig {
                base_url: setting.string("FARECAST_API_BASE_URL", defaults.api.base_url),
                timeout_secs: setting.parse("FARECAST_HTTP_TIMEOUT_SECS", defaults.api.timeout_secs)?,
                user_agent: setting.string("FARECAST_USER_AGENT", defaults.api.user_agent),
            },
            places: PlaceSearchConfig {
                base_url: setting.string("FARECAST_PLACE_SEARCH_URL", defaults.places.base_url),
                country: setting.string("FARECAST_PLACE_COUNTRY", defaults.places.country),
                limit: setting.parse("FARECAST_PLACE_LIMIT", defaults.places.limit)?,
            },
            timings,
        })
    }
}

struct Settings<F> {
    lookup: F,
    strict: bool,
}

impl<F> Settings<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str, default: String) -> String {
        (self.lookup)(key)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(default)
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        let Some(raw) = (self.lookup)(key) else {
            return Ok(default);
        };

        match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) if self.strict => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring malformed setting");
                Ok(default)
            },
        }
    }

    fn millis(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
        self.parse(key, default_ms).map(Duration::from_millis)
    }

    /// Like [`Self::millis`], but a repeating period must be non-zero
    fn period(&self, key: &str, default: Duration) -> Result<Duration, ConfigError> {
        let period = self.millis(key, default)?;
        if !period.is_zero() {
            return Ok(period);
        }

        let raw = (self.lookup)(key).unwrap_or_default();
        if self.strict {
            return Err(ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            });
        }
        tracing::warn!(key, value = %raw, "Ignoring zero period");
        Ok(default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_booking_screens() {
        let config = FarecastConfig::from_lookup(lookup(&[]), true).unwrap();

        assert_eq!(config.api.predict_url(), "http://localhost:8000/api/predict");
        assert_eq!(config.api.smart_predict_url(), "http://localhost:8000/api/smart-predict");
        assert_eq!(config.places.search_url(), "https://nominatim.openstreetmap.org/search");
        assert_eq!(config.places.limit, 5);
        assert_eq!(config.timings.narration_interval, Duration::from_millis(800));
        assert_eq!(config.timings.settle_delay, Duration::from_millis(600));
        assert_eq!(config.timings.dismiss_grace, Duration::from_millis(200));
        assert_eq!(config.timings.min_query_len, 3);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = FarecastConfig::from_lookup(
            lookup(&[
                ("FARECAST_API_BASE_URL", "https://fares.example.com/"),
                ("FARECAST_PLACE_LIMIT", "8"),
                ("FARECAST_SETTLE_MS", "0"),
            ]),
            true,
        )
        .unwrap();

        assert_eq!(config.api.health_url(), "https://fares.example.com/health");
        assert_eq!(config.places.limit, 8);
        assert_eq!(config.timings.settle_delay, Duration::ZERO);
    }

    #[test]
    fn malformed_values_fall_back_unless_strict() {
        let pairs = [("FARECAST_HTTP_TIMEOUT_SECS", "soon")];

        let lenient = FarecastConfig::from_lookup(lookup(&pairs), false).unwrap();
        assert_eq!(lenient.api.timeout_secs, 15);

        let strict = FarecastConfig::from_lookup(lookup(&pairs), true);
        assert_eq!(
            strict.unwrap_err(),
            ConfigError::Invalid {
                key: "FARECAST_HTTP_TIMEOUT_SECS".to_string(),
                value: "soon".to_string(),
            }
        );
    }

    #[test]
    fn zero_narration_interval_is_rejected() {
        let pairs = [("FARECAST_NARRATION_MS", "0")];

        let lenient = FarecastConfig::from_lookup(lookup(&pairs), false).unwrap();
        assert_eq!(lenient.timings.narration_interval, Duration::from_millis(800));

        let strict = FarecastConfig::from_lookup(lookup(&pairs), true);
        assert_eq!(
            strict.unwrap_err(),
            ConfigError::Invalid {
                key: "FARECAST_NARRATION_MS".to_string(),
                value: "0".to_string(),
            }
        );
    }
}
