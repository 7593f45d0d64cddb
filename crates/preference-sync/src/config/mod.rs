use crate::workflows::preferences::{PreferenceLimits, SubmissionWindow, MAX_NUM_FORMS_DEFAULT};
use chrono::{DateTime, Utc};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub preferences: PreferenceConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let preferences = PreferenceConfig::from_env()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            preferences,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Count limits and the submission window applied to every editing session.
///
/// `limits.min` also sizes the reserved band of empty slots rendered at session start.
/// `window` is present once either submission bound is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceConfig {
    pub limits: PreferenceLimits,
    pub window: Option<SubmissionWindow>,
}

impl PreferenceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let min = optional_count("APP_PREFERENCE_MIN")?;
        let max = optional_count("APP_PREFERENCE_MAX")?;
        let opens_at = optional_timestamp("APP_SUBMISSION_OPENS")?;
        let closes_at = optional_timestamp("APP_SUBMISSION_CLOSES")?;

        let window = (opens_at.is_some() || closes_at.is_some()).then_some(SubmissionWindow {
            opens_at,
            closes_at,
        });

        Self::new(PreferenceLimits { min, max }, window)
    }

    pub fn new(
        limits: PreferenceLimits,
        window: Option<SubmissionWindow>,
    ) -> Result<Self, ConfigError> {
        for (name, value) in [("minimum", limits.min), ("maximum", limits.max)] {
            if value.is_some_and(|count| count > MAX_NUM_FORMS_DEFAULT) {
                return Err(ConfigError::CountTooLarge {
                    name,
                    max: MAX_NUM_FORMS_DEFAULT,
                });
            }
        }
        if let (Some(min), Some(max)) = (limits.min, limits.max) {
            if min > max {
                return Err(ConfigError::LimitsOutOfOrder { min, max });
            }
        }
        if let Some(SubmissionWindow {
            opens_at: Some(opens_at),
            closes_at: Some(closes_at),
        }) = window
        {
            if opens_at >= closes_at {
                return Err(ConfigError::WindowOutOfOrder);
            }
        }
        Ok(Self { limits, window })
    }

    pub fn min_count(&self) -> usize {
        self.limits.min.unwrap_or(0)
    }
}

fn optional_count(name: &'static str) -> Result<Option<usize>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidCount { name }),
        _ => Ok(None),
    }
}

fn optional_timestamp(name: &'static str) -> Result<Option<DateTime<Utc>>, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => DateTime::parse_from_rfc3339(raw.trim())
            .map(|value| Some(value.with_timezone(&Utc)))
            .map_err(|source| ConfigError::InvalidTimestamp { name, source }),
        _ => Ok(None),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidCount {
        name: &'static str,
    },
    CountTooLarge {
        name: &'static str,
        max: usize,
    },
    LimitsOutOfOrder {
        min: usize,
        max: usize,
    },
    InvalidTimestamp {
        name: &'static str,
        source: chrono::ParseError,
    },
    WindowOutOfOrder,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidCount { name } => {
                write!(f, "{name} must be a non-negative integer")
            }
            ConfigError::CountTooLarge { name, max } => {
                write!(f, "the {name} preference limit cannot exceed {max}")
            }
            ConfigError::LimitsOutOfOrder { min, max } => write!(
                f,
                "the minimum preference limit ({min}) must be less than or equal to the maximum ({max})"
            ),
            ConfigError::InvalidTimestamp { name, .. } => {
                write!(f, "{name} must be an RFC 3339 timestamp")
            }
            ConfigError::WindowOutOfOrder => write!(
                f,
                "the preference submission end must be after the preference submission start"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidTimestamp { source, .. } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidCount { .. }
            | ConfigError::CountTooLarge { .. }
            | ConfigError::LimitsOutOfOrder { .. }
            | ConfigError::WindowOutOfOrder => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_PREFERENCE_MIN");
        env::remove_var("APP_PREFERENCE_MAX");
        env::remove_var("APP_SUBMISSION_OPENS");
        env::remove_var("APP_SUBMISSION_CLOSES");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.preferences, PreferenceConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_preference_limits_and_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PREFERENCE_MIN", "3");
        env::set_var("APP_PREFERENCE_MAX", "5");
        env::set_var("APP_SUBMISSION_OPENS", "2025-02-01T00:00:00Z");
        env::set_var("APP_SUBMISSION_CLOSES", "2025-02-14T17:00:00+10:00");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.preferences.limits.min, Some(3));
        assert_eq!(config.preferences.limits.max, Some(5));
        assert_eq!(config.preferences.min_count(), 3);
        let window = config.preferences.window.expect("window configured");
        assert!(window.is_set());
        let closes = window.closes_at.expect("close time parsed");
        assert_eq!(closes.to_rfc3339(), "2025-02-14T07:00:00+00:00");
        reset_env();
    }

    #[test]
    fn rejects_minimum_above_maximum() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PREFERENCE_MIN", "6");
        env::set_var("APP_PREFERENCE_MAX", "2");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::LimitsOutOfOrder { min: 6, max: 2 })
        ));
        reset_env();
    }

    #[test]
    fn rejects_malformed_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PREFERENCE_MIN", "several");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidCount {
                name: "APP_PREFERENCE_MIN"
            })
        ));
        reset_env();
        env::set_var("APP_SUBMISSION_OPENS", "next tuesday");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidTimestamp { .. })
        ));
        reset_env();
    }

    #[test]
    fn rejects_window_that_closes_before_it_opens() {
        let window = SubmissionWindow {
            opens_at: DateTime::parse_from_rfc3339("2025-02-14T00:00:00Z")
                .ok()
                .map(|value| value.with_timezone(&Utc)),
            closes_at: DateTime::parse_from_rfc3339("2025-02-01T00:00:00Z")
                .ok()
                .map(|value| value.with_timezone(&Utc)),
        };
        assert!(matches!(
            PreferenceConfig::new(PreferenceLimits::default(), Some(window)),
            Err(ConfigError::WindowOutOfOrder)
        ));
    }

    #[test]
    fn rejects_limits_above_form_cap() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PREFERENCE_MIN", "1001");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::CountTooLarge {
                name: "minimum",
                max: 1000
            })
        ));
        reset_env();

        let limits = PreferenceLimits {
            min: None,
            max: Some(MAX_NUM_FORMS_DEFAULT + 1),
        };
        assert!(matches!(
            PreferenceConfig::new(limits, None),
            Err(ConfigError::CountTooLarge {
                name: "maximum",
                ..
            })
        ));
        assert!(PreferenceConfig::new(
            PreferenceLimits {
                min: Some(MAX_NUM_FORMS_DEFAULT),
                max: None
            },
            None
        )
        .is_ok());
    }

    #[test]
    fn partial_window_is_kept_so_submissions_stay_closed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SUBMISSION_OPENS", "2025-02-01T00:00:00Z");
        let config = AppConfig::load().expect("config loads");
        let window = config.preferences.window.expect("window configured");
        assert!(!window.is_set());
        reset_env();
    }
}
