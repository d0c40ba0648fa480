use std::time::Duration;

use crate::common::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost/sapphire_trails_server";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://sapphire.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub database_url: String,
    pub bind_addr: String,
    pub request_timeout: Duration,
    pub cookie_secure: bool,
    pub tagline_api_key: Option<String>,
    pub tagline_model: Option<String>,
    pub tagline_ttl: Duration,
    /// Session scopes idle for longer than this are purged.
    pub session_idle: chrono::Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_base_url = get("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        if !crate::common::validate_url(&api_base_url) {
            return Err(ConfigError::Invalid {
                name: "API_BASE_URL",
                value: api_base_url,
            });
        }

        Ok(Self {
            api_base_url,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            request_timeout: Duration::from_secs(parse_secs(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                30,
            )?),
            cookie_secure: parse_bool("COOKIE_SECURE", get("COOKIE_SECURE"), false)?,
            tagline_api_key: get("TAGLINE_API_KEY"),
            tagline_model: get("TAGLINE_MODEL"),
            tagline_ttl: Duration::from_secs(parse_secs(
                "TAGLINE_TTL_SECS",
                get("TAGLINE_TTL_SECS"),
                6 * 60 * 60,
            )?),
            session_idle: chrono::Duration::hours(24),
        })
    }
}

fn parse_secs(name: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => match value.parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(ConfigError::Invalid { name, value }),
        },
    }
}

fn parse_bool(name: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(_) => Err(ConfigError::Invalid {
            name,
            value: raw.unwrap_or_default(),
        }),
    }
}
