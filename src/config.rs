//! Env-driven configuration for the service and library.
//!
//! Server settings (`Config`) are read once at startup; `dotenv` is loaded on
//! demand by the binaries. Backend settings (`BackendSettings`) are resolved
//! from the process environment on every call so a token or base URL change
//! takes effect without a restart.
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const REPLICATE_API_TOKEN: &str = "REPLICATE_API_TOKEN";
pub const REPLICATE_API_URL: &str = "REPLICATE_API_URL";
pub const REPLICATE_POLL_INTERVAL_MS: &str = "REPLICATE_POLL_INTERVAL_MS";
pub const A1111_BASE_URL: &str = "A1111_BASE_URL";

pub const DEFAULT_REPLICATE_API_URL: &str = "https://api.replicate.com/v1";
pub const DEFAULT_A1111_BASE_URL: &str = "http://127.0.0.1:7860";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

pub struct Config {
    pub api_host: String,
    pub api_port: String,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> Result<Self, env::VarError> {
        Ok(Config {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            api_port: env::var("API_PORT").unwrap_or_else(|_| "8189".to_string()),
        })
    }

    /// Listen address, falling back to `127.0.0.1:8189` piecewise on bad input.
    pub fn socket_addr(&self) -> SocketAddr {
        let ip: IpAddr = self.api_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid API_HOST '{}', falling back to 127.0.0.1", self.api_host);
            IpAddr::from([127, 0, 0, 1])
        });
        let port: u16 = self.api_port.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid API_PORT '{}', falling back to 8189", self.api_port);
            8189
        });
        SocketAddr::new(ip, port)
    }

    pub fn print_env_vars() {
        for key in ["API_HOST", "API_PORT", A1111_BASE_URL, REPLICATE_API_URL, REPLICATE_POLL_INTERVAL_MS] {
            let value = env::var(key).unwrap_or_else(|_| "<unset>".to_string());
            tracing::info!("{}: {}", key, value);
        }
        let token = if env::var(REPLICATE_API_TOKEN).is_ok() { "<set>" } else { "<unset>" };
        tracing::info!("{}: {}", REPLICATE_API_TOKEN, token);
    }
}

/// Per-call settings for the outbound backends.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub replicate_token: Option<String>,
    pub replicate_api_url: String,
    pub poll_interval: Duration,
    pub a1111_base_url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            replicate_token: None,
            replicate_api_url: DEFAULT_REPLICATE_API_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            a1111_base_url: DEFAULT_A1111_BASE_URL.to_string(),
        }
    }
}

impl BackendSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let defaults = Self::default();
        let poll_interval = match get(REPLICATE_POLL_INTERVAL_MS).map(|v| v.parse::<u64>()) {
            Some(Ok(ms)) => Duration::from_millis(ms),
            Some(Err(_)) => {
                tracing::warn!("Invalid {}, using default", REPLICATE_POLL_INTERVAL_MS);
                defaults.poll_interval
            }
            None => defaults.poll_interval,
        };

        BackendSettings {
            replicate_token: get(REPLICATE_API_TOKEN),
            replicate_api_url: get(REPLICATE_API_URL).unwrap_or(defaults.replicate_api_url),
            poll_interval,
            a1111_base_url: get(A1111_BASE_URL).unwrap_or(defaults.a1111_base_url),
        }
    }
}

/// Where request handlers obtain `BackendSettings` from.
#[derive(Debug, Clone)]
pub enum SettingsSource {
    /// Re-read the process environment on every request.
    Env,
    Fixed(BackendSettings),
}

impl SettingsSource {
    pub fn resolve(&self) -> BackendSettings {
        match self {
            SettingsSource::Env => BackendSettings::from_env(),
            SettingsSource::Fixed(settings) => settings.clone(),
        }
    }
}
