use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Runtime settings, loaded from the environment with logged defaults.
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    /// Seconds between remote-backend health probes.
    pub health_probe_secs: u64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("SHOPFRONT_PORT", "8080"),
            redis_url: try_load("SHOPFRONT_REDIS_URL", "redis://127.0.0.1:6379"),
            health_probe_secs: try_load("SHOPFRONT_HEALTH_PROBE_SECS", "5"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
