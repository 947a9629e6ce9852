use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::MAX_WINDOW_SECS;
use crate::visits::cache::DEFAULT_CACHE_TTL_SECS;
use crate::visits::dedup::DEFAULT_COOLDOWN_SECS;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub visits: VisitConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backing-store target; the scheme selects the backend
    pub url: String,
    pub max_connections: u32,
    /// Seconds between expired-lock sweeps, 0 disables the sweeper
    pub purge_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitConfig {
    pub cooldown_secs: u64,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Domain allowed to call the API; any origin when unset
    pub allowed_origin: Option<String>,
}

impl StoreConfig {
    const fn default_max_connections() -> u32 {
        5
    }

    const fn default_purge_interval_secs() -> u64 {
        300
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_url = required(&lookup, "STORE_URL")?;
        let token = required(&lookup, "AUTH_TOKEN")?;

        let host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "SERVER_PORT", 8080u16)?;

        let max_connections = parse_or(
            &lookup,
            "STORE_MAX_CONNECTIONS",
            StoreConfig::default_max_connections(),
        )?;
        let purge_interval_secs = parse_or(
            &lookup,
            "PURGE_INTERVAL_SECS",
            StoreConfig::default_purge_interval_secs(),
        )?;

        let cooldown_secs = window_secs(&lookup, "COOLDOWN_SECS", DEFAULT_COOLDOWN_SECS)?;
        let cache_ttl_secs = window_secs(&lookup, "CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;

        let allowed_origin = lookup("CORS_ALLOWED_ORIGIN").filter(|v| !v.trim().is_empty());

        Ok(Config {
            store: StoreConfig {
                url: store_url,
                max_connections,
                purge_interval_secs,
            },
            server: ServerConfig { host, port },
            auth: AuthConfig { token },
            visits: VisitConfig {
                cooldown_secs,
                cache_ttl_secs,
            },
            cors: CorsConfig { allowed_origin },
        })
    }
}

fn required<F>(lookup: &F, key: &str) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => bail!("{key} must be set"),
    }
}

/// A duration in seconds, at most [`MAX_WINDOW_SECS`]
fn window_secs<F>(lookup: &F, key: &str, default: u64) -> anyhow::Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_or(lookup, key, default)?;
    if secs > MAX_WINDOW_SECS {
        bail!("{key} must be at most {MAX_WINDOW_SECS} seconds, got {secs}");
    }
    Ok(secs)
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
