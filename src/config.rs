//! Runtime configuration read from the environment (and `.env`).
//!
//! | Variable                            | Default                        |
//! |-------------------------------------|--------------------------------|
//! | `STATIONS_API_URL`                  | `http://localhost:8080/api/v1` |
//! | `STATIONS_API_KEY`                  | unset (no auth header)         |
//! | `STATIONS_API_TIMEOUT_SECS`         | `30`                           |
//! | `STATIONS_API_CONNECT_TIMEOUT_SECS` | `10`                           |
//! | `REPORT_CONCURRENCY`                | `4`                            |

use anyhow::{Context, Result, bail};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let concurrency = parse_or(&get, "REPORT_CONCURRENCY", 4usize)?;
        if concurrency == 0 {
            bail!("REPORT_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            api_url: get("STATIONS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: get("STATIONS_API_KEY"),
            request_timeout: Duration::from_secs(parse_or(&get, "STATIONS_API_TIMEOUT_SECS", 30)?),
            connect_timeout: Duration::from_secs(parse_or(
                &get,
                "STATIONS_API_CONNECT_TIMEOUT_SECS",
                10,
            )?),
            concurrency,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has invalid value '{raw}'")),
        None => Ok(default),
    }
}
