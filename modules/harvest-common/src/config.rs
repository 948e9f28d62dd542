use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_APIFY_BASE_URL: &str = apify_client::DEFAULT_BASE_URL;
pub const DEFAULT_APIFY_ACTOR_ID: &str = apify_client::FACEBOOK_COMMENTS_SCRAPER;
pub const DEFAULT_COMMENTS_FILE: &str = "./data/comments.json";

/// How long to wait for an Apify run: fixed interval, bounded by both an
/// attempt count and a wall-clock budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 120,
            max_wait: Duration::from_secs(900),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Postgres { database_url: String },
    JsonFile { path: PathBuf },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Apify
    pub default_apify_token: Option<String>,
    pub apify_base_url: String,
    pub apify_actor_id: String,
    pub poll: PollPolicy,

    // Storage
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let poll = PollPolicy {
            interval: Duration::from_secs(parse_or(&get, "APIFY_POLL_INTERVAL_SECS", 5u64)?),
            max_attempts: parse_or(&get, "APIFY_POLL_MAX_ATTEMPTS", 120u32)?,
            max_wait: Duration::from_secs(parse_or(&get, "APIFY_POLL_MAX_WAIT_SECS", 900u64)?),
        };
        if poll.max_attempts == 0 {
            bail!("APIFY_POLL_MAX_ATTEMPTS must be at least 1");
        }
        if poll.max_wait.is_zero() {
            bail!("APIFY_POLL_MAX_WAIT_SECS must be at least 1");
        }
        if poll.interval.is_zero() {
            bail!("APIFY_POLL_INTERVAL_SECS must be at least 1");
        }
        if poll.interval > poll.max_wait {
            bail!(
                "APIFY_POLL_INTERVAL_SECS ({}) must not exceed APIFY_POLL_MAX_WAIT_SECS ({})",
                poll.interval.as_secs(),
                poll.max_wait.as_secs()
            );
        }

        let database_url = get("DATABASE_URL");
        let backend = get("STORAGE_BACKEND")
            .map(|b| b.trim().to_ascii_lowercase())
            .unwrap_or_else(|| {
                if database_url.is_some() {
                    "postgres".to_string()
                } else {
                    "json".to_string()
                }
            });
        let storage = match backend.as_str() {
            "postgres" => StorageConfig::Postgres {
                database_url: database_url
                    .context("DATABASE_URL is required when STORAGE_BACKEND=postgres")?,
            },
            "json" | "json-file" => StorageConfig::JsonFile {
                path: PathBuf::from(
                    get("COMMENTS_FILE").unwrap_or_else(|| DEFAULT_COMMENTS_FILE.to_string()),
                ),
            },
            other => bail!("Unknown STORAGE_BACKEND '{other}' (expected postgres or json)"),
        };

        Ok(Self {
            web_host: get("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port: parse_or(&get, "WEB_PORT", 3000u16)?,
            default_apify_token: get("DEFAULT_APIFY_TOKEN"),
            apify_base_url: get("APIFY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_APIFY_BASE_URL.to_string()),
            apify_actor_id: get("APIFY_ACTOR_ID")
                .unwrap_or_else(|| DEFAULT_APIFY_ACTOR_ID.to_string()),
            poll,
            storage,
        })
    }

    fn log_keys(&self) {
        fn preview(val: &str) -> String {
            let n = val.char_indices().nth(5).map(|(i, _)| i).unwrap_or(val.len());
            format!("{}...({} chars)", &val[..n], val.len())
        }

        tracing::info!("Config loaded:");
        tracing::info!(
            "  DEFAULT_APIFY_TOKEN: {}",
            self.default_apify_token
                .as_deref()
                .map(preview)
                .unwrap_or_else(|| "<not set>".to_string())
        );
        tracing::info!("  APIFY_ACTOR_ID: {}", self.apify_actor_id);
        tracing::info!(
            "  Poll: every {}s, max {} attempts, max {}s",
            self.poll.interval.as_secs(),
            self.poll.max_attempts,
            self.poll.max_wait.as_secs()
        );
        match &self.storage {
            StorageConfig::Postgres { .. } => tracing::info!("  Storage: postgres"),
            StorageConfig::JsonFile { path } => {
                tracing::info!("  Storage: json file at {}", path.display())
            }
        }
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}
