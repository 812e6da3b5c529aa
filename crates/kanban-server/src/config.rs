use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use kanban_api::assistant::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use kanban_api::sessions::DEFAULT_SESSION_TTL;

/// Server settings, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_ttl: Duration,
    /// Zero disables the background sweep.
    pub session_sweep: Duration,
    pub seed: bool,
    pub openrouter_api_key: String,
    pub ai_model: String,
    pub ai_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let string = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: string("KANBAN_HOST", "0.0.0.0"),
            port: parse(&get, "KANBAN_PORT", 8000)?,
            db_path: string("KANBAN_DB_PATH", "kanban.db").into(),
            session_ttl: Duration::from_secs(parse(
                &get,
                "KANBAN_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL.as_secs(),
            )?),
            session_sweep: Duration::from_secs(parse(&get, "KANBAN_SESSION_SWEEP_SECS", 300)?),
            seed: parse(&get, "KANBAN_SEED", true)?,
            openrouter_api_key: string("OPENROUTER_API_KEY", ""),
            ai_model: string("KANBAN_AI_MODEL", DEFAULT_MODEL),
            ai_base_url: string("KANBAN_AI_BASE_URL", DEFAULT_BASE_URL),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
