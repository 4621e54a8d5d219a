use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values abort startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Enables the Postgres store when set. In-memory otherwise.
    pub database_url: Option<String>,
    pub backend_url: Option<String>,
    pub backend_timeout_secs: u64,
    pub backend_mock_fallback: bool,
    pub backend_accept_invalid_certs: bool,
    pub seed_default_pipelines: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            backend_url: optional_env("BACKEND_URL").map(|u| u.trim_end_matches('/').to_string()),
            backend_timeout_secs: std::env::var("BACKEND_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse::<u64>()
                .context("BACKEND_TIMEOUT_SECS must be a whole number of seconds")?,
            backend_mock_fallback: bool_env("BACKEND_MOCK_FALLBACK", true)?,
            backend_accept_invalid_certs: bool_env("BACKEND_ACCEPT_INVALID_CERTS", false)?,
            seed_default_pipelines: bool_env("SEED_DEFAULT_PIPELINES", true)?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            backend_url: None,
            backend_timeout_secs: 10,
            backend_mock_fallback: true,
            backend_accept_invalid_certs: false,
            seed_default_pipelines: true,
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn bool_env(key: &str, default: bool) -> Result<bool> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => parse_bool(&raw)
            .with_context(|| format!("Environment variable '{key}' must be true or false, got '{raw}'")),
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("not a boolean: {other}"),
    }
}
