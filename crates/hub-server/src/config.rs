use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

pub struct Config {
    pub jwt_secret: String,
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub cors_origin: String,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. A missing or placeholder secret is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("HUB_JWT_SECRET").unwrap_or_default();
        if jwt_secret.trim().is_empty() {
            bail!("HUB_JWT_SECRET is unset");
        }
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("HUB_JWT_SECRET is still a placeholder");
        }

        let host = lookup("HUB_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("HUB_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("HUB_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .context("HUB_HOST must be an IP address")?;

        let db_path = lookup("HUB_DB_PATH")
            .unwrap_or_else(|| "social-hub.db".into())
            .into();
        let cors_origin =
            lookup("HUB_CORS_ORIGIN").unwrap_or_else(|| "http://localhost:5173".into());
        let cookie_secure = lookup("HUB_COOKIE_SECURE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            jwt_secret,
            addr,
            db_path,
            cors_origin,
            cookie_secure,
        })
    }
}
