use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use chrono::Duration;
use tracing::{info, warn};

use crate::error::ConfigError;

pub enum Backend {
    Remote { url: String, key: String },
    Memory { seed: Option<PathBuf> },
}

pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub image_bucket: String,
    pub session_ttl: Duration,
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let backend = match try_load::<String>("CATALOG_BACKEND", "remote")?.as_str() {
            "remote" => Backend::Remote {
                url: var("BACKEND_URL").ok_or(ConfigError::Missing("BACKEND_URL"))?,
                key: read_secret("BACKEND_KEY")?,
            },
            "memory" => Backend::Memory {
                seed: var("CATALOG_SEED").map(PathBuf::from),
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "CATALOG_BACKEND",
                    reason: format!("unknown backend {other}"),
                });
            }
        };

        Ok(Self {
            port: try_load("RUST_PORT", "1111")?,
            backend,
            image_bucket: try_load("IMAGE_BUCKET", "menu-images")?,
            session_ttl: Duration::minutes(try_load("SESSION_TTL_MINUTES", "480")?),
            allowed_origin: var("ALLOWED_ORIGIN"),
        })
    }

    /// Memory backend with defaults, for local runs and tests.
    pub fn memory() -> Self {
        Self {
            port: 1111,
            backend: Backend::Memory { seed: None },
            image_bucket: "menu-images".to_string(),
            session_ttl: Duration::minutes(480),
            allowed_origin: None,
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

fn read_secret(secret_name: &'static str) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) => Ok(secret.trim().to_string()),
        Err(e) => {
            warn!("Failed to read {secret_name} from file: {e}, trying environment");
            var(secret_name).ok_or(ConfigError::Missing(secret_name))
        }
    }
}
