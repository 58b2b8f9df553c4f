use std::{env, fmt::Display, fs::read_to_string, path::PathBuf, str::FromStr};

use tracing::{info, warn};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown store backend {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailApi {
    pub url: String,
    pub key: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub store: StoreBackend,
    pub redis_url: String,
    /// Deployment outputs document holding `custom.functionUrl`.
    pub outputs_path: PathBuf,
    pub mail_from: String,
    /// Unset means emails are only logged.
    pub mail_api: Option<MailApi>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources(|key| env::var(key).ok(), read_secret)
    }

    pub fn from_sources(
        var: impl Fn(&str) -> Option<String>,
        secret: impl Fn(&'static str) -> Result<String, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let mail_api = match var("MAIL_API_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(MailApi {
                url,
                key: secret("MAIL_API_KEY")?,
            }),
            None => {
                info!("MAIL_API_URL not set, emails will only be logged");
                None
            }
        };

        Ok(Self {
            port: try_load(&var, "RUST_PORT", "8080")?,
            store: try_load(&var, "STORE_BACKEND", "memory")?,
            redis_url: try_load(&var, "REDIS_URL", "redis://127.0.0.1:6379")?,
            outputs_path: try_load(&var, "OUTPUTS_PATH", "deploy_outputs.json")?,
            mail_from: try_load(&var, "MAIL_FROM", "noreply@example.com")?,
            mail_api,
        })
    }
}

fn try_load<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
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

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
            ConfigError::Secret {
                name: secret_name,
                source: e,
            }
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_secret(name: &'static str) -> Result<String, ConfigError> {
        Err(ConfigError::Secret {
            name,
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(|_| None, no_secret).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
        assert_eq!(config.outputs_path, PathBuf::from("deploy_outputs.json"));
        assert!(config.mail_api.is_none());
    }

    #[test]
    fn test_overrides_and_mail_secret() {
        let vars = HashMap::from([
            ("RUST_PORT", "9000"),
            ("STORE_BACKEND", "Redis"),
            ("MAIL_API_URL", "https://mail.example.com/send"),
        ]);

        let config = Config::from_sources(
            |key| vars.get(key).map(|v| v.to_string()),
            |_| Ok("key-123".to_string()),
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.store, StoreBackend::Redis);
        assert_eq!(
            config.mail_api,
            Some(MailApi {
                url: "https://mail.example.com/send".to_string(),
                key: "key-123".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_values() {
        let port = Config::from_sources(
            |key| (key == "RUST_PORT").then(|| "http".to_string()),
            no_secret,
        );
        assert!(matches!(
            port,
            Err(ConfigError::Invalid {
                key: "RUST_PORT",
                ..
            })
        ));

        let store = Config::from_sources(
            |key| (key == "STORE_BACKEND").then(|| "dynamo".to_string()),
            no_secret,
        );
        assert!(matches!(store, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_missing_mail_secret() {
        let result = Config::from_sources(
            |key| (key == "MAIL_API_URL").then(|| "https://mail.example.com".to_string()),
            no_secret,
        );

        assert!(matches!(
            result,
            Err(ConfigError::Secret {
                name: "MAIL_API_KEY",
                ..
            })
        ));
    }
}
