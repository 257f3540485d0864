use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://digihome.db";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid HOST {0:?}")]
    InvalidHost(String),
    #[error("invalid PORT {0:?}")]
    InvalidPort(String),
}

/// Process configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    /// Where to POST newly stored chat messages. Unset disables the webhook.
    pub webhook_url_message_sent: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            webhook_url_message_sent: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let host = match var("HOST") {
            Some(host) => host.parse().map_err(|_| ConfigError::InvalidHost(host))?,
            None => defaults.host,
        };
        let port = match var("PORT") {
            Some(port) => port.parse().map_err(|_| ConfigError::InvalidPort(port))?,
            None => defaults.port,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            host,
            port,
            webhook_url_message_sent: var("WEBHOOK_URL_MESSAGE_SENT"),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite://test.db"),
            ("HOST", "0.0.0.0"),
            ("PORT", "8080"),
            ("WEBHOOK_URL_MESSAGE_SENT", "https://hooks.example.com/sent"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite://test.db");
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(
            config.webhook_url_message_sent.as_deref(),
            Some("https://hooks.example.com/sent")
        );
    }

    #[test]
    fn test_blank_webhook_is_unset() {
        let config = Config::from_lookup(lookup(&[("WEBHOOK_URL_MESSAGE_SENT", "  ")])).unwrap();
        assert_eq!(config.webhook_url_message_sent, None);
    }

    #[test]
    fn test_bad_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(p) if p == "http"));
    }
}
