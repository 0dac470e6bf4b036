use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Expected {0} in the environment")]
    Missing(&'static str),
    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Settings read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub discord_channel_id: u64,
    pub corporation_id: u64,
    pub eve_client_id: String,
    pub eve_client_secret: String,
    pub webserver_url: String,
    pub listen_address: String,
    pub poll_interval: Duration,
    pub esi_base_url: String,
}

const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 120;
const DEFAULT_ESI_BASE_URL: &str = "https://esi.evetech.net/latest";

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let number = |name: &'static str, value: String| {
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { name, value })
        };

        let poll_interval_secs = match lookup("POLL_INTERVAL_SECS") {
            Some(value) => number("POLL_INTERVAL_SECS", value)?,
            None => DEFAULT_POLL_INTERVAL_SECS,
        };
        /* A zero interval would make tokio's interval panic. */
        if poll_interval_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                name: "POLL_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            discord_token: required("DISCORD_TOKEN")?,
            discord_channel_id: number("DISCORD_CHANNEL_ID", required("DISCORD_CHANNEL_ID")?)?,
            corporation_id: number("CORPORATION_ID", required("CORPORATION_ID")?)?,
            eve_client_id: required("EVE_CLIENT_ID")?,
            eve_client_secret: required("EVE_CLIENT_SECRET")?,
            webserver_url: required("WEBSERVER_URL")?
                .trim_end_matches('/')
                .to_string(),
            listen_address: lookup("LISTEN_ADDRESS")
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDRESS.to_string()),
            poll_interval: Duration::from_secs(poll_interval_secs),
            esi_base_url: lookup("ESI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ESI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DISCORD_TOKEN", "discord-token".to_string()),
            ("DISCORD_CHANNEL_ID", "1234".to_string()),
            ("CORPORATION_ID", "98000001".to_string()),
            ("EVE_CLIENT_ID", "client-id".to_string()),
            ("EVE_CLIENT_SECRET", "client-secret".to_string()),
            ("WEBSERVER_URL", "https://bot.example.com/".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config, ConfigError> {
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    pub(crate) fn test_config() -> Config {
        load(&base_env()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = test_config();

        assert_eq!(config.discord_channel_id, 1234);
        assert_eq!(config.corporation_id, 98000001);
        assert_eq!(config.webserver_url, "https://bot.example.com");
        assert_eq!(config.listen_address, "0.0.0.0:8080");
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.esi_base_url, "https://esi.evetech.net/latest");
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_env();
        vars.insert("POLL_INTERVAL_SECS", "60".to_string());
        vars.insert("LISTEN_ADDRESS", "127.0.0.1:3000".to_string());
        vars.insert("ESI_BASE_URL", "http://127.0.0.1:9000/esi/".to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.listen_address, "127.0.0.1:3000");
        assert_eq!(config.esi_base_url, "http://127.0.0.1:9000/esi");
    }

    #[test]
    fn test_missing_variable() {
        let mut vars = base_env();
        vars.remove("CORPORATION_ID");

        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Missing("CORPORATION_ID")
        );
    }

    #[test]
    fn test_invalid_numbers() {
        let mut vars = base_env();
        vars.insert("DISCORD_CHANNEL_ID", "general".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidNumber { name: "DISCORD_CHANNEL_ID", .. })
        ));

        let mut vars = base_env();
        vars.insert("POLL_INTERVAL_SECS", "0".to_string());
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidNumber { name: "POLL_INTERVAL_SECS", .. })
        ));
    }
}
