//! Environment configuration
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial configuration for the dispatch engine and games

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

/// Deployment flavour, read from `BOT_ENV`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(anyhow!("BOT_ENV must be production or development, got `{other}`")),
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Development guild; commands are uploaded there instead of globally
    pub discord_guild_id: Option<u64>,
    pub log_level: String,
    pub log_channel_id: Option<u64>,
    pub environment: Environment,
    pub database_path: String,
    /// Fixed shard count, autosharded when unset
    pub shard_count: Option<u64>,
    pub autocomplete_budget: Duration,
    pub commands_config_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup, `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;

        let environment = match var("BOT_ENV") {
            Some(raw) => Environment::parse(&raw)?,
            None => Environment::Production,
        };

        let autocomplete_ms = parse_optional::<u64>(var("AUTOCOMPLETE_BUDGET_MS"), "AUTOCOMPLETE_BUDGET_MS")?
            .unwrap_or(2500);

        Ok(Config {
            discord_token,
            discord_guild_id: parse_optional(var("DISCORD_GUILD_ID"), "DISCORD_GUILD_ID")?,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_channel_id: parse_optional(var("LOG_CHANNEL_ID"), "LOG_CHANNEL_ID")?,
            environment,
            database_path: var("DATABASE_PATH").unwrap_or_else(|| "plaza.db".to_string()),
            shard_count: parse_optional(var("SHARD_COUNT"), "SHARD_COUNT")?,
            autocomplete_budget: Duration::from_millis(autocomplete_ms),
            commands_config_path: var("COMMANDS_CONFIG_PATH")
                .unwrap_or_else(|| "commands.yaml".to_string()),
        })
    }
}

fn parse_optional<T>(raw: Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("{key} is not a valid number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.discord_token, "abc");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.database_path, "plaza.db");
        assert_eq!(config.autocomplete_budget, Duration::from_millis(2500));
        assert_eq!(config.commands_config_path, "commands.yaml");
        assert!(config.discord_guild_id.is_none());
        assert!(config.shard_count.is_none());
    }

    #[test]
    fn test_missing_token_is_an_error() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("DISCORD_TOKEN", "  ")])).is_err());
    }

    #[test]
    fn test_full_environment() {
        let config = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_GUILD_ID", "123"),
            ("LOG_CHANNEL_ID", "456"),
            ("BOT_ENV", "development"),
            ("SHARD_COUNT", "4"),
            ("AUTOCOMPLETE_BUDGET_MS", "900"),
        ]))
        .unwrap();
        assert_eq!(config.discord_guild_id, Some(123));
        assert_eq!(config.log_channel_id, Some(456));
        assert!(config.environment.is_development());
        assert_eq!(config.shard_count, Some(4));
        assert_eq!(config.autocomplete_budget, Duration::from_millis(900));
    }

    #[test]
    fn test_bad_numbers_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("DISCORD_GUILD_ID", "not-a-number"),
        ]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup(&[("DISCORD_TOKEN", "abc"), ("BOT_ENV", "staging")]));
        assert!(result.is_err());
    }
}
