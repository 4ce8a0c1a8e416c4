//! Operator overrides for command options
//!
//! Loaded once from a YAML file during startup registration, keyed by command
//! name or `"command sub"` path:
//!
//! ```yaml
//! commands:
//!   "game gamble evenodd":
//!     cooldown_ms: 5000
//!   minigame:
//!     guilds: [123456789012345678]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommandOverrides {
    #[serde(default)]
    pub commands: BTreeMap<String, NodeOverride>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct NodeOverride {
    /// Zero disables the cooldown
    pub cooldown_ms: Option<u64>,
    pub whitelist: Option<Vec<u64>>,
    /// Ignored for subcommands, guild scope belongs to the top-level command
    pub guilds: Option<Vec<u64>>,
    pub registration_required: Option<bool>,
}

impl CommandOverrides {
    /// Load overrides, a missing file yields no overrides
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read command overrides from {path}"))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let yaml = r#"
commands:
  "game gamble evenodd":
    cooldown_ms: 5000
    registration_required: false
  minigame:
    guilds: [1, 2]
    whitelist: [42]
"#;
        let overrides = CommandOverrides::from_yaml(yaml).unwrap();
        assert_eq!(overrides.commands.len(), 2);

        let evenodd = &overrides.commands["game gamble evenodd"];
        assert_eq!(evenodd.cooldown_ms, Some(5000));
        assert_eq!(evenodd.registration_required, Some(false));
        assert!(evenodd.guilds.is_none());

        let minigame = &overrides.commands["minigame"];
        assert_eq!(minigame.guilds, Some(vec![1, 2]));
        assert_eq!(minigame.whitelist, Some(vec![42]));
    }

    #[test]
    fn test_empty_and_missing() {
        assert!(CommandOverrides::from_yaml("").unwrap().is_empty());
        assert!(CommandOverrides::load("/nonexistent/commands.yaml")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(CommandOverrides::from_yaml("commands: [not, a, map]").is_err());
    }
}
