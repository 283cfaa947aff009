use std::{collections::HashMap, fs, io::ErrorKind, path::Path};

use anyhow::{Context as _, Result};
use serde::Deserialize;
use tracing::{info, warn};

use handler_core::Odds;
use plugin_responses::{Channel, default_channels};

/// Contents of the YAML config file. Every section is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct BotConfig {
    pub(crate) channels: Vec<Channel>,
    /// Extra `xkcd:<name>` shortcuts, merged over the built-in ones.
    pub(crate) xkcd_aliases: HashMap<String, u32>,
    /// Users allowed to run privileged commands anywhere.
    pub(crate) admins: Vec<String>,
    /// Public channel that `share cl` posts to.
    pub(crate) cl_channel: Option<String>,
    /// Channel that receives every merged changeset.
    pub(crate) cl_private_channel: Option<String>,
    /// Channel or user that is told about deployments.
    pub(crate) operator_channel: Option<String>,
    pub(crate) probability: Odds,
    pub(crate) gotime_channel: Option<String>,
    pub(crate) gotime_start_variance_mins: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            channels: default_channels(),
            xkcd_aliases: HashMap::new(),
            admins: Vec::new(),
            cl_channel: None,
            cl_private_channel: None,
            operator_channel: None,
            probability: Odds::default(),
            gotime_channel: None,
            gotime_start_variance_mins: 30,
        }
    }
}

/// Reads the config file. A missing file yields the built-in defaults.
pub(crate) fn load_config(path: &Path) -> Result<BotConfig> {
    let yaml = match fs::read_to_string(path) {
        Ok(yaml) => yaml,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(BotConfig::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config file at {}", path.display()));
        }
    };
    let cfg = parse_config(&yaml)
        .with_context(|| format!("parsing YAML config at {}", path.display()))?;
    info!(
        path = %path.display(),
        channels = cfg.channels.len(),
        admins = cfg.admins.len(),
        "Loaded config"
    );
    Ok(cfg)
}

fn parse_config(yaml: &str) -> Result<BotConfig> {
    // An empty document is `null`, not an empty mapping.
    if yaml.trim().is_empty() {
        return Ok(BotConfig::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.channels, default_channels());
        assert_eq!(cfg.probability, Odds::default());
        assert_eq!(cfg.gotime_start_variance_mins, 30);
        assert!(cfg.cl_channel.is_none());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = parse_config(
            r"
admins: [U0ADMIN]
cl_channel: C0CLS
cl_private_channel: G0CLS
probability:
  denominator: 10
xkcd_aliases:
  sandwich: 149
",
        )
        .unwrap();

        assert_eq!(cfg.admins, vec!["U0ADMIN".to_owned()]);
        assert_eq!(cfg.cl_channel.as_deref(), Some("C0CLS"));
        assert_eq!(cfg.cl_private_channel.as_deref(), Some("G0CLS"));
        assert_eq!(cfg.probability.denominator, 10);
        assert_eq!(cfg.probability.sentinel, 0x2A);
        assert_eq!(cfg.xkcd_aliases.get("sandwich"), Some(&149));
        assert_eq!(cfg.channels, default_channels());
    }

    #[test]
    fn custom_channels_replace_defaults() {
        let cfg = parse_config(
            r"
channels:
  - name: rust
    description: crabs welcome
    welcome: true
",
        )
        .unwrap();
        assert_eq!(cfg.channels.len(), 1);
        assert!(cfg.channels[0].welcome);
        assert!(!cfg.channels[0].special);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(cfg.channels, default_channels());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "admins: {not: [a list").unwrap();
        assert!(load_config(&path).is_err());
    }
}
