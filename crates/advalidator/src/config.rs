use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TAG_KEY: &str = "validate";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Field tag key holding the rule expression.
    #[serde(default = "default_tag_key")]
    pub tag_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tag_key: default_tag_key(),
        }
    }
}

fn default_tag_key() -> String {
    DEFAULT_TAG_KEY.to_string()
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default)]
    engine: EngineConfig,
}

impl EngineConfig {
    /// Resolve configuration from the environment.
    ///
    /// `ADVALIDATOR_CONFIG` names a TOML file and wins; otherwise
    /// `ADVALIDATOR_TAG_KEY` overrides the tag key. Unusable values are
    /// logged and skipped.
    pub fn load_from_env() -> Self {
        if let Ok(path) = std::env::var("ADVALIDATOR_CONFIG") {
            match load_config(&path) {
                Ok(cfg) => return cfg,
                Err(err) => {
                    tracing::warn!(%err, path = %path, "ignoring unreadable validator config");
                }
            }
        }
        if let Ok(key) = std::env::var("ADVALIDATOR_TAG_KEY") {
            match check_tag_key(&key) {
                Ok(()) => return Self { tag_key: key },
                Err(err) => tracing::warn!(%err, "ignoring ADVALIDATOR_TAG_KEY"),
            }
        }
        Self::default()
    }
}

fn check_tag_key(key: &str) -> Result<()> {
    if key.is_empty() {
        bail!("tag_key must not be empty");
    }
    if key.contains(char::is_whitespace) {
        bail!("tag_key must not contain whitespace: {key:?}");
    }
    Ok(())
}

/// Load an `[engine]` table from a TOML file.
pub fn load_config(path: &str) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)?;
    let file: ConfigFile = toml::from_str(&content)?;
    check_tag_key(&file.engine.tag_key)?;
    Ok(file.engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    fn clear_env() {
        std::env::remove_var("ADVALIDATOR_CONFIG");
        std::env::remove_var("ADVALIDATOR_TAG_KEY");
    }

    #[test]
    fn loads_tag_key_from_file() {
        let file = write_config("[engine]\ntag_key = \"check\"\n");
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.tag_key, "check");
    }

    #[test]
    fn missing_table_uses_defaults() {
        let file = write_config("# nothing here\n");
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.tag_key, DEFAULT_TAG_KEY);
    }

    #[test]
    fn rejects_bad_tag_keys() {
        let empty = write_config("[engine]\ntag_key = \"\"\n");
        assert!(load_config(empty.path().to_str().unwrap()).is_err());
        let spaced = write_config("[engine]\ntag_key = \"my key\"\n");
        assert!(load_config(spaced.path().to_str().unwrap()).is_err());
        assert!(load_config("/nonexistent/advalidator.toml").is_err());
    }

    #[test]
    #[serial]
    fn env_precedence() {
        clear_env();
        assert_eq!(EngineConfig::load_from_env(), EngineConfig::default());

        std::env::set_var("ADVALIDATOR_TAG_KEY", "rule");
        assert_eq!(EngineConfig::load_from_env().tag_key, "rule");

        let file = write_config("[engine]\ntag_key = \"fromfile\"\n");
        std::env::set_var("ADVALIDATOR_CONFIG", file.path());
        assert_eq!(EngineConfig::load_from_env().tag_key, "fromfile");

        std::env::set_var("ADVALIDATOR_CONFIG", "/nonexistent/advalidator.toml");
        assert_eq!(EngineConfig::load_from_env().tag_key, "rule");

        std::env::set_var("ADVALIDATOR_TAG_KEY", "");
        assert_eq!(EngineConfig::load_from_env().tag_key, DEFAULT_TAG_KEY);
        clear_env();
    }
}
