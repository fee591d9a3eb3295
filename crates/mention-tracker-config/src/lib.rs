use mention_tracker_engine::MentionConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid [mentions] settings in {config_path}: {reason}")]
    InvalidMentions {
        config_path: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Limits and trigger applied to every compose buffer
    pub mentions: MentionConfig,
    /// Where drafts (buffer plus persisted mention records) are written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drafts_path: Option<PathBuf>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if let Err(reason) = validate_mentions(&config.mentions) {
            return Err(ConfigError::InvalidMentions {
                config_path: config_path.to_path_buf(),
                reason,
            });
        }

        // Expand shell variables and tilde in the drafts directory
        config.drafts_path = config
            .drafts_path
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Configuration from the default location, or defaults when there is none
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/mention-tracker");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

/// Settings the engine would accept but that make every mention fail
fn validate_mentions(mentions: &MentionConfig) -> Result<(), String> {
    let trigger = &mentions.trigger_rule;
    if trigger.is_empty() {
        return Err("trigger_rule must not be empty".to_string());
    }
    if trigger.chars().any(char::is_whitespace) {
        return Err(format!("trigger_rule {trigger:?} contains whitespace"));
    }
    if mentions.max_buffer_length == Some(0) {
        return Err("max_buffer_length of 0 leaves no room for text".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/mention-tracker/config.toml"));
    }

    #[test]
    fn test_defaults_match_engine() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.mentions.max_mention_count, 5);
        assert_eq!(config.mentions.max_buffer_length, None);
        assert_eq!(config.mentions.trigger_rule, "@");
        assert_eq!(config.drafts_path, None);
    }

    #[test]
    fn test_partial_mentions_table() {
        let config: Config = toml::from_str(
            r#"
[mentions]
max_buffer_length = 280
"#,
        )
        .unwrap();

        assert_eq!(config.mentions.max_buffer_length, Some(280));
        assert_eq!(config.mentions.max_mention_count, 5);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config {
            mentions: MentionConfig::default()
                .with_max_mention_count(3)
                .with_trigger_rule("#"),
            drafts_path: Some(PathBuf::from("/tmp/drafts")),
        };

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("MENTION_TRACKER_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$MENTION_TRACKER_TEST_VAR/drafts");
        let expanded = Config::expand_path(&path).unwrap();
        assert_eq!(expanded, PathBuf::from("/test/env/path/drafts"));

        unsafe {
            env::remove_var("MENTION_TRACKER_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_unknown_var() {
        let path = PathBuf::from("$MENTION_TRACKER_SURELY_UNSET/drafts");
        assert_eq!(Config::expand_path(&path), None);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            mentions: MentionConfig::default().with_max_buffer_length(140),
            drafts_path: None,
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_tilde_drafts_path_is_expanded_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "drafts_path = \"~/drafts\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();
        let drafts = config.drafts_path.unwrap();

        assert!(!drafts.to_string_lossy().starts_with('~'));
        assert!(drafts.ends_with("drafts"));
    }

    #[rstest]
    #[case("trigger_rule = \"\"", "must not be empty")]
    #[case("trigger_rule = \"@ \"", "contains whitespace")]
    #[case("max_buffer_length = 0", "no room for text")]
    fn test_load_rejects_unusable_mentions(#[case] setting: &str, #[case] reason: &str) {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, format!("[mentions]\n{setting}\n")).unwrap();

        let error = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(error, ConfigError::InvalidMentions { .. }));
        assert!(error.to_string().contains(reason), "{error}");
    }

    #[test]
    fn test_load_accepts_custom_trigger() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[mentions]\ntrigger_rule = \"#\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.mentions.trigger_rule, "#");
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[mentions\nmax_mention_count = ").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }
}
