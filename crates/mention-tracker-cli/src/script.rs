use mention_tracker_engine::UserId;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Failed to read script at {script_path}: {source}")]
    ScriptReadError {
        script_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse script at {script_path}: {source}")]
    ScriptParseError {
        script_path: PathBuf,
        source: toml::de::Error,
    },
}

/// One host event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Type or paste text over the selection
    Type(String),
    Mention { user_id: UserId, name: String },
    /// Press backspace this many times
    Backspace(usize),
    Select([usize; 2]),
    Click(usize),
    /// Replace the buffer with a received exchange string
    LoadExchange(String),
}

/// A compose session to replay
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    /// Text already in the buffer
    pub text: String,
    /// Display names by user id, for `load_exchange`
    pub users: BTreeMap<String, String>,
    #[serde(rename = "step")]
    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(script_path: &Path) -> Result<Self, ScriptError> {
        let content =
            std::fs::read_to_string(script_path).map_err(|source| ScriptError::ScriptReadError {
                script_path: script_path.to_path_buf(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ScriptError::ScriptParseError {
            script_path: script_path.to_path_buf(),
            source,
        })
    }

    pub fn user_name(&self, user_id: UserId) -> Option<String> {
        self.users.get(&user_id.to_string()).cloned()
    }
}
