use serde::{Deserialize, Serialize};

use crate::models::span::DEFAULT_TRIGGER;

/// Mentions allowed in one buffer unless configured otherwise
pub const DEFAULT_MAX_MENTIONS: usize = 5;

/// Limits recognised by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionConfig {
    pub max_mention_count: usize,
    /// Maximum buffer length in UTF-16 code units, `None` for unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_buffer_length: Option<usize>,
    pub trigger_rule: String,
}

impl Default for MentionConfig {
    fn default() -> Self {
        Self {
            max_mention_count: DEFAULT_MAX_MENTIONS,
            max_buffer_length: None,
            trigger_rule: DEFAULT_TRIGGER.to_string(),
        }
    }
}

impl MentionConfig {
    pub fn with_max_buffer_length(mut self, max: usize) -> Self {
        self.max_buffer_length = Some(max);
        self
    }

    pub fn with_max_mention_count(mut self, max: usize) -> Self {
        self.max_mention_count = max;
        self
    }

    pub fn with_trigger_rule(mut self, trigger: impl Into<String>) -> Self {
        self.trigger_rule = trigger.into();
        self
    }
}
