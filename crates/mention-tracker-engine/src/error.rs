use std::ops::Range;

use crate::models::UserId;

/// Reasons the engine refuses an operation. No state changes when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MentionError {
    #[error("At most {max} users can be mentioned at once")]
    LimitExceeded { max: usize },

    #[error("User {user_id} is already mentioned")]
    DuplicateUser { user_id: UserId },

    #[error("Text would grow to {length} characters, the limit is {max}")]
    OverLength { length: usize, max: usize },

    #[error("A mention needs a trigger and a display name")]
    EmptyMention,

    #[error("Invalid range {start}..{end}: {reason}")]
    InvalidRange {
        start: usize,
        end: usize,
        reason: String,
    },
}

impl MentionError {
    pub(crate) fn invalid_range(range: Range<usize>, reason: impl Into<String>) -> Self {
        MentionError::InvalidRange {
            start: range.start,
            end: range.end,
            reason: reason.into(),
        }
    }

    /// Errors the host should present to the user (toast or similar).
    /// `InvalidRange` is an integration bug instead.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, MentionError::InvalidRange { .. })
    }
}
