use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::text::utf16;

/// Stable identifier of a mentioned user
pub type UserId = i64;

/// Trigger rule used when nothing else is configured
pub const DEFAULT_TRIGGER: &str = "@";

/// Separator appended after every mention's display text
pub const MENTION_SEPARATOR: char = ' ';

/// Lifecycle state of a mention during the two-keystroke atomic delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MentionState {
    #[default]
    Normal,
    /// Selected by a backspace at its end, waiting for a second keystroke
    Marked,
    /// Selected for removal, the host is about to delete its text
    Clear,
}

impl MentionState {
    pub const FLAG_NORMAL: i32 = 1000;
    pub const FLAG_MARKED: i32 = 1001;
    pub const FLAG_CLEAR: i32 = 1002;

    /// Integer flag used by the persisted record
    pub fn flag(self) -> i32 {
        match self {
            MentionState::Normal => Self::FLAG_NORMAL,
            MentionState::Marked => Self::FLAG_MARKED,
            MentionState::Clear => Self::FLAG_CLEAR,
        }
    }

    /// Unknown flags fall back to `Normal`
    pub fn from_flag(flag: i32) -> Self {
        match flag {
            Self::FLAG_MARKED => MentionState::Marked,
            Self::FLAG_CLEAR => MentionState::Clear,
            _ => MentionState::Normal,
        }
    }

    /// Whether the span takes part in a pending atomic delete
    pub fn is_flagged(self) -> bool {
        self != MentionState::Normal
    }
}

/// A mention annotation over a half-open range of the host's buffer.
///
/// Offsets are UTF-16 code units, the unit the host text widgets index by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub user_id: UserId,
    /// Text as shown in the buffer: trigger, name and trailing separator
    pub display_text: String,
    pub trigger: String,
    pub start: usize,
    pub end: usize,
    pub state: MentionState,
}

impl Span {
    /// Create a span covering `display_text` placed at `start`
    pub fn new(user_id: UserId, display_text: impl Into<String>, start: usize) -> Self {
        let display_text = display_text.into();
        let end = start + utf16::utf16_len(&display_text);
        Self {
            user_id,
            display_text,
            trigger: DEFAULT_TRIGGER.to_string(),
            start,
            end,
            state: MentionState::Normal,
        }
    }

    /// Build the span for a freshly inserted mention: `<trigger><name> `
    pub fn mention(user_id: UserId, trigger: &str, name: &str, start: usize) -> Self {
        let display_text = format!("{trigger}{name}{MENTION_SEPARATOR}");
        Self {
            trigger: trigger.to_string(),
            ..Self::new(user_id, display_text, start)
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when `offset` lies inside the span, excluding both edges
    pub fn contains_strictly(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }

    /// Half-open intersection test; empty ranges intersect nothing
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        if self.is_empty() || range.is_empty() {
            return false;
        }
        self.start < range.end && range.start < self.end
    }

    /// True when the whole span lies inside `range`
    pub fn is_within(&self, range: &Range<usize>) -> bool {
        self.start >= range.start && self.end <= range.end
    }

    pub(crate) fn shift_right(&mut self, by: usize) {
        self.start += by;
        self.end += by;
    }

    pub(crate) fn shift_left(&mut self, by: usize) {
        self.start = self.start.saturating_sub(by);
        self.end = self.end.saturating_sub(by);
    }
}
