use std::ops::Range;

use serde::Serialize;

use crate::error::MentionError;
use crate::models::UserId;

/// Text the host must insert for an accepted mention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionInsertion {
    /// Offset to insert at (the caret)
    pub at: usize,
    /// `<trigger><name> `
    pub text: String,
    /// Caret position once the text is in place
    pub caret: usize,
}

impl MentionInsertion {
    /// Range the inserted text will occupy
    pub fn range(&self) -> Range<usize> {
        self.at..self.caret
    }
}

/// Result of routing a backspace key press through the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackspaceOutcome {
    /// The host must suppress its default deletion
    pub handled: bool,
    /// Selection the host must apply before its default deletion runs
    pub selection: Option<Range<usize>>,
}

impl BackspaceOutcome {
    pub fn handled() -> Self {
        Self {
            handled: true,
            selection: None,
        }
    }

    pub fn pass_through() -> Self {
        Self::default()
    }

    pub fn delete_range(range: Range<usize>) -> Self {
        Self {
            handled: false,
            selection: Some(range),
        }
    }
}

/// How a highlighted range should be painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HighlightKind {
    /// Foreground color of an ordinary mention
    Mention,
    /// Background color of the mention a backspace selected
    Selected,
}

/// Styling range handed to the host on every change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub range: Range<usize>,
    pub kind: HighlightKind,
    pub user_id: UserId,
}

/// A persisted or parsed span the store refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSpan {
    /// Position in the input sequence
    pub index: usize,
    pub user_id: UserId,
    pub error: MentionError,
}

/// Outcome of loading spans in bulk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedSpan>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}
