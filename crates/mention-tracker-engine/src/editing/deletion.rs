//! Two-keystroke atomic deletion of mentions.
//!
//! ```text
//! Normal --backspace at end--> Marked --backspace--> Clear --delete committed--> (removed)
//!                                 |
//!                                 +--click / caret moved away--> Normal
//! ```
//!
//! At most one span is `Marked` or `Clear` at a time.

use std::ops::Range;

use log::{debug, warn};

use crate::editing::patch::BackspaceOutcome;
use crate::editing::store::SpanStore;
use crate::models::MentionState;

/// Route a backspace key press with the given selection
pub fn on_backspace(store: &mut SpanStore, caret: Range<usize>) -> BackspaceOutcome {
    if let Some(span) = store.find_mut(|span| span.state == MentionState::Marked) {
        span.state = MentionState::Clear;
        debug!(
            "backspace: mention of user {} cleared, deleting {:?}",
            span.user_id,
            span.range()
        );
        return BackspaceOutcome::delete_range(span.range());
    }

    // A range selection or an already clearing span means ordinary deletion
    if caret.start != caret.end || store.flagged().is_some() {
        return BackspaceOutcome::pass_through();
    }

    match store.find_mut(|span| !span.is_empty() && span.end == caret.start) {
        Some(span) => {
            span.state = MentionState::Marked;
            debug!(
                "backspace: mention of user {} marked at {:?}",
                span.user_id,
                span.range()
            );
            BackspaceOutcome::handled()
        }
        None => BackspaceOutcome::pass_through(),
    }
}

/// A click anywhere un-marks the marked span. Returns whether anything changed.
pub fn on_click(store: &mut SpanStore) -> bool {
    unmark(store, "click")
}

/// Un-mark the marked span when the caret leaves its end boundary
pub fn on_caret_moved(store: &mut SpanStore, selection: &Range<usize>) -> bool {
    let stays = store
        .find(|span| span.state == MentionState::Marked)
        .is_some_and(|span| selection.start == span.end && selection.end == span.end);
    if stays {
        return false;
    }
    unmark(store, "caret moved")
}

/// After a committed edit, a span still in `Clear` was not deleted by the
/// host; it goes back to `Normal`.
pub fn settle(store: &mut SpanStore) -> bool {
    match store.find_mut(|span| span.state == MentionState::Clear) {
        Some(span) => {
            warn!(
                "mention of user {} was cleared but its text was not deleted, restoring",
                span.user_id
            );
            span.state = MentionState::Normal;
            true
        }
        None => false,
    }
}

fn unmark(store: &mut SpanStore, reason: &str) -> bool {
    match store.find_mut(|span| span.state == MentionState::Marked) {
        Some(span) => {
            debug!("{reason}: mention of user {} unmarked", span.user_id);
            span.state = MentionState::Normal;
            true
        }
        None => false,
    }
}
