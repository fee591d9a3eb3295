use std::ops::Range;

use crate::editing::engine::MentionEngine;
use crate::editing::patch::LoadReport;
use crate::error::MentionError;
use crate::models::{MentionConfig, UserId};
use crate::text::{Filtered, utf16};

/// A plain-text compose field wired to a [`MentionEngine`].
///
/// Stands in for a platform text widget: it owns the buffer, applies every
/// edit itself and reports each one to the engine.
#[derive(Debug, Default)]
pub struct ComposeBox {
    text: String,
    selection: Range<usize>,
    engine: MentionEngine,
}

impl ComposeBox {
    pub fn new(config: MentionConfig) -> Self {
        Self {
            text: String::new(),
            selection: 0..0,
            engine: MentionEngine::new(config),
        }
    }

    /// Compose field pre-filled with `text`, caret at the end
    pub fn with_text(config: MentionConfig, text: &str) -> Self {
        let engine = MentionEngine::with_text(config, text);
        Self {
            text: text.to_string(),
            selection: engine.selection(),
            engine,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn engine(&self) -> &MentionEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut MentionEngine {
        &mut self.engine
    }

    /// Move the selection. The engine may widen it around mentions.
    pub fn select(&mut self, start: usize, end: usize) -> Range<usize> {
        let len = utf16::utf16_len(&self.text);
        self.selection = self.engine.on_selection_change(start.min(len), end.min(len));
        self.selection.clone()
    }

    /// Click at `offset`
    pub fn click(&mut self, offset: usize) -> Range<usize> {
        self.engine.on_click();
        self.select(offset, offset)
    }

    /// Type or paste `input` over the selection, cut to the length limit
    pub fn type_text(&mut self, input: &str) -> Result<(), MentionError> {
        let selection = self.selection.clone();
        let accepted = match self.engine.filter_input(input, selection.clone()) {
            Filtered::Reject => return Ok(()),
            filtered => filtered.apply(input),
        };
        self.replace(selection, accepted)
    }

    /// Mention `user_id` at the caret
    pub fn insert_mention(&mut self, user_id: UserId, display_name: &str) -> Result<(), MentionError> {
        self.byte_range(self.selection.clone())?;
        let insertion = self.engine.insert_mention(user_id, display_name)?;
        self.replace(insertion.at..insertion.at, &insertion.text)
    }

    /// Replace the content with the display form of `exchange`
    pub fn load_exchange<F>(&mut self, exchange: &str, resolve: F) -> LoadReport
    where
        F: FnMut(UserId) -> Option<String>,
    {
        let (text, report) = self.engine.load_exchange(exchange, resolve);
        self.text = text;
        self.selection = self.engine.selection();
        report
    }

    /// Backspace key press
    pub fn backspace(&mut self) -> Result<(), MentionError> {
        let Range { start, end } = self.selection.clone();
        let outcome = self.engine.on_backspace(start, end);
        if outcome.handled {
            return Ok(());
        }
        if let Some(selection) = outcome.selection {
            self.selection = selection;
        }

        let target = if self.selection.is_empty() {
            let caret = self.selection.start;
            match utf16::char_len_before(&self.text, caret) {
                Some(width) => caret - width..caret,
                None => return Ok(()),
            }
        } else {
            self.selection.clone()
        };
        self.replace(target, "")
    }

    fn byte_range(&self, range: Range<usize>) -> Result<Range<usize>, MentionError> {
        match (
            utf16::byte_index(&self.text, range.start),
            utf16::byte_index(&self.text, range.end),
        ) {
            (Some(start), Some(end)) if start <= end => Ok(start..end),
            _ => Err(MentionError::invalid_range(
                range,
                "outside the text or inside a character",
            )),
        }
    }

    fn replace(&mut self, range: Range<usize>, insert: &str) -> Result<(), MentionError> {
        let bytes = self.byte_range(range.clone())?;
        let inserted = utf16::utf16_len(insert);

        self.engine.on_before_edit(range.start, range.len())?;
        self.text.replace_range(bytes, insert);
        self.engine.on_after_edit(range.start, inserted)?;
        self.engine.on_text_committed(&self.text)?;

        let caret = range.start + inserted;
        self.selection = self.engine.on_selection_change(caret, caret);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MentionState;
    use pretty_assertions::assert_eq;

    fn hi_alice() -> ComposeBox {
        let mut compose = ComposeBox::new(MentionConfig::default());
        compose.type_text("Hi ").unwrap();
        compose.insert_mention(42, "alice").unwrap();
        compose
    }

    #[test]
    fn test_typing_moves_caret() {
        let mut compose = ComposeBox::new(MentionConfig::default());
        compose.type_text("hello").unwrap();
        assert_eq!(compose.text(), "hello");
        assert_eq!(compose.selection(), 5..5);
    }

    #[test]
    fn test_mention_is_inserted_at_caret() {
        let compose = hi_alice();
        assert_eq!(compose.text(), "Hi @alice ");
        assert_eq!(compose.selection(), 10..10);
        assert_eq!(compose.engine().spans().next().unwrap().range(), 3..10);
    }

    #[test]
    fn test_typing_before_mention_shifts_it() {
        let mut compose = hi_alice();
        compose.select(0, 0);
        compose.type_text("Oh, ").unwrap();

        assert_eq!(compose.text(), "Oh, Hi @alice ");
        assert_eq!(compose.engine().spans().next().unwrap().range(), 7..14);
        assert_eq!(compose.serialize(), "Oh, Hi @42 ");
    }

    #[test]
    fn test_atomic_delete() {
        let mut compose = hi_alice();

        compose.backspace().unwrap();
        assert_eq!(compose.text(), "Hi @alice ");
        assert_eq!(
            compose.engine().spans().next().unwrap().state,
            MentionState::Marked
        );

        compose.backspace().unwrap();
        assert_eq!(compose.text(), "Hi ");
        assert_eq!(compose.selection(), 3..3);
        assert!(compose.engine().store().is_empty());
    }

    #[test]
    fn test_click_cancels_marked_mention() {
        let mut compose = hi_alice();
        compose.backspace().unwrap();
        compose.click(10);
        compose.backspace().unwrap();

        // marked again, not deleted
        assert_eq!(compose.text(), "Hi @alice ");
        assert_eq!(compose.engine().store().len(), 1);
    }

    #[test]
    fn test_plain_backspace_deletes_one_character() {
        let mut compose = ComposeBox::with_text(MentionConfig::default(), "ab🦀");
        compose.backspace().unwrap();
        assert_eq!(compose.text(), "ab");
        compose.select(0, 0);
        compose.backspace().unwrap();
        assert_eq!(compose.text(), "ab");
    }

    #[test]
    fn test_caret_inside_mention_is_pushed_out() {
        let mut compose = hi_alice();
        compose.type_text("there").unwrap();
        assert_eq!(compose.select(5, 5), 10..10);
        assert_eq!(compose.select(1, 6), 1..10);
    }

    #[test]
    fn test_selection_over_mention_is_deleted_whole() {
        let mut compose = hi_alice();
        compose.type_text("there").unwrap();
        compose.select(1, 6);
        compose.backspace().unwrap();

        assert_eq!(compose.text(), "Hthere");
        assert!(compose.engine().store().is_empty());
    }

    #[test]
    fn test_length_limit_truncates_typing() {
        let config = MentionConfig::default().with_max_buffer_length(4);
        let mut compose = ComposeBox::new(config);
        compose.type_text("abcdef").unwrap();
        assert_eq!(compose.text(), "abcd");
        compose.type_text("x").unwrap();
        assert_eq!(compose.text(), "abcd");
    }

    #[test]
    fn test_caret_inside_surrogate_pair_is_rejected() {
        let mut compose = ComposeBox::with_text(MentionConfig::default(), "🦀");
        compose.select(1, 1);
        let result = compose.insert_mention(1, "a");
        assert!(matches!(result, Err(MentionError::InvalidRange { .. })));
        // nothing left pending
        compose.select(2, 2);
        assert!(compose.insert_mention(1, "a").is_ok());
    }

    #[test]
    fn test_load_exchange_replaces_content() {
        let mut compose = hi_alice();
        let report = compose.load_exchange("re @7 ok", |user_id| {
            (user_id == 7).then(|| "bob".to_string())
        });

        assert!(report.is_complete());
        assert_eq!(compose.text(), "re @bob ok");
        assert_eq!(compose.selection(), 10..10);
        assert_eq!(compose.serialize(), "re @7 ok");
    }

    impl ComposeBox {
        fn serialize(&self) -> String {
            self.engine.serialize_for_send(&self.text).unwrap()
        }
    }
}
