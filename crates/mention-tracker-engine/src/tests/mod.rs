use std::sync::{Arc, Mutex};

use crate::editing::engine::{MentionEngine, MentionObserver};
use crate::editing::patch::Highlight;
use crate::models::UserId;
use crate::text::utf16;


/// Observer that records every callback, shareable with the engine
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    over_length: Arc<Mutex<usize>>,
    changes: Arc<Mutex<Vec<Vec<Highlight>>>>,
}

impl RecordingObserver {
    pub fn over_length_count(&self) -> usize {
        *self.over_length.lock().unwrap()
    }

    pub fn changes(&self) -> Vec<Vec<Highlight>> {
        self.changes.lock().unwrap().clone()
    }
}

impl MentionObserver for RecordingObserver {
    fn on_over_length(&mut self) {
        *self.over_length.lock().unwrap() += 1;
    }

    fn on_mentions_changed(&mut self, highlights: &[Highlight]) {
        self.changes.lock().unwrap().push(highlights.to_vec());
    }
}

/// Insert a mention of `user_id` at the engine's caret the way a host would,
/// returning the new buffer
pub fn commit_insert(
    engine: &mut MentionEngine,
    buffer: &str,
    user_id: UserId,
    name: &str,
) -> String {
    let insertion = engine.insert_mention(user_id, name).unwrap();
    let at = utf16::byte_index(buffer, insertion.at).unwrap();
    let mut text = buffer.to_string();
    text.insert_str(at, &insertion.text);

    engine.on_before_edit(insertion.at, 0).unwrap();
    engine.on_after_edit(insertion.at, utf16::utf16_len(&insertion.text)).unwrap();
    engine.on_text_committed(&text).unwrap();
    text
}
