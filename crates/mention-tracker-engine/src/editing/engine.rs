use std::ops::Range;

use log::{debug, info, warn};

use crate::editing::adjust::{self, EditDescriptor};
use crate::editing::patch::{
    BackspaceOutcome, Highlight, HighlightKind, LoadReport, MentionInsertion, SkippedSpan,
};
use crate::editing::store::SpanStore;
use crate::editing::{deletion, selection};
use crate::error::MentionError;
use crate::io::{self, PersistedSpan};
use crate::models::{MentionConfig, MentionState, Span, UserId};
use crate::text::{Filtered, LengthFilter, utf16};

/// Callbacks the host registers to hear about engine-side changes
pub trait MentionObserver {
    /// An insertion was refused because the buffer would grow past its limit
    fn on_over_length(&mut self) {}

    /// The set of mentions or their ranges changed; repaint `highlights`
    fn on_mentions_changed(&mut self, _highlights: &[Highlight]) {}
}

/// Mention tracking for one host buffer.
///
/// The host owns the text and performs every write. Around each write it
/// calls, in order:
///
/// 1. [`MentionEngine::on_before_edit`] with the range about to be removed
/// 2. [`MentionEngine::on_after_edit`] with the number of units inserted
/// 3. [`MentionEngine::on_text_committed`] with the resulting text
///
/// Selection changes go through [`MentionEngine::on_selection_change`] and
/// backspace key presses through [`MentionEngine::on_backspace`] before the
/// host acts on them.
///
/// ```rust
/// # use mention_tracker_engine::{MentionConfig, MentionEngine};
/// let mut engine = MentionEngine::with_text(MentionConfig::default(), "Hi ");
///
/// let insertion = engine.insert_mention(42, "alice").unwrap();
/// assert_eq!(insertion.text, "@alice ");
///
/// // the host inserts the text, reporting the edit around it
/// engine.on_before_edit(insertion.at, 0).unwrap();
/// engine.on_after_edit(insertion.at, 7).unwrap();
/// engine.on_text_committed("Hi @alice ").unwrap();
///
/// assert_eq!(engine.serialize_for_send("Hi @alice ").unwrap(), "Hi @42 ");
/// ```
pub struct MentionEngine {
    config: MentionConfig,
    store: SpanStore,
    /// Buffer length in UTF-16 units as implied by the edits seen so far
    buffer_len: usize,
    selection: Range<usize>,
    /// Deletion reported by `on_before_edit`, waiting for `on_after_edit`
    open_edit: Option<EditDescriptor>,
    /// Mention accepted by `insert_mention`, registered once its text lands
    pending_mention: Option<Span>,
    /// Store changed since observers were last told
    dirty: bool,
    observer: Option<Box<dyn MentionObserver + Send>>,
}

impl std::fmt::Debug for MentionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionEngine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("buffer_len", &self.buffer_len)
            .field("selection", &self.selection)
            .field("open_edit", &self.open_edit)
            .field("pending_mention", &self.pending_mention)
            .finish_non_exhaustive()
    }
}

impl Default for MentionEngine {
    fn default() -> Self {
        Self::new(MentionConfig::default())
    }
}

impl MentionEngine {
    /// Engine for an empty buffer
    pub fn new(config: MentionConfig) -> Self {
        Self {
            store: SpanStore::new(config.max_mention_count),
            config,
            buffer_len: 0,
            selection: 0..0,
            open_edit: None,
            pending_mention: None,
            dirty: false,
            observer: None,
        }
    }

    /// Engine for a buffer that already holds `text` (and no mentions)
    pub fn with_text(config: MentionConfig, text: &str) -> Self {
        let mut engine = Self::new(config);
        engine.buffer_len = utf16::utf16_len(text);
        engine.selection = engine.buffer_len..engine.buffer_len;
        engine
    }

    pub fn set_observer(&mut self, observer: impl MentionObserver + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn config(&self) -> &MentionConfig {
        &self.config
    }

    /// Apply new limits. Existing mentions are kept even above a lowered cap.
    pub fn configure(&mut self, config: MentionConfig) {
        self.store.set_limit(config.max_mention_count);
        self.config = config;
    }

    pub fn store(&self) -> &SpanStore {
        &self.store
    }

    /// Mentions ordered by position
    pub fn spans(&self) -> impl Iterator<Item = &Span> + Clone {
        self.store.all()
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Styling ranges for every mention, in buffer order
    pub fn highlights(&self) -> Vec<Highlight> {
        self.store
            .all()
            .map(|span| Highlight {
                range: span.range(),
                kind: match span.state {
                    MentionState::Normal => HighlightKind::Mention,
                    MentionState::Marked | MentionState::Clear => HighlightKind::Selected,
                },
                user_id: span.user_id,
            })
            .collect()
    }

    /// Accept a mention of `user_id` at the caret.
    ///
    /// Nothing changes until the host inserts the returned text and reports
    /// that edit; the span is registered by the matching `on_after_edit`.
    pub fn insert_mention(
        &mut self,
        user_id: UserId,
        display_name: &str,
    ) -> Result<MentionInsertion, MentionError> {
        if self.open_edit.is_some() || self.pending_mention.is_some() {
            return Err(MentionError::invalid_range(
                self.selection.clone(),
                "another edit is still in progress",
            ));
        }
        if self.store.is_full() {
            info!("mention of user {user_id} refused: limit reached");
            return Err(MentionError::LimitExceeded {
                max: self.store.limit(),
            });
        }
        if self.store.contains_user(user_id) {
            info!("mention of user {user_id} refused: already mentioned");
            return Err(MentionError::DuplicateUser { user_id });
        }
        if display_name.is_empty() || self.config.trigger_rule.is_empty() {
            return Err(MentionError::EmptyMention);
        }

        let caret = selection::correct_selection(&self.store, self.selection.clone()).start;
        let at = caret.min(self.buffer_len);
        let span = Span::mention(user_id, &self.config.trigger_rule, display_name, at);

        let length = self.buffer_len + span.len();
        if let Some(max) = self.config.max_buffer_length
            && length > max
        {
            info!("mention of user {user_id} refused: {length} exceeds {max}");
            self.notify_over_length();
            return Err(MentionError::OverLength { length, max });
        }

        debug!("mention of user {user_id} pending at {:?}", span.range());
        let insertion = MentionInsertion {
            at,
            text: span.display_text.clone(),
            caret: span.end,
        };
        self.pending_mention = Some(span);
        Ok(insertion)
    }

    /// The host is about to remove `count` units at `start` (zero for a pure insertion)
    pub fn on_before_edit(&mut self, start: usize, count: usize) -> Result<(), MentionError> {
        let deleted = start..start.saturating_add(count);
        if let Some(open) = self.open_edit {
            return Err(MentionError::invalid_range(
                deleted,
                format!("edit at {} has not been completed", open.position),
            ));
        }
        if deleted.end > self.buffer_len {
            return Err(MentionError::invalid_range(
                deleted,
                format!("buffer is only {} long", self.buffer_len),
            ));
        }

        for user_id in adjust::partially_overlapping(&self.store, &deleted) {
            if let Some(span) = self.store.remove(user_id) {
                warn!(
                    "edit at {deleted:?} cuts the mention of user {} at {:?}, dropping it",
                    span.user_id,
                    span.range()
                );
                self.dirty = true;
            }
        }

        let adjustment = adjust::apply_pre_edit(&mut self.store, start, count);
        self.dirty |= !adjustment.is_noop();
        self.buffer_len -= count;
        self.open_edit = Some(EditDescriptor::delete(start, count));
        Ok(())
    }

    /// The host inserted `inserted` units at `start`
    pub fn on_after_edit(&mut self, start: usize, inserted: usize) -> Result<(), MentionError> {
        let Some(open) = self.open_edit else {
            return Err(MentionError::invalid_range(
                start..start + inserted,
                "after-edit without a matching before-edit",
            ));
        };
        if open.position != start {
            return Err(MentionError::invalid_range(
                start..start + inserted,
                format!("before-edit was reported at {}", open.position),
            ));
        }
        self.open_edit = None;

        let adjustment = adjust::apply_post_edit(&mut self.store, start, inserted);
        self.dirty |= !adjustment.is_noop();
        self.buffer_len += inserted;

        if let Some(span) = self.pending_mention.take() {
            if span.start == start && span.len() == inserted {
                let end = span.end;
                match self.store.add(span) {
                    Ok(()) => {
                        debug!("mention registered at {start}..{end}");
                        self.selection = end..end;
                        self.dirty = true;
                    }
                    Err(e) => warn!("pending mention dropped: {e}"),
                }
            } else {
                warn!(
                    "pending mention of user {} dropped: edit at {start} (+{inserted}) is not its insertion",
                    span.user_id
                );
            }
        }
        Ok(())
    }

    /// The host finished an edit and its buffer now reads `text`
    pub fn on_text_committed(&mut self, text: &str) -> Result<(), MentionError> {
        let len = utf16::utf16_len(text);
        if let Some(open) = self.open_edit {
            return Err(MentionError::invalid_range(
                open.range(),
                "committed before after-edit was reported",
            ));
        }
        if len != self.buffer_len {
            return Err(MentionError::invalid_range(
                0..len,
                format!("edits account for {} units", self.buffer_len),
            ));
        }

        if text.is_empty() && !self.store.is_empty() {
            debug!("buffer emptied, clearing {} mentions", self.store.len());
            self.store.clear();
            self.dirty = true;
        }
        self.dirty |= deletion::settle(&mut self.store);
        self.dirty |= self.store.retain(|span| span.end <= len) > 0;
        self.selection = self.selection.start.min(len)..self.selection.end.min(len);

        self.flush_changes();
        Ok(())
    }

    /// Correct a selection requested by the host; the host applies the result
    pub fn on_selection_change(&mut self, start: usize, end: usize) -> Range<usize> {
        let corrected = selection::correct_selection(&self.store, start..end);
        if deletion::on_caret_moved(&mut self.store, &corrected) {
            self.dirty = true;
        }
        if corrected != (start..end) {
            debug!("selection {start}..{end} corrected to {corrected:?}");
        }
        self.selection = corrected.clone();
        self.flush_changes();
        corrected
    }

    /// Backspace pressed with the given selection
    pub fn on_backspace(&mut self, caret_start: usize, caret_end: usize) -> BackspaceOutcome {
        let outcome = deletion::on_backspace(&mut self.store, caret_start..caret_end);
        if outcome.handled || outcome.selection.is_some() {
            self.dirty = true;
        }
        if let Some(selection) = &outcome.selection {
            self.selection = selection.clone();
        }
        self.flush_changes();
        outcome
    }

    /// The user clicked into the buffer. Returns whether a marked mention was released.
    pub fn on_click(&mut self) -> bool {
        let changed = deletion::on_click(&mut self.store);
        self.dirty |= changed;
        self.flush_changes();
        changed
    }

    /// Canonical exchange string for `buffer`
    pub fn serialize_for_send(&self, buffer: &str) -> Result<String, MentionError> {
        io::serialize(buffer, self.store.all())
    }

    /// Restore persisted mentions over `buffer`, in input order.
    ///
    /// Records that break a store invariant are skipped and reported.
    /// Loaded spans start out `Normal`.
    pub fn load_persisted_spans(
        &mut self,
        buffer: &str,
        records: impl IntoIterator<Item = PersistedSpan>,
    ) -> LoadReport {
        self.resync(buffer);
        let spans = records.into_iter().map(|record| {
            let mut span = io::from_persisted(&record);
            span.state = MentionState::Normal;
            span
        });
        let report = self.add_all(spans);
        self.flush_changes();
        report
    }

    /// Replace the buffer with the display form of `exchange`.
    ///
    /// Returns the text the host must show and which mentions made it in.
    pub fn load_exchange<F>(&mut self, exchange: &str, resolve: F) -> (String, LoadReport)
    where
        F: FnMut(UserId) -> Option<String>,
    {
        let (text, spans) = io::parse_exchange(exchange, &self.config.trigger_rule, resolve);
        self.reset_text(&text);
        let report = self.add_all(spans);
        self.flush_changes();
        (text, report)
    }

    /// Forget every mention and start over with `text`
    pub fn reset_text(&mut self, text: &str) {
        self.resync(text);
        if !self.store.is_empty() {
            self.store.clear();
            self.dirty = true;
        }
        self.selection = self.buffer_len..self.buffer_len;
        self.flush_changes();
    }

    /// Drop spans left empty or without a user by a lenient load
    pub fn prune_degenerate(&mut self) -> usize {
        let dropped = self
            .store
            .retain(|span| !span.is_empty() && span.user_id != 0);
        if dropped > 0 {
            debug!("pruned {dropped} degenerate mentions");
            self.dirty = true;
            self.flush_changes();
        }
        dropped
    }

    /// Run typed or pasted `source`, about to replace `replaced`, through the
    /// configured length limit
    pub fn filter_input<'a>(&mut self, source: &'a str, replaced: Range<usize>) -> Filtered<'a> {
        let Some(max) = self.config.max_buffer_length else {
            return Filtered::Accept;
        };
        let filtered = LengthFilter::new(max).filter(source, self.buffer_len, replaced);
        if filtered == Filtered::Reject {
            self.notify_over_length();
        }
        filtered
    }

    fn resync(&mut self, text: &str) {
        self.buffer_len = utf16::utf16_len(text);
        self.open_edit = None;
        self.pending_mention = None;
    }

    fn add_all(&mut self, spans: impl IntoIterator<Item = Span>) -> LoadReport {
        let mut report = LoadReport::default();
        for (index, span) in spans.into_iter().enumerate() {
            let user_id = span.user_id;
            let result = if span.end > self.buffer_len {
                Err(MentionError::invalid_range(
                    span.range(),
                    format!("buffer is only {} long", self.buffer_len),
                ))
            } else {
                self.store.add(span)
            };
            match result {
                Ok(()) => report.loaded += 1,
                Err(error) => {
                    warn!("mention #{index} of user {user_id} skipped: {error}");
                    report.skipped.push(SkippedSpan {
                        index,
                        user_id,
                        error,
                    });
                }
            }
        }
        self.dirty |= report.loaded > 0;
        report
    }

    fn notify_over_length(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.on_over_length();
        }
    }

    fn flush_changes(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        let highlights = self.highlights();
        if let Some(observer) = self.observer.as_mut() {
            observer.on_mentions_changed(&highlights);
        }
    }
}
