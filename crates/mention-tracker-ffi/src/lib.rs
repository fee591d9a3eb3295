//! UniFFI bindings for mention-tracker mobile apps
//!
//! Lets a Kotlin or Swift text field hand its edit, selection and key events
//! to the Rust engine. Offsets are UTF-16 code units, the unit both platforms'
//! text APIs use, and cross the boundary as `u32`.

use mention_tracker_engine::{
    BackspaceOutcome, Filtered, Highlight, HighlightKind, LoadReport, MentionConfig, MentionEngine,
    MentionError, MentionObserver, MentionState, PersistedSpan, Span, parse_exchange,
    records_from_json, records_to_json, to_persisted,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

uniffi::setup_scaffolding!();

// ============ Errors ============

/// Errors that can cross the FFI boundary
/// Note: Field is named `reason` not `message` to avoid conflict with Throwable.message in Kotlin
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FfiError {
    #[error("At most {max} users can be mentioned at once")]
    LimitExceeded { max: u32 },
    #[error("User {user_id} is already mentioned")]
    DuplicateUser { user_id: i64 },
    #[error("Text would grow to {length} characters, the limit is {max}")]
    OverLength { length: u32, max: u32 },
    #[error("A mention needs a trigger and a display name")]
    EmptyMention,
    #[error("Invalid range: {reason}")]
    InvalidRange { reason: String },
    #[error("Malformed mention records: {reason}")]
    MalformedRecords { reason: String },
}

impl From<MentionError> for FfiError {
    fn from(error: MentionError) -> Self {
        match error {
            MentionError::LimitExceeded { max } => Self::LimitExceeded { max: to_u32(max) },
            MentionError::DuplicateUser { user_id } => Self::DuplicateUser { user_id },
            MentionError::OverLength { length, max } => Self::OverLength {
                length: to_u32(length),
                max: to_u32(max),
            },
            MentionError::EmptyMention => Self::EmptyMention,
            e @ MentionError::InvalidRange { .. } => Self::InvalidRange {
                reason: e.to_string(),
            },
        }
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

// ============ Callbacks ============

/// Implemented by the app to repaint and warn the user
#[uniffi::export(with_foreign)]
pub trait MentionListener: Send + Sync {
    fn on_over_length(&self);
    fn on_mentions_changed(&self, highlights: Vec<HighlightDto>);
}

/// Looks up display names when rebuilding a buffer from an exchange string
#[uniffi::export(with_foreign)]
pub trait UserDirectory: Send + Sync {
    fn display_name(&self, user_id: i64) -> Option<String>;
}

/// Callback raised by the engine, delivered once the engine lock is released
enum ListenerEvent {
    OverLength,
    MentionsChanged(Vec<HighlightDto>),
}

type EventQueue = Arc<Mutex<Vec<ListenerEvent>>>;

/// Engine observer that only queues; the handle delivers after unlocking,
/// so a listener may call back into the handle.
struct ListenerBridge(EventQueue);

impl MentionObserver for ListenerBridge {
    fn on_over_length(&mut self) {
        lock(&self.0).push(ListenerEvent::OverLength);
    }

    fn on_mentions_changed(&mut self, highlights: &[Highlight]) {
        lock(&self.0).push(ListenerEvent::MentionsChanged(
            highlights.iter().map(HighlightDto::from).collect(),
        ));
    }
}

// Recover from poisoned mutex (another thread panicked while holding lock)
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

// ============ Engine Handle ============

/// A handle to the mention engine of one text field.
#[derive(uniffi::Object)]
pub struct MentionEngineHandle {
    inner: Mutex<MentionEngine>,
    listener: Mutex<Option<Arc<dyn MentionListener>>>,
    events: EventQueue,
}

impl MentionEngineHandle {
    fn from_engine(mut engine: MentionEngine) -> Self {
        let events = EventQueue::default();
        engine.set_observer(ListenerBridge(events.clone()));
        Self {
            inner: Mutex::new(engine),
            listener: Mutex::new(None),
            events,
        }
    }

    fn engine(&self) -> MutexGuard<'_, MentionEngine> {
        lock(&self.inner)
    }

    /// Run `f` on the engine, then hand queued events to the listener
    fn with_engine<T>(&self, f: impl FnOnce(&mut MentionEngine) -> T) -> T {
        let result = {
            let mut engine = lock(&self.inner);
            f(&mut engine)
        };
        self.deliver_events();
        result
    }

    fn deliver_events(&self) {
        let events = std::mem::take(&mut *lock(&self.events));
        if events.is_empty() {
            return;
        }
        let Some(listener) = lock(&self.listener).clone() else {
            return;
        };
        for event in events {
            match event {
                ListenerEvent::OverLength => listener.on_over_length(),
                ListenerEvent::MentionsChanged(highlights) => {
                    listener.on_mentions_changed(highlights)
                }
            }
        }
    }
}

#[uniffi::export]
impl MentionEngineHandle {
    /// Create an engine for an empty text field.
    #[uniffi::constructor]
    pub fn new(config: ConfigDto) -> Self {
        Self::from_engine(MentionEngine::new(config.into()))
    }

    /// Create an engine for a text field that already holds `text`.
    #[uniffi::constructor]
    pub fn with_text(config: ConfigDto, text: String) -> Self {
        Self::from_engine(MentionEngine::with_text(config.into(), &text))
    }

    pub fn set_listener(&self, listener: Arc<dyn MentionListener>) {
        *lock(&self.listener) = Some(listener);
    }

    pub fn clear_listener(&self) {
        *lock(&self.listener) = None;
        lock(&self.events).clear();
    }

    pub fn configure(&self, config: ConfigDto) {
        self.with_engine(|engine| engine.configure(config.into()));
    }

    /// Accept a mention at the caret. The app must then insert the returned text.
    pub fn insert_mention(
        &self,
        user_id: i64,
        display_name: String,
    ) -> Result<MentionInsertionDto, FfiError> {
        let insertion = self.with_engine(|engine| engine.insert_mention(user_id, &display_name))?;
        Ok(MentionInsertionDto {
            at: to_u32(insertion.at),
            text: insertion.text,
            caret: to_u32(insertion.caret),
        })
    }

    pub fn on_before_edit(&self, start: u32, count: u32) -> Result<(), FfiError> {
        Ok(self.with_engine(|engine| engine.on_before_edit(start as usize, count as usize))?)
    }

    pub fn on_after_edit(&self, start: u32, inserted: u32) -> Result<(), FfiError> {
        Ok(self.with_engine(|engine| engine.on_after_edit(start as usize, inserted as usize))?)
    }

    pub fn on_text_committed(&self, text: String) -> Result<(), FfiError> {
        Ok(self.with_engine(|engine| engine.on_text_committed(&text))?)
    }

    /// Returns the selection the app must apply instead of the requested one.
    pub fn on_selection_change(&self, start: u32, end: u32) -> SelectionDto {
        let corrected =
            self.with_engine(|engine| engine.on_selection_change(start as usize, end as usize));
        SelectionDto {
            start: to_u32(corrected.start),
            end: to_u32(corrected.end),
        }
    }

    pub fn on_backspace(&self, start: u32, end: u32) -> BackspaceDto {
        self.with_engine(|engine| engine.on_backspace(start as usize, end as usize))
            .into()
    }

    pub fn on_click(&self) -> bool {
        self.with_engine(MentionEngine::on_click)
    }

    /// Text to send, every mention replaced by `@<user_id> `.
    pub fn serialize_for_send(&self, buffer: String) -> Result<String, FfiError> {
        Ok(self.engine().serialize_for_send(&buffer)?)
    }

    /// Mentions in buffer order.
    pub fn spans(&self) -> Vec<SpanDto> {
        self.engine().spans().map(SpanDto::from).collect()
    }

    pub fn highlights(&self) -> Vec<HighlightDto> {
        self.engine()
            .highlights()
            .iter()
            .map(HighlightDto::from)
            .collect()
    }

    pub fn persisted_spans(&self) -> Vec<PersistedSpanDto> {
        self.engine()
            .spans()
            .map(|span| to_persisted(span).into())
            .collect()
    }

    pub fn load_persisted_spans(
        &self,
        buffer: String,
        records: Vec<PersistedSpanDto>,
    ) -> LoadReportDto {
        self.with_engine(|engine| {
            engine.load_persisted_spans(&buffer, records.into_iter().map(PersistedSpan::from))
        })
        .into()
    }

    /// Mentions as a JSON array of persisted records.
    pub fn persisted_json(&self) -> Result<String, FfiError> {
        records_to_json(self.engine().spans()).map_err(|e| FfiError::MalformedRecords {
            reason: e.to_string(),
        })
    }

    pub fn load_persisted_json(&self, buffer: String, json: String) -> Result<LoadReportDto, FfiError> {
        let records = records_from_json(&json).map_err(|e| FfiError::MalformedRecords {
            reason: e.to_string(),
        })?;
        Ok(self
            .with_engine(|engine| engine.load_persisted_spans(&buffer, records))
            .into())
    }

    /// Rebuild the buffer from a received exchange string. The app must show the returned text.
    pub fn load_exchange(&self, exchange: String, directory: Arc<dyn UserDirectory>) -> ExchangeLoadDto {
        // Ask the directory before locking, it is foreign code too
        let mut names = HashMap::new();
        parse_exchange(&exchange, "@", |user_id| {
            names
                .entry(user_id)
                .or_insert_with(|| directory.display_name(user_id))
                .clone()
        });
        let (text, report) = self.with_engine(|engine| {
            engine.load_exchange(&exchange, |user_id| names.get(&user_id).cloned().flatten())
        });
        ExchangeLoadDto {
            text,
            report: report.into(),
        }
    }

    pub fn reset_text(&self, text: String) {
        self.with_engine(|engine| engine.reset_text(&text));
    }

    pub fn prune_degenerate(&self) -> u32 {
        to_u32(self.with_engine(MentionEngine::prune_degenerate))
    }

    /// Text to actually insert for typed or pasted `source`, `None` when the field is full.
    pub fn filter_input(&self, source: String, replaced_start: u32, replaced_end: u32) -> Option<String> {
        let replaced = replaced_start as usize..replaced_end as usize;
        self.with_engine(|engine| match engine.filter_input(&source, replaced) {
            Filtered::Accept => Some(source.clone()),
            Filtered::Truncate(kept) => Some(kept.to_string()),
            Filtered::Reject => None,
        })
    }
}

// ============ DTOs ============

/// Engine limits. `max_buffer_length` of `None` means unlimited.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct ConfigDto {
    pub max_mention_count: u32,
    pub max_buffer_length: Option<u32>,
    pub trigger_rule: String,
}

impl From<ConfigDto> for MentionConfig {
    fn from(config: ConfigDto) -> Self {
        Self {
            max_mention_count: config.max_mention_count as usize,
            max_buffer_length: config.max_buffer_length.map(|max| max as usize),
            trigger_rule: config.trigger_rule,
        }
    }
}

/// Defaults of the engine: five mentions, no length limit, `@` trigger.
#[uniffi::export]
pub fn default_config() -> ConfigDto {
    let config = MentionConfig::default();
    ConfigDto {
        max_mention_count: to_u32(config.max_mention_count),
        max_buffer_length: config.max_buffer_length.map(to_u32),
        trigger_rule: config.trigger_rule,
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct MentionInsertionDto {
    pub at: u32,
    pub text: String,
    pub caret: u32,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct SelectionDto {
    pub start: u32,
    pub end: u32,
}

/// What the app does with a backspace key press.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct BackspaceDto {
    /// Suppress the default deletion
    pub handled: bool,
    /// Select this range before the default deletion runs
    pub selection: Option<SelectionDto>,
}

impl From<BackspaceOutcome> for BackspaceDto {
    fn from(outcome: BackspaceOutcome) -> Self {
        Self {
            handled: outcome.handled,
            selection: outcome.selection.map(|range| SelectionDto {
                start: to_u32(range.start),
                end: to_u32(range.end),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct SpanDto {
    pub user_id: i64,
    pub display_text: String,
    pub trigger: String,
    pub start: u32,
    pub end: u32,
    /// "normal", "marked" or "clear"
    pub state: String,
}

impl From<&Span> for SpanDto {
    fn from(span: &Span) -> Self {
        let state = match span.state {
            MentionState::Normal => "normal",
            MentionState::Marked => "marked",
            MentionState::Clear => "clear",
        };
        Self {
            user_id: span.user_id,
            display_text: span.display_text.clone(),
            trigger: span.trigger.clone(),
            start: to_u32(span.start),
            end: to_u32(span.end),
            state: state.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct HighlightDto {
    pub start: u32,
    pub end: u32,
    pub user_id: i64,
    /// Draw as selected (the mention is about to be deleted)
    pub selected: bool,
}

impl From<&Highlight> for HighlightDto {
    fn from(highlight: &Highlight) -> Self {
        Self {
            start: to_u32(highlight.range.start),
            end: to_u32(highlight.range.end),
            user_id: highlight.user_id,
            selected: highlight.kind == HighlightKind::Selected,
        }
    }
}

/// Flat record stored with a draft.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct PersistedSpanDto {
    pub flag: i32,
    pub rule: String,
    pub user_id: i64,
    pub user_name: String,
    pub start_pos: i64,
    pub end_pos: i64,
}

impl From<PersistedSpan> for PersistedSpanDto {
    fn from(record: PersistedSpan) -> Self {
        Self {
            flag: record.flag,
            rule: record.rule,
            user_id: record.user_id,
            user_name: record.user_name,
            start_pos: record.start_pos,
            end_pos: record.end_pos,
        }
    }
}

impl From<PersistedSpanDto> for PersistedSpan {
    fn from(record: PersistedSpanDto) -> Self {
        Self {
            flag: record.flag,
            rule: record.rule,
            user_id: record.user_id,
            user_name: record.user_name,
            start_pos: record.start_pos,
            end_pos: record.end_pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct SkippedSpanDto {
    /// Position of the record in the loaded list
    pub index: u32,
    pub user_id: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct LoadReportDto {
    pub loaded: u32,
    pub skipped: Vec<SkippedSpanDto>,
}

impl From<LoadReport> for LoadReportDto {
    fn from(report: LoadReport) -> Self {
        Self {
            loaded: to_u32(report.loaded),
            skipped: report
                .skipped
                .into_iter()
                .map(|skipped| SkippedSpanDto {
                    index: to_u32(skipped.index),
                    user_id: skipped.user_id,
                    reason: skipped.error.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct ExchangeLoadDto {
    /// Text the app must put in the field
    pub text: String,
    pub report: LoadReportDto,
}
