use crate::error::MentionError;
use crate::models::config::DEFAULT_MAX_MENTIONS;
use crate::models::{MentionState, Span, UserId};

/// Every mention currently present in the buffer.
///
/// Spans are kept in insertion order; [`SpanStore::all`] sorts on demand
/// because offsets change on nearly every keystroke.
#[derive(Debug, Clone)]
pub struct SpanStore {
    spans: Vec<Span>,
    limit: usize,
}

impl Default for SpanStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MENTIONS)
    }
}

impl SpanStore {
    pub fn new(limit: usize) -> Self {
        Self {
            spans: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Lowering the limit keeps existing spans; only later additions fail
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.spans.len() >= self.limit
    }

    pub fn contains_user(&self, user_id: UserId) -> bool {
        self.spans.iter().any(|span| span.user_id == user_id)
    }

    /// Add a span, enforcing the store invariants
    pub fn add(&mut self, span: Span) -> Result<(), MentionError> {
        if self.is_full() {
            return Err(MentionError::LimitExceeded { max: self.limit });
        }
        if self.contains_user(span.user_id) {
            return Err(MentionError::DuplicateUser {
                user_id: span.user_id,
            });
        }
        if span.start > span.end {
            return Err(MentionError::invalid_range(
                span.start..span.end,
                "span ends before it starts",
            ));
        }
        if let Some(other) = self.spans.iter().find(|other| other.overlaps(&span.range())) {
            return Err(MentionError::invalid_range(
                span.range(),
                format!("overlaps the mention of user {}", other.user_id),
            ));
        }
        if span.state.is_flagged() && self.flagged().is_some() {
            return Err(MentionError::invalid_range(
                span.range(),
                "another mention is already selected for deletion",
            ));
        }

        self.spans.push(span);
        Ok(())
    }

    /// Remove the span for `user_id`
    pub fn remove(&mut self, user_id: UserId) -> Option<Span> {
        let index = self.spans.iter().position(|span| span.user_id == user_id)?;
        Some(self.spans.remove(index))
    }

    /// First span in buffer order matching `predicate`
    pub fn find(&self, predicate: impl Fn(&Span) -> bool) -> Option<&Span> {
        self.all().find(|span| predicate(span))
    }

    pub(crate) fn find_mut(&mut self, predicate: impl Fn(&Span) -> bool) -> Option<&mut Span> {
        self.spans.iter_mut().find(|span| predicate(span))
    }

    /// All spans ordered by start offset, ties in insertion order.
    ///
    /// The iterator can be cloned to restart it.
    pub fn all(&self) -> std::vec::IntoIter<&Span> {
        let mut ordered: Vec<&Span> = self.spans.iter().collect();
        ordered.sort_by_key(|span| span.start);
        ordered.into_iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Span> {
        self.spans.iter_mut()
    }

    /// Remove and return every span matching `predicate`, keeping the order of the rest
    pub(crate) fn take_where(&mut self, predicate: impl Fn(&Span) -> bool) -> Vec<Span> {
        let (taken, kept): (Vec<Span>, Vec<Span>) = std::mem::take(&mut self.spans)
            .into_iter()
            .partition(|span| predicate(span));
        self.spans = kept;
        taken
    }

    /// Keep only spans matching `predicate`, returns how many were dropped
    pub fn retain(&mut self, predicate: impl Fn(&Span) -> bool) -> usize {
        let before = self.spans.len();
        self.spans.retain(|span| predicate(span));
        before - self.spans.len()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// The span currently taking part in an atomic delete, if any
    pub fn flagged(&self) -> Option<&Span> {
        self.spans.iter().find(|span| span.state.is_flagged())
    }

    pub fn has_clear(&self) -> bool {
        self.spans
            .iter()
            .any(|span| span.state == MentionState::Clear)
    }
}
