//! Offset adjustment of mention spans around a single buffer edit.
//!
//! Both passes touch every span independently, so the result does not
//! depend on the order spans are visited in.

use std::ops::Range;

use log::debug;

use crate::editing::store::SpanStore;
use crate::models::{Span, UserId};

/// Kind of buffer mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insert,
    Delete,
}

/// Describes one buffer mutation without owning any text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditDescriptor {
    pub kind: EditKind,
    pub position: usize,
    pub length: usize,
}

impl EditDescriptor {
    pub fn insert(position: usize, length: usize) -> Self {
        Self {
            kind: EditKind::Insert,
            position,
            length,
        }
    }

    pub fn delete(position: usize, length: usize) -> Self {
        Self {
            kind: EditKind::Delete,
            position,
            length,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.position..self.position + self.length
    }
}

/// What a pass did to the store
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Adjustment {
    pub removed: Vec<Span>,
    pub shifted: usize,
}

impl Adjustment {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.shifted == 0
    }
}

/// Run the pass matching `edit`
pub fn apply(store: &mut SpanStore, edit: EditDescriptor) -> Adjustment {
    match edit.kind {
        EditKind::Delete => apply_pre_edit(store, edit.position, edit.length),
        EditKind::Insert => apply_post_edit(store, edit.position, edit.length),
    }
}

/// Before `count` units at `start` are deleted.
///
/// Spans wholly inside the deleted range are removed, spans starting after
/// `start` move left. Partially overlapping spans are not truncated here.
pub fn apply_pre_edit(store: &mut SpanStore, start: usize, count: usize) -> Adjustment {
    if count == 0 {
        return Adjustment::default();
    }

    let deleted = start..start + count;
    let removed = store.take_where(|span| span.is_within(&deleted));
    for span in &removed {
        debug!(
            "pre-edit: mention of user {} at {:?} deleted",
            span.user_id,
            span.range()
        );
    }

    let mut shifted = 0;
    for span in store.iter_mut() {
        if span.start > start {
            span.shift_left(count);
            shifted += 1;
        }
    }

    Adjustment { removed, shifted }
}

/// After `count` units were inserted at `start`: spans at or after it move right
pub fn apply_post_edit(store: &mut SpanStore, start: usize, count: usize) -> Adjustment {
    if count == 0 {
        return Adjustment::default();
    }

    let mut shifted = 0;
    for span in store.iter_mut() {
        if span.start >= start {
            span.shift_right(count);
            shifted += 1;
        }
    }

    Adjustment {
        removed: Vec::new(),
        shifted,
    }
}

/// Spans an edit of `range` would cut through without swallowing them.
///
/// An empty `range` is a pure insertion and cuts the spans it lands strictly inside.
pub fn partially_overlapping(store: &SpanStore, range: &Range<usize>) -> Vec<UserId> {
    store
        .all()
        .filter(|span| {
            if range.is_empty() {
                span.contains_strictly(range.start)
            } else {
                span.overlaps(range) && !span.is_within(range)
            }
        })
        .map(|span| span.user_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// "Hi @alice and @bob " with spans [3,10) and [14,19)
    fn two_mentions() -> SpanStore {
        let mut store = SpanStore::default();
        store.add(Span::mention(1, "@", "alice", 3)).unwrap();
        store.add(Span::mention(2, "@", "bob", 14)).unwrap();
        store
    }

    fn ranges(store: &SpanStore) -> Vec<Range<usize>> {
        store.all().map(Span::range).collect()
    }

    #[rstest]
    #[case(0, 2, vec![5..12, 16..21])]
    #[case(3, 1, vec![4..11, 15..20])]
    #[case(10, 4, vec![3..10, 18..23])]
    #[case(19, 3, vec![3..10, 14..19])]
    #[case(5, 0, vec![3..10, 14..19])]
    fn test_post_edit_shifts_spans_at_or_after_insertion(
        #[case] at: usize,
        #[case] count: usize,
        #[case] expected: Vec<Range<usize>>,
    ) {
        let mut store = two_mentions();
        apply_post_edit(&mut store, at, count);
        assert_eq!(ranges(&store), expected);
    }

    #[test]
    fn test_pre_edit_removes_fully_contained_span() {
        let mut store = two_mentions();
        let adjustment = apply_pre_edit(&mut store, 3, 7);

        assert_eq!(adjustment.removed.len(), 1);
        assert_eq!(adjustment.removed[0].user_id, 1);
        assert_eq!(ranges(&store), vec![7..12]);
    }

    #[test]
    fn test_pre_edit_removes_every_span_in_a_wide_deletion() {
        let mut store = two_mentions();
        let adjustment = apply_pre_edit(&mut store, 0, 19);
        assert_eq!(adjustment.removed.len(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_pre_edit_shifts_only_spans_after_start() {
        let mut store = two_mentions();
        apply_pre_edit(&mut store, 11, 2);
        assert_eq!(ranges(&store), vec![3..10, 12..17]);
    }

    #[test]
    fn test_pre_edit_does_not_truncate_partial_overlap() {
        let mut store = two_mentions();
        // cuts the tail of alice only
        let adjustment = apply_pre_edit(&mut store, 8, 4);
        assert!(adjustment.removed.is_empty());
        assert_eq!(ranges(&store), vec![3..10, 10..15]);
    }

    #[test]
    fn test_zero_count_is_noop() {
        let mut store = two_mentions();
        assert!(apply_pre_edit(&mut store, 3, 0).is_noop());
        assert!(apply_post_edit(&mut store, 3, 0).is_noop());
        assert_eq!(ranges(&store), vec![3..10, 14..19]);
    }

    #[test]
    fn test_partially_overlapping() {
        let store = two_mentions();
        assert_eq!(partially_overlapping(&store, &(8..12)), vec![1]);
        assert_eq!(partially_overlapping(&store, &(8..16)), vec![1, 2]);
        assert_eq!(partially_overlapping(&store, &(3..10)), Vec::<UserId>::new());
        assert_eq!(partially_overlapping(&store, &(10..14)), Vec::<UserId>::new());
    }

    #[rstest]
    #[case(5, vec![1])]
    #[case(15, vec![2])]
    #[case(3, vec![])]
    #[case(10, vec![])]
    #[case(12, vec![])]
    fn test_insertion_point_inside_span_cuts_it(
        #[case] at: usize,
        #[case] expected: Vec<UserId>,
    ) {
        let store = two_mentions();
        assert_eq!(partially_overlapping(&store, &(at..at)), expected);
    }

    #[test]
    fn test_apply_dispatches_on_kind() {
        let mut store = two_mentions();
        apply(&mut store, EditDescriptor::insert(0, 1));
        assert_eq!(ranges(&store), vec![4..11, 15..20]);
        apply(&mut store, EditDescriptor::delete(0, 1));
        assert_eq!(ranges(&store), vec![3..10, 14..19]);
    }
}
