use std::ops::Range;

use crate::editing::store::SpanStore;

/// Correct a requested selection so neither end sits strictly inside a mention.
///
/// A caret inside a mention jumps to the mention's end. A range selection
/// grows outward to cover any mention it would otherwise cut. Correction is
/// suspended while a mention is in `Clear`, so the pending atomic delete can
/// select it. Running this on its own output returns the same range.
pub fn correct_selection(store: &SpanStore, selection: Range<usize>) -> Range<usize> {
    let (mut start, mut end) = if selection.start <= selection.end {
        (selection.start, selection.end)
    } else {
        (selection.end, selection.start)
    };

    if store.has_clear() {
        return start..end;
    }

    if start == end {
        return match store.find(|span| span.contains_strictly(start)) {
            Some(span) => span.end..span.end,
            None => start..end,
        };
    }

    for span in store.all() {
        if span.contains_strictly(end) {
            end = span.end;
        }
        if span.contains_strictly(start) {
            start = span.start;
        }
    }

    start..end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MentionState, Span};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// "Hi @alice and @bob " with spans [3,10) and [14,19)
    fn two_mentions() -> SpanStore {
        let mut store = SpanStore::default();
        store.add(Span::mention(1, "@", "alice", 3)).unwrap();
        store.add(Span::mention(2, "@", "bob", 14)).unwrap();
        store
    }

    #[rstest]
    #[case(0..0, 0..0)]
    #[case(3..3, 3..3)]
    #[case(4..4, 10..10)]
    #[case(9..9, 10..10)]
    #[case(10..10, 10..10)]
    #[case(16..16, 19..19)]
    fn test_caret(#[case] requested: Range<usize>, #[case] expected: Range<usize>) {
        assert_eq!(correct_selection(&two_mentions(), requested), expected);
    }

    #[rstest]
    #[case(0..5, 0..10)]
    #[case(5..12, 3..12)]
    #[case(5..16, 3..19)]
    #[case(3..10, 3..10)]
    #[case(0..20, 0..20)]
    #[case(11..13, 11..13)]
    fn test_range(#[case] requested: Range<usize>, #[case] expected: Range<usize>) {
        assert_eq!(correct_selection(&two_mentions(), requested), expected);
    }

    #[test]
    fn test_reversed_selection_is_normalized() {
        let reversed = Range { start: 12, end: 5 };
        assert_eq!(correct_selection(&two_mentions(), reversed), 3..12);
    }

    #[test]
    fn test_correction_suspended_while_clear() {
        let mut store = two_mentions();
        store.find_mut(|span| span.user_id == 1).unwrap().state = MentionState::Clear;

        assert_eq!(correct_selection(&store, 5..5), 5..5);
        assert_eq!(correct_selection(&store, 5..16), 5..16);
    }

    #[test]
    fn test_marked_does_not_suspend_correction() {
        let mut store = two_mentions();
        store.find_mut(|span| span.user_id == 1).unwrap().state = MentionState::Marked;
        assert_eq!(correct_selection(&store, 5..5), 10..10);
    }

    #[rstest]
    #[case(4..4)]
    #[case(5..16)]
    #[case(0..9)]
    #[case(15..18)]
    fn test_idempotent(#[case] requested: Range<usize>) {
        let store = two_mentions();
        let once = correct_selection(&store, requested);
        let twice = correct_selection(&store, once.clone());
        assert_eq!(once, twice);
    }
}
