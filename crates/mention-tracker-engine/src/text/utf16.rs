use std::ops::Range;

/// Length of `text` in UTF-16 code units
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte index of a UTF-16 offset.
///
/// Returns `None` past the end of `text` or when the offset falls between
/// the two halves of a surrogate pair.
pub fn byte_index(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units == offset {
            return Some(index);
        }
        units += ch.len_utf16();
        if units > offset {
            return None;
        }
    }
    (units == offset).then_some(text.len())
}

/// Slice `text` by a UTF-16 range
pub fn slice(text: &str, range: Range<usize>) -> Option<&str> {
    if range.start > range.end {
        return None;
    }
    let start = byte_index(text, range.start)?;
    let end = byte_index(text, range.end)?;
    text.get(start..end)
}

/// Width in code units of the character ending at `offset`, if any
pub fn char_len_before(text: &str, offset: usize) -> Option<usize> {
    let index = byte_index(text, offset)?;
    text[..index].chars().next_back().map(char::len_utf16)
}

/// Longest prefix of `text` fitting in `budget` code units
pub fn truncate(text: &str, budget: usize) -> &str {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        units += ch.len_utf16();
        if units > budget {
            return &text[..index];
        }
    }
    text
}
