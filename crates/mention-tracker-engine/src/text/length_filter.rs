use std::ops::Range;

use crate::text::utf16;

/// What the host should do with a piece of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtered<'a> {
    /// Insert the input unchanged
    Accept,
    /// Insert only this prefix of the input
    Truncate(&'a str),
    /// Drop the input, the buffer is full
    Reject,
}

impl<'a> Filtered<'a> {
    /// The text to actually insert for `source`
    pub fn apply(self, source: &'a str) -> &'a str {
        match self {
            Filtered::Accept => source,
            Filtered::Truncate(kept) => kept,
            Filtered::Reject => "",
        }
    }
}

/// Caps the buffer length, cutting input at character boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthFilter {
    max: usize,
}

impl LengthFilter {
    pub fn new(max: usize) -> Self {
        Self { max }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Filter `source` about to replace `replaced` in a buffer of `dest_len` units
    pub fn filter<'a>(
        &self,
        source: &'a str,
        dest_len: usize,
        replaced: Range<usize>,
    ) -> Filtered<'a> {
        if source.is_empty() {
            return Filtered::Accept;
        }

        let remaining = dest_len.saturating_sub(replaced.len());
        let keep = self.max.saturating_sub(remaining);
        if keep == 0 {
            return Filtered::Reject;
        }
        if keep >= utf16::utf16_len(source) {
            return Filtered::Accept;
        }

        match utf16::truncate(source, keep) {
            "" => Filtered::Reject,
            kept => Filtered::Truncate(kept),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abc", 5, 0..0, Filtered::Accept)]
    #[case("abcdef", 5, 0..0, Filtered::Truncate("abcde"))]
    #[case("abc", 8, 0..0, Filtered::Truncate("ab"))]
    #[case("abc", 10, 0..0, Filtered::Reject)]
    #[case("abc", 10, 2..5, Filtered::Accept)]
    #[case("", 10, 0..0, Filtered::Accept)]
    fn test_filter(
        #[case] source: &str,
        #[case] dest_len: usize,
        #[case] replaced: Range<usize>,
        #[case] expected: Filtered<'static>,
    ) {
        let filter = LengthFilter::new(10);
        assert_eq!(filter.filter(source, dest_len, replaced), expected);
    }

    #[test]
    fn test_truncation_never_splits_surrogate_pair() {
        let filter = LengthFilter::new(10);
        // one unit left: the crab needs two
        assert_eq!(filter.filter("🦀x", 9, 0..0), Filtered::Reject);
        assert_eq!(filter.filter("a🦀", 8, 0..0), Filtered::Truncate("a"));
    }

    #[test]
    fn test_apply() {
        assert_eq!(Filtered::Accept.apply("abc"), "abc");
        assert_eq!(Filtered::Truncate("ab").apply("abc"), "ab");
        assert_eq!(Filtered::Reject.apply("abc"), "");
    }
}
