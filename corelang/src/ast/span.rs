//! Byte-offset source locations

use serde::{Deserialize, Serialize};

/// Half-open byte range `start..end` into the program text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A syntax node together with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_covers_both() {
        assert_eq!(Span::new(4, 9).merge(Span::new(0, 2)), Span::new(0, 9));
        assert_eq!(Span::new(3, 3).merge(Span::new(3, 8)), Span::new(3, 8));
    }

    #[test]
    fn test_display_is_range_syntax() {
        assert_eq!(Span::new(12, 20).to_string(), "12..20");
    }

    #[test]
    fn test_into_range_for_diagnostics() {
        let range: std::ops::Range<usize> = Span::new(5, 11).into();
        assert_eq!(range, 5..11);
    }

    #[test]
    fn test_spanned_keeps_location() {
        let name = Spanned::new("counter".to_string(), Span::new(10, 17));
        assert_eq!(name.node, "counter");
        assert_eq!(name.span.end - name.span.start, name.node.len());
    }
}
