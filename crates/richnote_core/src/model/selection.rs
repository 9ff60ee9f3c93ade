//! Selection ranges reported by the editing surface.

use std::ops::Range;

/// Selected UTF-16 range; `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Selection {
    start: usize,
    end: usize,
}

impl Selection {
    /// Creates a selection, ordering reversed endpoints.
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self {
            start: anchor.min(focus),
            end: anchor.max(focus),
        }
    }

    pub fn caret(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Selection {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

#[cfg(test)]
mod tests {
    use super::Selection;

    #[test]
    fn reversed_endpoints_are_ordered() {
        let selection = Selection::new(5, 2);
        assert_eq!(selection.range(), 2..5);
        assert!(!selection.is_caret());
        assert!(Selection::caret(3).is_caret());
    }
}
