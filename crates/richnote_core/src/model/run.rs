//! Style runs and the split/merge utilities that keep run lists canonical.

use crate::model::style::StyleAttributes;
use std::ops::Range;

/// A maximal sub-range of text sharing one style.
///
/// Offsets are UTF-16 code units. A stored run is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRun {
    pub range: Range<usize>,
    pub style: StyleAttributes,
}

impl StyleRun {
    pub fn new(range: Range<usize>, style: StyleAttributes) -> Self {
        debug_assert!(range.start < range.end, "empty style run {range:?}");
        Self { range, style }
    }

    pub fn start(&self) -> usize {
        self.range.start
    }

    pub fn end(&self) -> usize {
        self.range.end
    }

    pub fn len(&self) -> usize {
        self.range.end - self.range.start
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.range.contains(&offset)
    }

    /// Returns whether this run shares at least one offset with `range`.
    pub fn intersects(&self, range: &Range<usize>) -> bool {
        self.range.start < range.end && range.start < self.range.end
    }

    /// Splits at an interior `offset`, both halves keeping this style.
    ///
    /// Returns `None` when `offset` is not strictly inside the run.
    pub fn split_at(&self, offset: usize) -> Option<(StyleRun, StyleRun)> {
        if offset <= self.range.start || offset >= self.range.end {
            return None;
        }
        Some((
            StyleRun::new(self.range.start..offset, self.style),
            StyleRun::new(offset..self.range.end, self.style),
        ))
    }

    /// Returns whether `next` starts where this run ends with an equal style.
    pub fn merges_with(&self, next: &StyleRun) -> bool {
        self.range.end == next.range.start && self.style == next.style
    }

    /// Copy of this run moved by `delta` code units.
    pub(crate) fn shifted(&self, delta: isize) -> StyleRun {
        let move_offset = |offset: usize| offset.checked_add_signed(delta).unwrap_or(0);
        StyleRun::new(
            move_offset(self.range.start)..move_offset(self.range.end),
            self.style,
        )
    }
}

/// Merges every adjacent, style-equal pair and drops empty runs.
pub fn coalesce(runs: impl IntoIterator<Item = StyleRun>) -> Vec<StyleRun> {
    let mut merged: Vec<StyleRun> = Vec::new();
    for run in runs {
        if run.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.merges_with(&run) => last.range.end = run.range.end,
            _ => merged.push(run),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{coalesce, StyleRun};
    use crate::model::style::StyleAttributes;

    fn plain() -> StyleAttributes {
        StyleAttributes::default()
    }

    fn bold() -> StyleAttributes {
        StyleAttributes::default().with_bold(true)
    }

    #[test]
    fn split_at_interior_offset_keeps_style() {
        let run = StyleRun::new(2..6, bold());
        let (left, right) = run.split_at(4).unwrap();
        assert_eq!(left, StyleRun::new(2..4, bold()));
        assert_eq!(right, StyleRun::new(4..6, bold()));
    }

    #[test]
    fn split_at_edges_is_rejected() {
        let run = StyleRun::new(2..6, bold());
        assert!(run.split_at(2).is_none());
        assert!(run.split_at(6).is_none());
        assert!(run.split_at(9).is_none());
    }

    #[test]
    fn coalesce_merges_equal_neighbours_only() {
        let runs = vec![
            StyleRun::new(0..1, plain()),
            StyleRun::new(1..3, plain()),
            StyleRun::new(3..4, bold()),
            StyleRun::new(4..6, bold()),
            StyleRun::new(6..7, plain()),
        ];
        assert_eq!(
            coalesce(runs),
            vec![
                StyleRun::new(0..3, plain()),
                StyleRun::new(3..6, bold()),
                StyleRun::new(6..7, plain()),
            ]
        );
    }

    #[test]
    fn intersects_is_half_open() {
        let run = StyleRun::new(2..4, plain());
        assert!(run.intersects(&(3..10)));
        assert!(!run.intersects(&(4..10)));
        assert!(!run.intersects(&(0..2)));
    }
}
