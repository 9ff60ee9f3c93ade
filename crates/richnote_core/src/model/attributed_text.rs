//! Attributed text: a string plus the style runs that partition it.
//!
//! # Responsibility
//! - Own the canonical run representation of formatted note content.
//! - Provide pure range operations (apply style, splice text) that return a
//!   new value instead of mutating in place.
//!
//! # Invariants
//! - Runs are non-empty, ordered, contiguous and cover `[0, len)` exactly.
//! - Run boundaries never split a UTF-16 surrogate pair.
//! - Adjacent runs never carry equal styles.
//! - Empty text has zero runs.

use crate::model::run::{coalesce, StyleRun};
use crate::model::style::StyleAttributes;
use crate::model::utf16;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Errors from range-based attributed text operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    /// Range has `start > end`.
    InvalidRange { start: usize, end: usize },
    /// Offset or range end lies past the text length.
    OutOfRange { offset: usize, len: usize },
    /// Offset falls inside a surrogate pair.
    NotOnCharBoundary { offset: usize },
    /// A run list does not partition its text.
    InvalidRuns(String),
}

impl Display for TextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "invalid range {start}..{end}: start > end")
            }
            Self::OutOfRange { offset, len } => {
                write!(f, "offset {offset} out of range for text of length {len}")
            }
            Self::NotOnCharBoundary { offset } => {
                write!(f, "offset {offset} is not on a character boundary")
            }
            Self::InvalidRuns(message) => write!(f, "invalid style runs: {message}"),
        }
    }
}

impl Error for TextError {}

/// Formatted text owned by one note.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributedText {
    text: String,
    runs: Vec<StyleRun>,
    len: usize,
}

impl AttributedText {
    /// Empty text with no runs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// One run spanning all of `text`, or no run when `text` is empty.
    pub fn from_plain_text(text: impl Into<String>, style: StyleAttributes) -> Self {
        let text = text.into();
        let len = utf16::len(&text);
        let runs = if len == 0 {
            Vec::new()
        } else {
            vec![StyleRun::new(0..len, style)]
        };
        Self { text, runs, len }
    }

    /// Builds a value from explicit runs, coalescing style-equal neighbours.
    ///
    /// # Errors
    /// - `InvalidRuns` when the runs leave gaps, overlap, contain empty runs,
    ///   split a surrogate pair or do not match the text length.
    pub fn from_runs(text: impl Into<String>, runs: Vec<StyleRun>) -> Result<Self, TextError> {
        let text = text.into();
        let len = utf16::len(&text);
        check_partition(&text, len, &runs)?;
        Ok(Self {
            text,
            runs: coalesce(runs),
            len,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Style of the run containing `offset`.
    ///
    /// # Errors
    /// - `OutOfRange` when `offset >= len`.
    pub fn attributes_at(&self, offset: usize) -> Result<&StyleAttributes, TextError> {
        self.run_index_at(offset)
            .map(|index| &self.runs[index].style)
            .ok_or(TextError::OutOfRange {
                offset,
                len: self.len,
            })
    }

    /// Style that typing at `caret` should stamp on inserted characters.
    ///
    /// Uses the character before the caret, the first character when the
    /// caret is at the start, and `fallback` for empty text.
    pub fn typing_attributes_at(
        &self,
        caret: usize,
        fallback: &StyleAttributes,
    ) -> StyleAttributes {
        if self.is_empty() {
            return *fallback;
        }
        let offset = caret.saturating_sub(1).min(self.len - 1);
        self.attributes_at(offset).copied().unwrap_or(*fallback)
    }

    /// Runs sharing at least one offset with `range`, in order.
    pub fn runs_in(&self, range: Range<usize>) -> impl Iterator<Item = &StyleRun> + '_ {
        let first = self.runs.partition_point(|run| run.end() <= range.start);
        self.runs[first..]
            .iter()
            .take_while(move |run| run.start() < range.end)
    }

    /// Clamps `range` into `[0, len]`, orders its endpoints and floors them
    /// to character boundaries.
    pub fn clamp_range(&self, range: Range<usize>) -> Range<usize> {
        let (low, high) = if range.start <= range.end {
            (range.start, range.end)
        } else {
            (range.end, range.start)
        };
        let start = utf16::floor_char_boundary(&self.text, low.min(self.len));
        let end = utf16::floor_char_boundary(&self.text, high.min(self.len));
        start..end
    }

    /// Returns a copy where every run inside `range` has its style replaced
    /// by `mutator(old_style)`.
    ///
    /// Runs straddling either endpoint are split first and the result is
    /// coalesced. A caret range (`start == end`) changes nothing.
    ///
    /// # Errors
    /// - `InvalidRange`, `OutOfRange` or `NotOnCharBoundary` for a bad range.
    pub fn apply_over_range<F>(&self, range: Range<usize>, mutator: F) -> Result<Self, TextError>
    where
        F: Fn(&StyleAttributes) -> StyleAttributes,
    {
        self.validate_range(&range)?;
        if range.is_empty() {
            return Ok(self.clone());
        }

        let mut runs = Vec::with_capacity(self.runs.len() + 2);
        for run in &self.runs {
            if !run.intersects(&range) {
                runs.push(run.clone());
                continue;
            }
            if run.start() < range.start {
                runs.push(StyleRun::new(run.start()..range.start, run.style));
            }
            let inner = run.start().max(range.start)..run.end().min(range.end);
            runs.push(StyleRun::new(inner, mutator(&run.style)));
            if run.end() > range.end {
                runs.push(StyleRun::new(range.end..run.end(), run.style));
            }
        }

        Ok(Self {
            text: self.text.clone(),
            runs: coalesce(runs),
            len: self.len,
        })
    }

    /// Returns a copy with `range` replaced by `replacement`.
    ///
    /// Runs inside the deleted range are dropped, boundary runs are trimmed,
    /// and the inserted text becomes one run styled with `style`.
    ///
    /// # Errors
    /// - `InvalidRange`, `OutOfRange` or `NotOnCharBoundary` for a bad range.
    pub fn replace_text(
        &self,
        range: Range<usize>,
        replacement: &str,
        style: &StyleAttributes,
    ) -> Result<Self, TextError> {
        self.validate_range(&range)?;
        let byte_start = self.byte_offset(range.start)?;
        let byte_end = self.byte_offset(range.end)?;

        let mut text = String::with_capacity(
            self.text.len() - (byte_end - byte_start) + replacement.len(),
        );
        text.push_str(&self.text[..byte_start]);
        text.push_str(replacement);
        text.push_str(&self.text[byte_end..]);

        let inserted = utf16::len(replacement);
        let delta = inserted as isize - range.len() as isize;

        let mut before = Vec::new();
        let mut after = Vec::new();
        for run in &self.runs {
            if run.start() < range.start {
                before.push(StyleRun::new(
                    run.start()..run.end().min(range.start),
                    run.style,
                ));
            }
            if run.end() > range.end {
                let kept = StyleRun::new(run.start().max(range.end)..run.end(), run.style);
                after.push(kept.shifted(delta));
            }
        }

        let middle = (inserted > 0)
            .then(|| StyleRun::new(range.start..range.start + inserted, *style));
        let runs = coalesce(before.into_iter().chain(middle).chain(after));

        Ok(Self {
            len: self.len - range.len() + inserted,
            text,
            runs,
        })
    }

    /// Verifies every structural invariant of this value.
    ///
    /// # Errors
    /// - `InvalidRuns` describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), TextError> {
        if self.len != utf16::len(&self.text) {
            return Err(TextError::InvalidRuns(format!(
                "cached length {} does not match text length {}",
                self.len,
                utf16::len(&self.text)
            )));
        }
        check_partition(&self.text, self.len, &self.runs)?;
        for pair in self.runs.windows(2) {
            if pair[0].merges_with(&pair[1]) {
                return Err(TextError::InvalidRuns(format!(
                    "adjacent runs {:?} and {:?} share a style",
                    pair[0].range, pair[1].range
                )));
            }
        }
        Ok(())
    }

    fn run_index_at(&self, offset: usize) -> Option<usize> {
        if offset >= self.len {
            return None;
        }
        let index = self.runs.partition_point(|run| run.end() <= offset);
        (index < self.runs.len()).then_some(index)
    }

    fn validate_range(&self, range: &Range<usize>) -> Result<(), TextError> {
        if range.start > range.end {
            return Err(TextError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        if range.end > self.len {
            return Err(TextError::OutOfRange {
                offset: range.end,
                len: self.len,
            });
        }
        for offset in [range.start, range.end] {
            if !utf16::is_char_boundary(&self.text, offset) {
                return Err(TextError::NotOnCharBoundary { offset });
            }
        }
        Ok(())
    }

    fn byte_offset(&self, unit: usize) -> Result<usize, TextError> {
        utf16::byte_offset(&self.text, unit).ok_or(TextError::NotOnCharBoundary { offset: unit })
    }
}

fn check_partition(text: &str, len: usize, runs: &[StyleRun]) -> Result<(), TextError> {
    let mut cursor = 0;
    for run in runs {
        if run.is_empty() {
            return Err(TextError::InvalidRuns(format!(
                "empty run at {}",
                run.start()
            )));
        }
        if run.start() != cursor {
            return Err(TextError::InvalidRuns(format!(
                "run {:?} does not start at {cursor}",
                run.range
            )));
        }
        if !utf16::is_char_boundary(text, run.end()) {
            return Err(TextError::InvalidRuns(format!(
                "run {:?} ends inside a character",
                run.range
            )));
        }
        cursor = run.end();
    }
    if cursor != len {
        return Err(TextError::InvalidRuns(format!(
            "runs cover {cursor} code units, text has {len}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{AttributedText, TextError};
    use crate::model::run::StyleRun;
    use crate::model::style::StyleAttributes;

    fn plain() -> StyleAttributes {
        StyleAttributes::default()
    }

    fn bold() -> StyleAttributes {
        plain().with_bold(true)
    }

    #[test]
    fn empty_text_has_no_runs() {
        let text = AttributedText::from_plain_text("", plain());
        assert!(text.runs().is_empty());
        assert_eq!(text, AttributedText::empty());
        text.check_invariants().unwrap();
    }

    #[test]
    fn attributes_at_end_is_out_of_range() {
        let text = AttributedText::from_plain_text("abc", plain());
        assert_eq!(
            text.attributes_at(3).unwrap_err(),
            TextError::OutOfRange { offset: 3, len: 3 }
        );
    }

    #[test]
    fn typing_attributes_follow_previous_character() {
        let text = AttributedText::from_runs(
            "abcd",
            vec![StyleRun::new(0..2, bold()), StyleRun::new(2..4, plain())],
        )
        .unwrap();
        assert_eq!(text.typing_attributes_at(2, &plain()), bold());
        assert_eq!(text.typing_attributes_at(0, &plain()), bold());
        assert_eq!(text.typing_attributes_at(4, &bold()), plain());
        assert_eq!(
            AttributedText::empty().typing_attributes_at(0, &bold()),
            bold()
        );
    }

    #[test]
    fn from_runs_rejects_gaps() {
        let err = AttributedText::from_runs(
            "abcd",
            vec![StyleRun::new(0..1, bold()), StyleRun::new(2..4, plain())],
        )
        .unwrap_err();
        assert!(matches!(err, TextError::InvalidRuns(_)));
    }

    #[test]
    fn clamp_range_orders_and_snaps() {
        let text = AttributedText::from_plain_text("a😀b", plain());
        assert_eq!(text.clamp_range(9..0), 0..4);
        assert_eq!(text.clamp_range(2..3), 1..3);
    }

    #[test]
    fn apply_rejects_split_surrogate() {
        let text = AttributedText::from_plain_text("a😀b", plain());
        let err = text
            .apply_over_range(0..2, |style| style.with_bold(true))
            .unwrap_err();
        assert_eq!(err, TextError::NotOnCharBoundary { offset: 2 });
    }

    #[test]
    fn runs_in_returns_intersecting_runs() {
        let text = AttributedText::from_runs(
            "abcdef",
            vec![
                StyleRun::new(0..2, bold()),
                StyleRun::new(2..4, plain()),
                StyleRun::new(4..6, bold().with_italic(true)),
            ],
        )
        .unwrap();
        let hits: Vec<_> = text.runs_in(1..3).map(|run| run.range.clone()).collect();
        assert_eq!(hits, vec![0..2, 2..4]);
        assert_eq!(text.runs_in(4..4).count(), 0);
    }
}
