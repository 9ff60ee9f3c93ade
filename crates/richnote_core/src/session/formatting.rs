//! Formatting session over one note's content.
//!
//! # Responsibility
//! - Track selection, typing attributes and staged edits for one editing
//!   surface.
//! - Turn toggle/color/size actions and text-change events into new
//!   `AttributedText` values.
//!
//! # Invariants
//! - The selection always lies inside the content and on char boundaries.
//! - A caret never mutates stored runs; it only updates typing attributes.
//! - Staged edits never touch content until `apply_pending`.
//! - Every returned state is resolved from the content after the action.

use crate::config::EditorConfig;
use crate::model::attributed_text::AttributedText;
use crate::model::selection::Selection;
use crate::model::style::{Rgba, StyleAttributes};
use crate::model::utf16;
use crate::session::state::{resolve_state, FormattingState};
use log::{debug, warn};
use std::ops::Range;

/// Immediate formatting command from the toolbar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormatAction {
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    /// `None` removes the color.
    SetTextColor(Option<Rgba>),
    SetBackgroundColor(Option<Rgba>),
    /// Signed number of font steps relative to the selection baseline.
    AdjustFontSize(i32),
}

/// Result of one session call.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOutcome {
    /// New content to publish; `None` when text and runs are unchanged.
    pub content: Option<AttributedText>,
    pub state: FormattingState,
}

impl FormatOutcome {
    pub fn changed(&self) -> bool {
        self.content.is_some()
    }
}

/// Partial style override; `None` fields keep the existing value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct StylePatch {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    font_size: Option<f64>,
    text_color: Option<Option<Rgba>>,
    background_color: Option<Option<Rgba>>,
}

impl StylePatch {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply(&self, style: &StyleAttributes) -> StyleAttributes {
        StyleAttributes {
            bold: self.bold.unwrap_or(style.bold),
            italic: self.italic.unwrap_or(style.italic),
            underline: self.underline.unwrap_or(style.underline),
            font_size: self.font_size.unwrap_or(style.font_size),
            text_color: self.text_color.unwrap_or(style.text_color),
            background_color: self.background_color.unwrap_or(style.background_color),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct StagedEdits {
    font_delta: i32,
    text_color: Option<Rgba>,
    background_color: Option<Rgba>,
}

/// Editing session bound to one note's content.
#[derive(Debug, Clone)]
pub struct FormattingSession {
    config: EditorConfig,
    content: AttributedText,
    selection: Selection,
    typing: StyleAttributes,
    staged: StagedEdits,
}

impl FormattingSession {
    /// Opens a session with the caret at the end of `content`.
    pub fn new(content: AttributedText, config: EditorConfig) -> Self {
        let selection = Selection::caret(content.len());
        let typing = content.typing_attributes_at(selection.start(), &config.default_style);
        Self {
            config,
            content,
            selection,
            typing,
            staged: StagedEdits::default(),
        }
    }

    pub fn content(&self) -> &AttributedText {
        &self.content
    }

    pub fn into_content(self) -> AttributedText {
        self.content
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Style stamped on the next inserted text.
    pub fn typing_attributes(&self) -> &StyleAttributes {
        &self.typing
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Current display state for the selection.
    pub fn state(&self) -> FormattingState {
        resolve_state(
            &self.content,
            self.selection,
            &self.typing,
            self.staged.font_delta,
        )
    }

    /// Moves the selection, clamping out-of-range offsets.
    ///
    /// Reporting the current selection again is a no-op that keeps typing
    /// attributes toggled at the caret.
    pub fn select(&mut self, selection: Selection) -> FormattingState {
        let clamped = Selection::from(self.content.clamp_range(selection.range()));
        if clamped != selection {
            debug!(
                "event=selection_clamped module=session requested={:?} applied={:?} len={}",
                selection.range(),
                clamped.range(),
                self.content.len()
            );
        }
        if clamped != self.selection {
            self.selection = clamped;
            self.typing = self.derive_typing();
        }
        self.state()
    }

    /// Applies one toolbar action to the selection, or to typing attributes
    /// at a caret.
    pub fn apply(&mut self, action: FormatAction) -> FormatOutcome {
        let state = self.state();
        let patch = match action {
            FormatAction::ToggleBold => StylePatch {
                bold: Some(state.bold.toggled()),
                ..StylePatch::default()
            },
            FormatAction::ToggleItalic => StylePatch {
                italic: Some(state.italic.toggled()),
                ..StylePatch::default()
            },
            FormatAction::ToggleUnderline => StylePatch {
                underline: Some(state.underline.toggled()),
                ..StylePatch::default()
            },
            FormatAction::SetTextColor(color) => StylePatch {
                text_color: Some(color),
                ..StylePatch::default()
            },
            FormatAction::SetBackgroundColor(color) => StylePatch {
                background_color: Some(color),
                ..StylePatch::default()
            },
            FormatAction::AdjustFontSize(0) => StylePatch::default(),
            FormatAction::AdjustFontSize(steps) => StylePatch {
                font_size: Some(self.config.stepped_font_size(state.font_size, steps)),
                ..StylePatch::default()
            },
        };
        let outcome = self.commit(patch);
        debug!(
            "event=format_apply module=session action={:?} caret={} changed={}",
            action,
            self.selection.is_caret(),
            outcome.changed()
        );
        outcome
    }

    /// Stages `steps` font steps; applied by `apply_pending`.
    pub fn stage_font_step(&mut self, steps: i32) -> FormattingState {
        self.staged.font_delta = self.staged.font_delta.saturating_add(steps);
        self.state()
    }

    /// Stages a picked text color; applied by `apply_pending`.
    pub fn stage_text_color(&mut self, color: Rgba) -> FormattingState {
        self.staged.text_color = Some(color);
        self.state()
    }

    /// Stages a picked background color; applied by `apply_pending`.
    pub fn stage_background_color(&mut self, color: Rgba) -> FormattingState {
        self.staged.background_color = Some(color);
        self.state()
    }

    /// Applies all staged edits in one range application, then resets them.
    pub fn apply_pending(&mut self) -> FormatOutcome {
        let staged = std::mem::take(&mut self.staged);
        if staged == StagedEdits::default() {
            return self.unchanged();
        }

        let baseline = self.state().font_size;
        let patch = StylePatch {
            font_size: (staged.font_delta != 0)
                .then(|| self.config.stepped_font_size(baseline, staged.font_delta)),
            text_color: staged.text_color.map(Some),
            background_color: staged.background_color.map(Some),
            ..StylePatch::default()
        };
        let outcome = self.commit(patch);
        debug!(
            "event=format_apply_pending module=session font_delta={} text_color={} background_color={} changed={}",
            staged.font_delta,
            staged.text_color.is_some(),
            staged.background_color.is_some(),
            outcome.changed()
        );
        outcome
    }

    /// Drops staged edits without touching content.
    pub fn discard_pending(&mut self) -> FormattingState {
        self.staged = StagedEdits::default();
        self.state()
    }

    /// Replaces `range` with `replacement` (one keystroke or paste).
    ///
    /// Inserted text takes the typing attributes; the caret moves to the end
    /// of the insertion.
    pub fn edit(&mut self, range: Range<usize>, replacement: &str) -> FormatOutcome {
        let range = self.content.clamp_range(range);
        if range.is_empty() && replacement.is_empty() {
            return self.unchanged();
        }

        let updated = match self
            .content
            .replace_text(range.clone(), replacement, &self.typing)
        {
            Ok(updated) => updated,
            Err(err) => {
                warn!(
                    "event=text_edit module=session status=error range={:?} error={}",
                    range, err
                );
                return self.unchanged();
            }
        };

        self.selection = Selection::caret(range.start + utf16::len(replacement));
        if replacement.is_empty() {
            self.typing = self.derive_typing();
        }
        if updated == self.content {
            return self.unchanged();
        }
        self.content = updated;
        self.changed()
    }

    /// Handles a whole-text change notification from the surface.
    ///
    /// Only the window between the common prefix and suffix is treated as
    /// edited. Reporting the current text again is a no-op.
    pub fn replace_all_text(&mut self, new_text: &str) -> FormatOutcome {
        let old = self.content.text();
        if old == new_text {
            return self.unchanged();
        }

        let prefix: usize = old
            .chars()
            .zip(new_text.chars())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
        let (old_rest, new_rest) = (&old[prefix..], &new_text[prefix..]);
        let suffix: usize = old_rest
            .chars()
            .rev()
            .zip(new_rest.chars().rev())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();

        let start = utf16::len(&old[..prefix]);
        let end = start + utf16::len(&old_rest[..old_rest.len() - suffix]);
        let replacement = &new_rest[..new_rest.len() - suffix];
        self.edit(start..end, replacement)
    }

    fn commit(&mut self, patch: StylePatch) -> FormatOutcome {
        if patch.is_empty() {
            return self.unchanged();
        }
        if self.selection.is_caret() {
            self.typing = patch.apply(&self.typing);
            return self.unchanged();
        }

        match self
            .content
            .apply_over_range(self.selection.range(), |style| patch.apply(style))
        {
            Ok(updated) if updated != self.content => {
                self.content = updated;
                self.typing = self.derive_typing();
                self.changed()
            }
            Ok(_) => self.unchanged(),
            Err(err) => {
                warn!(
                    "event=format_apply module=session status=error range={:?} error={}",
                    self.selection.range(),
                    err
                );
                self.unchanged()
            }
        }
    }

    fn derive_typing(&self) -> StyleAttributes {
        if self.selection.is_caret() {
            return self
                .content
                .typing_attributes_at(self.selection.start(), &self.config.default_style);
        }
        self.content
            .attributes_at(self.selection.start())
            .copied()
            .unwrap_or(self.config.default_style)
    }

    fn changed(&self) -> FormatOutcome {
        FormatOutcome {
            content: Some(self.content.clone()),
            state: self.state(),
        }
    }

    fn unchanged(&self) -> FormatOutcome {
        FormatOutcome {
            content: None,
            state: self.state(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FormatAction, FormattingSession};
    use crate::config::EditorConfig;
    use crate::model::attributed_text::AttributedText;
    use crate::model::selection::Selection;
    use crate::model::style::StyleAttributes;

    fn session(text: &str) -> FormattingSession {
        FormattingSession::new(
            AttributedText::from_plain_text(text, StyleAttributes::default()),
            EditorConfig::default(),
        )
    }

    #[test]
    fn new_session_places_caret_at_end() {
        let session = session("Hello");
        assert_eq!(session.selection(), Selection::caret(5));
    }

    #[test]
    fn zero_font_steps_are_a_no_op() {
        let mut session = session("Hello");
        session.select(Selection::new(0, 5));
        let outcome = session.apply(FormatAction::AdjustFontSize(0));
        assert!(!outcome.changed());
    }

    #[test]
    fn select_clamps_past_end() {
        let mut session = session("Hello");
        session.select(Selection::new(3, 40));
        assert_eq!(session.selection(), Selection::new(3, 5));
    }

    #[test]
    fn deletion_rederives_typing_attributes() {
        let mut session = session("ab");
        session.select(Selection::new(1, 2));
        session.apply(FormatAction::ToggleBold);
        session.select(Selection::caret(2));
        assert!(session.typing_attributes().bold);

        session.edit(1..2, "");
        assert!(!session.typing_attributes().bold);
    }
}
