//! Display state resolved from a selection.

use crate::model::attributed_text::AttributedText;
use crate::model::selection::Selection;
use crate::model::style::{Rgba, StyleAttributes};

/// Value of one boolean attribute across a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleState {
    Off,
    On,
    /// Runs in the selection disagree.
    Mixed,
}

impl ToggleState {
    fn from_bool(value: bool) -> Self {
        if value {
            Self::On
        } else {
            Self::Off
        }
    }

    fn merge(self, value: bool) -> Self {
        match (self, value) {
            (Self::On, true) | (Self::Off, false) => self,
            _ => Self::Mixed,
        }
    }

    /// Value a toggle action applies: mixed and off turn on, on turns off.
    pub fn toggled(self) -> bool {
        match self {
            Self::On => false,
            Self::Off | Self::Mixed => true,
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

/// Snapshot of formatting state shown by the editing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormattingState {
    pub bold: ToggleState,
    pub italic: ToggleState,
    pub underline: ToggleState,
    /// Shared concrete color, `None` when absent or not shared.
    pub text_color: Option<Rgba>,
    pub background_color: Option<Rgba>,
    /// Size of the first selected run; baseline for size steps.
    pub font_size: f64,
    /// Staged font steps not yet applied.
    pub pending_font_delta: i32,
}

impl FormattingState {
    pub fn is_bold(&self) -> bool {
        self.bold.is_on()
    }

    pub fn is_italic(&self) -> bool {
        self.italic.is_on()
    }

    pub fn is_underlined(&self) -> bool {
        self.underline.is_on()
    }

    fn uniform(style: &StyleAttributes, pending_font_delta: i32) -> Self {
        Self {
            bold: ToggleState::from_bool(style.bold),
            italic: ToggleState::from_bool(style.italic),
            underline: ToggleState::from_bool(style.underline),
            text_color: style.text_color,
            background_color: style.background_color,
            font_size: style.font_size,
            pending_font_delta,
        }
    }
}

/// Resolves display state of `selection` over `content`.
///
/// A caret (or a selection over empty text) reports the typing attributes.
pub(crate) fn resolve_state(
    content: &AttributedText,
    selection: Selection,
    typing: &StyleAttributes,
    pending_font_delta: i32,
) -> FormattingState {
    let mut runs = content.runs_in(selection.range());
    let first = match (selection.is_caret(), runs.next()) {
        (false, Some(first)) => first,
        _ => return FormattingState::uniform(typing, pending_font_delta),
    };

    let mut state = FormattingState::uniform(&first.style, pending_font_delta);
    for run in runs {
        state.bold = state.bold.merge(run.style.bold);
        state.italic = state.italic.merge(run.style.italic);
        state.underline = state.underline.merge(run.style.underline);
        if state.text_color != run.style.text_color {
            state.text_color = None;
        }
        if state.background_color != run.style.background_color {
            state.background_color = None;
        }
    }
    state
}
