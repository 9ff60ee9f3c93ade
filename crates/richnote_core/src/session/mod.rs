//! Formatting session: selection-driven style editing.
//!
//! # Responsibility
//! - Resolve toggle/color/size display state over the current selection.
//! - Apply formatting actions and text edits as pure request/response calls.
//!
//! # Invariants
//! - Mixed attributes resolve to "on" when toggled.
//! - Session state is local to one editing surface and never persisted.

pub mod formatting;
pub mod state;

pub use formatting::{FormatAction, FormatOutcome, FormattingSession};
pub use state::{FormattingState, ToggleState};
