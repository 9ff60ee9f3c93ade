//! Persisted byte form of attributed text.
//!
//! # Responsibility
//! - Encode `AttributedText` into a versioned JSON envelope and back.
//! - Recover from unreadable blobs without failing the surrounding note.
//!
//! # Invariants
//! - `decode(encode(t)) == t` for every valid value, bit-exact for colors,
//!   font sizes and flags.
//! - Lenient decoding never fails; unreadable input becomes empty text.
//!
//! # Wire format
//! `{"version":1,"text":"...","runs":[{"len":N,"style":{...}}]}` where `len`
//! counts UTF-16 code units and runs are listed in text order.

use crate::model::attributed_text::{AttributedText, TextError};
use crate::model::run::StyleRun;
use crate::model::style::StyleAttributes;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Envelope version written by this build.
pub const CODEC_VERSION: u32 = 1;

/// Errors from encoding or strict decoding.
#[derive(Debug)]
pub enum CodecError {
    /// Serializer failure while encoding.
    Encode(serde_json::Error),
    /// Blob cannot be parsed or violates the run invariants.
    Corrupt(String),
    /// Blob was written by a newer, unknown envelope version.
    UnsupportedVersion(u32),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode attributed text: {err}"),
            Self::Corrupt(message) => write!(f, "corrupt attributed text blob: {message}"),
            Self::UnsupportedVersion(version) => write!(
                f,
                "attributed text blob version {version} is newer than supported {CODEC_VERSION}"
            ),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Corrupt(_) => None,
            Self::UnsupportedVersion(_) => None,
        }
    }
}

impl From<TextError> for CodecError {
    fn from(value: TextError) -> Self {
        Self::Corrupt(value.to_string())
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    text: &'a str,
    runs: Vec<WireRunRef<'a>>,
}

#[derive(Serialize)]
struct WireRunRef<'a> {
    len: usize,
    style: &'a StyleAttributes,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    text: String,
    #[serde(default)]
    runs: Vec<WireRun>,
}

#[derive(Deserialize)]
struct WireRun {
    len: usize,
    style: StyleAttributes,
}

/// Encodes `text` into its persisted byte form.
///
/// # Errors
/// - `Corrupt` when a run carries a non-finite or non-positive font size,
///   which JSON cannot carry losslessly.
/// - `Encode` on serializer failure.
pub fn encode(text: &AttributedText) -> Result<Vec<u8>, CodecError> {
    if let Some(run) = text.runs().iter().find(|run| !run.style.has_valid_font_size()) {
        return Err(CodecError::Corrupt(format!(
            "run {:?} has unsupported font size {}",
            run.range, run.style.font_size
        )));
    }
    let envelope = EnvelopeRef {
        version: CODEC_VERSION,
        text: text.text(),
        runs: text
            .runs()
            .iter()
            .map(|run| WireRunRef {
                len: run.len(),
                style: &run.style,
            })
            .collect(),
    };
    serde_json::to_vec(&envelope).map_err(CodecError::Encode)
}

/// Strictly decodes a blob produced by [`encode`].
///
/// Zero-length input decodes to empty text; an envelope without runs decodes
/// to `text` styled with `default_style`.
///
/// # Errors
/// - `Corrupt` for unparsable input or run lists that do not partition text.
/// - `UnsupportedVersion` for envelopes newer than [`CODEC_VERSION`].
pub fn try_decode(
    bytes: &[u8],
    default_style: &StyleAttributes,
) -> Result<AttributedText, CodecError> {
    if bytes.is_empty() {
        return Ok(AttributedText::empty());
    }

    let envelope: Envelope = serde_json::from_slice(bytes).map_err(|err| {
        CodecError::Corrupt(format!(
            "{:?} error at line {} column {}",
            err.classify(),
            err.line(),
            err.column()
        ))
    })?;
    if envelope.version > CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion(envelope.version));
    }
    if envelope.runs.is_empty() {
        return Ok(AttributedText::from_plain_text(envelope.text, *default_style));
    }

    let mut cursor = 0usize;
    let mut runs = Vec::with_capacity(envelope.runs.len());
    for wire in envelope.runs {
        if !wire.style.has_valid_font_size() {
            return Err(CodecError::Corrupt(format!(
                "unsupported font size {}",
                wire.style.font_size
            )));
        }
        let end = cursor
            .checked_add(wire.len)
            .ok_or_else(|| CodecError::Corrupt("run length overflow".to_string()))?;
        runs.push(StyleRun {
            range: cursor..end,
            style: wire.style,
        });
        cursor = end;
    }
    Ok(AttributedText::from_runs(envelope.text, runs)?)
}

/// Leniently decodes `bytes` with the default style for attributeless input.
pub fn decode(bytes: &[u8]) -> AttributedText {
    decode_with_default(bytes, &StyleAttributes::default())
}

/// Leniently decodes `bytes`; never fails.
///
/// Anything that is not a readable envelope is logged and replaced by empty
/// text so the owning note stays usable.
pub fn decode_with_default(bytes: &[u8], default_style: &StyleAttributes) -> AttributedText {
    match try_decode(bytes, default_style) {
        Ok(text) => text,
        Err(err) => {
            // Error text carries parser positions and run ranges only.
            warn!(
                "event=content_decode module=codec status=recovered blob_len={} error={}",
                bytes.len(),
                err
            );
            AttributedText::empty()
        }
    }
}
