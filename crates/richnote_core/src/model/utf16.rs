//! UTF-16 code unit offsets over UTF-8 strings.
//!
//! Editing surfaces report positions in UTF-16 code units while the text is
//! stored as a Rust `String`; these helpers translate between the two.

/// Number of UTF-16 code units needed to encode `text`.
pub fn len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

/// Byte index of UTF-16 offset `unit`.
///
/// Returns `None` when `unit` is past the end of `text` or falls inside a
/// surrogate pair.
pub fn byte_offset(text: &str, unit: usize) -> Option<usize> {
    let mut units = 0;
    for (index, ch) in text.char_indices() {
        if units == unit {
            return Some(index);
        }
        if units > unit {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == unit).then_some(text.len())
}

/// Returns whether `unit` lies on a character boundary of `text`.
pub fn is_char_boundary(text: &str, unit: usize) -> bool {
    byte_offset(text, unit).is_some()
}

/// Largest character boundary `<= unit`, clamped to the text length.
pub fn floor_char_boundary(text: &str, unit: usize) -> usize {
    let mut units = 0;
    for ch in text.chars() {
        let next = units + ch.len_utf16();
        if next > unit {
            return units;
        }
        units = next;
    }
    units
}

/// UTF-16 offset of byte index `byte`, which must be a char boundary.
pub fn unit_offset(text: &str, byte: usize) -> usize {
    len(&text[..byte])
}
