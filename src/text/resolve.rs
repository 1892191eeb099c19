//! Implicit tag resolution for scalars.
//!
//! The decoder asks which tag a scalar carries when the source wrote none;
//! the encoder asks the same question to decide whether a tag or quoting is
//! needed for the text to come back with the tag it has now.

use crate::constants::{
    BOOL_TAG, FLOAT_TAG, INT_TAG, MERGE_TAG, NULL_TAG, STR_TAG, TIMESTAMP_TAG,
};
use crate::num::number::{is_int_literal, parse_float};

/// How a scalar was (or will be) written; only plain scalars are subject to
/// implicit typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// Resolves the core-schema tag of a scalar written in `style`. Non-plain
/// scalars are always strings.
pub fn resolve(value: &str, style: ScalarStyle) -> &'static str {
    if style != ScalarStyle::Plain {
        return STR_TAG;
    }
    resolve_plain(value)
}

pub fn resolve_plain(value: &str) -> &'static str {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return NULL_TAG,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return BOOL_TAG,
        "<<" => return MERGE_TAG,
        _ => {}
    }
    let first = value.as_bytes()[0];
    if first.is_ascii_digit() || matches!(first, b'-' | b'+' | b'.') {
        if is_int_literal(value) {
            return INT_TAG;
        }
        if parse_float(value).is_some() {
            return FLOAT_TAG;
        }
        if is_timestamp(value) {
            return TIMESTAMP_TAG;
        }
    }
    STR_TAG
}

/// Untagged text that only survives a round trip as `!!binary`: it holds
/// characters a YAML stream cannot carry, and every character fits in a
/// byte, so the value reads as a byte string.
pub fn requires_binary(value: &str) -> bool {
    needs_binary(value) && value.chars().all(|ch| (ch as u32) <= 0xFF)
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Text a YAML stream cannot carry verbatim: C0 controls other than tab and
/// line breaks, DEL, C1 controls other than NEL, and the non-characters.
pub fn needs_binary(value: &str) -> bool {
    value.chars().any(|ch| !is_printable(ch))
}

pub fn is_printable(ch: char) -> bool {
    match ch {
        '\t' | '\n' | '\r' => true,
        '\u{20}'..='\u{7E}' => true,
        '\u{85}' => true,
        '\u{A0}'..='\u{D7FF}' => true,
        '\u{E000}'..='\u{FFFD}' => ch != '\u{FEFF}',
        '\u{10000}'..='\u{10FFFF}' => true,
        _ => false,
    }
}

/// `YYYY-M-D`, optionally followed by `T` or spaces, `H:MM:SS`, a fraction
/// and a zone.
pub fn is_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    if !take_digits(bytes, &mut i, 4, 4) || !take(bytes, &mut i, b'-') {
        return false;
    }
    if !take_digits(bytes, &mut i, 1, 2) || !take(bytes, &mut i, b'-') {
        return false;
    }
    if !take_digits(bytes, &mut i, 1, 2) {
        return false;
    }
    if i == bytes.len() {
        return true;
    }
    if matches!(bytes[i], b'T' | b't') {
        i += 1;
    } else {
        let start = i;
        while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
            i += 1;
        }
        if i == start {
            return false;
        }
    }
    if !take_digits(bytes, &mut i, 1, 2) || !take(bytes, &mut i, b':') {
        return false;
    }
    if !take_digits(bytes, &mut i, 2, 2) || !take(bytes, &mut i, b':') {
        return false;
    }
    if !take_digits(bytes, &mut i, 2, 2) {
        return false;
    }
    if take(bytes, &mut i, b'.') {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    if i == bytes.len() {
        return true;
    }
    if bytes[i] == b'Z' {
        return i + 1 == bytes.len();
    }
    if !matches!(bytes[i], b'+' | b'-') {
        return false;
    }
    i += 1;
    if !take_digits(bytes, &mut i, 1, 2) {
        return false;
    }
    if take(bytes, &mut i, b':') && !take_digits(bytes, &mut i, 2, 2) {
        return false;
    }
    i == bytes.len()
}

fn take(bytes: &[u8], i: &mut usize, expected: u8) -> bool {
    if bytes.get(*i) == Some(&expected) {
        *i += 1;
        true
    } else {
        false
    }
}

fn take_digits(bytes: &[u8], i: &mut usize, min: usize, max: usize) -> bool {
    let start = *i;
    while *i < bytes.len() && *i - start < max && bytes[*i].is_ascii_digit() {
        *i += 1;
    }
    *i - start >= min
}
