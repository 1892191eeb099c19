pub const NULL_TAG: &str = "!!null";
pub const BOOL_TAG: &str = "!!bool";
pub const INT_TAG: &str = "!!int";
pub const FLOAT_TAG: &str = "!!float";
pub const STR_TAG: &str = "!!str";
pub const TIMESTAMP_TAG: &str = "!!timestamp";
pub const BINARY_TAG: &str = "!!binary";
pub const MERGE_TAG: &str = "!!merge";
pub const MAP_TAG: &str = "!!map";
pub const SEQ_TAG: &str = "!!seq";

pub(crate) const LONG_TAG_PREFIX: &str = "tag:yaml.org,2002:";

pub const DEFAULT_INDENT: usize = 2;

/// Stored text of a comment line holding nothing but `#`. An empty line
/// inside stored comment text stands for a blank source line.
pub const EMPTY_COMMENT_LINE: &str = " ";

pub const MAX_DEPTH: usize = 256;

/// YAML 1.1 booleans that the core schema reads as strings. Serialized
/// strings spelled like this are double-quoted so older readers do not
/// turn them into booleans; decoded plain ones stay plain.
pub const LEGACY_BOOLS: &[&str] = &[
    "y", "Y", "yes", "Yes", "YES", "n", "N", "no", "No", "NO", "on", "On", "ON", "off", "Off",
    "OFF",
];

#[inline]
pub fn is_flow_indicator(ch: char) -> bool {
    matches!(ch, ',' | '[' | ']' | '{' | '}')
}

#[inline]
pub fn is_indicator(ch: char) -> bool {
    matches!(
        ch,
        '-' | '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\''
            | '"' | '%' | '@' | '`'
    )
}

#[inline]
pub fn is_core_tag(tag: &str) -> bool {
    matches!(
        tag,
        NULL_TAG | BOOL_TAG | INT_TAG | FLOAT_TAG | STR_TAG | TIMESTAMP_TAG | BINARY_TAG
            | MERGE_TAG | MAP_TAG | SEQ_TAG
    )
}

/// Shortens `tag:yaml.org,2002:str` to `!!str`; other tags pass through.
pub fn short_tag(tag: &str) -> String {
    match tag.strip_prefix(LONG_TAG_PREFIX) {
        Some(rest) => format!("!!{rest}"),
        None => tag.to_string(),
    }
}
