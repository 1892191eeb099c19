//! The YAML node model.
//!
//! A [`Node`] keeps everything a round trip needs besides the value itself:
//! comments, anchors, scalar and collection styles, explicit tags and the
//! source position. Nodes live in an [`Arena`](crate::arena::Arena) and
//! refer to each other through [`NodeId`](crate::arena::NodeId), which lets
//! aliases share (and cycle back to) the node that defines their anchor.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use base64::Engine as _;

use crate::arena::NodeId;
use crate::constants::{BINARY_TAG, LEGACY_BOOLS, MAP_TAG, NULL_TAG, SEQ_TAG, STR_TAG};
use crate::text::resolve::{needs_binary, ScalarStyle};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// The zero value. Encoding or decoding such a node is an error.
    #[default]
    Unknown,
    Document,
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Unknown => "unknown",
            NodeKind::Document => "document",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Scalar => "scalar",
            NodeKind::Alias => "alias",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Independent style flags. The empty set means plain scalars and block
/// collections.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style(u8);

impl Style {
    pub const TAGGED: Style = Style(1);
    pub const DOUBLE_QUOTED: Style = Style(1 << 1);
    pub const SINGLE_QUOTED: Style = Style(1 << 2);
    pub const LITERAL: Style = Style(1 << 3);
    pub const FOLDED: Style = Style(1 << 4);
    pub const FLOW: Style = Style(1 << 5);

    pub const fn empty() -> Self {
        Style(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Style) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn insert(&mut self, other: Style) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Style) {
        self.0 &= !other.0;
    }

    /// The quoting style these flags ask for. When several are set the
    /// block styles win over quotes.
    pub fn scalar_style(self) -> ScalarStyle {
        if self.contains(Style::LITERAL) {
            ScalarStyle::Literal
        } else if self.contains(Style::FOLDED) {
            ScalarStyle::Folded
        } else if self.contains(Style::DOUBLE_QUOTED) {
            ScalarStyle::DoubleQuoted
        } else if self.contains(Style::SINGLE_QUOTED) {
            ScalarStyle::SingleQuoted
        } else {
            ScalarStyle::Plain
        }
    }

    pub fn from_scalar_style(style: ScalarStyle) -> Self {
        match style {
            ScalarStyle::Plain => Style::empty(),
            ScalarStyle::SingleQuoted => Style::SINGLE_QUOTED,
            ScalarStyle::DoubleQuoted => Style::DOUBLE_QUOTED,
            ScalarStyle::Literal => Style::LITERAL,
            ScalarStyle::Folded => Style::FOLDED,
        }
    }
}

impl BitOr for Style {
    type Output = Style;

    fn bitor(self, rhs: Style) -> Style {
        Style(self.0 | rhs.0)
    }
}

impl BitOrAssign for Style {
    fn bitor_assign(&mut self, rhs: Style) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Style, &str); 6] = [
            (Style::TAGGED, "Tagged"),
            (Style::DOUBLE_QUOTED, "DoubleQuoted"),
            (Style::SINGLE_QUOTED, "SingleQuoted"),
            (Style::LITERAL, "Literal"),
            (Style::FOLDED, "Folded"),
            (Style::FLOW, "Flow"),
        ];
        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if names.is_empty() {
            f.write_str("Style()")
        } else {
            write!(f, "Style({})", names.join(" | "))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    kind: NodeKind,
    pub style: Style,
    pub tag: String,
    pub value: String,
    pub anchor: String,
    /// Target of an alias node. The target is owned by its structural parent.
    pub alias: Option<NodeId>,
    /// Mapping content alternates key and value.
    pub content: Vec<NodeId>,
    pub head_comment: String,
    pub line_comment: String,
    pub foot_comment: String,
    pub line: usize,
    pub column: usize,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn document() -> Self {
        Self::new(NodeKind::Document)
    }

    pub fn mapping() -> Self {
        Self {
            tag: MAP_TAG.to_string(),
            ..Self::new(NodeKind::Mapping)
        }
    }

    pub fn sequence() -> Self {
        Self {
            tag: SEQ_TAG.to_string(),
            ..Self::new(NodeKind::Sequence)
        }
    }

    pub fn scalar(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
            ..Self::new(NodeKind::Scalar)
        }
    }

    pub fn null() -> Self {
        Self::scalar(NULL_TAG, "null")
    }

    pub fn alias_of(target: NodeId) -> Self {
        Self {
            alias: Some(target),
            ..Self::new(NodeKind::Alias)
        }
    }

    /// A string scalar: multi-line text gets literal style, other text is
    /// left plain and quoted by the encoder when needed. Text holding
    /// unprintable characters becomes a byte string when it can, otherwise a
    /// double-quoted string.
    pub fn string(value: impl Into<String>) -> Self {
        let mut node = Self::new(NodeKind::Scalar);
        node.assign_string(value.into());
        node
    }

    /// A string scalar for a serialized value. Besides what [`Node::string`]
    /// does, YAML 1.1 booleans such as `yes` are double-quoted so older
    /// readers keep them strings.
    pub(crate) fn serialized_string(value: impl Into<String>) -> Self {
        let mut node = Self::string(value);
        if node.style.is_empty() && LEGACY_BOOLS.contains(&node.value.as_str()) {
            node.style = Style::DOUBLE_QUOTED;
        }
        node
    }

    /// A `!!binary` scalar. The bytes are kept one character per byte and
    /// written as base64.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::scalar(BINARY_TAG, bytes.iter().map(|&b| char::from(b)).collect::<String>())
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_document(&self) -> bool {
        self.kind == NodeKind::Document
    }

    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    pub fn is_alias(&self) -> bool {
        self.kind == NodeKind::Alias
    }

    pub fn is_flow(&self) -> bool {
        self.style.contains(Style::FLOW)
    }

    pub fn has_comments(&self) -> bool {
        !self.head_comment.is_empty() || !self.line_comment.is_empty() || !self.foot_comment.is_empty()
    }

    /// Replaces a scalar's text the way [`Node::string`] builds one.
    pub fn set_string(&mut self, value: impl Into<String>) -> Result<()> {
        if self.kind != NodeKind::Scalar {
            return Err(Error::invalid_node(format!(
                "cannot set a string on a {} node",
                self.kind
            )));
        }
        self.assign_string(value.into());
        Ok(())
    }

    fn assign_string(&mut self, value: String) {
        self.style = Style::empty();
        if needs_binary(&value) {
            if crate::text::resolve::requires_binary(&value) {
                self.tag = BINARY_TAG.to_string();
            } else {
                self.tag = STR_TAG.to_string();
                self.style = Style::DOUBLE_QUOTED;
            }
        } else {
            self.tag = STR_TAG.to_string();
            if value.contains('\n') {
                self.style = Style::LITERAL;
            }
        }
        self.value = value;
    }

    /// The raw bytes of a `!!binary` scalar.
    pub fn binary_bytes(&self) -> Option<Vec<u8>> {
        if self.kind != NodeKind::Scalar || self.tag != BINARY_TAG {
            return None;
        }
        Some(binary_value_bytes(&self.value))
    }

    /// The `!!binary` payload as base64 text.
    pub fn binary_base64(&self) -> Option<String> {
        self.binary_bytes()
            .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Builds the in-memory value of a `!!binary` scalar from its base64 text.
    pub(crate) fn decode_base64(text: &str) -> Result<String> {
        let compact: String = text.chars().filter(|ch| !ch.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|err| Error::deserialize(format!("invalid !!binary data: {err}")))?;
        Ok(bytes.iter().map(|&b| char::from(b)).collect())
    }
}

/// One byte per character when every character fits in a byte, UTF-8
/// otherwise.
pub(crate) fn binary_value_bytes(value: &str) -> Vec<u8> {
    if value.chars().all(|ch| (ch as u32) <= 0xFF) {
        value.chars().map(|ch| ch as u32 as u8).collect()
    } else {
        value.as_bytes().to_vec()
    }
}
