use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed YAML text.
    #[error("syntax error")]
    Syntax,
    /// An alias names an anchor that was never defined in the document.
    #[error("undefined anchor")]
    UndefinedAnchor,
    /// Strict mode only: a mapping repeats a key.
    #[error("duplicate key")]
    DuplicateKey,
    /// Strict mode only: a typed decode met a field the target does not declare.
    #[error("unknown field")]
    UnknownField,
    /// A node whose kind was never set reached the encoder or decoder.
    #[error("unknown node kind")]
    UnknownNodeKind,
    /// A typed decode target cannot hold the node's resolved value.
    #[error("type mismatch")]
    TypeMismatch,
    /// Node construction violated a structural invariant.
    #[error("invalid node")]
    InvalidNode,
    /// Expanding aliases would produce far more nodes than the document holds.
    #[error("excessive aliasing")]
    ExcessiveAliasing,
    #[error("json error")]
    Json,
    #[error("io error")]
    Io,
    #[error("serialize error")]
    Serialize,
    #[error("deserialize error")]
    Deserialize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
    /// Index of the failing document when decoding a multi-document stream.
    pub document: Option<usize>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.document {
            write!(f, "document {index}: ")?;
        }
        write!(f, "{}", self.kind)?;
        if let Some(location) = self.location {
            write!(f, " at {location}")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
            document: None,
        }
    }

    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(ErrorKind::Syntax, message).at(line, column)
    }

    pub fn undefined_anchor(name: &str) -> Self {
        Self::new(ErrorKind::UndefinedAnchor, format!("unknown anchor '{name}' referenced"))
    }

    pub fn duplicate_key(key: &str) -> Self {
        Self::new(ErrorKind::DuplicateKey, format!("key {key:?} already set in map"))
    }

    pub fn unknown_field(field: &str) -> Self {
        Self::new(ErrorKind::UnknownField, format!("unknown field {field:?}"))
    }

    pub fn unknown_node_kind() -> Self {
        Self::new(ErrorKind::UnknownNodeKind, "node kind was never set")
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch, message)
    }

    pub fn invalid_node(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNode, message)
    }

    pub fn excessive_aliasing() -> Self {
        Self::new(ErrorKind::ExcessiveAliasing, "document contains excessive aliasing")
    }

    pub fn json(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Json, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn serialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialize, message)
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialize, message)
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        if line > 0 {
            self.location = Some(Location::new(line, column));
        }
        self
    }

    pub fn in_document(mut self, index: usize) -> Self {
        self.document = Some(index);
        self
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        // serde_json already renders its own position into the message
        Error::json(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn display_includes_kind_location_and_document() {
        let err = Error::syntax("did not find expected key", 3, 5).in_document(1);
        assert_eq!(
            err.to_string(),
            "document 1: syntax error at line 3 column 5: did not find expected key"
        );
    }

    #[rstest::rstest]
    fn display_without_location() {
        let err = Error::unknown_node_kind();
        assert_eq!(
            err.to_string(),
            "unknown node kind: node kind was never set"
        );
        assert!(err.is(ErrorKind::UnknownNodeKind));
    }

    #[rstest::rstest]
    fn zero_line_leaves_location_unset() {
        let err = Error::undefined_anchor("x").at(0, 0);
        assert!(err.location.is_none());
    }
}
