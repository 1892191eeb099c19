#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub fn get_spaces(self) -> usize {
        let Indent::Spaces(count) = self;
        count.max(1)
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(crate::constants::DEFAULT_INDENT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    pub indent: Indent,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }
}

/// Decode policy. Loose decoding lets the last duplicate key win; strict
/// decoding rejects duplicate keys and unknown struct fields.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub strict: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn defaults() {
        assert_eq!(EncodeOptions::default().indent, Indent::Spaces(2));
        assert!(!DecodeOptions::default().strict);
        assert!(DecodeOptions::strict().strict);
    }

    #[rstest::rstest]
    fn zero_indent_is_clamped() {
        assert_eq!(Indent::spaces(0).get_spaces(), 1);
        assert_eq!(
            EncodeOptions::new().with_indent(Indent::spaces(4)).indent,
            Indent::Spaces(4)
        );
    }
}
