use crate::options::EncodeOptions;
use crate::text::string::{escape_double_quoted_into, escape_single_quoted_into};

/// Output buffer with cached indentation strings, one per depth.
pub(crate) struct Writer {
    buffer: String,
    indent_unit: String,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(options: &EncodeOptions) -> Self {
        // A compact `- ` needs two columns, and block scalar indentation
        // indicators are a single digit.
        let indent_unit = " ".repeat(options.indent.get_spaces().clamp(2, 9));
        Self {
            buffer: String::new(),
            indent_unit,
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn indent_width(&self) -> usize {
        self.indent_unit.len()
    }

    pub fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    pub fn write_char(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    pub fn write_newline(&mut self) {
        self.buffer.push('\n');
    }

    pub fn write_indent(&mut self, depth: usize) {
        if depth == 0 {
            return;
        }
        if depth >= self.indent_cache.len() {
            self.extend_indent_cache(depth);
        }
        self.buffer.push_str(&self.indent_cache[depth]);
    }

    /// Single-quoted text. Each line break becomes a break plus an empty
    /// line, and text resumes at `depth`.
    pub fn write_single_quoted(&mut self, s: &str, depth: usize) {
        self.buffer.push('\'');
        for (index, line) in s.split('\n').enumerate() {
            if index > 0 {
                self.write_newline();
            }
            if line.is_empty() {
                continue;
            }
            if index > 0 {
                self.write_newline();
                self.write_indent(depth);
            }
            escape_single_quoted_into(&mut self.buffer, line);
        }
        self.buffer.push('\'');
    }

    pub fn write_double_quoted(&mut self, s: &str) {
        self.buffer.push('"');
        escape_double_quoted_into(&mut self.buffer, s);
        self.buffer.push('"');
    }

    /// Writes a comment block, one `#` line per text line. Empty text lines
    /// become blank lines; whitespace-only ones a bare `#`.
    pub fn write_comment_block(&mut self, text: &str, depth: usize) {
        for line in text.split('\n') {
            if !line.is_empty() {
                self.write_indent(depth);
                self.write_comment_text(line);
            }
            self.write_newline();
        }
    }

    /// ` # text` after a token; a multi-line comment is folded onto the line.
    pub fn write_line_comment(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.buffer.push(' ');
        self.write_comment_text(&text.replace('\n', " "));
    }

    /// `# text` at the cursor.
    pub fn write_comment_text(&mut self, line: &str) {
        self.buffer.push('#');
        if !line.trim().is_empty() {
            self.buffer.push(' ');
            self.buffer.push_str(line);
        }
    }

    fn extend_indent_cache(&mut self, depth: usize) {
        while self.indent_cache.len() <= depth {
            let next = match self.indent_cache.last() {
                Some(prev) => {
                    let mut s = String::with_capacity(prev.len() + self.indent_unit.len());
                    s.push_str(prev);
                    s.push_str(&self.indent_unit);
                    s
                }
                None => String::new(),
            };
            self.indent_cache.push(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Indent;

    #[rstest::rstest]
    fn test_writer_basic() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_str("hello");
        writer.write_char(' ');
        writer.write_str("world");
        assert_eq!(writer.finish(), "hello world");
    }

    #[rstest::rstest]
    fn test_write_indent() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_indent(0);
        writer.write_str("a");
        writer.write_newline();
        writer.write_indent(1);
        writer.write_str("b");
        writer.write_newline();
        writer.write_indent(2);
        writer.write_str("c");
        assert_eq!(writer.finish(), "a\n  b\n    c");
    }

    #[rstest::rstest]
    #[case(1, 2)]
    #[case(2, 2)]
    #[case(4, 4)]
    #[case(12, 9)]
    fn test_indent_width_is_clamped(#[case] spaces: usize, #[case] expected: usize) {
        let options = EncodeOptions::new().with_indent(Indent::spaces(spaces));
        assert_eq!(Writer::new(&options).indent_width(), expected);
    }

    #[rstest::rstest]
    fn test_comment_block() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_comment_block("one\n\ntwo", 1);
        assert_eq!(writer.finish(), "  # one\n\n  # two\n");
    }

    #[rstest::rstest]
    fn test_empty_comment_lines_keep_their_marker() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_comment_block("a\n \nb", 0);
        writer.write_str("k: v");
        writer.write_line_comment(" ");
        assert_eq!(writer.finish(), "# a\n#\n# b\nk: v #");
    }

    #[rstest::rstest]
    fn test_line_comment() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_str("a: 1");
        writer.write_line_comment("note");
        writer.write_line_comment("");
        assert_eq!(writer.finish(), "a: 1 # note");
    }

    #[rstest::rstest]
    fn test_quoting() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_double_quoted("say \"hi\"");
        writer.write_char(' ');
        writer.write_single_quoted("it's", 0);
        assert_eq!(writer.finish(), r#""say \"hi\"" 'it''s'"#);
    }

    #[rstest::rstest]
    fn test_single_quoted_line_breaks() {
        let mut writer = Writer::new(&EncodeOptions::default());
        writer.write_single_quoted("one\ntwo\n\nthree", 1);
        assert_eq!(writer.finish(), "'one\n\n  two\n\n\n  three'");
    }
}
