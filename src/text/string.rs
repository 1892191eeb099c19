use crate::constants::{is_flow_indicator, is_indicator};
use crate::text::resolve::is_printable;

/// Where a scalar is written; flow collections and mapping keys forbid
/// more characters in plain scalars than block values do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotingContext {
    Block,
    Flow,
    Key,
}

/// Whether `value` can be written as a plain scalar without changing its
/// text. Tag resolution is checked separately.
pub fn plain_allowed(value: &str, context: QuotingContext) -> bool {
    let mut chars = value.chars();
    let first = match chars.next() {
        Some(ch) => ch,
        None => return false,
    };
    let second = chars.next();
    if first.is_whitespace() || value.ends_with(|ch: char| ch.is_whitespace()) {
        return false;
    }
    if is_indicator(first) {
        let safe_follow = matches!(first, '-' | '?' | ':')
            && second.is_some_and(|ch| {
                !ch.is_whitespace() && !(context != QuotingContext::Block && is_flow_indicator(ch))
            });
        if !safe_follow {
            return false;
        }
    }
    if value.starts_with("---") || value.starts_with("...") {
        return false;
    }
    let in_flow = context != QuotingContext::Block;
    let mut prev = ' ';
    let mut iter = value.chars().peekable();
    while let Some(ch) = iter.next() {
        if !is_printable(ch) || matches!(ch, '\n' | '\r' | '\t' | '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}') {
            return false;
        }
        if ch == '#' && prev.is_whitespace() {
            return false;
        }
        if ch == ':' {
            match iter.peek() {
                None => return false,
                Some(next) if next.is_whitespace() => return false,
                Some(next) if in_flow && is_flow_indicator(*next) => return false,
                _ => {}
            }
        }
        if in_flow && is_flow_indicator(ch) {
            return false;
        }
        prev = ch;
    }
    true
}

/// Single quotes carry printable text. A line break is written as a break
/// plus an empty line, so it may not sit at either end of the text or next
/// to a space, which folding would drop.
pub fn single_quoted_allowed(value: &str) -> bool {
    let printable = value.chars().all(|ch| {
        is_printable(ch) && !matches!(ch, '\r' | '\t' | '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}')
    });
    if !printable {
        return false;
    }
    if !value.contains('\n') {
        return true;
    }
    !value.starts_with('\n')
        && !value.ends_with('\n')
        && !value.contains(" \n")
        && !value.contains("\n ")
}

/// Literal block scalars carry multi-line printable text as long as no line
/// is whitespace-only, which the block scalar reader would treat as an
/// indentation line.
pub fn literal_allowed(value: &str) -> bool {
    if !value.contains('\n') || value.trim_matches('\n').is_empty() {
        return false;
    }
    if value
        .chars()
        .any(|ch| !is_printable(ch) || matches!(ch, '\r' | '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}'))
    {
        return false;
    }
    value
        .split('\n')
        .all(|line| line.is_empty() || !line.chars().all(|ch| ch == ' ' || ch == '\t'))
}

pub fn escape_single_quoted_into(out: &mut String, value: &str) {
    for ch in value.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
}

pub fn escape_double_quoted_into(out: &mut String, value: &str) {
    let mut start = 0;
    for (idx, ch) in value.char_indices() {
        let escaped: Option<&str> = match ch {
            '\n' => Some("\\n"),
            '\r' => Some("\\r"),
            '\t' => Some("\\t"),
            '"' => Some("\\\""),
            '\\' => Some("\\\\"),
            '\0' => Some("\\0"),
            '\u{7}' => Some("\\a"),
            '\u{8}' => Some("\\b"),
            '\u{b}' => Some("\\v"),
            '\u{c}' => Some("\\f"),
            '\u{1b}' => Some("\\e"),
            '\u{85}' => Some("\\N"),
            '\u{a0}' => Some("\\_"),
            '\u{2028}' => Some("\\L"),
            '\u{2029}' => Some("\\P"),
            _ if is_printable(ch) && ch != '\u{FEFF}' => None,
            _ => {
                out.push_str(&value[start..idx]);
                push_hex_escape(out, ch);
                start = idx + ch.len_utf8();
                continue;
            }
        };
        if let Some(escaped) = escaped {
            out.push_str(&value[start..idx]);
            out.push_str(escaped);
            start = idx + ch.len_utf8();
        }
    }
    out.push_str(&value[start..]);
}

fn push_hex_escape(out: &mut String, ch: char) {
    let code = ch as u32;
    if code <= 0xFF {
        out.push_str(&format!("\\x{code:02X}"));
    } else if code <= 0xFFFF {
        out.push_str(&format!("\\u{code:04X}"));
    } else {
        out.push_str(&format!("\\U{code:08X}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("something simple", QuotingContext::Block, true)]
    #[case("-foo", QuotingContext::Block, true)]
    #[case("- foo", QuotingContext::Block, false)]
    #[case("-", QuotingContext::Block, false)]
    #[case("a: b", QuotingContext::Block, false)]
    #[case("a:b", QuotingContext::Block, true)]
    #[case("key:", QuotingContext::Block, false)]
    #[case("a #b", QuotingContext::Block, false)]
    #[case("a#b", QuotingContext::Block, true)]
    #[case("\"quoted value\"", QuotingContext::Block, false)]
    #[case("&anchor", QuotingContext::Block, false)]
    #[case(" padded", QuotingContext::Block, false)]
    #[case("padded ", QuotingContext::Block, false)]
    #[case("a,b", QuotingContext::Block, true)]
    #[case("a,b", QuotingContext::Flow, false)]
    #[case("[x]", QuotingContext::Key, false)]
    #[case("---", QuotingContext::Block, false)]
    #[case("multi\nline", QuotingContext::Block, false)]
    #[case("", QuotingContext::Block, false)]
    #[case("š", QuotingContext::Block, true)]
    fn test_plain_allowed(
        #[case] input: &str,
        #[case] context: QuotingContext,
        #[case] expected: bool,
    ) {
        assert_eq!(plain_allowed(input, context), expected);
    }

    #[rstest::rstest]
    #[case("\"quoted value\"", true)]
    #[case(" it's ", true)]
    #[case("a\nb", true)]
    #[case("a\n\nb", true)]
    #[case("\na", false)]
    #[case("a\n", false)]
    #[case("a \nb", false)]
    #[case("a\n b", false)]
    #[case("tab\there", false)]
    fn test_single_quoted_allowed(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(single_quoted_allowed(input), expected);
    }

    #[rstest::rstest]
    #[case("multi\nline", true)]
    #[case("multi\nline\n", true)]
    #[case("single", false)]
    #[case("\n\n", false)]
    #[case("a\n  \nb", false)]
    #[case("bell\u{7}\n", false)]
    fn test_literal_allowed(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(literal_allowed(input), expected);
    }

    #[rstest::rstest]
    fn escapes_double_quoted() {
        let mut out = String::new();
        escape_double_quoted_into(&mut out, "a\"b\\c\nd\u{1}e\u{feff}");
        assert_eq!(out, "a\\\"b\\\\c\\nd\\x01e\\uFEFF");
    }

    #[rstest::rstest]
    fn escapes_single_quoted() {
        let mut out = String::new();
        escape_single_quoted_into(&mut out, "it's");
        assert_eq!(out, "it''s");
    }
}
