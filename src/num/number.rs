/// Integer parsed from a plain scalar. Values outside `i64` fall back to `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedInt {
    Signed(i64),
    Unsigned(u64),
}

pub fn format_i64(value: i64) -> String {
    let mut buffer = itoa::Buffer::new();
    buffer.format(value).to_string()
}

pub fn format_u64(value: u64) -> String {
    let mut buffer = itoa::Buffer::new();
    buffer.format(value).to_string()
}

/// Formats a float with YAML spellings for the non-finite values.
///
/// The result always resolves back to `!!float`: `ryu` keeps a `.0` or an
/// exponent on integral values.
pub fn format_f64(value: f64) -> String {
    if value.is_nan() {
        return ".nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }
    let mut buffer = ryu::Buffer::new();
    buffer.format_finite(value).to_string()
}

/// Lossless whole-number view of a float, used when JSON numbers are folded
/// back into integers.
pub fn whole_f64(value: f64) -> Option<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

/// Parses the integer forms the resolver accepts: optional sign, then
/// decimal without leading zeros, `0o` octal, `0x` hex or `0b` binary.
pub fn parse_int(text: &str) -> Option<ParsedInt> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    if body.is_empty() {
        return None;
    }
    let (radix, digits) = if let Some(rest) = body.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = body.strip_prefix("0o") {
        (8, rest)
    } else if let Some(rest) = body.strip_prefix("0b") {
        (2, rest)
    } else {
        if body.len() > 1 && body.starts_with('0') {
            return None;
        }
        (10, body)
    };
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return None;
    }
    let magnitude = u64::from_str_radix(digits, radix).ok();
    match (negative, magnitude) {
        (false, Some(value)) => Some(match i64::try_from(value) {
            Ok(signed) => ParsedInt::Signed(signed),
            Err(_) => ParsedInt::Unsigned(value),
        }),
        (true, Some(value)) if value <= i64::MAX as u64 + 1 => {
            Some(ParsedInt::Signed((value as i128).wrapping_neg() as i64))
        }
        // Out of 64-bit range: still an integer literal, callers fall back to f64.
        _ => None,
    }
}

/// True when `text` is an integer literal, whatever its magnitude.
pub fn is_int_literal(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    if body.is_empty() {
        return false;
    }
    if let Some(rest) = body.strip_prefix("0x") {
        return !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_hexdigit());
    }
    if let Some(rest) = body.strip_prefix("0o") {
        return !rest.is_empty() && rest.chars().all(|ch| ('0'..='7').contains(&ch));
    }
    if let Some(rest) = body.strip_prefix("0b") {
        return !rest.is_empty() && rest.chars().all(|ch| ch == '0' || ch == '1');
    }
    if body.len() > 1 && body.starts_with('0') {
        return false;
    }
    body.bytes().all(|b| b.is_ascii_digit())
}

pub fn parse_float(text: &str) -> Option<f64> {
    match text {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    if !is_float_literal(text) {
        return None;
    }
    text.parse::<f64>().ok()
}

/// `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?` with at least a
/// dot or an exponent.
fn is_float_literal(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'-' | b'+')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_digits = i - int_start;
    let mut frac_digits = 0;
    let mut dotted = false;
    if i < bytes.len() && bytes[i] == b'.' {
        dotted = true;
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        frac_digits = i - frac_start;
    }
    if int_digits == 0 && frac_digits == 0 {
        return false;
    }
    let mut exponent = false;
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        exponent = true;
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'-' | b'+') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len() && (dotted || exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("0", Some(ParsedInt::Signed(0)))]
    #[case("-10", Some(ParsedInt::Signed(-10)))]
    #[case("+7", Some(ParsedInt::Signed(7)))]
    #[case("0x1F", Some(ParsedInt::Signed(31)))]
    #[case("0o17", Some(ParsedInt::Signed(15)))]
    #[case("0b101", Some(ParsedInt::Signed(5)))]
    #[case("4294967296", Some(ParsedInt::Signed(4_294_967_296)))]
    #[case("18446744073709551615", Some(ParsedInt::Unsigned(u64::MAX)))]
    #[case("-9223372036854775808", Some(ParsedInt::Signed(i64::MIN)))]
    #[case("0123", None)]
    #[case("12a", None)]
    #[case("-", None)]
    #[case("0x", None)]
    fn test_parse_int(#[case] input: &str, #[case] expected: Option<ParsedInt>) {
        assert_eq!(parse_int(input), expected);
    }

    #[rstest::rstest]
    fn huge_integer_is_still_a_literal() {
        assert_eq!(parse_int("123456789012345678901234567890"), None);
        assert!(is_int_literal("123456789012345678901234567890"));
        assert!(!is_int_literal("007"));
    }

    #[rstest::rstest]
    #[case("0.1000", Some(0.1))]
    #[case("1e3", Some(1000.0))]
    #[case("-.5", Some(-0.5))]
    #[case("1.", Some(1.0))]
    #[case(".inf", Some(f64::INFINITY))]
    #[case("-.inf", Some(f64::NEG_INFINITY))]
    #[case("10", None)]
    #[case(".", None)]
    #[case("1e", None)]
    #[case("abc", None)]
    fn test_parse_float(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_float(input), expected);
    }

    #[rstest::rstest]
    fn nan_parses() {
        assert!(parse_float(".nan").is_some_and(f64::is_nan));
    }

    #[rstest::rstest]
    #[case(0.5, "0.5")]
    #[case(1.0, "1.0")]
    #[case(f64::INFINITY, ".inf")]
    #[case(f64::NEG_INFINITY, "-.inf")]
    #[case(f64::NAN, ".nan")]
    fn test_format_f64(#[case] input: f64, #[case] expected: &str) {
        assert_eq!(format_f64(input), expected);
    }
}
