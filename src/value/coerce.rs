//! Element-level conversions shared by every value representation.
//!
//! These are the primitives behind the coercing accessors and the comparison
//! engine; the `Value` accessors wrap their `None` results into conversion
//! errors.

/// Formats an integer in plain decimal.
pub fn format_int(value: i64) -> String {
    itoa::Buffer::new().format(value).to_string()
}

/// Formats a float as its shortest round-trip representation.
///
/// Integral values drop the trailing `.0`; non-finite values print as
/// `NAN`, `INF` and `-INF`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NAN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    let mut buffer = ryu::Buffer::new();
    let text = buffer.format_finite(value);
    text.strip_suffix(".0").unwrap_or(text).to_string()
}

pub fn format_logical(value: bool) -> &'static str {
    if value {
        "T"
    } else {
        "F"
    }
}

/// Parses a float, accepting `INF`, `-INF` and `NAN`. Surrounding whitespace is ignored.
pub fn parse_float(text: &str) -> Option<f64> {
    match text.trim() {
        "INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NAN" => Some(f64::NAN),
        // Rust accepts "inf"/"nan" spellings that scripts never produce
        trimmed if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            None
        }
        trimmed => trimmed.parse().ok(),
    }
}

/// Parses an integer literal, falling back to a float literal truncated toward zero.
pub fn parse_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    match trimmed.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => parse_float(trimmed).and_then(float_to_int),
    }
}

/// Truncates toward zero. `None` for NaN, infinities and magnitudes outside `i64`.
pub fn float_to_int(value: f64) -> Option<i64> {
    // -2^63 is exactly representable; 2^63 is the first value out of range
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;

    if value.is_nan() || value < LOWER || value >= UPPER {
        None
    } else {
        Some(value.trunc() as i64)
    }
}

/// `None` for NaN, which has no truth value.
pub fn float_to_logical(value: f64) -> Option<bool> {
    if value.is_nan() {
        None
    } else {
        Some(value != 0.0)
    }
}

pub fn string_to_logical(text: &str) -> Option<bool> {
    match text {
        "T" | "true" | "TRUE" => Some(true),
        "F" | "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Quotes a string for printing, escaping quotes, backslashes and control whitespace.
pub fn quote_string(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_float_formatting_golden() {
        assert_eq!(format_float(3.5), "3.5");
        assert_eq!(format_float(5.0), "5");
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(-2.25), "-2.25");
        assert_eq!(format_float(100.0), "100");
        assert_eq!(format_float(1.0 / 3.0), "0.3333333333333333");
        assert_eq!(format_float(f64::NAN), "NAN");
        assert_eq!(format_float(f64::INFINITY), "INF");
        assert_eq!(format_float(f64::NEG_INFINITY), "-INF");
    }

    #[test]
    fn test_int_formatting() {
        assert_eq!(format_int(0), "0");
        assert_eq!(format_int(-42), "-42");
        assert_eq!(format_int(i64::MAX), "9223372036854775807");
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(" 2.5 "), Some(2.5));
        assert_eq!(parse_float("1e3"), Some(1000.0));
        assert_eq!(parse_float("-INF"), Some(f64::NEG_INFINITY));
        assert!(parse_float("NAN").unwrap().is_nan());
        assert_eq!(parse_float("inf"), None);
        assert_eq!(parse_float("abc"), None);
        assert_eq!(parse_float(""), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("10"), Some(10));
        assert_eq!(parse_int(" -7 "), Some(-7));
        assert_eq!(parse_int("3.9"), Some(3));
        assert_eq!(parse_int("-3.9"), Some(-3));
        assert_eq!(parse_int("NAN"), None);
        assert_eq!(parse_int("ten"), None);
    }

    #[test]
    fn test_float_to_int_truncates() {
        assert_eq!(float_to_int(3.5), Some(3));
        assert_eq!(float_to_int(-3.5), Some(-3));
        assert_eq!(float_to_int(-9_223_372_036_854_775_808.0), Some(i64::MIN));
        assert_eq!(float_to_int(9.3e18), None);
        assert_eq!(float_to_int(f64::INFINITY), None);
        assert_eq!(float_to_int(f64::NAN), None);
    }

    #[test]
    fn test_logical_conversions() {
        assert_eq!(string_to_logical("TRUE"), Some(true));
        assert_eq!(string_to_logical("F"), Some(false));
        assert_eq!(string_to_logical("yes"), None);
        assert_eq!(float_to_logical(0.0), Some(false));
        assert_eq!(float_to_logical(-0.5), Some(true));
        assert_eq!(float_to_logical(f64::NAN), None);
    }

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("a\"b"), "\"a\\\"b\"");
        assert_eq!(quote_string("line\n"), "\"line\\n\"");
    }
}
