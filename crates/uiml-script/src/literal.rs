//! Literal value construction.
//!
//! String escapes and numeric radix/overflow handling are applied when the
//! parser builds the AST, not while lexing.

use num_bigint::BigInt;
use num_traits::{Num, ToPrimitive};

/// The largest integer a `f64` represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// The value of a numeric literal.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericValue {
    /// Fits in a double without losing precision.
    Number(f64),
    /// An integer beyond the exact-integer range of a double.
    BigInt(BigInt),
}

/// Parses the source text of a numeric literal.
///
/// Returns `None` for malformed literals (for example `0x_` or `1e`).
pub fn parse_number(text: &str) -> Option<NumericValue> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();

    let radix_body = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
        .map(|body| (16, body))
        .or_else(|| {
            cleaned
                .strip_prefix("0b")
                .or_else(|| cleaned.strip_prefix("0B"))
                .map(|body| (2, body))
        });

    if let Some((radix, body)) = radix_body {
        if body.is_empty() {
            return None;
        }
        let value = BigInt::from_str_radix(body, radix).ok()?;
        return Some(integer_value(value));
    }

    let is_integer = cleaned.chars().all(|c| c.is_ascii_digit());
    if is_integer {
        if cleaned.is_empty() {
            return None;
        }
        let value = BigInt::from_str_radix(&cleaned, 10).ok()?;
        return Some(integer_value(value));
    }

    cleaned.parse::<f64>().ok().map(NumericValue::Number)
}

fn integer_value(value: BigInt) -> NumericValue {
    match value.to_f64() {
        Some(number) if number.abs() <= MAX_SAFE_INTEGER => NumericValue::Number(number),
        _ => NumericValue::BigInt(value),
    }
}

/// Unescapes a quoted string literal (the quotes are included in `raw`).
pub fn unescape_quoted(raw: &str) -> String {
    let mut chars = raw.chars();
    let quote = chars.next();
    let mut inner = chars.as_str();
    if let (Some(q), Some(last)) = (quote, inner.chars().last()) {
        if last == q && !inner.is_empty() && !ends_with_escape(inner) {
            inner = &inner[..inner.len() - last.len_utf8()];
        }
    }
    unescape(inner)
}

/// A closing quote preceded by an odd number of backslashes is escaped.
fn ends_with_escape(inner: &str) -> bool {
    let without_last = &inner[..inner.len() - 1];
    without_last.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Unescapes string content.
///
/// Recognized escapes are `\n \t \r \b \f \v`, `\xHH`, `\uHHHH` and
/// `\u{H+}`. Any other escaped character stands for itself. A `\x` or `\u`
/// escape without the required hex digits degrades to the literal prefix
/// (`x`, `u` or `u{`) and scanning resumes right after it.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    let mut pending_high: Option<u32> = None;

    while let Some(pos) = rest.find('\\') {
        flush_surrogate(&mut out, &mut pending_high);
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let mut chars = after.chars();
        let Some(escaped) = chars.next() else {
            // A trailing lone backslash.
            rest = "";
            break;
        };
        let after_escape = &after[escaped.len_utf8()..];

        rest = match escaped {
            'n' => push_then(&mut out, '\n', after_escape),
            't' => push_then(&mut out, '\t', after_escape),
            'r' => push_then(&mut out, '\r', after_escape),
            'b' => push_then(&mut out, '\u{8}', after_escape),
            'f' => push_then(&mut out, '\u{c}', after_escape),
            'v' => push_then(&mut out, '\u{b}', after_escape),
            'x' => match hex_prefix(after_escape, 2) {
                Some(code) => {
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    &after_escape[2..]
                }
                None => push_then(&mut out, 'x', after_escape),
            },
            'u' => {
                if let Some(braced) = after_escape.strip_prefix('{') {
                    match braced.find('}') {
                        Some(close)
                            if close > 0
                                && braced[..close].chars().all(|c| c.is_ascii_hexdigit()) =>
                        {
                            match u32::from_str_radix(&braced[..close], 16)
                                .ok()
                                .and_then(char::from_u32)
                            {
                                Some(c) => {
                                    out.push(c);
                                    &braced[close + 1..]
                                }
                                None => push_str_then(&mut out, "u{", braced),
                            }
                        }
                        _ => push_str_then(&mut out, "u{", braced),
                    }
                } else {
                    match hex_prefix(after_escape, 4) {
                        Some(code) if (0xD800..0xDC00).contains(&code) => {
                            pending_high = Some(code);
                            let remaining = &after_escape[4..];
                            if let Some(low) = low_surrogate_at(remaining) {
                                let combined =
                                    0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                                out.push(
                                    char::from_u32(combined).unwrap_or(char::REPLACEMENT_CHARACTER),
                                );
                                pending_high = None;
                                &remaining[6..]
                            } else {
                                remaining
                            }
                        }
                        Some(code) => {
                            out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                            &after_escape[4..]
                        }
                        None => push_then(&mut out, 'u', after_escape),
                    }
                }
            }
            other => push_then(&mut out, other, after_escape),
        };
    }

    flush_surrogate(&mut out, &mut pending_high);
    out.push_str(rest);
    out
}

fn push_then<'a>(out: &mut String, c: char, rest: &'a str) -> &'a str {
    out.push(c);
    rest
}

fn push_str_then<'a>(out: &mut String, s: &str, rest: &'a str) -> &'a str {
    out.push_str(s);
    rest
}

fn flush_surrogate(out: &mut String, pending_high: &mut Option<u32>) {
    if pending_high.take().is_some() {
        out.push(char::REPLACEMENT_CHARACTER);
    }
}

fn hex_prefix(s: &str, digits: usize) -> Option<u32> {
    let prefix = s.get(..digits)?;
    if prefix.len() == digits && prefix.chars().all(|c| c.is_ascii_hexdigit()) {
        u32::from_str_radix(prefix, 16).ok()
    } else {
        None
    }
}

fn low_surrogate_at(s: &str) -> Option<u32> {
    let hex = s.strip_prefix("\\u")?;
    hex_prefix(hex, 4).filter(|code| (0xDC00..0xE000).contains(code))
}
