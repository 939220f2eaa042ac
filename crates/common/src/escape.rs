//! Decoding of `\DDD` escapes in string literals.

use crate::error::EscapeError;

/// Replace every `\DDD` (three decimal digits) with the character of that code.
///
/// A backslash not followed by exactly three decimal digits is an error.
pub fn decode_escapes(raw: &str) -> Result<String, EscapeError> {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }

        let digits: String = chars.by_ref().take(3).collect();
        let code = if digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            None
        };

        match code {
            Some(ch) => decoded.push(ch),
            None => {
                return Err(EscapeError {
                    literal: raw.to_string(),
                })
            }
        }
    }

    Ok(decoded)
}
