//! Hexadecimal floating-point text form, e.g. `0x1.8000000000000p+1` for 3.0.
//!
//! This is the reproducible float notation used for float literals, `WRITE`
//! output and `READ` input.

/// Format a float as `[-]0x1.<13 hex digits>p<exp>`.
///
/// Zero is `0x0.0p+0`, subnormals use `0x0.<digits>p-1022`, and the
/// non-finite values are `inf`, `-inf` and `nan`.
pub fn format(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value == 0.0 {
        return format!("{sign}0x0.0p+0");
    }

    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);

    if exponent == 0 {
        format!("{sign}0x0.{fraction:013x}p-1022")
    } else {
        format!("{sign}0x1.{fraction:013x}p{:+}", exponent - 1023)
    }
}

/// Parse the hexadecimal float form.
///
/// Accepts an optional sign, an optional `0x` prefix, hex digits with an
/// optional point, and an optional binary exponent `p[+-]N`. Also accepts
/// `inf`, `infinity` and `nan`. Surrounding whitespace is ignored. Returns
/// `None` for malformed text or a finite literal too large for f64.
pub fn parse(text: &str) -> Option<f64> {
    let text = text.trim();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let lower = rest.to_ascii_lowercase();
    let magnitude = match lower.as_str() {
        "inf" | "infinity" => f64::INFINITY,
        "nan" => f64::NAN,
        _ => parse_finite(&lower)?,
    };

    Some(if negative { -magnitude } else { magnitude })
}

// Digits beyond this many bits only contribute a sticky bit.
const MANTISSA_LIMIT: u128 = 1 << 120;

// Far outside the f64 range, small enough that exponent arithmetic cannot overflow.
const EXP_LIMIT: i64 = 1 << 40;

fn parse_finite(text: &str) -> Option<f64> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    let (mantissa, exponent) = match text.split_once('p') {
        Some((m, e)) => (m, Some(e)),
        None => (text, None),
    };
    let (int_digits, frac_digits) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let mut exp: i64 = match exponent {
        Some(e) if !e.is_empty() => e.parse::<i64>().ok()?.clamp(-EXP_LIMIT, EXP_LIMIT),
        Some(_) => return None,
        None => 0,
    };

    let mut bits: u128 = 0;
    let mut sticky = false;
    for c in int_digits.chars() {
        let digit = c.to_digit(16)? as u128;
        if bits < MANTISSA_LIMIT {
            bits = bits * 16 + digit;
        } else {
            sticky |= digit != 0;
            exp += 4;
        }
    }
    for c in frac_digits.chars() {
        let digit = c.to_digit(16)? as u128;
        if bits < MANTISSA_LIMIT {
            bits = bits * 16 + digit;
            exp -= 4;
        } else {
            sticky |= digit != 0;
        }
    }
    if sticky {
        bits |= 1;
    }
    if bits == 0 {
        return Some(0.0);
    }

    let (mantissa, exp) = round_to_precision(bits, exp)?;
    let value = scale(mantissa as f64, exp);
    value.is_finite().then_some(value)
}

/// Round `bits * 2^exp` to the precision available at its magnitude, half
/// to even, in one step. Subnormal results keep fewer than 53 bits. The
/// returned mantissa fits in an f64 exactly, so scaling it adds no error.
fn round_to_precision(bits: u128, exp: i64) -> Option<(u64, i64)> {
    let width = i64::from(128 - bits.leading_zeros());
    let top = exp + width - 1;
    let precision = if top >= -1022 { 53 } else { top + 1075 };
    let shift = width - precision;
    if shift <= 0 {
        return u64::try_from(bits).ok().map(|m| (m, exp));
    }
    if shift > width {
        return Some((0, 0));
    }

    let kept = bits >> shift;
    let rest = bits & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let rounded = if rest > half || (rest == half && kept & 1 == 1) {
        kept + 1
    } else {
        kept
    };
    u64::try_from(rounded).ok().map(|m| (m, exp + shift))
}

/// `value * 2^exp`, in steps that stay inside the normal range.
fn scale(mut value: f64, exp: i64) -> f64 {
    let mut exp = exp.clamp(-2200, 2200) as i32;
    while exp > 1000 {
        value *= pow2(1000);
        exp -= 1000;
    }
    while exp < -1000 {
        value *= pow2(-1000);
        exp += 1000;
    }
    value * pow2(exp)
}

/// Exact power of two for `-1022 <= k <= 1023`.
fn pow2(k: i32) -> f64 {
    f64::from_bits(((k + 1023) as u64) << 52)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_normal_values() {
        assert_eq!(format(1.0), "0x1.0000000000000p+0");
        assert_eq!(format(3.0), "0x1.8000000000000p+1");
        assert_eq!(format(0.5), "0x1.0000000000000p-1");
        assert_eq!(format(-2.25), "-0x1.2000000000000p+1");
        assert_eq!(format(0.1), "0x1.999999999999ap-4");
    }

    #[test]
    fn format_special_values() {
        assert_eq!(format(0.0), "0x0.0p+0");
        assert_eq!(format(-0.0), "-0x0.0p+0");
        assert_eq!(format(f64::INFINITY), "inf");
        assert_eq!(format(f64::NEG_INFINITY), "-inf");
        assert_eq!(format(f64::NAN), "nan");
        assert_eq!(format(f64::from_bits(1)), "0x0.0000000000001p-1022");
    }

    #[test]
    fn parse_canonical_form() {
        assert_eq!(parse("0x1.8000000000000p+1"), Some(3.0));
        assert_eq!(parse("0x1.999999999999ap-4"), Some(0.1));
        assert_eq!(parse("-0x1.2p+1"), Some(-2.25));
    }

    #[test]
    fn parse_loose_forms() {
        assert_eq!(parse("0x1p3"), Some(8.0));
        assert_eq!(parse("1p3"), Some(8.0));
        assert_eq!(parse("0X1P-1"), Some(0.5));
        assert_eq!(parse("  0x10  "), Some(16.0));
        assert_eq!(parse("0x.8"), Some(0.5));
        assert_eq!(parse("0xa."), Some(10.0));
    }

    #[test]
    fn parse_special_values() {
        assert_eq!(parse("inf"), Some(f64::INFINITY));
        assert_eq!(parse("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(parse("nan").is_some_and(f64::is_nan));
        assert!(parse("-0x0.0p+0").is_some_and(|v| v == 0.0 && v.is_sign_negative()));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("0x"), None);
        assert_eq!(parse("0x1p"), None);
        assert_eq!(parse("0x1.g"), None);
        assert_eq!(parse("1,5"), None);
        assert_eq!(parse("hello"), None);
    }

    #[test]
    fn parse_rejects_overflow() {
        assert_eq!(parse("0x1p+1024"), None);
        assert_eq!(parse("0x1p+99999999"), None);
    }

    #[test]
    fn parse_underflow_to_zero() {
        assert_eq!(parse("0x1p-99999"), Some(0.0));
    }

    #[test]
    fn parse_subnormal() {
        assert_eq!(parse("0x0.0000000000001p-1022"), Some(f64::from_bits(1)));
    }

    #[test]
    fn parse_long_subnormal_rounds_once() {
        // Just above half the smallest subnormal: rounds up, not to zero.
        assert_eq!(parse("0x1.000000000000001p-1075"), Some(f64::from_bits(1)));
        // Exactly half: ties go to even.
        assert_eq!(parse("0x1p-1075"), Some(0.0));
        assert_eq!(parse("0x1.8p-1074"), Some(f64::from_bits(2)));
        assert_eq!(
            parse("0x0.00000000000018000000000001p-1022"),
            Some(f64::from_bits(2))
        );
    }

    #[test]
    fn parse_long_normal_mantissa_rounds_half_even() {
        assert_eq!(parse("0x1.00000000000008p+0"), Some(1.0));
        assert_eq!(parse("0x1.00000000000018p+0"), Some(1.0 + 2.0 * f64::EPSILON));
        assert_eq!(
            parse("0x1.000000000000080000001p+0"),
            Some(1.0 + f64::EPSILON)
        );
    }
}
