//! Decimal-safe amount handling at the fixed WEUSD scale.
//!
//! Two layers with distinct jobs:
//!
//! * [`sanitize_decimal_input`] is the per-keystroke lexical cleanup. It is
//!   total (never fails), idempotent, and only truncates — it never rounds
//!   and never judges magnitude.
//! * [`to_base_units`] / [`is_valid_amount`] are the submit-time codec and
//!   validator. They reject anything malformed, over-scaled, or out of
//!   range with a single precise check instead of silently clamping.

use alloy_primitives::U256;

use crate::errors::AmountError;

/// Fractional digits of the WEUSD stable token.
pub const WEUSD_DECIMALS: u32 = 6;

/// Unbounded-approval sentinel, and the ceiling for any encoded amount.
pub const MAX_AMOUNT: U256 = U256::MAX;

/// Restrict free-text input to a fixed-point numeral at `scale`.
///
/// Strips everything that is not an ASCII digit or `.`, keeps only the
/// first `.` as the separator (digits after later dots join the fractional
/// part), and truncates the fractional part to `scale` digits. A string
/// with no digits at all collapses to `"0"`; empty input stays empty.
pub fn sanitize_decimal_input(raw: &str, scale: u32) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let formatted = match kept.split_once('.') {
        Some((head, tail)) => {
            let frac: String = tail
                .chars()
                .filter(char::is_ascii_digit)
                .take(scale as usize)
                .collect();
            format!("{head}.{frac}")
        }
        None => kept,
    };

    // After the cleanup the only strings a codec cannot parse are a lone
    // separator and the residue of input with no digits at all.
    if formatted.is_empty() || formatted == "." {
        return "0".to_string();
    }
    formatted
}

/// Encode a decimal string as an integer base-unit amount at `scale`.
///
/// Exact integer arithmetic: the digit string is shifted by `scale` places,
/// never converted through a float. Fails with [`AmountError::InvalidFormat`]
/// on anything that is not `digits[.digits]`, on more than `scale`
/// fractional digits (truncation is the sanitizer's job, not the codec's),
/// and on values above [`MAX_AMOUNT`].
pub fn to_base_units(value: &str, scale: u32) -> Result<U256, AmountError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AmountError::InvalidFormat("empty amount".to_string()));
    }

    let (int_part, frac_part) = match value.split_once('.') {
        Some((i, f)) => (i, f),
        None => (value, ""),
    };

    let all_digits =
        int_part.bytes().all(|b| b.is_ascii_digit()) && frac_part.bytes().all(|b| b.is_ascii_digit());
    if !all_digits || (int_part.is_empty() && frac_part.is_empty()) {
        return Err(AmountError::InvalidFormat(format!(
            "`{value}` is not a decimal numeral"
        )));
    }
    if frac_part.len() > scale as usize {
        return Err(AmountError::InvalidFormat(format!(
            "`{value}` has more than {scale} decimal places"
        )));
    }

    let mut digits = String::with_capacity(int_part.len() + scale as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    digits.extend(std::iter::repeat('0').take(scale as usize - frac_part.len()));

    U256::from_str_radix(&digits, 10).map_err(|_| {
        AmountError::InvalidFormat(format!(
            "`{value}` exceeds the maximum representable amount"
        ))
    })
}

/// Render a base-unit amount back into a decimal string at `scale`,
/// trimming trailing fractional zeros. Inverse of [`to_base_units`].
pub fn to_decimal_string(amount: U256, scale: u32) -> String {
    let divisor = U256::from(10u64).pow(U256::from(scale));
    let int = amount / divisor;
    let frac = amount % divisor;
    if frac.is_zero() {
        int.to_string()
    } else {
        let frac = format!("{frac:0>width$}", width = scale as usize);
        format!("{int}.{}", frac.trim_end_matches('0'))
    }
}

/// Submit-time validator: a well-formed, strictly positive decimal with at
/// most `scale` fractional digits that encodes within range.
pub fn is_valid_amount(value: &str, scale: u32) -> bool {
    match to_base_units(value, scale) {
        Ok(encoded) => !encoded.is_zero(),
        Err(_) => false,
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_truncates_excess_decimals() {
        assert_eq!(sanitize_decimal_input("12.3456789", 6), "12.345678");
    }

    #[test]
    fn sanitize_strips_foreign_characters() {
        assert_eq!(sanitize_decimal_input("1a2b.3c4", 6), "12.34");
        assert_eq!(sanitize_decimal_input("$1,000.50", 6), "1000.50");
    }

    #[test]
    fn sanitize_collapses_extra_separators() {
        assert_eq!(sanitize_decimal_input("1.2.3", 6), "1.23");
        assert_eq!(sanitize_decimal_input("1..5", 6), "1.5");
    }

    #[test]
    fn sanitize_keeps_empty_input_and_zeroes_bare_dot() {
        assert_eq!(sanitize_decimal_input("", 6), "");
        assert_eq!(sanitize_decimal_input(".", 6), "0");
        assert_eq!(sanitize_decimal_input("abc", 6), "0");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "",
            ".",
            "0",
            "12.3456789",
            "1.2.3",
            "abc12.34.56xyz",
            "000.000",
            "999999999999999999999999999999999999999999999999999999999999999999999999999999.9",
        ];
        for raw in inputs {
            let once = sanitize_decimal_input(raw, 6);
            assert_eq!(sanitize_decimal_input(&once, 6), once, "input {raw:?}");
        }
    }

    #[test]
    fn encodes_exactly_at_scale_six() {
        assert_eq!(to_base_units("12.345678", 6).unwrap(), U256::from(12_345_678u64));
        assert_eq!(to_base_units("0.000001", 6).unwrap(), U256::from(1u64));
        assert_eq!(to_base_units("1", 6).unwrap(), U256::from(1_000_000u64));
        // "0.1 + 0.2" style values stay exact.
        assert_eq!(to_base_units("0.3", 6).unwrap(), U256::from(300_000u64));
    }

    #[test]
    fn encodes_partial_numerals() {
        // "12." and ".5" are valid keystroke states the sanitizer lets through.
        assert_eq!(to_base_units("12.", 6).unwrap(), U256::from(12_000_000u64));
        assert_eq!(to_base_units(".5", 6).unwrap(), U256::from(500_000u64));
    }

    #[test]
    fn rejects_malformed_numerals() {
        for bad in ["", " ", ".", "1.2.3", "-1", "+1", "1e6", "0x10", "one"] {
            assert!(to_base_units(bad, 6).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_rather_than_truncates_excess_scale() {
        assert!(to_base_units("12.3456789", 6).is_err());
    }

    #[test]
    fn rejects_out_of_range_outright() {
        // 79 nines shifted by 6 places overflows 256 bits; the codec rejects
        // instead of dropping digits.
        let huge = "9".repeat(79);
        assert!(to_base_units(&huge, 6).is_err());
        assert!(!is_valid_amount(&huge, 6));
    }

    #[test]
    fn decodes_with_trailing_zeros_trimmed() {
        assert_eq!(to_decimal_string(U256::from(12_345_678u64), 6), "12.345678");
        assert_eq!(to_decimal_string(U256::from(1_000_000u64), 6), "1");
        assert_eq!(to_decimal_string(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(to_decimal_string(U256::from(1u64), 6), "0.000001");
        assert_eq!(to_decimal_string(U256::ZERO, 6), "0");
    }

    #[test]
    fn round_trips_sanitized_positive_inputs() {
        for s in ["12.345678", "0.000001", "1", "1.5", "42000", "0.3"] {
            let encoded = to_base_units(s, 6).unwrap();
            let rendered = to_decimal_string(encoded, 6);
            assert_eq!(to_base_units(&rendered, 6).unwrap(), encoded, "input {s:?}");
        }
    }

    #[test]
    fn validator_requires_strictly_positive() {
        assert!(is_valid_amount("1", 6));
        assert!(is_valid_amount("0.000001", 6));
        assert!(!is_valid_amount("0", 6));
        assert!(!is_valid_amount("0.000000", 6));
        assert!(!is_valid_amount("", 6));
        assert!(!is_valid_amount("1.2345678", 6));
    }
}
