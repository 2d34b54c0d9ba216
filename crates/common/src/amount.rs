//! Wei amount handling.
//!
//! Monetary values are u128 wei throughout the backend, mirroring the
//! chain's native representation. The HTTP boundary accepts decimal
//! token strings (or JSON numbers) and converts them exactly; anything
//! that cannot be represented in 18 fractional digits is rejected
//! rather than rounded.
//!
//! ## Guarantees
//!
//! - **Exact**: no floating-point arithmetic on the parse path.
//! - **Deterministic**: `format_wei(parse_wei(s)) == canonical(s)`.
//! - **No panic**: overflow and malformed input return errors.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Wei per whole token (18 decimals, AVAX native currency).
pub const WEI_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Number of fractional digits the native currency supports.
pub const TOKEN_DECIMALS: u32 = 18;

// ════════════════════════════════════════════════════════════════════════════
// PARSING / FORMATTING
// ════════════════════════════════════════════════════════════════════════════

/// Parse a decimal token string (e.g. `"10"`, `"0.25"`) into wei.
///
/// Accepts an optional fractional part of up to 18 digits. Rejects
/// empty input, negative values, more than 18 fractional digits and
/// values that overflow u128.
pub fn parse_wei(s: &str) -> Result<u128, AmountParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AmountParseError::Empty);
    }
    if s.starts_with('-') {
        return Err(AmountParseError::Negative);
    }

    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountParseError::Malformed);
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountParseError::Malformed);
    }
    if frac_part.len() > TOKEN_DECIMALS as usize {
        return Err(AmountParseError::TooManyDecimals(frac_part.len()));
    }

    let whole: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| AmountParseError::Overflow)?
    };

    let mut frac: u128 = 0;
    if !frac_part.is_empty() {
        frac = frac_part.parse().map_err(|_| AmountParseError::Overflow)?;
        frac *= 10u128.pow(TOKEN_DECIMALS - frac_part.len() as u32);
    }

    whole
        .checked_mul(WEI_PER_TOKEN)
        .and_then(|w| w.checked_add(frac))
        .ok_or(AmountParseError::Overflow)
}

/// Format wei as a decimal token string with trailing zeros trimmed.
#[must_use]
pub fn format_wei(wei: u128) -> String {
    let whole = wei / WEI_PER_TOKEN;
    let frac = wei % WEI_PER_TOKEN;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:018}", frac);
    let trimmed = frac_str.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

// ════════════════════════════════════════════════════════════════════════════
// AMOUNT NEWTYPE
// ════════════════════════════════════════════════════════════════════════════

/// Wei amount that serializes as a decimal token string and
/// deserializes from either a string or a JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u128);

impl Amount {
    #[must_use]
    pub fn wei(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_wei(self.0))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_wei(self.0))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            // serde_json's arbitrary_precision keeps the full decimal
            // text of the number, so 18-digit fractions survive intact.
            Num(serde_json::Number),
            Str(String),
        }
        let text = match Repr::deserialize(deserializer)? {
            Repr::Num(n) => n.to_string(),
            Repr::Str(s) => s,
        };
        parse_wei(&text).map(Amount).map_err(de::Error::custom)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PARSE ERROR
// ════════════════════════════════════════════════════════════════════════════

/// Error parsing a decimal token amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount is negative")]
    Negative,
    #[error("amount is not a decimal number")]
    Malformed,
    #[error("amount has {0} fractional digits, max is 18")]
    TooManyDecimals(usize),
    #[error("amount overflows u128 wei")]
    Overflow,
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_tokens() {
        assert_eq!(parse_wei("10").unwrap(), 10 * WEI_PER_TOKEN);
        assert_eq!(parse_wei("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(parse_wei("0.5").unwrap(), WEI_PER_TOKEN / 2);
        assert_eq!(parse_wei("10.2").unwrap(), 10 * WEI_PER_TOKEN + WEI_PER_TOKEN / 5);
        assert_eq!(parse_wei(".25").unwrap(), WEI_PER_TOKEN / 4);
    }

    #[test]
    fn test_parse_max_decimals() {
        // exactly 18 fractional digits = 1 wei
        assert_eq!(parse_wei("0.000000000000000001").unwrap(), 1);
        assert_eq!(
            parse_wei("0.0000000000000000001"),
            Err(AmountParseError::TooManyDecimals(19))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_wei(""), Err(AmountParseError::Empty));
        assert_eq!(parse_wei("-1"), Err(AmountParseError::Negative));
        assert_eq!(parse_wei("abc"), Err(AmountParseError::Malformed));
        assert_eq!(parse_wei("1.2.3"), Err(AmountParseError::Malformed));
        assert_eq!(parse_wei("."), Err(AmountParseError::Malformed));
    }

    #[test]
    fn test_format_trims_zeros() {
        assert_eq!(format_wei(10 * WEI_PER_TOKEN), "10");
        assert_eq!(format_wei(WEI_PER_TOKEN / 5), "0.2");
        assert_eq!(format_wei(1), "0.000000000000000001");
    }

    #[test]
    fn test_roundtrip() {
        for s in ["1", "0.2", "10.25", "123.456789"] {
            assert_eq!(format_wei(parse_wei(s).unwrap()), s);
        }
    }

    #[test]
    fn test_amount_deserializes_number_and_string() {
        let a: Amount = serde_json::from_str("10.2").unwrap();
        assert_eq!(a.wei(), parse_wei("10.2").unwrap());
        let b: Amount = serde_json::from_str("\"10.2\"").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_amount_number_with_full_precision_is_exact() {
        // 18 fractional digits exceed f64 precision; every wei must land
        let a: Amount = serde_json::from_str("10.123456789012345678").unwrap();
        assert_eq!(a.wei(), 10_123_456_789_012_345_678);
        // and inside a JSON document, the path the HTTP body takes
        let v: std::collections::HashMap<String, Amount> =
            serde_json::from_str(r#"{"amount": 0.000000000000000001}"#).unwrap();
        assert_eq!(v["amount"].wei(), 1);
    }

    #[test]
    fn test_amount_serializes_as_string() {
        let a = Amount(WEI_PER_TOKEN / 5);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"0.2\"");
    }
}
