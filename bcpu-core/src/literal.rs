//! Data literals (`0b…`, `0d…`, `0x…`)
//!
//! Literals parse to unbounded non-negative integers. Width truncation is
//! not applied here; each opcode decides at execution time.

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use crate::error::Rejection;
use crate::namespace::{BINARY_PREFIX, DECIMAL_PREFIX, HEX_PREFIX};
use crate::validate::validate_data;

/// Base selected by a literal prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Binary,
    Decimal,
    Hex,
}

impl Radix {
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            BINARY_PREFIX => Some(Self::Binary),
            DECIMAL_PREFIX => Some(Self::Decimal),
            HEX_PREFIX => Some(Self::Hex),
            _ => None,
        }
    }

    pub fn base(&self) -> u32 {
        match self {
            Self::Binary => 2,
            Self::Decimal => 10,
            Self::Hex => 16,
        }
    }
}

/// Validates and converts a data literal
pub fn parse_data(text: &str) -> Result<BigUint, Rejection> {
    validate_data(text)?;
    let (prefix, digits) = text.split_at(2);
    let radix = Radix::from_prefix(prefix)
        .ok_or_else(|| Rejection::InvalidDataPrefix(prefix.to_string()))?;
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::from_str_radix(digits, radix.base()).map_err(|_| Rejection::InvalidDigit {
        radix: radix.base(),
        digit: digits.chars().next().unwrap_or('?'),
    })
}

/// Canonical source form of a value (decimal)
pub fn format_data(value: &BigUint) -> String {
    format!("{}{}", DECIMAL_PREFIX, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_radix() {
        assert_eq!(parse_data("0b101").unwrap(), BigUint::from(5u32));
        assert_eq!(parse_data("0d250").unwrap(), BigUint::from(250u32));
        assert_eq!(parse_data("0xfF").unwrap(), BigUint::from(255u32));
    }

    #[test]
    fn test_empty_digits_are_zero() {
        for text in ["0b", "0d", "0x"] {
            assert!(parse_data(text).unwrap().is_zero());
        }
    }

    #[test]
    fn test_unbounded_precision() {
        let value = parse_data("0x1_0000_0000_0000_0000_0000_0000_0000_0000");
        assert!(value.is_err(), "underscores are not digits");

        let value = parse_data("0x100000000000000000000000000000000").unwrap();
        assert_eq!(value, BigUint::from(1u32) << 128usize);
    }

    #[test]
    fn test_leading_sign_rejected() {
        assert!(parse_data("0d+5").is_err());
        assert!(parse_data("0d-5").is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let value = BigUint::from(44u32);
        assert_eq!(format_data(&value), "0d44");
        assert_eq!(parse_data(&format_data(&value)).unwrap(), value);
    }
}
