//! # Base-36 Identifiers
//!
//! Compact text identifiers carried on the wire as a 32-bit little-endian
//! integer. The text form uses the digit alphabet `0-9A-Z`, most significant
//! digit first, and parses case-insensitively.
//!
//! Negative values are written with a leading `-` followed by the magnitude,
//! so every `i32` survives a round trip.

use crate::error::{ProtocolError, Result};

/// Digit alphabet, index = digit value
const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

const RADIX: u32 = 36;

/// Encode an integer as a base-36 token
pub fn encode(value: i32) -> String {
    if value == 0 {
        return String::from("0");
    }

    let mut magnitude = value.unsigned_abs();
    let mut digits = Vec::with_capacity(8);

    while magnitude > 0 {
        digits.push(DIGITS[(magnitude % RADIX) as usize]);
        magnitude /= RADIX;
    }

    if value < 0 {
        digits.push(b'-');
    }

    digits.reverse();
    // Alphabet and sign are ASCII
    digits.into_iter().map(char::from).collect()
}

/// Parse a base-36 token (case-insensitive, optional leading sign)
pub fn decode(token: &str) -> Result<i32> {
    let trimmed = token.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    if digits.is_empty() {
        return Err(ProtocolError::InvalidId(format!("empty identifier '{token}'")));
    }

    // i32::MIN has one more unit of magnitude than i32::MAX
    let limit: u64 = if negative {
        i32::MAX as u64 + 1
    } else {
        i32::MAX as u64
    };

    let mut magnitude: u64 = 0;
    for ch in digits.chars() {
        let digit = ch
            .to_digit(RADIX)
            .ok_or_else(|| ProtocolError::InvalidId(format!("invalid digit '{ch}' in '{token}'")))?;

        magnitude = magnitude * RADIX as u64 + digit as u64;
        if magnitude > limit {
            return Err(ProtocolError::InvalidId(format!(
                "identifier '{token}' overflows 32 bits"
            )));
        }
    }

    let value = if negative {
        (magnitude as i64).wrapping_neg() as i32
    } else {
        magnitude as i32
    };

    Ok(value)
}
