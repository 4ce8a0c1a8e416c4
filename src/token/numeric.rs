//! Digit compression for token arguments
//!
//! A decimal digit string is packed four digits per character. Each group of up
//! to four digits becomes the code point `width * 10000 + value`, so the group
//! width survives the trip and leading zeros are restored on expansion. A 15
//! digit bet amount or a 19 digit user id costs four or five characters instead
//! of one per digit.

use std::fmt::Write;

/// Digits carried by one compressed character
pub const GROUP_WIDTH: usize = 4;

const WIDTH_BASE: u32 = 10_000;

/// Width 5, outside the compressed alphabet. Leads a digit string that is
/// text rather than a number.
pub const TEXT_MARKER: char = '\u{C350}';

/// Compress an ASCII digit string. Returns `None` for empty or non-digit input.
pub fn compress_digits(digits: &str) -> Option<String> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut out = String::with_capacity(digits.len().div_ceil(GROUP_WIDTH) * 3);
    for chunk in digits.as_bytes().chunks(GROUP_WIDTH) {
        let width = chunk.len() as u32;
        let value = chunk
            .iter()
            .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        // width * 10000 + value stays within 10000..=49999, far from the surrogate block
        out.push(char::from_u32(width * WIDTH_BASE + value)?);
    }
    Some(out)
}

/// Expand a compressed segment back into its digit string.
///
/// Returns `None` when any character falls outside the compressed alphabet,
/// which lets callers fall back to the literal text.
pub fn expand_digits(encoded: &str) -> Option<String> {
    if encoded.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(encoded.chars().count() * GROUP_WIDTH);
    for ch in encoded.chars() {
        let code = ch as u32;
        let width = code / WIDTH_BASE;
        if !(1..=GROUP_WIDTH as u32).contains(&width) {
            return None;
        }
        let value = code - width * WIDTH_BASE;
        if value >= 10u32.pow(width) {
            return None;
        }
        write!(out, "{:0width$}", value, width = width as usize).ok()?;
    }
    Some(out)
}

/// Compress an integer
pub fn compress_number(n: u64) -> String {
    // to_string of a u64 is always a non-empty digit string
    compress_digits(&n.to_string()).unwrap_or_default()
}

/// Expand a compressed integer, `None` if malformed or wider than `u64`
pub fn expand_number(encoded: &str) -> Option<u64> {
    expand_digits(encoded)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_groups_of_four() {
        let encoded = compress_number(1_234_567_890);
        let codes: Vec<u32> = encoded.chars().map(|c| c as u32).collect();
        assert_eq!(codes, vec![41234, 45678, 20090]);
    }

    #[test]
    fn test_leading_zero_group_survives() {
        // 1_0000_0001 splits into "1000", "0000", "1"
        let encoded = compress_number(100_000_001);
        assert_eq!(expand_number(&encoded), Some(100_000_001));

        let padded = compress_digits("0042").unwrap();
        assert_eq!(expand_digits(&padded).as_deref(), Some("0042"));
    }

    #[test]
    fn test_fifteen_digit_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut samples = vec![0, 1, 9, 10, 9_999, 10_000, 100_000_000_000_000, 999_999_999_999_999];
        samples.extend((0..500).map(|_| rng.random_range(0..1_000_000_000_000_000u64)));

        for n in samples {
            let encoded = compress_number(n);
            assert!(encoded.chars().count() <= 4, "{n} took {} chars", encoded.chars().count());
            assert_eq!(expand_number(&encoded), Some(n));
        }
    }

    #[test]
    fn test_snowflake_fits() {
        let id = 851_385_935_282_700_310u64;
        let encoded = compress_number(id);
        assert_eq!(encoded.chars().count(), 5);
        assert_eq!(expand_number(&encoded), Some(id));
    }

    #[test]
    fn test_rejects_non_digits() {
        assert!(compress_digits("").is_none());
        assert!(compress_digits("12a").is_none());
        assert!(compress_digits("-5").is_none());
    }

    #[test]
    fn test_expand_rejects_foreign_characters() {
        assert!(expand_digits("hit").is_none());
        assert!(expand_digits("").is_none());
        // width 1 only admits values 0..=9
        assert!(expand_digits("\u{271A}").is_none());
        // below the compressed range entirely
        assert!(expand_digits("\u{2000}").is_none());
    }
}
