//! Base-36 helpers shared by the seed format and the replay log codec.
//!
//! Digits are `0-9` followed by lowercase `a-z`. Uppercase letters are never
//! digits, which is what lets the replay log use them as control codes.

/// Digit alphabet in value order.
const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Radix of the encoding.
pub const RADIX: u32 = 36;

/// Returns the value of a single base-36 digit, or `None` for any other byte.
#[must_use]
pub const fn digit_value(byte: u8) -> Option<u32> {
    match byte {
        b'0'..=b'9' => Some((byte - b'0') as u32),
        b'a'..=b'z' => Some((byte - b'a') as u32 + 10),
        _ => None,
    }
}

/// Returns the digit character for `value`.
///
/// # Panics
///
/// Panics if `value >= 36`. Callers only pass values they have already
/// bounded to a single digit.
#[must_use]
pub fn digit_char(value: u32) -> char {
    char::from(DIGITS[value as usize])
}

/// Encodes an unsigned integer as base-36 without leading zeros.
#[must_use]
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        #[allow(clippy::cast_possible_truncation)]
        out.push(DIGITS[(value % u64::from(RADIX)) as usize]);
        value /= u64::from(RADIX);
    }
    out.reverse();
    // Only ASCII digits were pushed.
    out.into_iter().map(char::from).collect()
}

/// Decodes a non-empty base-36 string, returning `None` on an invalid digit
/// or on overflow of `u64`.
#[must_use]
pub fn decode(text: &str) -> Option<u64> {
    if text.is_empty() {
        return None;
    }
    text.bytes().try_fold(0u64, |acc, byte| {
        let digit = digit_value(byte)?;
        acc.checked_mul(u64::from(RADIX))?
            .checked_add(u64::from(digit))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_cover_alphabet() {
        assert_eq!(digit_value(b'0'), Some(0));
        assert_eq!(digit_value(b'9'), Some(9));
        assert_eq!(digit_value(b'a'), Some(10));
        assert_eq!(digit_value(b'z'), Some(35));
        assert_eq!(digit_value(b'A'), None);
        assert_eq!(digit_value(b'['), None);
        assert_eq!(digit_char(35), 'z');
    }

    #[test]
    fn encode_known_values() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(35), "z");
        assert_eq!(encode(36), "10");
        assert_eq!(encode(1295), "zz");
        assert_eq!(encode(u64::from(u32::MAX)), "1z141z3");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(decode(""), None);
        assert_eq!(decode("1Z"), None);
        assert_eq!(decode("-1"), None);
        assert_eq!(decode("zzzzzzzzzzzzzzzzzzzz"), None);
        assert_eq!(decode("1z141z3"), Some(u64::from(u32::MAX)));
    }
}
