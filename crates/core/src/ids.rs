//! Base-31 identifiers for pages and users.
//!
//! Ids use digits plus the lowercase consonants so that generated ids never
//! spell words. The first character is always a digit. New ids are produced
//! by incrementing the highest id in use, like an odometer.

use std::cmp::Ordering;

/// Every symbol an id may contain, in increasing order.
pub const BASE31_CHARS: &str = "0123456789bcdfghjklmnpqrstvwxyz";

/// Symbols allowed in the first position.
pub const BASE31_FIRST_CHARS: &str = "0123456789";

/// Seed used when no page or user exists yet.
pub const EMPTY_ID_SEED: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("Invalid character '{ch}' at position {position} in id")]
    InvalidChar { ch: char, position: usize },

    #[error("Id must not be empty")]
    Empty,
}

/// Return the symbol following `ch` at `position` and whether it wrapped to zero.
///
/// Position 0 only cycles through digits, later positions through the full
/// alphabet. Upper-case input is accepted and treated as lower-case.
pub fn next_base31_char(ch: char, position: usize) -> Result<(char, bool), IdError> {
    let alphabet = if position == 0 {
        BASE31_FIRST_CHARS
    } else {
        BASE31_CHARS
    };
    let lower = ch.to_ascii_lowercase();
    let index = alphabet
        .find(lower)
        .ok_or(IdError::InvalidChar { ch, position })?;

    let bytes = alphabet.as_bytes();
    if index + 1 < bytes.len() {
        Ok((bytes[index + 1] as char, false))
    } else {
        Ok((bytes[0] as char, true))
    }
}

/// Increment a base-31 id by one.
pub fn increment_base31_id(previous: &str) -> Result<String, IdError> {
    if previous.is_empty() {
        return Err(IdError::Empty);
    }

    let mut chars: Vec<char> = previous.chars().collect();
    let mut index = chars.len();
    loop {
        if index == 0 {
            chars.insert(0, '1');
            break;
        }
        index -= 1;
        let (next, carried) = next_base31_char(chars[index], index)?;
        chars[index] = next;
        if !carried {
            break;
        }
    }

    Ok(chars.into_iter().collect())
}

/// Length-then-value ordering used to find the highest id in use.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A usable page or user id starts with a non-zero digit.
pub fn is_id_valid(id: &str) -> bool {
    matches!(id.as_bytes().first(), Some(b'1'..=b'9'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_has_no_vowels_and_31_symbols() {
        assert_eq!(BASE31_CHARS.len(), 31);
        assert!(!BASE31_CHARS.chars().any(|c| "aeiou".contains(c)));
    }

    #[test]
    fn next_char_steps_through_alphabet() {
        assert_eq!(next_base31_char('0', 1).unwrap(), ('1', false));
        assert_eq!(next_base31_char('9', 1).unwrap(), ('b', false));
        assert_eq!(next_base31_char('d', 1).unwrap(), ('f', false));
        assert_eq!(next_base31_char('z', 1).unwrap(), ('0', true));
    }

    #[test]
    fn first_char_wraps_after_nine() {
        assert_eq!(next_base31_char('8', 0).unwrap(), ('9', false));
        assert_eq!(next_base31_char('9', 0).unwrap(), ('0', true));
    }

    #[test]
    fn next_char_rejects_vowels_and_letters_in_first_position() {
        assert_eq!(
            next_base31_char('a', 2),
            Err(IdError::InvalidChar { ch: 'a', position: 2 })
        );
        assert_eq!(
            next_base31_char('b', 0),
            Err(IdError::InvalidChar { ch: 'b', position: 0 })
        );
        assert!(next_base31_char('-', 1).is_err());
    }

    #[test]
    fn increment_simple() {
        assert_eq!(increment_base31_id("1").unwrap(), "2");
        assert_eq!(increment_base31_id("19").unwrap(), "1b");
        assert_eq!(increment_base31_id("5df").unwrap(), "5dg");
    }

    #[test]
    fn increment_nine_prepends_one() {
        assert_eq!(increment_base31_id("9").unwrap(), "10");
    }

    #[test]
    fn increment_carries_through_positions() {
        assert_eq!(increment_base31_id("1z").unwrap(), "20");
        assert_eq!(increment_base31_id("9z").unwrap(), "100");
        assert_eq!(increment_base31_id("3zz").unwrap(), "400");
    }

    #[test]
    fn increment_accepts_uppercase() {
        assert_eq!(increment_base31_id("1B").unwrap(), "1c");
    }

    #[test]
    fn increment_reports_bad_position() {
        assert_eq!(
            increment_base31_id("1a").unwrap_err(),
            IdError::InvalidChar { ch: 'a', position: 1 }
        );
        assert_eq!(
            increment_base31_id("bz").unwrap_err(),
            IdError::InvalidChar { ch: 'b', position: 0 }
        );
        assert_eq!(increment_base31_id("").unwrap_err(), IdError::Empty);
    }

    #[test]
    fn increment_is_strictly_greater() {
        let mut id = EMPTY_ID_SEED.to_string();
        for _ in 0..2_000 {
            let next = increment_base31_id(&id).unwrap();
            assert_eq!(compare_ids(&next, &id), Ordering::Greater, "{next} <= {id}");
            assert!(is_id_valid(&next));
            id = next;
        }
    }

    #[test]
    fn compare_uses_length_first() {
        assert_eq!(compare_ids("10", "z"), Ordering::Greater);
        assert_eq!(compare_ids("1b", "19"), Ordering::Greater);
        assert_eq!(compare_ids("5dg", "5dg"), Ordering::Equal);
    }

    #[test]
    fn id_validity() {
        assert!(is_id_valid("5dg"));
        assert!(!is_id_valid("0"));
        assert!(!is_id_valid("dg5"));
        assert!(!is_id_valid(""));
    }
}
