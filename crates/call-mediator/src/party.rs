//! Party-name validation and transformation (§4.5).
//!
//! A phone number in E.164-ish `+<digits>` form is rewritten into the
//! backend's international-prefix form (`+15551234` -> `0015551234`). A
//! symbolic handle (`[a-zA-Z][a-zA-Z0-9_]*`) passes through unchanged.
//! Anything else is invalid and must not reach the backend.

use once_cell::sync::Lazy;
use regex::Regex;

static PHONE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+[1-9][0-9]*$").unwrap());
static SYMBOLIC_HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartyKind {
    Number,
    Symbolic,
    Unknown,
}

fn classify(party: &str) -> PartyKind {
    if PHONE_NUMBER.is_match(party) {
        PartyKind::Number
    } else if SYMBOLIC_HANDLE.is_match(party) {
        PartyKind::Symbolic
    } else {
        PartyKind::Unknown
    }
}

/// Validate and transform a party string into the form handed to the
/// backend's `call` command. Returns `None` for anything that is neither a
/// valid phone number nor a valid symbolic handle.
pub fn transform_party(party: &str) -> Option<String> {
    match classify(party) {
        PartyKind::Number => Some(format!("00{}", &party[1..])),
        PartyKind::Symbolic => Some(party.to_string()),
        PartyKind::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_number_gets_00_prefix() {
        assert_eq!(transform_party("+15551234"), Some("0015551234".to_string()));
        assert_eq!(transform_party("+4917012345"), Some("004917012345".to_string()));
    }

    #[test]
    fn symbolic_handle_passes_through() {
        assert_eq!(transform_party("alice_42"), Some("alice_42".to_string()));
        assert_eq!(transform_party("alice"), Some("alice".to_string()));
    }

    #[test]
    fn missing_plus_is_invalid() {
        assert_eq!(transform_party("15551234"), None);
    }

    #[test]
    fn malformed_number_is_invalid() {
        assert_eq!(transform_party("+0abc"), None);
    }

    #[test]
    fn empty_string_is_invalid() {
        assert_eq!(transform_party(""), None);
    }

    #[test]
    fn leading_digit_handle_is_invalid() {
        assert_eq!(transform_party("42alice"), None);
    }
}
