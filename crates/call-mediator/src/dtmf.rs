//! DTMF tone decoding, grounded on `decode_tone` in the original dialer.

use crate::api::DtmfTone;

/// Decode a raw backend tone character into a [`DtmfTone`]. Returns `None`
/// for anything the backend should never send; the worker logs and drops
/// such events rather than forwarding garbage to the client (§4.4).
pub fn decode_tone(raw: char) -> Option<DtmfTone> {
    match raw {
        '0' => Some(DtmfTone::Tone0),
        '1' => Some(DtmfTone::Tone1),
        '2' => Some(DtmfTone::Tone2),
        '3' => Some(DtmfTone::Tone3),
        '4' => Some(DtmfTone::Tone4),
        '5' => Some(DtmfTone::Tone5),
        '6' => Some(DtmfTone::Tone6),
        '7' => Some(DtmfTone::Tone7),
        '8' => Some(DtmfTone::Tone8),
        '9' => Some(DtmfTone::Tone9),
        'a' | 'A' => Some(DtmfTone::ToneA),
        'b' | 'B' => Some(DtmfTone::ToneB),
        'c' | 'C' => Some(DtmfTone::ToneC),
        'd' | 'D' => Some(DtmfTone::ToneD),
        '*' => Some(DtmfTone::ToneStar),
        '#' => Some(DtmfTone::ToneHash),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_digits() {
        assert_eq!(decode_tone('7'), Some(DtmfTone::Tone7));
    }

    #[test]
    fn decodes_letters_case_insensitively() {
        assert_eq!(decode_tone('b'), Some(DtmfTone::ToneB));
        assert_eq!(decode_tone('B'), Some(DtmfTone::ToneB));
    }

    #[test]
    fn decodes_star_and_hash() {
        assert_eq!(decode_tone('*'), Some(DtmfTone::ToneStar));
        assert_eq!(decode_tone('#'), Some(DtmfTone::ToneHash));
    }

    #[test]
    fn rejects_unknown_characters() {
        assert_eq!(decode_tone('x'), None);
        assert_eq!(decode_tone(' '), None);
    }
}
