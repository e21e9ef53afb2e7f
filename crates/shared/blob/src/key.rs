use crate::error::BlobError;
use std::borrow::Cow;

const HEX_PREFIX: &str = "hex:";

/// Renders a key for humans: printable UTF-8 stays as-is, anything else is
/// shown as `hex:<digits>`.
#[must_use]
pub fn display_key(key: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(key) {
        Ok(text) if !text.starts_with(HEX_PREFIX) && !text.chars().any(char::is_control) => {
            Cow::Borrowed(text)
        },
        _ => Cow::Owned(format!("{HEX_PREFIX}{}", hex::encode(key))),
    }
}

/// Parses the textual key form produced by [`display_key`].
///
/// # Errors
/// Returns [`BlobError::Internal`] if a `hex:` key carries invalid hex digits.
pub fn parse_key(text: &str) -> Result<Vec<u8>, BlobError> {
    text.strip_prefix(HEX_PREFIX).map_or_else(
        || Ok(text.as_bytes().to_vec()),
        |digits| {
            hex::decode(digits).map_err(|e| BlobError::Internal {
                message: format!("invalid hex key '{digits}': {e}").into(),
                context: Some("Parsing key".into()),
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_keys_are_shown_verbatim() {
        assert_eq!(display_key(b"team-a/report"), "team-a/report");
    }

    #[test]
    fn binary_keys_are_hex_escaped() {
        assert_eq!(display_key(&[0, 255, 16]), "hex:00ff10");
        assert_eq!(display_key(b"a\nb"), "hex:610a62");
    }

    #[test]
    fn keys_that_look_escaped_are_escaped_again() {
        let shown = display_key(b"hex:00");
        assert_eq!(parse_key(&shown).unwrap(), b"hex:00");
    }

    #[test]
    fn parse_reverses_display() {
        for key in [b"plain".to_vec(), vec![0, 1, 2, 254], Vec::new()] {
            assert_eq!(parse_key(&display_key(&key)).unwrap(), key);
        }
    }

    #[test]
    fn parse_rejects_bad_hex() {
        let err = parse_key("hex:zz").unwrap_err();
        assert!(matches!(err, BlobError::Internal { .. }));
    }
}
