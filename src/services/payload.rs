use crate::error::AppError;
use crate::models::DecodedPayload;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;
use std::sync::LazyLock;

static DATA_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:(.+);base64,(.+)$").expect("data URL pattern"));

static FILE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[^/.]+$").expect("extension pattern"));

// Padding is optional and stray trailing bits are dropped, as Node's Buffer does.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a data URL (`data:<mime>;base64,<data>`) or a bare base64 string.
pub fn decode_payload(payload: &str) -> Result<DecodedPayload, AppError> {
    let (mime_type, encoded) = match DATA_URL.captures(payload) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().to_string()),
            caps.get(2).map_or("", |m| m.as_str()),
        ),
        None => (None, payload),
    };

    let bytes = decode_base64(encoded)?;
    Ok(DecodedPayload { bytes, mime_type })
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, AppError> {
    // Whitespace is ignored and the URL-safe alphabet is folded into the standard one.
    let normalized: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();

    LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| AppError::Validation(format!("file is not valid base64: {e}")))
}

/// Storage identifier for an uploaded file: the filename without its last extension.
///
/// Returns `None` when no usable name is left, so the provider picks one.
pub fn public_id_for(filename: Option<&str>) -> Option<String> {
    let filename = filename.filter(|f| !f.is_empty())?;
    let stem = FILE_EXTENSION.replace(filename, "");
    (!stem.is_empty()).then(|| stem.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    // "hello world"
    const HELLO_B64: &str = "aGVsbG8gd29ybGQ=";

    #[test]
    fn data_url_and_bare_base64_decode_identically() {
        let bare = decode_payload(HELLO_B64).unwrap();
        let data_url = decode_payload(&format!("data:image/png;base64,{HELLO_B64}")).unwrap();

        assert_eq!(bare.bytes, b"hello world");
        assert_eq!(data_url.bytes, bare.bytes);
        assert_eq!(data_url.mime_type.as_deref(), Some("image/png"));
        assert_eq!(bare.mime_type, None);
    }

    #[test]
    fn missing_padding_and_whitespace_are_tolerated() {
        let decoded = decode_payload("aGVsbG8g\nd29ybGQ").unwrap();
        assert_eq!(decoded.bytes, b"hello world");
    }

    #[test]
    fn url_safe_alphabet_is_accepted() {
        // 0xfb 0xff encodes to "+/8" in the standard alphabet
        assert_eq!(decode_payload("-_8").unwrap().bytes, vec![0xfb, 0xff]);
    }

    #[test]
    fn nonzero_trailing_bits_are_ignored() {
        assert_eq!(decode_payload("QR==").unwrap().bytes, b"A");
    }

    #[test]
    fn garbage_is_a_validation_error() {
        let err = decode_payload("not*base64!").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn non_base64_data_url_is_treated_as_bare_payload() {
        // No ";base64," marker, so the whole string must be base64, and it is not.
        assert!(decode_payload("data:text/plain,hello").is_err());
    }

    #[test]
    fn extension_is_stripped() {
        assert_eq!(public_id_for(Some("story.png")).as_deref(), Some("story"));
        assert_eq!(public_id_for(Some("my.book.pdf")).as_deref(), Some("my.book"));
    }

    #[test]
    fn name_without_extension_is_unchanged() {
        assert_eq!(public_id_for(Some("story")).as_deref(), Some("story"));
        assert_eq!(public_id_for(Some("dir.v2/cover")).as_deref(), Some("dir.v2/cover"));
        assert_eq!(public_id_for(Some("trailing.")).as_deref(), Some("trailing."));
    }

    #[test]
    fn missing_or_empty_name_leaves_id_unset() {
        assert_eq!(public_id_for(None), None);
        assert_eq!(public_id_for(Some("")), None);
        assert_eq!(public_id_for(Some(".png")), None);
    }
}
