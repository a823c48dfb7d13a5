use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}")]
    Malformed { encoding: String },
}

/// Decode an exported file: BOM first, then strict UTF-8, then a chardetng
/// guess for legacy exports (Windows-1252 spreadsheets and the like).
pub fn decode_text(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(&bytes[bom_len..], encoding);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(DecodedText {
            text: text.to_string(),
            encoding_label: UTF_8.name().to_string(),
        });
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedText, DecodeError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(DecodedText {
        text: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bom_is_stripped() {
        let decoded = decode_text(b"\xEF\xBB\xBFID,Title").unwrap();
        assert_eq!(decoded.text, "ID,Title");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn plain_utf8_passes_through() {
        let decoded = decode_text("Größe: 3".as_bytes()).unwrap();
        assert_eq!(decoded.text, "Größe: 3");
    }

    #[test]
    fn legacy_single_byte_is_detected() {
        // German text encoded as Windows-1252.
        let bytes = b"Aufgabe f\xFCr M\xFCller, Gr\xF6\xDFe und \xC4nderung";
        let decoded = decode_text(bytes).unwrap();
        assert!(decoded.text.contains("für Müller"));
    }
}
