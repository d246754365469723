//! Text extraction from uploaded documents.
//!
//! Extraction is pipeline-layer: callers supply bytes plus a file type and
//! this module returns plain UTF-8 text or a typed error the pipeline skips
//! on. Plain-text formats pass through; binary formats (PDF, DOCX) are
//! rejected with [`ExtractError::Unsupported`] — wiring in real extractors
//! is out of scope, but the contract is fixed so they can slot in later.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("document is not valid UTF-8")]
    InvalidEncoding,
}

/// Extract plain text from `bytes` based on the lowercase file extension.
pub fn extract_text(bytes: &[u8], file_type: &str) -> Result<String, ExtractError> {
    match file_type.to_lowercase().as_str() {
        "txt" | "md" | "csv" => {
            String::from_utf8(bytes.to_vec()).map_err(|_| ExtractError::InvalidEncoding)
        }
        "pdf" | "docx" => Err(ExtractError::Unsupported(file_type.to_string())),
        // Unknown types get a lossy decode rather than a hard failure.
        _ => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_passes_through() {
        let text = extract_text("billing spec.".as_bytes(), "txt").unwrap();
        assert_eq!(text, "billing spec.");
    }

    #[test]
    fn binary_formats_are_rejected() {
        assert!(matches!(
            extract_text(b"%PDF-1.7", "pdf"),
            Err(ExtractError::Unsupported(_))
        ));
        assert!(matches!(
            extract_text(b"PK\x03\x04", "docx"),
            Err(ExtractError::Unsupported(_))
        ));
    }

    #[test]
    fn invalid_utf8_txt_is_an_error() {
        assert!(matches!(
            extract_text(&[0xff, 0xfe, 0x00], "txt"),
            Err(ExtractError::InvalidEncoding)
        ));
    }

    #[test]
    fn unknown_types_decode_lossily() {
        let text = extract_text(&[b'o', b'k', 0xff], "log").unwrap();
        assert!(text.starts_with("ok"));
    }
}
