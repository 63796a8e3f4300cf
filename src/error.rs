//! Error types for the edgequake-convert library.
//!
//! Two error types reflect two distinct layers:
//!
//! * [`ConvertError`] is returned by every public operation. It carries
//!   enough classification for the HTTP layer to pick a status code
//!   (bad request, not found, conversion failure, internal error).
//!
//! * [`StageError`] is a failure inside one converter: a third-party library
//!   rejected the input or could not produce the output. The dispatcher
//!   wraps it into [`ConvertError::ConversionFailed`] together with the
//!   conversion label, so callers see `"PDF-to-Word conversion failed: …"`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-convert library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The conversion tag is not in the dispatch table.
    #[error("Unsupported file type: {tag}")]
    UnsupportedConversion { tag: String },

    /// The uploaded file's MIME type is not accepted by the conversion.
    #[error("Invalid file format: {file_name}. Expected format: {}", expected.join(", "))]
    InvalidFormat {
        file_name: String,
        expected: Vec<&'static str>,
    },

    /// The upload carried no bytes.
    #[error("Uploaded file '{file_name}' is empty")]
    EmptyInput { file_name: String },

    /// The upload exceeds the configured size limit.
    #[error("File too large: {size} bytes exceeds the maximum of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    /// A Base64 payload could not be decoded.
    #[error("Invalid Base64 payload: {0}")]
    InvalidBase64(String),

    /// The request is structurally wrong (missing field, bad output mode…).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A client-supplied file name is unsafe or malformed.
    #[error("Invalid file name: '{0}'")]
    InvalidFileName(String),

    /// No stored file with this name exists.
    #[error("File not found: {0}")]
    NotFound(String),

    // ── Remote input errors ───────────────────────────────────────────────
    /// URL was syntactically valid but the download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Conversion errors ─────────────────────────────────────────────────
    /// A converter's library call failed on this input.
    #[error("{conversion} conversion failed: {detail}")]
    ConversionFailed {
        conversion: &'static str,
        detail: String,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Every conversion reads or writes PDF through pdfium. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory).\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A failure inside a single converter stage.
///
/// Library errors that do not implement `std::error::Error` (pdfium,
/// docx readers) are captured as their debug string.
#[derive(Debug, Error)]
pub enum StageError {
    /// pdfium could not be bound; surfaces as [`ConvertError::PdfiumBindingFailed`].
    #[error("{0}")]
    Engine(String),

    /// pdfium failed to load, read, or write a document.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Image decoding or encoding failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Word document could not be read or written.
    #[error("Word document error: {0}")]
    Word(String),

    /// Spreadsheet could not be read or written.
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Presentation could not be read or written.
    #[error("presentation error: {0}")]
    Presentation(String),

    /// ZIP packaging failed.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Staging a temp file or writing a buffer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Wrap a stage failure for the conversion named `conversion`.
    pub fn from_stage(conversion: &'static str, err: StageError) -> Self {
        match err {
            StageError::Engine(detail) => ConvertError::PdfiumBindingFailed(detail),
            other => ConvertError::ConversionFailed {
                conversion,
                detail: other.to_string(),
            },
        }
    }

    /// Whether the error was caused by the client's request rather than the
    /// server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedConversion { .. }
                | ConvertError::InvalidFormat { .. }
                | ConvertError::EmptyInput { .. }
                | ConvertError::PayloadTooLarge { .. }
                | ConvertError::InvalidBase64(_)
                | ConvertError::InvalidRequest(_)
                | ConvertError::InvalidFileName(_)
                | ConvertError::NotFound(_)
                | ConvertError::ConversionFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_format_lists_expected_types() {
        let e = ConvertError::InvalidFormat {
            file_name: "notes.txt".into(),
            expected: vec!["image/jpeg", "image/png"],
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.txt"), "got: {msg}");
        assert!(msg.contains("image/jpeg, image/png"), "got: {msg}");
    }

    #[test]
    fn conversion_failed_display() {
        let e = ConvertError::ConversionFailed {
            conversion: "JPG-to-PDF",
            detail: "bad header".into(),
        };
        assert_eq!(e.to_string(), "JPG-to-PDF conversion failed: bad header");
    }

    #[test]
    fn stage_engine_error_becomes_binding_failure() {
        let e = ConvertError::from_stage("PDF-to-JPG", StageError::Engine("no lib".into()));
        assert!(matches!(e, ConvertError::PdfiumBindingFailed(_)));
        assert!(!e.is_client_error());
    }

    #[test]
    fn stage_library_error_becomes_conversion_failure() {
        let e = ConvertError::from_stage(
            "Excel-to-PDF",
            StageError::Spreadsheet("no worksheet".into()),
        );
        assert_eq!(
            e.to_string(),
            "Excel-to-PDF conversion failed: spreadsheet error: no worksheet"
        );
        assert!(e.is_client_error());
    }

    #[test]
    fn unsupported_conversion_display() {
        let e = ConvertError::UnsupportedConversion {
            tag: "pdf-to-mp3".into(),
        };
        assert_eq!(e.to_string(), "Unsupported file type: pdf-to-mp3");
    }
}
