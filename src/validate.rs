//! Upload validation: check a file against the conversion's MIME allow-list.
//!
//! The MIME type is guessed from the file name, the same way a browser or
//! `mimetypes.guess_type` would. The declared multipart content type is only
//! consulted when the name carries no recognised extension; clients often
//! send `application/octet-stream` for everything, so the name is the more
//! reliable signal.

use crate::error::ConvertError;
use crate::kind::ConversionKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex is valid")
});

static DOT_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}").expect("static regex is valid"));

/// Validate an upload for `kind`.
///
/// # Errors
/// - [`ConvertError::EmptyInput`] when `bytes` is empty
/// - [`ConvertError::InvalidFormat`] when the guessed MIME type is not in the
///   conversion's allow-list
pub fn validate_upload(
    kind: ConversionKind,
    file_name: &str,
    declared_content_type: Option<&str>,
    bytes: &[u8],
) -> Result<(), ConvertError> {
    if bytes.is_empty() {
        return Err(ConvertError::EmptyInput {
            file_name: file_name.to_string(),
        });
    }

    let mime = guess_mime(file_name, declared_content_type);
    debug!(tag = kind.tag(), file_name, mime = ?mime, "validating upload");

    match mime {
        Some(m) if kind.accepted_mime_types().contains(&m.as_str()) => Ok(()),
        _ => Err(ConvertError::InvalidFormat {
            file_name: file_name.to_string(),
            expected: kind.accepted_mime_types().to_vec(),
        }),
    }
}

/// Guess the MIME type of an upload: file-name extension first, declared
/// content type (parameters stripped) as fallback.
pub fn guess_mime(file_name: &str, declared_content_type: Option<&str>) -> Option<String> {
    if let Some(m) = mime_guess::from_path(file_name).first_raw() {
        return Some(m.to_string());
    }
    declared_content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
}

/// Reduce a client-supplied file name to a safe single path component.
///
/// Directory parts are dropped, characters outside `[A-Za-z0-9._-]` become
/// `_`, runs of dots collapse to one, and leading dots and dashes are
/// removed. The result always starts with `[A-Za-z0-9_]` and never contains
/// `..`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    let cleaned = UNSAFE_CHARS.replace_all(base, "_");
    let cleaned = DOT_RUNS.replace_all(&cleaned, ".");
    let cleaned = cleaned.trim_start_matches(['.', '-']);
    if !cleaned.chars().any(|c| c.is_ascii_alphanumeric()) {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// The file stem of a (sanitised) name, e.g. `"report"` for `"report.pdf"`.
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("converted")
        .to_string()
}
