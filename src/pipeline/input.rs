//! Input handling: an uploaded file held in memory, staged to disk on demand.
//!
//! Most readers work from a byte slice. A few (docx-lite, calamine's
//! auto-detection, pptx-to-md) only open paths and pick their parser from
//! the extension, so [`InputFile::stage`] writes the bytes to a
//! `NamedTempFile` carrying the original extension. The file is removed when
//! the handle is dropped, even if the conversion fails halfway.

use crate::error::ConvertError;
use crate::validate::{file_stem, sanitize_file_name};
use futures::StreamExt;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// An uploaded or downloaded file.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Sanitised file name (single path component).
    pub file_name: String,
    /// Content type declared by the client or the remote server.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(file_name: &str, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: sanitize_file_name(file_name),
            content_type,
            bytes,
        }
    }

    /// Read a local file; the content type is left to name-based guessing.
    pub async fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::NotFound(path.display().to_string()),
            _ => ConvertError::Internal(format!("Failed to read '{}': {e}", path.display())),
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        Ok(Self::new(name, None, bytes))
    }

    /// File name without its extension, used to name outputs.
    pub fn stem(&self) -> String {
        file_stem(&self.file_name)
    }

    /// The upload's extension, lower-cased, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Write the bytes to a temp file that keeps the original extension.
    pub fn stage(&self) -> std::io::Result<NamedTempFile> {
        let suffix = self
            .extension()
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let mut tmp = tempfile::Builder::new()
            .prefix("convert-")
            .suffix(&suffix)
            .tempfile()?;
        tmp.write_all(&self.bytes)?;
        tmp.flush()?;
        debug!(path = %tmp.path().display(), bytes = self.bytes.len(), "staged input");
        Ok(tmp)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Download a remote file into memory, reading at most `max_bytes`.
///
/// The file name comes from the last URL path segment; the content type from
/// the response header. A declared `Content-Length` over the limit is
/// refused before the body is read; otherwise the body is read chunk by
/// chunk and the download stops as soon as the limit is passed.
///
/// # Errors
/// - [`ConvertError::DownloadFailed`] for transport errors and non-2xx replies
/// - [`ConvertError::DownloadTimeout`] when `timeout_secs` elapses
/// - [`ConvertError::PayloadTooLarge`] when the body exceeds `max_bytes`
pub async fn fetch_remote(
    url: &str,
    timeout_secs: u64,
    max_bytes: usize,
) -> Result<InputFile, ConvertError> {
    info!("Downloading input from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_error = |e: reqwest::Error| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ConvertError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_error)?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let file_name = filename_from_url(url);

    if let Some(declared) = response.content_length() {
        if declared > max_bytes as u64 {
            return Err(ConvertError::PayloadTooLarge {
                size: usize::try_from(declared).unwrap_or(usize::MAX),
                limit: max_bytes,
            });
        }
    }

    let mut bytes = Vec::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(map_send_error)?;
        if bytes.len() + chunk.len() > max_bytes {
            return Err(ConvertError::PayloadTooLarge {
                size: bytes.len() + chunk.len(),
                limit: max_bytes,
            });
        }
        bytes.extend_from_slice(&chunk);
    }
    info!(file_name = %file_name, bytes = bytes.len(), "Downloaded input");

    Ok(InputFile::new(&file_name, content_type, bytes))
}

/// Last non-empty path segment of `url`, or `"download"`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "download".to_string())
}
