//! Output modes: how a finished conversion reaches the client.
//!
//! | mode     | body                                               |
//! |----------|----------------------------------------------------|
//! | `link`   | JSON with download URLs; files saved to the store  |
//! | `base64` | JSON with every artifact Base64-encoded inline     |
//! | `stream` | the raw file (a ZIP when there are several)        |

use crate::error::{ConvertError, StageError};
use crate::output::{Artifact, ConversionOutput};
use crate::pipeline::encode::to_base64;
use crate::store::{download_url, OutputStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const SUCCESS_MESSAGE: &str = "File converted successfully";

/// How the converted output is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Save to the drop box and return download links.
    #[default]
    Link,
    /// Inline the bytes as Base64 in a JSON body.
    Base64,
    /// Return the file itself.
    Stream,
}

impl FromStr for OutputMode {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "link" => Ok(OutputMode::Link),
            "base64" => Ok(OutputMode::Base64),
            "stream" => Ok(OutputMode::Stream),
            other => Err(ConvertError::InvalidRequest(format!(
                "unknown output mode '{other}' (expected link, base64 or stream)"
            ))),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputMode::Link => "link",
            OutputMode::Base64 => "base64",
            OutputMode::Stream => "stream",
        })
    }
}

/// Body of a link-mode response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkResponse {
    pub message: String,
    /// URL of the first file, for clients that expect a single result.
    pub download_url: String,
    pub files: Vec<LinkedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedFile {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
    pub download_url: String,
}

/// Body of a base64-mode response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Base64Response {
    pub message: String,
    /// The conversion tag that produced the files.
    pub file_type: String,
    pub files: Vec<EncodedFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedFile {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

/// A conversion result ready to be written to the wire.
#[derive(Debug)]
pub enum Materialized {
    Link(LinkResponse),
    Base64(Base64Response),
    Stream(Artifact),
}

/// Turn `output` into the representation `mode` asks for.
///
/// `stem` names the ZIP bundle when a stream-mode result has several files.
/// In link mode either every artifact is stored or none is: when a save
/// fails, the files already stored for this result are removed again.
pub async fn materialize(
    mode: OutputMode,
    output: ConversionOutput,
    stem: &str,
    store: &OutputStore,
    public_base_url: &str,
) -> Result<Materialized, ConvertError> {
    match mode {
        OutputMode::Link => {
            let mut files = Vec::with_capacity(output.artifacts.len());
            for artifact in &output.artifacts {
                let stored = match store.save(artifact).await {
                    Ok(stored) => stored,
                    Err(e) => {
                        discard(store, &files).await;
                        return Err(e);
                    }
                };
                files.push(LinkedFile {
                    download_url: download_url(public_base_url, &stored.file_name),
                    file_name: stored.file_name,
                    content_type: stored.content_type,
                    size: stored.size,
                });
            }
            let first = files.first().map(|f| f.download_url.clone()).ok_or_else(|| {
                ConvertError::ConversionFailed {
                    conversion: output.kind.label(),
                    detail: "the document has no pages".into(),
                }
            })?;
            Ok(Materialized::Link(LinkResponse {
                message: SUCCESS_MESSAGE.to_string(),
                download_url: first,
                files,
            }))
        }
        OutputMode::Base64 => Ok(Materialized::Base64(Base64Response {
            message: SUCCESS_MESSAGE.to_string(),
            file_type: output.kind.tag().to_string(),
            files: output
                .artifacts
                .iter()
                .map(|a| EncodedFile {
                    file_name: a.file_name.clone(),
                    content_type: a.content_type.to_string(),
                    data: to_base64(&a.bytes),
                })
                .collect(),
        })),
        OutputMode::Stream => {
            let kind = output.kind;
            let bundle = output
                .bundle(stem)
                .map_err(|e: StageError| ConvertError::from_stage(kind.label(), e))?;
            Ok(Materialized::Stream(bundle))
        }
    }
}

/// Best-effort removal of files stored for a result that failed midway.
async fn discard(store: &OutputStore, files: &[LinkedFile]) {
    for file in files {
        if let Err(e) = store.remove(&file.file_name).await {
            warn!(file_name = %file.file_name, error = %e, "Failed to remove partial output");
        }
    }
}
