//! Output types returned by the conversion API.

use crate::error::StageError;
use crate::kind::ConversionKind;
use serde::Serialize;
use std::io::{Cursor, Write};
use zip::write::{SimpleFileOptions, ZipWriter};

/// One produced output file.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// File name suggested to the client, e.g. `report_1.jpg`.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub content_type: &'static str,
    /// Encoded file contents.
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, content_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Complete output of a conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub kind: ConversionKind,
    /// Produced files, in page order for multi-file conversions.
    pub artifacts: Vec<Artifact>,
    pub stats: ConversionStats,
}

/// Statistics about a conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub artifact_count: usize,
    pub duration_ms: u64,
}

impl ConversionOutput {
    /// Collapse the output to a single file for streaming.
    ///
    /// A single artifact is returned as-is. Several artifacts are packed
    /// into `{stem}.zip` (deflate), entries in their original order.
    pub fn bundle(&self, stem: &str) -> Result<Artifact, StageError> {
        if let [only] = self.artifacts.as_slice() {
            return Ok(only.clone());
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for artifact in &self.artifacts {
            zip.start_file(artifact.file_name.as_str(), options)?;
            zip.write_all(&artifact.bytes)?;
        }
        let bytes = zip.finish()?.into_inner();

        Ok(Artifact::new(format!("{stem}.zip"), "application/zip", bytes))
    }
}
