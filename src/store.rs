//! The drop box: a directory where link-mode results wait for download.
//!
//! Stored names get a random 8-hex suffix (`report_1a2b3c4d.pdf`) so
//! concurrent requests for files with the same name never overwrite each
//! other. Names coming back from clients are checked against a strict
//! pattern before they touch the file system.

use crate::convert::write_atomic;
use crate::error::ConvertError;
use crate::output::Artifact;
use crate::validate::{file_stem, sanitize_file_name};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

static STORED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]{0,254}$").expect("static regex is valid")
});

/// Longest stem kept in a stored name; leaves room for the suffix and a
/// short extension under the 255-byte limit.
const MAX_STEM_LEN: usize = 200;

/// A file saved in the drop box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Handle to the output directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    /// Open (creating if needed) the drop box at `dir`.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, ConvertError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: dir.clone(),
                source: e,
            })?;
        info!("Output directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save an artifact under a fresh unique name.
    ///
    /// The stored name always passes [`resolve`](Self::resolve); an artifact
    /// whose extension alone would break that rule is refused with
    /// [`ConvertError::InvalidFileName`] before anything is written.
    pub async fn save(&self, artifact: &Artifact) -> Result<StoredFile, ConvertError> {
        let file_name = unique_name(&artifact.file_name);
        check_name(&file_name)?;
        let path = self.dir.join(&file_name);
        write_atomic(&path, &artifact.bytes).await?;
        debug!("Stored {} ({} bytes)", file_name, artifact.len());

        Ok(StoredFile {
            file_name,
            content_type: artifact.content_type.to_string(),
            size: artifact.len() as u64,
        })
    }

    /// Path of a stored file named by a client.
    ///
    /// # Errors
    /// - [`ConvertError::InvalidFileName`] for anything that is not a plain
    ///   file name (separators, `..`, hidden names, odd characters)
    /// - [`ConvertError::NotFound`] when no such file exists
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, ConvertError> {
        check_name(name)?;
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(ConvertError::NotFound(name.to_string())),
        }
    }

    /// Delete a stored file.
    pub async fn remove(&self, name: &str) -> Result<(), ConvertError> {
        let path = self.resolve(name).await?;
        tokio::fs::remove_file(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConvertError::NotFound(name.to_string()),
            _ => ConvertError::Internal(format!("Failed to delete '{}': {e}", path.display())),
        })?;
        info!("Deleted {}", name);
        Ok(())
    }

    /// All stored files, sorted by name. In-flight temp files are skipped.
    pub async fn list(&self) -> Result<Vec<StoredFile>, ConvertError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| ConvertError::Internal(format!("Failed to list output directory: {e}")))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ConvertError::Internal(format!("Failed to list output directory: {e}")))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.ends_with(".tmp") || check_name(&name).is_err() {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let content_type = mime_guess::from_path(&name)
                .first_or_octet_stream()
                .essence_str()
                .to_string();
            files.push(StoredFile {
                file_name: name,
                content_type,
                size: meta.len(),
            });
        }
        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }
}

/// Public URL of a stored file.
pub fn download_url(base_url: &str, file_name: &str) -> String {
    format!("{}/download/{}", base_url.trim_end_matches('/'), file_name)
}

fn check_name(name: &str) -> Result<(), ConvertError> {
    if STORED_NAME.is_match(name) && !name.contains("..") {
        Ok(())
    } else {
        Err(ConvertError::InvalidFileName(name.to_string()))
    }
}

/// `{stem}_{8 hex}.{ext}` for an artifact name, sanitised first.
fn unique_name(file_name: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let suffix = &id[..8];
    let safe = sanitize_file_name(file_name);
    let mut stem = file_stem(&safe);
    // Sanitised names are ASCII, so any byte index is a char boundary.
    stem.truncate(MAX_STEM_LEN);
    match Path::new(&safe).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{stem}_{suffix}"),
    }
}
