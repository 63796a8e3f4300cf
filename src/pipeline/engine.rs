//! pdfium binding.
//!
//! Every conversion reads or writes PDF through pdfium, a C++ library loaded
//! at runtime. Candidates are tried in order:
//!
//! 1. `ConversionConfig::pdfium_lib_path` (a library file or its directory)
//! 2. `PDFIUM_LIB_PATH`
//! 3. the current working directory
//! 4. the system library search path
//!
//! The first candidate that binds is remembered for the process lifetime so
//! later calls skip the probing.

use crate::config::ConversionConfig;
use crate::error::StageError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Where the library was found. `None` means the system loader.
static RESOLVED: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Bind to pdfium using the candidates above.
pub fn bind(config: &ConversionConfig) -> Result<Pdfium, StageError> {
    if let Some(resolved) = RESOLVED.get() {
        return bind_resolved(resolved.as_deref());
    }

    let mut failures = Vec::new();
    for candidate in candidates(config) {
        match Pdfium::bind_to_library(&candidate) {
            Ok(bindings) => {
                info!("Bound pdfium from {}", candidate.display());
                let _ = RESOLVED.set(Some(candidate));
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => {
                debug!("pdfium not loadable from {}: {:?}", candidate.display(), e);
                failures.push(format!("{}: {:?}", candidate.display(), e));
            }
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            info!("Bound system pdfium library");
            let _ = RESOLVED.set(None);
            Ok(Pdfium::new(bindings))
        }
        Err(e) => {
            failures.push(format!("system library: {e:?}"));
            Err(StageError::Engine(failures.join("; ")))
        }
    }
}

/// Whether pdfium can be bound with this configuration.
pub fn is_available(config: &ConversionConfig) -> bool {
    bind(config).is_ok()
}

fn bind_resolved(path: Option<&Path>) -> Result<Pdfium, StageError> {
    let bindings = match path {
        Some(p) => Pdfium::bind_to_library(p),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| StageError::Engine(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Library paths to probe before the system loader.
fn candidates(config: &ConversionConfig) -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Some(p) = &config.pdfium_lib_path {
        out.push(library_file(p));
    }
    if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
        if !env_path.is_empty() {
            out.push(library_file(Path::new(&env_path)));
        }
    }
    out.push(Pdfium::pdfium_platform_library_name_at_path("./"));
    out
}

/// A directory resolves to the platform library name inside it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}
