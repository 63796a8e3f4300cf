//! # edgequake-convert
//!
//! Convert images and office documents to and from PDF, as a library or as
//! an HTTP service.
//!
//! ## Conversions
//!
//! | Tag            | Accepts   | Produces                              |
//! |----------------|-----------|---------------------------------------|
//! | `jpg-to-pdf`   | JPEG, PNG | PDF, one page per image               |
//! | `word-to-pdf`  | DOC, DOCX | PDF of the document text              |
//! | `excel-to-pdf` | XLS, XLSX | PDF of the first sheet                |
//! | `ppt-to-pdf`   | PPT, PPTX | PDF of the slide text                 |
//! | `html-to-pdf`  | HTML      | PDF of the rendered text              |
//! | `pdf-to-jpg`   | PDF       | one JPEG per page                     |
//! | `pdf-to-word`  | PDF       | DOCX, a paragraph per page            |
//! | `pdf-to-ppt`   | PDF       | PPTX, a slide per page                |
//! | `pdf-to-excel` | PDF       | XLSX, a row per page, a cell per line |
//!
//! Every conversion reads or writes PDF through pdfium, which is bound at
//! runtime (`PDFIUM_LIB_PATH`, the working directory, then system paths).
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (multipart, Base64 JSON, URL or local path)
//!  │
//!  ├─ 1. Validate   tag lookup, MIME allow-list, size and emptiness checks
//!  ├─ 2. Convert    blocking converter on spawn_blocking
//!  │                  extract → layout → write  (text conversions)
//!  │                  render → encode           (pdf-to-jpg)
//!  └─ 3. Materialise link (saved + download URL), base64 (inline) or stream
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_convert::{convert_tag, ConversionConfig, InputFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let input = InputFile::from_path("report.pdf".as_ref()).await?;
//!     let output = convert_tag("pdf-to-word", input, &ConversionConfig::default()).await?;
//!     for artifact in &output.artifacts {
//!         std::fs::write(&artifact.file_name, &artifact.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `convertd` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when embedding the library or the router:
//! ```toml
//! edgequake-convert = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod kind;
pub mod materialize;
pub mod output;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod stream;
pub mod validate;
pub mod writer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ServerConfig};
pub use convert::{convert, convert_sync, convert_tag, convert_to_dir};
pub use error::{ConvertError, StageError};
pub use kind::{ConversionKind, OutputFormat, CONVERSIONS};
pub use materialize::{materialize, Materialized, OutputMode};
pub use output::{Artifact, ConversionOutput, ConversionStats};
pub use pipeline::input::InputFile;
pub use server::{router, serve, shutdown_signal, AppState};
pub use store::OutputStore;
