//! Configuration types for conversions and for the HTTP service.
//!
//! [`ConversionConfig`] controls how converters call their libraries (render
//! DPI, JPEG quality, page typography) and is built through
//! [`ConversionConfigBuilder`], which clamps and validates each knob.
//! [`ServerConfig`] holds what only the HTTP layer needs: bind address,
//! drop-box directory, public URL and upload limit.

use crate::error::ConvertError;
use crate::materialize::OutputMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration shared by every converter.
///
/// # Example
/// ```rust
/// use edgequake_convert::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// DPI used when rasterising PDF pages to JPEG. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered image dimension in pixels. Default: 2000.
    ///
    /// Caps the long edge independently of DPI so an oversized page (posters,
    /// engineering drawings) cannot exhaust memory.
    pub max_rendered_pixels: u32,

    /// JPEG quality for rendered pages. Range: 1–100. Default: 85.
    pub jpeg_quality: u8,

    /// Resolution assumed for images placed on PDF pages. Default: 96.
    ///
    /// An image of `w × h` pixels becomes a page of `w × 72 / dpi` by
    /// `h × 72 / dpi` points.
    pub image_dpi: u32,

    /// Font size in points for text written to PDF. Default: 12.
    pub font_size: f32,

    /// Line height in millimetres for text written to PDF. Default: 10.
    pub line_height_mm: f32,

    /// User password for encrypted input PDFs.
    #[serde(skip_serializing)]
    pub pdf_password: Option<String>,

    /// Path to the pdfium shared library (file or directory). If None,
    /// `PDFIUM_LIB_PATH`, the working directory, and system paths are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            jpeg_quality: 85,
            image_dpi: 96,
            font_size: 12.0,
            line_height_mm: 10.0,
            pdf_password: None,
            pdfium_lib_path: None,
            download_timeout_secs: 120,
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn image_dpi(mut self, dpi: u32) -> Self {
        self.config.image_dpi = dpi;
        self
    }

    pub fn font_size(mut self, pt: f32) -> Self {
        self.config.font_size = pt;
        self
    }

    pub fn line_height_mm(mut self, mm: f32) -> Self {
        self.config.line_height_mm = mm;
        self
    }

    pub fn pdf_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.pdf_password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if c.image_dpi == 0 {
            return Err(ConvertError::InvalidConfig(
                "Image DPI must be ≥ 1".into(),
            ));
        }
        if !(4.0..=72.0).contains(&c.font_size) {
            return Err(ConvertError::InvalidConfig(format!(
                "Font size must be 4–72 pt, got {}",
                c.font_size
            )));
        }
        if c.line_height_mm <= 0.0 || c.line_height_mm > 50.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "Line height must be within (0, 50] mm, got {}",
                c.line_height_mm
            )));
        }
        Ok(self.config)
    }
}

/// Configuration of the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP address to bind. Default: `127.0.0.1:8000`.
    pub bind_address: String,

    /// Drop-box directory for link-mode results. Default: `static/converted_files`.
    pub output_dir: PathBuf,

    /// Base URL used to build download links. Default: `http://127.0.0.1:8000`.
    pub public_base_url: String,

    /// Largest accepted upload in bytes. Default: 50 MiB.
    pub max_upload_bytes: usize,

    /// Output mode of `POST /process` when the request does not choose one.
    pub default_output: OutputMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
            output_dir: PathBuf::from("static/converted_files"),
            public_base_url: "http://127.0.0.1:8000".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            default_output: OutputMode::Link,
        }
    }
}
