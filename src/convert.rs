//! Conversion entry points and the nine converters.
//!
//! A converter is a plain blocking function from an [`InputFile`] to one or
//! more [`Artifact`]s. [`convert`] looks it up for a [`ConversionKind`], runs
//! it on the blocking pool (pdfium and the office readers are synchronous),
//! and wraps the result with statistics.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, StageError};
use crate::kind::{ConversionKind, OutputFormat};
use crate::output::{Artifact, ConversionOutput, ConversionStats};
use crate::pipeline::input::InputFile;
use crate::pipeline::{encode, extract, render};
use crate::validate::validate_upload;
use crate::writer;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Signature shared by every converter.
pub type ConverterFn = fn(&InputFile, &ConversionConfig) -> Result<Vec<Artifact>, StageError>;

/// The converter registered for `kind`.
pub fn converter(kind: ConversionKind) -> ConverterFn {
    match kind {
        ConversionKind::JpgToPdf => jpg_to_pdf,
        ConversionKind::WordToPdf => word_to_pdf,
        ConversionKind::ExcelToPdf => excel_to_pdf,
        ConversionKind::PptToPdf => ppt_to_pdf,
        ConversionKind::HtmlToPdf => html_to_pdf,
        ConversionKind::PdfToJpg => pdf_to_jpg,
        ConversionKind::PdfToWord => pdf_to_word,
        ConversionKind::PdfToPpt => pdf_to_ppt,
        ConversionKind::PdfToExcel => pdf_to_excel,
    }
}

/// Run the conversion for `kind` on `input`.
///
/// The input is not validated here; use [`convert_tag`] or
/// [`crate::validate::validate_upload`] first for untrusted uploads.
///
/// # Errors
/// - [`ConvertError::ConversionFailed`] when a library rejects the input
///   (message: `"{label} conversion failed: {detail}"`), or when the input
///   yields no output at all, e.g. a PDF with zero pages
/// - [`ConvertError::PdfiumBindingFailed`] when pdfium cannot be loaded
pub async fn convert(
    kind: ConversionKind,
    input: InputFile,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let start = Instant::now();
    let input_bytes = input.bytes.len();
    info!(
        tag = kind.tag(),
        file_name = %input.file_name,
        input_bytes,
        "Starting conversion"
    );

    let run = converter(kind);
    let cfg = config.clone();
    let artifacts = tokio::task::spawn_blocking(move || run(&input, &cfg))
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {e}")))?
        .map_err(|e| {
            warn!(tag = kind.tag(), error = %e, "Conversion failed");
            ConvertError::from_stage(kind.label(), e)
        })?;
    if artifacts.is_empty() {
        warn!(tag = kind.tag(), "Conversion produced no files");
        return Err(ConvertError::ConversionFailed {
            conversion: kind.label(),
            detail: "the document has no pages".into(),
        });
    }

    let stats = ConversionStats {
        input_bytes,
        output_bytes: artifacts.iter().map(Artifact::len).sum(),
        artifact_count: artifacts.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        tag = kind.tag(),
        artifacts = stats.artifact_count,
        output_bytes = stats.output_bytes,
        duration_ms = stats.duration_ms,
        "Conversion complete"
    );

    Ok(ConversionOutput {
        kind,
        artifacts,
        stats,
    })
}

/// Parse `tag`, validate the upload against its allow-list, then convert.
pub async fn convert_tag(
    tag: &str,
    input: InputFile,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let kind: ConversionKind = tag.parse()?;
    validate_upload(
        kind,
        &input.file_name,
        input.content_type.as_deref(),
        &input.bytes,
    )?;
    convert(kind, input, config).await
}

/// Convert and write every artifact into `dir`.
///
/// Each file is written atomically (temp file + rename) so a reader never
/// sees a partial output. Returns the written paths in artifact order.
pub async fn convert_to_dir(
    kind: ConversionKind,
    input: InputFile,
    dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<Vec<PathBuf>, ConvertError> {
    let dir = dir.as_ref();
    let output = convert(kind, input, config).await?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut written = Vec::with_capacity(output.artifacts.len());
    for artifact in &output.artifacts {
        let path = dir.join(&artifact.file_name);
        write_atomic(&path, &artifact.bytes).await?;
        debug!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    kind: ConversionKind,
    input: InputFile,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(kind, input, config))
}

/// Write `bytes` to `path` through a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ConvertError> {
    let write_err = |e: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    Ok(())
}

// ── Converters ───────────────────────────────────────────────────────────

fn single(input: &InputFile, format: OutputFormat, bytes: Vec<u8>) -> Vec<Artifact> {
    vec![Artifact::new(
        format!("{}.{}", input.stem(), format.extension()),
        format.content_type(),
        bytes,
    )]
}

fn jpg_to_pdf(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let image = image::load_from_memory(&input.bytes)?;
    let pdf = writer::pdf::images_to_pdf(&[image], config)?;
    Ok(single(input, OutputFormat::Pdf, pdf))
}

fn word_to_pdf(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let paragraphs = extract::docx_paragraphs(input)?;
    let pdf = writer::pdf::text_to_pdf(&paragraphs, config)?;
    Ok(single(input, OutputFormat::Pdf, pdf))
}

fn excel_to_pdf(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let rows = extract::spreadsheet_rows(input)?;
    let pdf = writer::pdf::text_to_pdf(&rows, config)?;
    Ok(single(input, OutputFormat::Pdf, pdf))
}

fn ppt_to_pdf(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let slides = extract::presentation_slides(input)?;
    let mut lines = Vec::new();
    for (i, slide) in slides.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(slide.lines().map(str::to_string));
    }
    let pdf = writer::pdf::text_to_pdf(&lines, config)?;
    Ok(single(input, OutputFormat::Pdf, pdf))
}

fn html_to_pdf(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let lines = extract::html_lines(&input.bytes);
    let pdf = writer::pdf::text_to_pdf(&lines, config)?;
    Ok(single(input, OutputFormat::Pdf, pdf))
}

fn pdf_to_jpg(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let stem = input.stem();
    render::render_pages(&input.bytes, config)?
        .iter()
        .enumerate()
        .map(|(i, page)| -> Result<Artifact, StageError> {
            let jpeg = encode::encode_jpeg(page, config.jpeg_quality)?;
            Ok(Artifact::new(
                format!("{stem}_{}.jpg", i + 1),
                OutputFormat::Jpeg.content_type(),
                jpeg,
            ))
        })
        .collect()
}

/// Page texts with at least one non-whitespace character.
fn text_pages(input: &InputFile, config: &ConversionConfig) -> Result<Vec<String>, StageError> {
    let pages = extract::pdf_page_texts(&input.bytes, config)?;
    let total = pages.len();
    let kept: Vec<String> = pages.into_iter().filter(|t| !t.trim().is_empty()).collect();
    if kept.len() < total {
        debug!("{} of {} pages carry no text", total - kept.len(), total);
    }
    Ok(kept)
}

fn pdf_to_word(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let pages = text_pages(input, config)?;
    let docx = writer::docx::paragraphs_to_docx(&pages)?;
    Ok(single(input, OutputFormat::Docx, docx))
}

fn pdf_to_ppt(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let pages = text_pages(input, config)?;
    let pptx = writer::pptx::slides_to_pptx(&pages)?;
    Ok(single(input, OutputFormat::Pptx, pptx))
}

fn pdf_to_excel(input: &InputFile, config: &ConversionConfig) -> Result<Vec<Artifact>, StageError> {
    let rows: Vec<Vec<String>> = text_pages(input, config)?
        .iter()
        .map(|page| page.lines().map(str::to_string).collect())
        .collect();
    let xlsx = writer::xlsx::rows_to_xlsx(&rows)?;
    Ok(single(input, OutputFormat::Xlsx, xlsx))
}
