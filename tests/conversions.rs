//! End-to-end conversion tests through pdfium.
//!
//! Inputs are generated on the fly with the crate's own writers, so no
//! fixture files are needed. Every test skips with a message when the pdfium
//! shared library cannot be bound.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium cargo test --test conversions -- --nocapture
//!
//! Set `RUST_LOG=edgequake_convert=debug` to see the pipeline's logs.

use edgequake_convert::pipeline::{engine, extract};
use edgequake_convert::writer;
use edgequake_convert::writer::pdf::PageMetrics;
use edgequake_convert::{
    convert_tag, convert_to_dir, ConversionConfig, ConversionKind, ConvertError, InputFile,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test harness; later calls are no-ops.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Skip this test when pdfium is not available.
macro_rules! skip_without_pdfium {
    () => {{
        init_tracing();
        let config = ConversionConfig::default();
        if !engine::is_available(&config) {
            println!("SKIP: pdfium library not found (set PDFIUM_LIB_PATH)");
            return;
        }
        config
    }};
}

fn sample_image(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn png_bytes(img: &DynamicImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn text_pdf(lines: &[&str], config: &ConversionConfig) -> Vec<u8> {
    writer::pdf::text_to_pdf(lines, config).unwrap()
}

fn pdf_text(pdf: &[u8], config: &ConversionConfig) -> String {
    extract::pdf_page_texts(pdf, config).unwrap().join("\n")
}

// ── Into PDF ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn image_to_pdf() {
    let config = skip_without_pdfium!();
    let input = InputFile::new(
        "photo.png",
        Some("image/png".into()),
        png_bytes(&sample_image(320, 240)),
    );

    let output = convert_tag("jpg-to-pdf", input, &config).await.unwrap();
    assert_eq!(output.artifacts.len(), 1);
    let pdf = &output.artifacts[0];
    assert_eq!(pdf.file_name, "photo.pdf");
    assert_eq!(pdf.content_type, "application/pdf");
    assert!(pdf.bytes.starts_with(b"%PDF"));
    assert_eq!(output.stats.artifact_count, 1);
}

#[tokio::test]
async fn word_to_pdf_keeps_text() {
    let config = skip_without_pdfium!();
    let docx = writer::docx::paragraphs_to_docx(&["Quarterly report", "Revenue grew"]).unwrap();
    let input = InputFile::new("report.docx", None, docx);

    let output = convert_tag("word-to-pdf", input, &config).await.unwrap();
    let text = pdf_text(&output.artifacts[0].bytes, &config);
    assert!(text.contains("Quarterly report"), "got: {text}");
    assert!(text.contains("Revenue grew"), "got: {text}");
}

#[tokio::test]
async fn excel_to_pdf_renders_rows() {
    let config = skip_without_pdfium!();
    let xlsx = writer::xlsx::rows_to_xlsx(&[
        vec!["Name".to_string(), "Qty".to_string()],
        vec!["Apple".to_string(), "3".to_string()],
    ])
    .unwrap();
    let input = InputFile::new("stock.xlsx", None, xlsx);

    let output = convert_tag("excel-to-pdf", input, &config).await.unwrap();
    let text = pdf_text(&output.artifacts[0].bytes, &config);
    assert!(text.contains("Apple | 3"), "got: {text}");
}

#[tokio::test]
async fn ppt_to_pdf_renders_slides() {
    let config = skip_without_pdfium!();
    let pptx = writer::pptx::slides_to_pptx(&["Welcome deck", "Second slide"]).unwrap();
    let input = InputFile::new("deck.pptx", None, pptx);

    let output = convert_tag("ppt-to-pdf", input, &config).await.unwrap();
    let text = pdf_text(&output.artifacts[0].bytes, &config);
    assert!(text.contains("Welcome deck"), "got: {text}");
    assert!(text.contains("Second slide"), "got: {text}");
}

#[tokio::test]
async fn html_to_pdf_drops_markup() {
    let config = skip_without_pdfium!();
    let html = b"<html><body><h1>Release notes</h1><p>Bug fixes only.</p></body></html>";
    let input = InputFile::new("notes.html", None, html.to_vec());

    let output = convert_tag("html-to-pdf", input, &config).await.unwrap();
    let text = pdf_text(&output.artifacts[0].bytes, &config);
    assert!(text.contains("Release notes"), "got: {text}");
    assert!(!text.contains("<p>"), "got: {text}");
}

#[tokio::test]
async fn html_capitals_wrap_inside_the_margins() {
    let config = skip_without_pdfium!();
    let shout = "QUARTERLY MEMO WITH WIDE CAPITALS ".repeat(8);
    let html = format!("<html><body><p>{}</p></body></html>", shout.trim());
    let input = InputFile::new("memo.html", None, html.into_bytes());

    let output = convert_tag("html-to-pdf", input, &config).await.unwrap();
    let metrics = PageMetrics::a4(&config);
    let text = pdf_text(&output.artifacts[0].bytes, &config);
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    assert!(lines.len() > 1, "got: {text}");
    for line in &lines {
        let width = metrics.text_width(line.trim());
        assert!(
            metrics.margin + width <= metrics.width - metrics.margin + 0.5,
            "{line:?} is {width} pt wide"
        );
    }
}

// ── Out of PDF ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_to_jpg_one_file_per_page() {
    let config = skip_without_pdfium!();
    let pdf = writer::pdf::images_to_pdf(
        &[sample_image(200, 100), sample_image(100, 200)],
        &config,
    )
    .unwrap();
    let input = InputFile::new("scan.pdf", None, pdf);

    let output = convert_tag("pdf-to-jpg", input, &config).await.unwrap();
    let names: Vec<&str> = output
        .artifacts
        .iter()
        .map(|a| a.file_name.as_str())
        .collect();
    assert_eq!(names, ["scan_1.jpg", "scan_2.jpg"]);
    for artifact in &output.artifacts {
        assert_eq!(artifact.content_type, "image/jpeg");
        let img = image::load_from_memory(&artifact.bytes).unwrap();
        assert!(img.width() > 0 && img.height() > 0);
    }
    // Landscape first page, portrait second.
    let first = image::load_from_memory(&output.artifacts[0].bytes).unwrap();
    let second = image::load_from_memory(&output.artifacts[1].bytes).unwrap();
    assert!(first.width() > first.height());
    assert!(second.height() > second.width());
}

#[tokio::test]
async fn pdf_to_word_extracts_text() {
    let config = skip_without_pdfium!();
    let pdf = text_pdf(&["Hello world", "Second line"], &config);
    let input = InputFile::new("notes.pdf", None, pdf);

    let output = convert_tag("pdf-to-word", input, &config).await.unwrap();
    let docx = &output.artifacts[0];
    assert_eq!(docx.file_name, "notes.docx");

    let paragraphs =
        extract::docx_paragraphs(&InputFile::new("notes.docx", None, docx.bytes.clone())).unwrap();
    let text = paragraphs.join("\n");
    assert!(text.contains("Hello world"), "got: {text}");
    assert!(text.contains("Second line"), "got: {text}");
}

#[tokio::test]
async fn pdf_to_excel_puts_lines_in_cells() {
    let config = skip_without_pdfium!();
    let pdf = text_pdf(&["Alpha", "Beta"], &config);
    let input = InputFile::new("list.pdf", None, pdf);

    let output = convert_tag("pdf-to-excel", input, &config).await.unwrap();
    let xlsx = &output.artifacts[0];
    assert_eq!(xlsx.file_name, "list.xlsx");

    let rows =
        extract::spreadsheet_rows(&InputFile::new("list.xlsx", None, xlsx.bytes.clone())).unwrap();
    let joined = rows.join("\n");
    assert!(joined.contains("Alpha"), "got: {joined}");
    assert!(joined.contains("Beta"), "got: {joined}");
}

#[tokio::test]
async fn pdf_to_ppt_makes_slides() {
    let config = skip_without_pdfium!();
    let pdf = text_pdf(&["Agenda"], &config);
    let input = InputFile::new("talk.pdf", None, pdf);

    let output = convert_tag("pdf-to-ppt", input, &config).await.unwrap();
    let pptx = &output.artifacts[0];
    assert_eq!(pptx.file_name, "talk.pptx");

    let slides =
        extract::presentation_slides(&InputFile::new("talk.pptx", None, pptx.bytes.clone()))
            .unwrap();
    assert!(!slides.is_empty());
    assert!(slides.join("\n").contains("Agenda"));
}

#[tokio::test]
async fn corrupt_pdf_fails_with_label() {
    let config = skip_without_pdfium!();
    let input = InputFile::new("broken.pdf", None, b"%PDF-1.4 truncated".to_vec());

    let err = convert_tag("pdf-to-word", input, &config).await.unwrap_err();
    match err {
        ConvertError::ConversionFailed { conversion, .. } => assert_eq!(conversion, "PDF-to-Word"),
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn pdf_without_pages_fails_with_label() {
    let config = skip_without_pdfium!();
    let pdfium = engine::bind(&config).unwrap();
    let empty = pdfium.create_new_pdf().unwrap().save_to_bytes().unwrap();
    let input = InputFile::new("blank.pdf", None, empty);

    let err = convert_tag("pdf-to-jpg", input, &config).await.unwrap_err();
    match err {
        ConvertError::ConversionFailed { conversion, detail } => {
            assert_eq!(conversion, "PDF-to-JPG");
            assert!(detail.contains("no pages"), "got: {detail}");
        }
        other => panic!("expected ConversionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn convert_to_dir_writes_every_page() {
    let config = skip_without_pdfium!();
    let pdf = writer::pdf::images_to_pdf(
        &[sample_image(50, 50), sample_image(50, 50), sample_image(50, 50)],
        &config,
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();

    let written = convert_to_dir(
        ConversionKind::PdfToJpg,
        InputFile::new("pages.pdf", None, pdf),
        dir.path().join("out"),
        &config,
    )
    .await
    .unwrap();
    assert_eq!(written.len(), 3);
    for path in &written {
        assert!(path.exists());
        assert_eq!(path.extension().unwrap(), "jpg");
    }
}
