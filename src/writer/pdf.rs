//! PDF output through pdfium.
//!
//! Two page models:
//!
//! * [`images_to_pdf`] makes one page per image, sized to the image at
//!   `image_dpi`, the image filling the page.
//! * [`text_to_pdf`] typesets plain lines on A4 in Helvetica with fixed
//!   margins and line height, wrapping and breaking pages as needed.

use crate::config::ConversionConfig;
use crate::error::StageError;
use crate::pipeline::{engine, layout};
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

const MM_TO_PT: f32 = 72.0 / 25.4;
const A4_WIDTH_PT: f32 = 595.28;
const A4_HEIGHT_PT: f32 = 841.89;
const MARGIN_MM: f32 = 10.0;

/// Helvetica advance widths for ASCII 32..=126, in 1/1000 em (Adobe AFM).
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //  !"#$%&'()*+,-./
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0-9 :;<=>?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @A-O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P-Z [\]^_
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `a-o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // p-z {|}~
];

/// Width assumed for characters outside the table: a full em, at least as
/// wide as any Helvetica glyph but `@`.
const FALLBACK_WIDTH: u16 = 1000;

/// Advance width of `c` in Helvetica, in 1/1000 em.
fn helvetica_width(c: char) -> u16 {
    match c as u32 {
        code @ 32..=126 => HELVETICA_WIDTHS[(code - 32) as usize],
        _ => FALLBACK_WIDTH,
    }
}

fn pdf_err(e: PdfiumError) -> StageError {
    StageError::Pdf(format!("{e:?}"))
}

/// Page geometry for text output, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub line_height: f32,
}

impl PageMetrics {
    /// A4 portrait with 10 mm margins, typography from `config`.
    pub fn a4(config: &ConversionConfig) -> Self {
        Self {
            width: A4_WIDTH_PT,
            height: A4_HEIGHT_PT,
            margin: MARGIN_MM * MM_TO_PT,
            font_size: config.font_size,
            line_height: config.line_height_mm * MM_TO_PT,
        }
    }

    /// Width between the left and right margins.
    pub fn usable_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Rendered width of `text` in Helvetica at this font size.
    pub fn text_width(&self, text: &str) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(helvetica_width(c))).sum();
        units as f32 * self.font_size / 1000.0
    }

    /// Lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.height - 2.0 * self.margin;
        ((usable / self.line_height).floor() as usize).max(1)
    }
}

/// Size in points of an image of `width × height` pixels at `dpi`.
pub fn image_page_size(width: u32, height: u32, dpi: u32) -> (f32, f32) {
    let dpi = dpi.max(1) as f32;
    (width as f32 * 72.0 / dpi, height as f32 * 72.0 / dpi)
}

/// One page per image, each page exactly the size of its image.
pub fn images_to_pdf(
    images: &[DynamicImage],
    config: &ConversionConfig,
) -> Result<Vec<u8>, StageError> {
    let pdfium = engine::bind(config)?;
    let mut document = pdfium.create_new_pdf().map_err(pdf_err)?;

    for (idx, image) in images.iter().enumerate() {
        let (w, h) = image_page_size(image.width(), image.height(), config.image_dpi);
        let (w, h) = (PdfPoints::new(w), PdfPoints::new(h));
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(w, h))
            .map_err(pdf_err)?;
        page.objects_mut()
            .create_image_object(PdfPoints::new(0.0), PdfPoints::new(0.0), image, Some(w), Some(h))
            .map_err(pdf_err)?;
        debug!("Placed image {} on a {:.1}x{:.1} pt page", idx + 1, w.value, h.value);
    }

    document.save_to_bytes().map_err(pdf_err)
}

/// Wrap `lines` to the measured text width and break them into pages.
pub fn layout_pages<S: AsRef<str>>(lines: &[S], metrics: &PageMetrics) -> Vec<Vec<String>> {
    let wrapped = layout::wrap_lines(lines, metrics.usable_width(), |s| metrics.text_width(s));
    layout::paginate(wrapped, metrics.lines_per_page())
}

/// Typeset `lines` onto as many A4 pages as needed.
///
/// An empty input still yields a valid single blank page.
pub fn text_to_pdf<S: AsRef<str>>(
    lines: &[S],
    config: &ConversionConfig,
) -> Result<Vec<u8>, StageError> {
    let metrics = PageMetrics::a4(config);
    let pages = layout_pages(lines, &metrics);

    let pdfium = engine::bind(config)?;
    let mut document = pdfium.create_new_pdf().map_err(pdf_err)?;
    let font = document.fonts_mut().helvetica();
    let font_size = PdfPoints::new(metrics.font_size);

    for page_lines in &pages {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::a4())
            .map_err(pdf_err)?;

        // Baselines run down from the top margin, one line height apart.
        let mut y = metrics.height - metrics.margin - metrics.font_size;
        for line in page_lines {
            if !line.is_empty() {
                page.objects_mut()
                    .create_text_object(
                        PdfPoints::new(metrics.margin),
                        PdfPoints::new(y),
                        line,
                        font,
                        font_size,
                    )
                    .map_err(pdf_err)?;
            }
            y -= metrics.line_height;
        }
    }
    debug!("Typeset text onto {} pages", pages.len());

    document.save_to_bytes().map_err(pdf_err)
}
