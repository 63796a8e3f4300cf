//! PDF rasterisation: render every page to `DynamicImage` via pdfium.
//!
//! pdfium is not async-safe; callers reach this through
//! [`crate::convert::convert`], which runs converters on the blocking pool.
//!
//! The target size comes from the page size at the configured DPI, with the
//! long edge capped at `max_rendered_pixels`. An A0 poster at 150 DPI would
//! otherwise come out around 7,000 × 10,000 px.

use crate::config::ConversionConfig;
use crate::error::StageError;
use crate::pipeline::engine;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Rasterise all pages of a PDF held in memory, in page order.
pub fn render_pages(
    pdf_bytes: &[u8],
    config: &ConversionConfig,
) -> Result<Vec<DynamicImage>, StageError> {
    let pdfium = engine::bind(config)?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, config.pdf_password.as_deref())
        .map_err(|e| StageError::Pdf(format!("{e:?}")))?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let mut images = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let (width, height) = target_size(
            page.width().value,
            page.height().value,
            config.dpi,
            config.max_rendered_pixels,
        );
        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_maximum_height(height as i32);

        let image = page
            .render_with_config(&render_config)
            .map_err(|e| StageError::Pdf(format!("page {}: {e:?}", idx + 1)))?
            .as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}

/// Pixel size of a page of `width_pt × height_pt` points at `dpi`, scaled
/// down so neither edge exceeds `max_pixels`.
pub fn target_size(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (u32, u32) {
    let scale = dpi as f32 / 72.0;
    let mut w = (width_pt * scale).max(1.0);
    let mut h = (height_pt * scale).max(1.0);

    let long_edge = w.max(h);
    if long_edge > max_pixels as f32 {
        let shrink = max_pixels as f32 / long_edge;
        w *= shrink;
        h *= shrink;
    }
    (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_150_dpi() {
        // 8.5 × 11 in
        assert_eq!(target_size(612.0, 792.0, 150, 2000), (1275, 1650));
    }

    #[test]
    fn long_edge_is_capped() {
        let (w, h) = target_size(612.0, 792.0, 400, 2000);
        assert_eq!(h, 2000);
        assert!(w < h);
        assert_eq!(w, 1545);
    }

    #[test]
    fn degenerate_page_still_has_a_pixel() {
        assert_eq!(target_size(0.0, 0.0, 150, 2000), (1, 1));
    }
}
