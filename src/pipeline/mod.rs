//! Pipeline stages shared by the converters.
//!
//! Each submodule wraps one library concern so converters stay short
//! compositions of stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract / render ──▶ layout / encode ──▶ writer
//! (bytes)   (pdfium, office     (wrap, paginate,    (pdf, docx,
//!            readers, html)      JPEG, Base64)       xlsx, pptx)
//! ```
//!
//! 1. [`input`]: the upload in memory, staged to a temp file on demand
//! 2. [`engine`]: locate and bind the pdfium shared library
//! 3. [`render`]: rasterise PDF pages
//! 4. [`extract`]: pull plain text out of PDF, Word, Excel, PowerPoint, HTML
//! 5. [`encode`]: JPEG and Base64 encoding
//! 6. [`layout`]: word wrapping and pagination for text-to-PDF

pub mod encode;
pub mod engine;
pub mod extract;
pub mod input;
pub mod layout;
pub mod render;
