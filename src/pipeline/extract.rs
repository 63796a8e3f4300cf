//! Text extraction from the supported input formats.
//!
//! Every extractor returns plain text only; layout, fonts and images of the
//! source document are not carried over.

use crate::config::ConversionConfig;
use crate::error::StageError;
use crate::pipeline::engine;
use crate::pipeline::input::InputFile;
use calamine::{open_workbook_auto, Reader};
use tracing::{debug, warn};

/// Column width handed to html2text; our own layout wraps again for the page.
const HTML_RENDER_WIDTH: usize = 200;

/// Text of every page of a PDF, in page order. Pages without text yield an
/// empty string so indices still line up with page numbers.
pub fn pdf_page_texts(
    pdf_bytes: &[u8],
    config: &ConversionConfig,
) -> Result<Vec<String>, StageError> {
    let pdfium = engine::bind(config)?;
    let document = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, config.pdf_password.as_deref())
        .map_err(|e| StageError::Pdf(format!("{e:?}")))?;

    let mut texts = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| StageError::Pdf(format!("page {}: {e:?}", idx + 1)))?
            .all();
        let text = normalize_page_text(&text);
        debug!("Extracted {} chars from page {}", text.len(), idx + 1);
        texts.push(text);
    }
    Ok(texts)
}

/// Unify line endings and drop control characters other than tab and
/// newline. pdfium reports line ends as `\r\n` and page breaks or soft
/// hyphens as control codes that XML-based writers reject.
pub fn normalize_page_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| if c == '\r' { '\n' } else { c })
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect()
}

/// Paragraph texts of a Word document, one entry per line of output.
pub fn docx_paragraphs(input: &InputFile) -> Result<Vec<String>, StageError> {
    let staged = input.stage()?;
    let text = docx_lite::extract_text(staged.path())
        .map_err(|e| StageError::Word(e.to_string()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Rows of the first worksheet, cells joined with `" | "`. Rows whose cells
/// are all empty are skipped.
pub fn spreadsheet_rows(input: &InputFile) -> Result<Vec<String>, StageError> {
    let staged = input.stage()?;
    let mut workbook =
        open_workbook_auto(staged.path()).map_err(|e| StageError::Spreadsheet(e.to_string()))?;

    let Some(first) = workbook.sheet_names().first().cloned() else {
        warn!("Workbook '{}' has no worksheets", input.file_name);
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| StageError::Spreadsheet(e.to_string()))?;

    let rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>())
        .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
        .map(|cells| cells.join(" | "))
        .collect::<Vec<_>>();
    debug!("Read {} rows from sheet '{}'", rows.len(), first);
    Ok(rows)
}

/// Text of each slide of a presentation, in slide order.
pub fn presentation_slides(input: &InputFile) -> Result<Vec<String>, StageError> {
    use pptx_to_md::{ParserConfig, PptxContainer};

    let staged = input.stage()?;
    let config = ParserConfig::builder()
        .extract_images(false)
        .include_slide_comment(false)
        .build();

    let mut container = PptxContainer::open(staged.path(), config)
        .map_err(|e| StageError::Presentation(e.to_string()))?;
    let slides = container
        .parse_all()
        .map_err(|e| StageError::Presentation(e.to_string()))?;

    Ok(slide_texts(slides.into_iter().map(|slide| slide.convert_to_md())))
}

/// Plain text per slide from each slide's Markdown. A slide without Markdown
/// keeps its place as an empty entry and is logged.
fn slide_texts<I>(markdown: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    markdown
        .into_iter()
        .enumerate()
        .map(|(idx, md)| match md {
            Some(md) => strip_markdown(&md),
            None => {
                warn!(slide = idx + 1, "Slide could not be converted to text; leaving it empty");
                String::new()
            }
        })
        .collect()
}

/// Rendered text of an HTML document, one entry per line, each trimmed.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn html_lines(bytes: &[u8]) -> Vec<String> {
    let html = String::from_utf8_lossy(bytes);
    let text = html2text::from_read(html.as_bytes(), HTML_RENDER_WIDTH);
    text.lines().map(|l| l.trim().to_string()).collect()
}

/// Drop the Markdown decoration pptx-to-md adds around slide text: heading
/// and list markers, emphasis, table pipes.
fn strip_markdown(md: &str) -> String {
    md.lines()
        .map(|line| {
            let line = line.trim();
            let line = line.trim_start_matches('#').trim_start();
            let line = line
                .strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .unwrap_or(line);
            line.replace("**", "").trim_matches('|').trim().to_string()
        })
        .filter(|line| !line.chars().all(|c| c == '-' || c == '|' || c == ' ') || line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
