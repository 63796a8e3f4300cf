//! Word output via docx-rs.

use crate::error::StageError;
use docx_rs::{BreakType, Docx, Paragraph, Run};
use std::io::Cursor;

/// One paragraph per entry; newlines inside an entry become line breaks.
pub fn paragraphs_to_docx<S: AsRef<str>>(paragraphs: &[S]) -> Result<Vec<u8>, StageError> {
    let mut docx = Docx::new();
    for text in paragraphs {
        let mut run = Run::new();
        for (i, line) in text.as_ref().lines().enumerate() {
            if i > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(line);
        }
        docx = docx.add_paragraph(Paragraph::new().add_run(run));
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| StageError::Word(e.to_string()))?;
    Ok(buf.into_inner())
}
