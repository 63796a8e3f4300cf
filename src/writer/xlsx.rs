//! Excel output via rust_xlsxwriter: a single sheet, no header row.

use crate::error::StageError;
use rust_xlsxwriter::Workbook;

/// Longest string Excel stores in one cell.
const MAX_CELL_CHARS: usize = 32_767;

/// Write `rows` to the first worksheet, starting at A1.
pub fn rows_to_xlsx(rows: &[Vec<String>]) -> Result<Vec<u8>, StageError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let text = truncate_chars(cell, MAX_CELL_CHARS);
            sheet
                .write_string(r as u32, c as u16, text)
                .map_err(|e| StageError::Spreadsheet(e.to_string()))?;
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| StageError::Spreadsheet(e.to_string()))
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
