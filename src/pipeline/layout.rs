//! Plain-text layout: word wrapping and pagination.
//!
//! Wrapping is width-based: the caller supplies a measure that returns the
//! rendered width of a string in the same unit as the line width (points
//! for the PDF writer, characters in the tests below). Measures are assumed
//! additive, i.e. the width of a string is the sum of its characters' widths.

/// Wrap each input line so no output line measures more than `max_width`.
///
/// Breaks happen at whitespace; a word wider than `max_width` is split hard
/// between characters. Empty input lines are preserved as empty output
/// lines. A single character wider than `max_width` still gets a line of its
/// own.
pub fn wrap_lines<S, F>(lines: &[S], max_width: f32, measure: F) -> Vec<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> f32,
{
    let space = measure(" ");
    let mut out = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if line.trim().is_empty() {
            out.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0f32;
        for word in line.split_whitespace() {
            for (piece, width) in split_to_fit(word, max_width, &measure) {
                let needed = if current.is_empty() {
                    width
                } else {
                    current_width + space + width
                };
                if needed > max_width && !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                if !current.is_empty() {
                    current.push(' ');
                    current_width += space;
                }
                current.push_str(&piece);
                current_width += width;
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
    }

    out
}

/// A word as pieces no wider than `max_width`, each with its width.
fn split_to_fit<F>(word: &str, max_width: f32, measure: &F) -> Vec<(String, f32)>
where
    F: Fn(&str) -> f32,
{
    let whole = measure(word);
    if whole <= max_width {
        return vec![(word.to_string(), whole)];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;
    let mut buf = [0u8; 4];
    for c in word.chars() {
        let w = measure(c.encode_utf8(&mut buf));
        if !current.is_empty() && current_width + w > max_width {
            pieces.push((std::mem::take(&mut current), current_width));
            current_width = 0.0;
        }
        current.push(c);
        current_width += w;
    }
    if !current.is_empty() {
        pieces.push((current, current_width));
    }
    pieces
}

/// Split `lines` into pages of at most `per_page` lines. Always returns at
/// least one (possibly empty) page.
pub fn paginate(lines: Vec<String>, per_page: usize) -> Vec<Vec<String>> {
    let per_page = per_page.max(1);
    if lines.is_empty() {
        return vec![Vec::new()];
    }
    let mut pages = Vec::with_capacity(lines.len().div_ceil(per_page));
    let mut iter = lines.into_iter().peekable();
    while iter.peek().is_some() {
        pages.push(iter.by_ref().take(per_page).collect());
    }
    pages
}
