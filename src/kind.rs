//! Conversion tags and the static dispatch table.
//!
//! Every supported conversion is one row of [`CONVERSIONS`]: the tag a
//! client sends (`"pdf-to-word"`), the MIME types the upload may have, and
//! the format the converter produces. Lookup is by [`ConversionKind`]; the
//! converter function itself lives in [`crate::convert`].

use crate::error::ConvertError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the nine supported conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    JpgToPdf,
    WordToPdf,
    ExcelToPdf,
    PptToPdf,
    HtmlToPdf,
    PdfToJpg,
    PdfToWord,
    PdfToPpt,
    PdfToExcel,
}

/// File format produced by a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Pdf,
    Jpeg,
    Docx,
    Pptx,
    Xlsx,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Docx => "docx",
            OutputFormat::Pptx => "pptx",
            OutputFormat::Xlsx => "xlsx",
        }
    }

    /// `Content-Type` header value for files of this format.
    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            OutputFormat::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
            OutputFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// A row of the dispatch table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConversionSpec {
    pub kind: ConversionKind,
    pub tag: &'static str,
    /// Human label used in error messages, e.g. `"JPG-to-PDF"`.
    pub label: &'static str,
    pub accepts: &'static [&'static str],
    pub output: OutputFormat,
}

const PDF: &[&str] = &["application/pdf"];

/// The dispatch table, in the order conversions are listed to clients.
pub static CONVERSIONS: [ConversionSpec; 9] = [
    ConversionSpec {
        kind: ConversionKind::JpgToPdf,
        tag: "jpg-to-pdf",
        label: "JPG-to-PDF",
        accepts: &["image/jpeg", "image/png"],
        output: OutputFormat::Pdf,
    },
    ConversionSpec {
        kind: ConversionKind::WordToPdf,
        tag: "word-to-pdf",
        label: "Word-to-PDF",
        accepts: &[
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ],
        output: OutputFormat::Pdf,
    },
    ConversionSpec {
        kind: ConversionKind::ExcelToPdf,
        tag: "excel-to-pdf",
        label: "Excel-to-PDF",
        accepts: &[
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ],
        output: OutputFormat::Pdf,
    },
    ConversionSpec {
        kind: ConversionKind::PptToPdf,
        tag: "ppt-to-pdf",
        label: "PPT-to-PDF",
        accepts: &[
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        ],
        output: OutputFormat::Pdf,
    },
    ConversionSpec {
        kind: ConversionKind::HtmlToPdf,
        tag: "html-to-pdf",
        label: "HTML-to-PDF",
        accepts: &["text/html"],
        output: OutputFormat::Pdf,
    },
    ConversionSpec {
        kind: ConversionKind::PdfToJpg,
        tag: "pdf-to-jpg",
        label: "PDF-to-JPG",
        accepts: PDF,
        output: OutputFormat::Jpeg,
    },
    ConversionSpec {
        kind: ConversionKind::PdfToWord,
        tag: "pdf-to-word",
        label: "PDF-to-Word",
        accepts: PDF,
        output: OutputFormat::Docx,
    },
    ConversionSpec {
        kind: ConversionKind::PdfToPpt,
        tag: "pdf-to-ppt",
        label: "PDF-to-PPT",
        accepts: PDF,
        output: OutputFormat::Pptx,
    },
    ConversionSpec {
        kind: ConversionKind::PdfToExcel,
        tag: "pdf-to-excel",
        label: "PDF-to-Excel",
        accepts: PDF,
        output: OutputFormat::Xlsx,
    },
];

impl ConversionKind {
    /// All conversions in table order.
    pub fn all() -> impl Iterator<Item = ConversionKind> {
        CONVERSIONS.iter().map(|s| s.kind)
    }

    /// The dispatch-table row for this conversion.
    pub fn spec(self) -> &'static ConversionSpec {
        // The table holds exactly one row per variant, in declaration order.
        &CONVERSIONS[self as usize]
    }

    pub fn tag(self) -> &'static str {
        self.spec().tag
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn accepted_mime_types(self) -> &'static [&'static str] {
        self.spec().accepts
    }

    pub fn output(self) -> OutputFormat {
        self.spec().output
    }

    /// Whether the conversion can produce more than one artifact.
    pub fn is_multi_output(self) -> bool {
        self == ConversionKind::PdfToJpg
    }
}

impl FromStr for ConversionKind {
    type Err = ConvertError;

    /// Parse a conversion tag. Surrounding whitespace and case are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        CONVERSIONS
            .iter()
            .find(|spec| spec.tag.eq_ignore_ascii_case(tag))
            .map(|spec| spec.kind)
            .ok_or_else(|| ConvertError::UnsupportedConversion {
                tag: tag.to_string(),
            })
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_rows_match_variants() {
        for (i, spec) in CONVERSIONS.iter().enumerate() {
            assert_eq!(spec.kind as usize, i, "row {} out of order", spec.tag);
            assert_eq!(spec.kind.spec().tag, spec.tag);
        }
        assert_eq!(ConversionKind::all().count(), 9);
    }

    #[test]
    fn parse_trims_and_ignores_case() {
        assert_eq!(
            " PDF-to-Word ".parse::<ConversionKind>().unwrap(),
            ConversionKind::PdfToWord
        );
        assert_eq!(
            "jpg-to-pdf\n".parse::<ConversionKind>().unwrap(),
            ConversionKind::JpgToPdf
        );
    }

    #[test]
    fn parse_unknown_tag_fails() {
        let err = "pdf-to-mp3".parse::<ConversionKind>().unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedConversion { ref tag } if tag == "pdf-to-mp3"));
    }

    #[test]
    fn display_round_trips_tag() {
        for kind in ConversionKind::all() {
            assert_eq!(kind.to_string().parse::<ConversionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&ConversionKind::PdfToExcel).unwrap();
        assert_eq!(json, "\"pdf-to-excel\"");
    }

    #[test]
    fn outputs_and_content_types() {
        assert_eq!(ConversionKind::PdfToJpg.output().extension(), "jpg");
        assert_eq!(ConversionKind::PdfToJpg.output().content_type(), "image/jpeg");
        assert_eq!(ConversionKind::HtmlToPdf.output(), OutputFormat::Pdf);
        assert_eq!(ConversionKind::PdfToPpt.output().extension(), "pptx");
        assert!(ConversionKind::PdfToJpg.is_multi_output());
        assert!(!ConversionKind::PdfToWord.is_multi_output());
    }

    #[test]
    fn jpg_to_pdf_accepts_png() {
        assert!(ConversionKind::JpgToPdf
            .accepted_mime_types()
            .contains(&"image/png"));
    }
}
