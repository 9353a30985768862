//! Contact export
//!
//! Renders a single contact to Markdown text or a small PDF document.
//! Rendering is pure: it works on a [`ContactSnapshot`] and never sees
//! the store, so a failed export cannot affect stored contacts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::info;

use crate::models::Contact;

/// Errors that can occur while exporting
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Unknown export format '{0}' (expected 'markdown' or 'pdf')")]
    UnknownFormat(String),

    #[error("Failed to create export directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write export '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Pdf,
}

impl ExportFormat {
    /// File extension, without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Markdown => write!(f, "markdown"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }
}

/// A label/value pair as it appears in an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportField {
    pub label: String,
    pub value: String,
}

/// What gets exported: the name and the fields in stored order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSnapshot {
    pub name: String,
    pub fields: Vec<ExportField>,
}

impl ContactSnapshot {
    pub fn new(name: impl Into<String>, fields: Vec<ExportField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

impl From<&Contact> for ContactSnapshot {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            fields: contact
                .fields
                .iter()
                .map(|f| ExportField {
                    label: f.label.clone(),
                    value: f.value.clone(),
                })
                .collect(),
        }
    }
}

/// Render a contact as Markdown
pub fn render_markdown(snapshot: &ContactSnapshot) -> String {
    let body = snapshot
        .fields
        .iter()
        .map(|f| format!("**{}:** {}\n", f.label, f.value))
        .collect::<Vec<_>>()
        .join("\n");

    format!("# {}\n\n{}", snapshot.name, body)
}

/// Render in the requested format
pub fn render(snapshot: &ContactSnapshot, format: ExportFormat) -> Vec<u8> {
    match format {
        ExportFormat::Markdown => render_markdown(snapshot).into_bytes(),
        ExportFormat::Pdf => render_pdf(snapshot),
    }
}

/// File name for an exported contact: `<name>.<ext>`
pub fn default_file_name(name: &str, format: ExportFormat) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    let stem = if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "contact".to_string()
    } else {
        cleaned
    };

    format!("{}.{}", stem, format.extension())
}

/// Render and write the export into `dir`, returning the written path
pub fn export_to_dir(
    snapshot: &ContactSnapshot,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(default_file_name(&snapshot.name, format));
    fs::write(&path, render(snapshot, format)).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    info!("Exported '{}' as {} to {:?}", snapshot.name, format, path);
    Ok(path)
}

// ==================== PDF ====================

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const TITLE_SIZE: u32 = 16;
const BODY_SIZE: u32 = 12;
const FIRST_FIELD_Y_MM: f32 = 30.0;
const LINE_STEP_MM: f32 = 10.0;

fn mm_to_pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

/// One line of text, positioned from the top-left corner in millimetres
struct TextLine {
    x_mm: f32,
    y_mm: f32,
    size: u32,
    text: String,
}

fn layout(snapshot: &ContactSnapshot) -> Vec<Vec<TextLine>> {
    let mut pages = vec![vec![TextLine {
        x_mm: MARGIN_MM,
        y_mm: MARGIN_MM,
        size: TITLE_SIZE,
        text: snapshot.name.clone(),
    }]];

    let mut y = FIRST_FIELD_Y_MM;
    for field in &snapshot.fields {
        if y > PAGE_HEIGHT_MM - MARGIN_MM {
            pages.push(Vec::new());
            y = MARGIN_MM;
        }
        if let Some(page) = pages.last_mut() {
            page.push(TextLine {
                x_mm: MARGIN_MM,
                y_mm: y,
                size: BODY_SIZE,
                text: format!("{}: {}", field.label, field.value),
            });
        }
        y += LINE_STEP_MM;
    }

    pages
}

/// Map a character to its WinAnsiEncoding byte, if it has one
fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => match c {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            _ => None,
        },
    }
}

/// Encode text as the body of a PDF literal string
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let byte = match c {
            '\n' | '\r' | '\t' => b' ',
            c => win_ansi_byte(c).unwrap_or(b'?'),
        };
        if matches!(byte, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(byte);
    }
    out
}

fn content_stream(lines: &[TextLine]) -> Vec<u8> {
    let mut out = Vec::new();
    for line in lines {
        let x = mm_to_pt(line.x_mm);
        let y = mm_to_pt(PAGE_HEIGHT_MM - line.y_mm);
        out.extend_from_slice(
            format!("BT /F1 {} Tf {:.2} {:.2} Td (", line.size, x, y).as_bytes(),
        );
        out.extend_from_slice(&pdf_string(&line.text));
        out.extend_from_slice(b") Tj ET\n");
    }
    out
}

/// Minimal PDF 1.4 writer tracking object offsets for the xref table
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Append the next object; objects must be written in id order
    fn object(&mut self, body: &[u8]) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, data: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(&body);
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", count);
        for offset in &self.offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, xref_offset
        ));

        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Render a contact as a PDF document
pub fn render_pdf(snapshot: &ContactSnapshot) -> Vec<u8> {
    let pages = layout(snapshot);

    // 1: catalog, 2: page tree, 3: font, then a page/content pair per page
    let page_id = |i: usize| 4 + 2 * i;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_id(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut pdf = PdfWriter::new();
    pdf.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()).as_bytes());
    pdf.object(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );

    for (i, lines) in pages.iter().enumerate() {
        pdf.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                mm_to_pt(PAGE_WIDTH_MM),
                mm_to_pt(PAGE_HEIGHT_MM),
                page_id(i) + 1
            )
            .as_bytes(),
        );
        pdf.stream(&content_stream(lines));
    }

    pdf.finish()
}
