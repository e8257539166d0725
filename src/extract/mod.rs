use docx_rs::read_docx;
use log::warn;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),
    #[error("[PDF parsing failed] {0}")]
    Pdf(String),
    #[error("[Word parsing failed] {0}")]
    Word(String),
    #[error("[Text parsing failed] {0}")]
    Text(String),
}

/// Extensions the upload endpoint will dispatch to an extractor. Values
/// include the leading dot, as detected from the uploaded filename.
pub const SUPPORTED_EXTENSIONS: [&str; 4] = [".pdf", ".docx", ".doc", ".txt"];

pub fn is_supported(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension)
}

/// Lowercased extension of `filename` including the dot, or an empty string.
pub fn file_extension(filename: &str) -> String {
    match filename.rfind('.') {
        Some(idx) => filename[idx..].to_lowercase(),
        None => String::new(),
    }
}

/// Dispatch on the declared extension. Callers reject unsupported extensions
/// before reaching here; an unknown value still maps to a typed error.
pub fn extract(path: &Path, extension: &str) -> Result<String, ExtractError> {
    match extension {
        ".pdf" => parse_pdf(path),
        ".docx" | ".doc" => parse_word(path),
        ".txt" => parse_txt(path),
        other => Err(ExtractError::UnsupportedExtension(other.to_string())),
    }
}

/// Two-stage PDF extraction: layout-aware pass first, then a more lenient
/// page-by-page pass. Only the second failure is surfaced.
pub fn parse_pdf(path: &Path) -> Result<String, ExtractError> {
    parse_pdf_with(path, |p: &Path| pdf_extract::extract_text(p))
}

fn parse_pdf_with<E: std::fmt::Display>(
    path: &Path,
    primary: impl Fn(&Path) -> Result<String, E>
) -> Result<String, ExtractError> {
    match primary(path) {
        Ok(text) => Ok(text),
        Err(primary_err) => {
            warn!("primary PDF extraction failed: {}", primary_err);
            parse_pdf_lenient(path)
        }
    }
}

fn parse_pdf_lenient(path: &Path) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Concatenates paragraph texts in document order, joined by newlines.
pub fn parse_word(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path).map_err(|e| ExtractError::Word(e.to_string()))?;
    let docx = read_docx(&bytes).map_err(|e| ExtractError::Word(e.to_string()))?;

    let mut paragraphs = Vec::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            let mut text = String::new();
            for para_child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = para_child {
                    for run_child in run.children {
                        if let docx_rs::RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            paragraphs.push(text);
        }
    }
    Ok(paragraphs.join("\n"))
}

pub fn parse_txt(path: &Path) -> Result<String, ExtractError> {
    let bytes = fs::read(path).map_err(|e| ExtractError::Text(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExtractError::Text(e.to_string()))
}
