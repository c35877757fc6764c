#[cfg(test)]
pub(crate) mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{ChatbotError, Result};

/// Text of one PDF page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// A source PDF and its extracted pages, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfDocument {
    pub path: PathBuf,
    pub pages: Vec<PdfPage>,
}

/// Whether the path has a `.pdf` extension, in any case
#[inline]
pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// List the PDF files directly inside `dir`, sorted by path
#[inline]
pub fn find_pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_pdf(&path) {
            files.push(path);
        } else {
            debug!("Ignoring non-PDF entry {}", path.display());
        }
    }

    files.sort();
    Ok(files)
}

/// Load a PDF and extract the text of every page
#[inline]
pub fn load_pdf(path: &Path) -> Result<PdfDocument> {
    let document = lopdf::Document::load(path)
        .map_err(|e| ChatbotError::Pdf(format!("Failed to open {}: {}", path.display(), e)))?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    let mut pages = Vec::with_capacity(page_numbers.len());

    for number in page_numbers {
        let text = document.extract_text(&[number]).map_err(|e| {
            ChatbotError::Pdf(format!(
                "Failed to extract page {} of {}: {}",
                number,
                path.display(),
                e
            ))
        })?;
        pages.push(PdfPage { number, text });
    }

    debug!("Loaded {} pages from {}", pages.len(), path.display());

    Ok(PdfDocument {
        path: path.to_path_buf(),
        pages,
    })
}
