use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Reads the embedded text layer of single PDF pages through `pdftotext`.
#[derive(Debug, Clone, Default)]
pub struct PageTextReader;

impl PageTextReader {
    pub fn new() -> Self {
        Self
    }

    /// Text of page `page_idx` (0-based), or `None` when the page carries no
    /// text layer.
    pub fn read_page(&self, pdf_path: &Path, page_idx: usize) -> Result<Option<String>> {
        let page_number = (page_idx + 1).to_string();

        let output = Command::new("pdftotext")
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-enc")
            .arg("UTF-8")
            .arg(pdf_path)
            .arg("-")
            .output()
            .with_context(|| "failed to invoke pdftotext; is poppler-utils installed?")?;

        if !output.status.success() {
            anyhow::bail!(
                "pdftotext failed with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(clean_page_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Trims surrounding whitespace, including the form feed pdftotext emits
/// after every page.
fn clean_page_text(raw: &str) -> Option<String> {
    let text = raw.trim();
    (!text.is_empty()).then(|| text.to_string())
}
