use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("PDF file does not exist: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn page_count(&self) -> Result<usize> {
        let output = Command::new("pdfinfo")
            .arg(&self.path)
            .output()
            .with_context(|| format!("failed to invoke pdfinfo on {}", self.path.display()))?;

        if !output.status.success() {
            anyhow::bail!("pdfinfo failed with status: {}", output.status);
        }

        parse_page_count(&String::from_utf8_lossy(&output.stdout)).with_context(|| {
            format!(
                "pdfinfo output did not report a page count for {}",
                self.path.display()
            )
        })
    }
}

fn parse_page_count(pdfinfo_stdout: &str) -> Result<usize> {
    for line in pdfinfo_stdout.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            let num_str = rest.trim();
            return num_str.parse().with_context(|| {
                format!("failed to parse page count from 'Pages:' line: {num_str}")
            });
        }
    }
    anyhow::bail!("missing 'Pages:' line")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pages_line() {
        let stdout = "Title:          Report\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(stdout).unwrap(), 12);
    }

    #[test]
    fn rejects_output_without_pages() {
        assert!(parse_page_count("Title: x\n").is_err());
        assert!(parse_page_count("Pages: many\n").is_err());
    }

    #[test]
    fn missing_file_is_rejected() {
        assert!(PdfReader::new(PathBuf::from("/nonexistent/input.pdf")).is_err());
    }
}
