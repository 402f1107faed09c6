use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// One image stream written out by `pdfimages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub path: PathBuf,
    pub format: String,
    pub size: u64,
}

/// Extracts the images embedded in single PDF pages through `pdfimages -all`,
/// which keeps each stream in its native format (JPEG stays JPEG).
#[derive(Debug, Clone)]
pub struct EmbeddedImageExtractor {
    out_dir: PathBuf,
}

impl EmbeddedImageExtractor {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    /// Writes the images of page `page_idx` (0-based) into a directory of their
    /// own and returns them in page order. The caller removes the directory
    /// with [`EmbeddedImageExtractor::cleanup`].
    pub fn extract_page(&self, pdf_path: &Path, page_idx: usize) -> Result<Vec<EmbeddedImage>> {
        let page_number = page_idx + 1;
        let dir = self.page_dir(page_idx);
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let status = Command::new("pdfimages")
            .arg("-all")
            .arg("-f")
            .arg(page_number.to_string())
            .arg("-l")
            .arg(page_number.to_string())
            .arg(pdf_path)
            .arg(dir.join("img"))
            .status()
            .with_context(|| "failed to invoke pdfimages; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdfimages failed with status: {status}");
        }

        collect_images(&dir)
    }

    pub fn cleanup(&self, page_idx: usize) -> Result<()> {
        let dir = self.page_dir(page_idx);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to remove {}", dir.display()))?;
        }
        Ok(())
    }

    fn page_dir(&self, page_idx: usize) -> PathBuf {
        self.out_dir.join(format!("page_{:03}_images", page_idx + 1))
    }
}

/// Lists the files in `dir` ordered by name; pdfimages numbers them
/// `img-000.*`, `img-001.*`, ... in page order.
fn collect_images(dir: &Path) -> Result<Vec<EmbeddedImage>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() {
            continue;
        }
        let path = entry.path();
        let format = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        images.push(EmbeddedImage {
            path,
            format,
            size: metadata.len(),
        });
    }
    images.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_images_in_page_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("img-001.png"), [0u8; 12])?;
        fs::write(dir.path().join("img-000.JPG"), [0u8; 30])?;
        fs::create_dir(dir.path().join("nested"))?;

        let images = collect_images(dir.path())?;

        let summary: Vec<(String, u64)> =
            images.iter().map(|img| (img.format.clone(), img.size)).collect();
        assert_eq!(summary, vec![("jpg".to_string(), 30), ("png".to_string(), 12)]);
        Ok(())
    }

    #[test]
    fn cleanup_removes_page_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let extractor = EmbeddedImageExtractor::new(dir.path().to_path_buf());
        let page_dir = extractor.page_dir(2);
        fs::create_dir_all(&page_dir)?;
        fs::write(page_dir.join("img-000.png"), [0u8; 4])?;

        extractor.cleanup(2)?;
        assert!(!page_dir.exists());
        // missing directories are fine
        extractor.cleanup(5)?;
        Ok(())
    }

    #[test]
    #[ignore] // requires poppler-utils and a sample PDF
    fn extracts_images_from_first_page() {
        let pdf = PathBuf::from("test/sample.pdf");
        let dir = tempfile::tempdir().unwrap();
        let images = EmbeddedImageExtractor::new(dir.path().to_path_buf())
            .extract_page(&pdf, 0)
            .unwrap();
        assert!(images.iter().all(|img| img.size > 0));
    }
}
