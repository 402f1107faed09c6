use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::model::{DocumentExtraction, EmbeddedExtraction, LayoutResult};
use crate::export::Exporter;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn write<T: Serialize>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;
        let path = self.out_dir.join(file_name);
        let data = serde_json::to_string_pretty(value)?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

impl Exporter<LayoutResult> for JsonExporter {
    fn export(&self, layout: &LayoutResult) -> Result<()> {
        self.write("layout.json", layout).map(|_| ())
    }
}

impl Exporter<DocumentExtraction> for JsonExporter {
    fn export(&self, document: &DocumentExtraction) -> Result<()> {
        self.write("document.json", document).map(|_| ())
    }
}

impl Exporter<EmbeddedExtraction> for JsonExporter {
    fn export(&self, document: &EmbeddedExtraction) -> Result<()> {
        self.write("document.json", document).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::{Block, Classification, EmbeddedMetadata, TextExtraction};

    #[test]
    fn writes_layout_json() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let layout = LayoutResult {
            segmented_image_url: None,
            blocks: vec![Block {
                classification: Classification::Caption,
                text: "Figure 2: sample distribution".to_string(),
                coordinates: BBox::new(1, 2, 3, 4).into(),
            }],
        };

        JsonExporter::new(dir.path().to_path_buf()).export(&layout)?;

        let contents = fs::read_to_string(dir.path().join("layout.json"))?;
        let parsed: serde_json::Value = serde_json::from_str(&contents)?;
        assert_eq!(parsed["segmented_image_url"], serde_json::Value::Null);
        assert_eq!(parsed["blocks"][0]["classification"], "Caption");
        assert_eq!(parsed["blocks"][0]["coordinates"]["height"], 4);
        Ok(())
    }

    #[test]
    fn writes_embedded_extraction_counts() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let document = EmbeddedExtraction {
            metadata: EmbeddedMetadata {
                file_name: "report.pdf".to_string(),
                total_pages: 2,
                text_extractions_count: 1,
                image_extractions_count: 0,
            },
            text_extractions: vec![TextExtraction {
                page_number: 2,
                content: "Appendix".to_string(),
            }],
            image_extractions: Vec::new(),
        };

        JsonExporter::new(dir.path().to_path_buf()).export(&document)?;

        let contents = fs::read_to_string(dir.path().join("document.json"))?;
        let parsed: serde_json::Value = serde_json::from_str(&contents)?;
        assert_eq!(parsed["metadata"]["text_extractions_count"], 1);
        assert_eq!(parsed["text_extractions"][0]["page_number"], 2);
        assert_eq!(parsed["image_extractions"], serde_json::json!([]));
        Ok(())
    }
}
