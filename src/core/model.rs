use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::geometry::BBox;

/// Semantic category assigned to one content region.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Classification {
    Header,
    Footer,
    #[serde(rename = "Short Text")]
    Blurb,
    Caption,
    Image,
    List,
    Paragraph,
    Table,
    #[serde(rename = "Title/Subtitle")]
    Title,
    #[serde(rename = "Unclassified Text")]
    Unclassified,
}

impl Classification {
    pub const ALL: [Classification; 10] = [
        Classification::Header,
        Classification::Footer,
        Classification::Blurb,
        Classification::Caption,
        Classification::Image,
        Classification::List,
        Classification::Paragraph,
        Classification::Table,
        Classification::Title,
        Classification::Unclassified,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Header => "Header",
            Classification::Footer => "Footer",
            Classification::Blurb => "Short Text",
            Classification::Caption => "Caption",
            Classification::Image => "Image",
            Classification::List => "List",
            Classification::Paragraph => "Paragraph",
            Classification::Table => "Table",
            Classification::Title => "Title/Subtitle",
            Classification::Unclassified => "Unclassified Text",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Coordinates {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl From<BBox> for Coordinates {
    fn from(bbox: BBox) -> Self {
        Self {
            left: bbox.x,
            top: bbox.y,
            width: bbox.width,
            height: bbox.height,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub classification: Classification,
    pub text: String,
    pub coordinates: Coordinates,
}

impl Block {
    pub fn bbox(&self) -> BBox {
        let c = self.coordinates;
        BBox::new(c.left, c.top, c.width, c.height)
    }
}

/// Output of one pipeline run over a single page image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutResult {
    /// Reference returned by the upload collaborator; `None` when the upload failed.
    pub segmented_image_url: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageExtraction {
    pub page_number: usize,
    pub blocks: Vec<Block>,
    pub segmented_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub file_name: String,
    pub total_pages: usize,
    pub pages_processed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentExtraction {
    pub metadata: DocumentMetadata,
    pub page_extractions: Vec<PageExtraction>,
}

/// Text layer of one PDF page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextExtraction {
    pub page_number: usize,
    pub content: String,
}

/// One image embedded in a PDF page, segmented like a standalone page image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageExtraction {
    pub page_number: usize,
    /// 1-based position among the images extracted from the page.
    pub image_index: usize,
    /// File extension of the stored image stream, e.g. `jpg` or `png`.
    pub format: String,
    /// Size of the stored image stream in bytes.
    pub size: u64,
    pub segmented_image_url: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedMetadata {
    pub file_name: String,
    pub total_pages: usize,
    pub text_extractions_count: usize,
    pub image_extractions_count: usize,
}

/// Output of the low-resolution PDF mode: the embedded text layer plus the
/// embedded images, without rasterizing the pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddedExtraction {
    pub metadata: EmbeddedMetadata,
    pub text_extractions: Vec<TextExtraction>,
    pub image_extractions: Vec<ImageExtraction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_serializes_to_output_shape() {
        let block = Block {
            classification: Classification::Title,
            text: "Quarterly Report".to_string(),
            coordinates: BBox::new(4, 8, 120, 30).into(),
        };
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "classification": "Title/Subtitle",
                "text": "Quarterly Report",
                "coordinates": {"left": 4, "top": 8, "width": 120, "height": 30}
            })
        );
    }

    #[test]
    fn labels_match_serialized_names() {
        for class in Classification::ALL {
            let value = serde_json::to_value(class).unwrap();
            assert_eq!(value, serde_json::Value::String(class.label().to_string()));
        }
    }
}
