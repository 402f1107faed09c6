use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::error::LayoutError;
use crate::core::geometry::BBox;
use crate::core::model::{
    Block, Classification, DocumentExtraction, DocumentMetadata, EmbeddedExtraction,
    EmbeddedMetadata, ImageExtraction, LayoutResult, PageExtraction, TextExtraction,
};
use crate::core::region_classifier::{ClassifierConfig, RegionClassifier};
use crate::export::{AnnotationConfig, Annotator, ImageUploader};
use crate::ocr::{OcrMode, TextExtractor};
use crate::pdf::{EmbeddedImage, EmbeddedImageExtractor, PageRenderer, PageTextReader, PdfReader};
use crate::segment::{BoxMerger, DetectorConfig, MergeConfig, MorphologicalDetector};

/// What to do with a region whose OCR call fails.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OcrFailurePolicy {
    /// Keep the block as unclassified text with empty content.
    #[default]
    EmptyText,
    /// Leave the block out of the result.
    Skip,
}

/// Tunable thresholds for every stage of the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub detector: DetectorConfig,
    pub merge: MergeConfig,
    pub classifier: ClassifierConfig,
    pub annotation: AnnotationConfig,
    pub ocr_failure: OcrFailurePolicy,
}

impl LayoutConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}

/// Command-line level settings for one conversion.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub dpi: u32,
    pub layout: LayoutConfig,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output: PathBuf, dpi: u32) -> Self {
        Self {
            input,
            output,
            dpi,
            layout: LayoutConfig::default(),
        }
    }

    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }
}

/// Detects, merges, classifies and annotates the content regions of a page
/// image. Holds no per-image state; each call is independent.
pub struct LayoutPipeline<E, U> {
    detector: MorphologicalDetector,
    merger: BoxMerger,
    classifier: RegionClassifier,
    annotator: Annotator,
    ocr_failure: OcrFailurePolicy,
    ocr: E,
    uploader: U,
}

impl<E: TextExtractor, U: ImageUploader> LayoutPipeline<E, U> {
    pub fn new(config: &LayoutConfig, ocr: E, uploader: U) -> Self {
        Self {
            detector: MorphologicalDetector::new(config.detector.clone()),
            merger: BoxMerger::new(config.merge.clone()),
            classifier: RegionClassifier::new(config.classifier.clone()),
            annotator: Annotator::new(&config.annotation),
            ocr_failure: config.ocr_failure,
            ocr,
            uploader,
        }
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn run_path(&self, path: &Path) -> Result<LayoutResult, LayoutError> {
        let image = image::open(path)
            .map_err(|e| LayoutError::image_decode(path.display().to_string(), e))?;
        Ok(self.run(&image))
    }

    pub fn run_bytes(&self, bytes: &[u8]) -> Result<LayoutResult, LayoutError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| LayoutError::image_decode("in-memory buffer", e))?;
        Ok(self.run(&image))
    }

    pub fn run(&self, image: &DynamicImage) -> LayoutResult {
        let (width, height) = image.dimensions();
        let page = image.to_rgb8();

        let raw = self.detector.sweep(image);
        let boxes = self.merger.merge(&raw.boxes, width, height);
        info!(
            width,
            height,
            iterations = raw.iterations,
            raw = raw.boxes.len(),
            merged = boxes.len(),
            "detected content regions"
        );

        let mut annotated = page.clone();
        let mut blocks = Vec::with_capacity(boxes.len());

        for bbox in boxes {
            let outcome = self.extract_block(&page, bbox, height);
            let block = match outcome {
                Ok(block) => Some(block),
                Err(err) => {
                    warn!(?bbox, error = %err, policy = ?self.ocr_failure, "OCR failed for region");
                    match self.ocr_failure {
                        OcrFailurePolicy::EmptyText => Some(Block {
                            classification: Classification::Unclassified,
                            text: String::new(),
                            coordinates: bbox.into(),
                        }),
                        OcrFailurePolicy::Skip => None,
                    }
                }
            };

            let class = block
                .as_ref()
                .map(|b| b.classification)
                .unwrap_or(Classification::Unclassified);
            self.annotator.draw(&mut annotated, bbox, class);
            blocks.extend(block);
        }

        let segmented_image_url = match self.publish(&annotated) {
            Ok(reference) => Some(reference),
            Err(err) => {
                error!(error = %err, "failed to upload annotated image");
                None
            }
        };

        LayoutResult {
            segmented_image_url,
            blocks,
        }
    }

    fn publish(&self, annotated: &RgbImage) -> Result<String, LayoutError> {
        Ok(self.uploader.upload(annotated)?)
    }

    fn extract_block(
        &self,
        page: &RgbImage,
        bbox: BBox,
        page_height: u32,
    ) -> Result<Block, LayoutError> {
        let classification = self.classifier.classify(page, bbox, page_height, &self.ocr)?;
        let crop = image::imageops::crop_imm(page, bbox.x, bbox.y, bbox.width, bbox.height)
            .to_image();
        let text = self.ocr.extract_text(&crop, OcrMode::Default)?;
        debug!(?bbox, %classification, chars = text.len(), "classified region");

        Ok(Block {
            classification,
            text,
            coordinates: bbox.into(),
        })
    }

    /// Renders every page of `pdf` and runs the image pipeline on it. Pages
    /// that fail to render are logged and left out.
    pub fn run_pdf(&self, pdf: &PdfReader, renderer: &PageRenderer) -> Result<DocumentExtraction> {
        let total_pages = pdf.page_count()?;
        let mut page_extractions = Vec::with_capacity(total_pages);

        for page_idx in 0..total_pages {
            let rendered = match renderer.render_page(pdf.path(), page_idx) {
                Ok(rendered) => rendered,
                Err(err) => {
                    error!(page = page_idx + 1, error = %format!("{err:#}"), "skipping page");
                    continue;
                }
            };

            info!(
                page = page_idx + 1,
                width = rendered.width(),
                height = rendered.height(),
                "rendered page"
            );
            let layout = self.run(&rendered.image);
            page_extractions.push(PageExtraction {
                page_number: page_idx + 1,
                blocks: layout.blocks,
                segmented_image_url: layout.segmented_image_url,
            });

            if let Err(err) = fs::remove_file(&rendered.path) {
                debug!(path = %rendered.path.display(), error = %err, "could not remove rendered page");
            }
        }

        Ok(DocumentExtraction {
            metadata: DocumentMetadata {
                file_name: pdf.file_name(),
                total_pages,
                pages_processed: page_extractions.len(),
            },
            page_extractions,
        })
    }

    /// Reads the text layer of every page and segments each embedded image
    /// on its own, without rasterizing the pages. Pages whose text or images
    /// cannot be extracted are logged and contribute nothing.
    pub fn run_pdf_embedded(
        &self,
        pdf: &PdfReader,
        text_reader: &PageTextReader,
        image_extractor: &EmbeddedImageExtractor,
    ) -> Result<EmbeddedExtraction> {
        let total_pages = pdf.page_count()?;
        let mut text_extractions = Vec::new();
        let mut image_extractions = Vec::new();

        for page_idx in 0..total_pages {
            let page_number = page_idx + 1;

            match text_reader.read_page(pdf.path(), page_idx) {
                Ok(Some(content)) => text_extractions.push(TextExtraction {
                    page_number,
                    content,
                }),
                Ok(None) => debug!(page = page_number, "page has no text layer"),
                Err(err) => {
                    error!(page = page_number, error = %format!("{err:#}"), "failed to read page text");
                }
            }

            let images = match image_extractor.extract_page(pdf.path(), page_idx) {
                Ok(images) => images,
                Err(err) => {
                    error!(page = page_number, error = %format!("{err:#}"), "failed to extract page images");
                    Vec::new()
                }
            };

            for (idx, embedded) in images.iter().enumerate() {
                match self.segment_embedded_image(page_number, idx + 1, embedded) {
                    Ok(extraction) => image_extractions.push(extraction),
                    Err(err) => warn!(
                        page = page_number,
                        image = idx + 1,
                        format = %embedded.format,
                        error = %err,
                        "skipping embedded image"
                    ),
                }
            }

            if let Err(err) = image_extractor.cleanup(page_idx) {
                debug!(page = page_number, error = %format!("{err:#}"), "could not remove extracted images");
            }
        }

        info!(
            pages = total_pages,
            texts = text_extractions.len(),
            images = image_extractions.len(),
            "extracted embedded content"
        );

        Ok(EmbeddedExtraction {
            metadata: EmbeddedMetadata {
                file_name: pdf.file_name(),
                total_pages,
                text_extractions_count: text_extractions.len(),
                image_extractions_count: image_extractions.len(),
            },
            text_extractions,
            image_extractions,
        })
    }

    fn segment_embedded_image(
        &self,
        page_number: usize,
        image_index: usize,
        embedded: &EmbeddedImage,
    ) -> Result<ImageExtraction, LayoutError> {
        let layout = self.run_path(&embedded.path)?;
        Ok(ImageExtraction {
            page_number,
            image_index,
            format: embedded.format.clone(),
            size: embedded.size,
            segmented_image_url: layout.segmented_image_url,
            blocks: layout.blocks,
        })
    }
}
