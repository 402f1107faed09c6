pub mod bridge;

pub use bridge::TesseractBridge;

use image::RgbImage;

use crate::core::error::OcrError;

/// Page segmentation mode requested from the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrMode {
    /// Engine defaults; used for the short header/footer probe.
    Default,
    /// Assume a single uniform block of text; used for full metrics extraction.
    UniformBlock,
}

/// Turns a cropped region into text. Implementations are called once per
/// request and must not retry internally.
pub trait TextExtractor {
    fn extract_text(&self, image: &RgbImage, mode: OcrMode) -> Result<String, OcrError>;
}
