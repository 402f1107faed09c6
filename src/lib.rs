pub mod core;
pub mod export;
pub mod ocr;
pub mod pdf;
pub mod pipeline;
pub mod segment;

pub use crate::core::error::{LayoutError, OcrError, UploadError};
pub use crate::core::model::{Block, Classification, DocumentExtraction, LayoutResult};
pub use pipeline::{LayoutConfig, LayoutPipeline, OcrFailurePolicy};
