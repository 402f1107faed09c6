//! Error taxonomy for the layout pipeline and its collaborators.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the OCR collaborator for a single crop.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to encode crop for OCR")]
    Encode(#[source] image::ImageError),

    #[error("failed to invoke OCR engine '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("OCR engine exited with {status}: {stderr}")]
    Engine { status: String, stderr: String },

    #[error("OCR engine returned non UTF-8 text")]
    InvalidOutput(#[source] std::string::FromUtf8Error),
}

/// Failures of the upload collaborator for the annotated image.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to encode annotated image")]
    Encode(#[source] image::ImageError),

    #[error("failed to write annotated image to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unreadable image: {context}")]
    ImageDecode {
        context: String,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}

impl LayoutError {
    pub fn image_decode(context: impl Into<String>, source: image::ImageError) -> Self {
        LayoutError::ImageDecode {
            context: context.into(),
            source,
        }
    }
}
