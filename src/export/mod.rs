pub mod annotate;
pub mod json_export;
pub mod upload;

use anyhow::Result;

pub use annotate::{AnnotationConfig, Annotator};
pub use json_export::JsonExporter;
pub use upload::{DirectoryUploader, ImageUploader};

pub trait Exporter<T> {
    fn export(&self, value: &T) -> Result<()>;
}
