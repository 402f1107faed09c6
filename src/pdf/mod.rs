//! Page-count, rasterization, text-layer and embedded-image collaborators for
//! PDF input.

pub mod images;
pub mod reader;
pub mod renderer;
pub mod text;

pub use images::{EmbeddedImage, EmbeddedImageExtractor};
pub use reader::PdfReader;
pub use renderer::{PageRenderer, RenderedPage};
pub use text::PageTextReader;
