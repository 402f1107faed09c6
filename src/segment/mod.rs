//! Region detection and consolidation over a raster page.

pub mod detector;
pub mod merge;

pub use detector::{DetectorConfig, MorphologicalDetector, RegionSweep};
pub use merge::{merge_boxes, BoxMerger, MergeConfig};

use image::DynamicImage;

use crate::core::geometry::BBox;

/// Finds raw candidate content regions on a page image.
pub trait RegionDetector {
    fn detect(&self, image: &DynamicImage) -> Vec<BBox>;
}
