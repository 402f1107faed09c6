use image::{imageops, DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::geometry::BBox;
use crate::segment::RegionDetector;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Side of the square structuring element; must be odd.
    pub kernel_size: u8,
    pub min_iterations: u32,
    /// Exclusive upper bound of the iteration sweep.
    pub max_iterations: u32,
    /// Region budget that ends the sweep.
    pub max_regions: usize,
    /// Boxes must cover strictly more than this many pixels.
    pub min_area: u64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            min_iterations: 4,
            max_iterations: 9,
            max_regions: 20,
            min_area: 2000,
        }
    }
}

/// Outcome of the dilation sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSweep {
    pub boxes: Vec<BBox>,
    /// Dilation iteration count the boxes were taken from; zero when the page
    /// had no ink and no dilation ran.
    pub iterations: u32,
}

/// Detects ink-dense regions by Otsu binarization followed by square-kernel
/// dilation of increasing strength, stopping at the weakest dilation whose
/// region count fits the budget.
#[derive(Debug, Clone, Default)]
pub struct MorphologicalDetector {
    config: DetectorConfig,
}

impl MorphologicalDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn sweep(&self, image: &DynamicImage) -> RegionSweep {
        let Some(ink) = binarize_ink(&image.to_luma8()) else {
            debug!("page has no contrast, skipping region detection");
            return RegionSweep {
                boxes: Vec::new(),
                iterations: 0,
            };
        };

        let mut last = RegionSweep {
            boxes: Vec::new(),
            iterations: 0,
        };
        for iterations in self.config.min_iterations..self.config.max_iterations {
            let dilated = self.dilate(&ink, iterations);
            let boxes = self.candidate_boxes(&dilated);
            debug!(iterations, candidates = boxes.len(), "dilation pass");

            let within_budget = boxes.len() <= self.config.max_regions;
            last = RegionSweep { boxes, iterations };
            if within_budget {
                break;
            }
        }
        last
    }

    /// Applies the structuring element `iterations` times. Repeated dilation by
    /// a `k x k` square equals one dilation by a square of radius
    /// `iterations * (k / 2)` under the L-infinity norm.
    fn dilate(&self, ink: &GrayImage, iterations: u32) -> GrayImage {
        let step = u32::from(self.config.kernel_size / 2);
        let mut remaining = iterations * step;
        let mut mask = ink.clone();
        while remaining > 0 {
            let radius = remaining.min(u32::from(u8::MAX));
            mask = morphology::dilate(&mask, Norm::LInf, radius as u8);
            remaining -= radius;
        }
        mask
    }

    fn candidate_boxes(&self, mask: &GrayImage) -> Vec<BBox> {
        // border following needs background on every side, otherwise ink
        // touching the page edge is reported as a hole or not at all
        let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
        imageops::replace(&mut padded, mask, 1, 1);

        find_contours::<u32>(&padded)
            .iter()
            .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
            .filter_map(bounding_rect)
            .filter(|bbox| bbox.area() > self.config.min_area)
            .collect()
    }
}

impl RegionDetector for MorphologicalDetector {
    fn detect(&self, image: &DynamicImage) -> Vec<BBox> {
        self.sweep(image).boxes
    }
}

/// Inverted global Otsu threshold: ink becomes 255, background 0.
/// Returns `None` for a page without any contrast.
fn binarize_ink(gray: &GrayImage) -> Option<GrayImage> {
    let mut pixels = gray.pixels().map(|p| p[0]);
    let first = pixels.next()?;
    if pixels.all(|value| value == first) {
        return None;
    }

    let level = otsu_level(gray);
    Some(GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([0])
        } else {
            Luma([255])
        }
    }))
}

fn bounding_rect(contour: &Contour<u32>) -> Option<BBox> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    // undo the one pixel border added before contour tracing
    Some(BBox::from_extents(
        min_x.saturating_sub(1),
        min_y.saturating_sub(1),
        max_x.saturating_sub(1),
        max_y.saturating_sub(1),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;
    use pretty_assertions::assert_eq;

    fn page_with_blocks(blocks: &[(i32, i32, u32, u32)]) -> DynamicImage {
        let mut page = RgbImage::from_pixel(600, 800, Rgb([255, 255, 255]));
        for &(x, y, w, h) in blocks {
            draw_filled_rect_mut(&mut page, Rect::at(x, y).of_size(w, h), Rgb([0, 0, 0]));
        }
        DynamicImage::ImageRgb8(page)
    }

    #[test]
    fn blank_page_has_no_regions() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 200, Rgb([255, 255, 255])));
        let sweep = MorphologicalDetector::default().sweep(&page);
        assert!(sweep.boxes.is_empty());
        assert_eq!(sweep.iterations, 0);
    }

    #[test]
    fn stops_at_first_iteration_within_budget() {
        let page = page_with_blocks(&[(50, 50, 200, 60), (50, 400, 300, 120)]);
        let sweep = MorphologicalDetector::default().sweep(&page);
        assert_eq!(sweep.iterations, 4);
        assert_eq!(sweep.boxes.len(), 2);
    }

    #[test]
    fn boxes_grow_by_dilation_radius() {
        let page = page_with_blocks(&[(100, 100, 100, 50)]);
        let boxes = MorphologicalDetector::default().detect(&page);
        // four 5x5 passes extend each side by 8 pixels
        assert_eq!(boxes, vec![BBox::new(92, 92, 116, 66)]);
    }

    #[test]
    fn ink_touching_left_edge_is_detected() {
        let page = page_with_blocks(&[(0, 300, 300, 100)]);
        let boxes = MorphologicalDetector::default().detect(&page);
        assert_eq!(boxes, vec![BBox::new(0, 292, 308, 116)]);
    }

    #[test]
    fn full_width_band_is_detected() {
        let page = page_with_blocks(&[(0, 700, 600, 100)]);
        let boxes = MorphologicalDetector::default().detect(&page);
        // dilation is clipped at the right and bottom page edges
        assert_eq!(boxes, vec![BBox::new(0, 692, 600, 108)]);
    }

    #[test]
    fn small_specks_are_discarded() {
        let page = page_with_blocks(&[(300, 300, 2, 2), (50, 50, 200, 60)]);
        let boxes = MorphologicalDetector::default().detect(&page);
        assert_eq!(boxes.len(), 1);
    }

    #[test]
    fn escalates_dilation_when_over_budget() {
        let config = DetectorConfig {
            max_regions: 1,
            ..DetectorConfig::default()
        };
        // 20px gap closes once each side has grown by 10px (iteration 5)
        let page = page_with_blocks(&[(100, 100, 60, 60), (180, 100, 60, 60)]);
        let sweep = MorphologicalDetector::new(config).sweep(&page);
        assert_eq!(sweep.iterations, 5);
        assert_eq!(sweep.boxes.len(), 1);
    }

    #[test]
    fn exhausted_sweep_returns_last_pass() {
        let config = DetectorConfig {
            max_regions: 0,
            ..DetectorConfig::default()
        };
        let page = page_with_blocks(&[(50, 50, 200, 60)]);
        let sweep = MorphologicalDetector::new(config).sweep(&page);
        assert_eq!(sweep.iterations, 8);
        assert_eq!(sweep.boxes.len(), 1);
    }
}
