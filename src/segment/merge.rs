use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::geometry::BBox;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MergeConfig {
    /// Pixel tolerance for padded intersection and edge adjacency.
    pub edge_threshold: u32,
    /// Boxes covering more than this fraction of the page are discarded.
    pub coverage_threshold: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            edge_threshold: 5,
            coverage_threshold: 0.9,
        }
    }
}

/// Consolidates overlapping and edge-adjacent boxes into disjoint regions.
#[derive(Debug, Clone, Default)]
pub struct BoxMerger {
    config: MergeConfig,
}

impl BoxMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    pub fn merge(&self, boxes: &[BBox], image_width: u32, image_height: u32) -> Vec<BBox> {
        let covers_page = |bbox: &BBox| {
            bbox.coverage(image_width, image_height) > self.config.coverage_threshold
        };

        let mut regions: Vec<BBox> = boxes.iter().copied().filter(|b| !covers_page(b)).collect();

        let mut passes = 0;
        loop {
            passes += 1;
            let (next, folded) = self.consolidate(regions);
            regions = next.into_iter().filter(|b| !covers_page(b)).collect();
            if !folded {
                break;
            }
        }

        debug!(input = boxes.len(), output = regions.len(), passes, "merged boxes");
        regions
    }

    /// One consolidation pass: each working box absorbs every remaining box it
    /// touches, rescanning until nothing more folds in. Returns the emitted
    /// boxes and whether any fold happened.
    fn consolidate(&self, mut pending: Vec<BBox>) -> (Vec<BBox>, bool) {
        let threshold = self.config.edge_threshold;
        let mut emitted = Vec::with_capacity(pending.len());
        let mut folded_any = false;

        while !pending.is_empty() {
            let mut current = pending.remove(0);
            loop {
                let mut folded = false;
                let mut i = 0;
                while i < pending.len() {
                    let other = pending[i];
                    if current.intersects_padded(&other, threshold)
                        || current.is_edge_adjacent(&other, threshold)
                    {
                        current = current.union(&pending.remove(i));
                        folded = true;
                    } else {
                        i += 1;
                    }
                }
                if !folded {
                    break;
                }
                folded_any = true;
            }
            emitted.push(current);
        }

        (emitted, folded_any)
    }
}

/// Convenience wrapper over [`BoxMerger`] with explicit thresholds.
pub fn merge_boxes(
    boxes: &[BBox],
    image_width: u32,
    image_height: u32,
    edge_threshold: u32,
    coverage_threshold: f64,
) -> Vec<BBox> {
    BoxMerger::new(MergeConfig {
        edge_threshold,
        coverage_threshold,
    })
    .merge(boxes, image_width, image_height)
}
