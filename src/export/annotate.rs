//! Drawing of classified regions onto a copy of the page image.

use std::path::PathBuf;

use ab_glyph::FontVec;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::geometry::BBox;
use crate::core::model::Classification;

const BBOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const LABEL_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Vertical distance between a region's bottom edge and its label.
const LABEL_OFFSET: i32 = 20;

const SYSTEM_FONT_PATHS: [&str; 4] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Font used for labels. Falls back to common system fonts; labels are
    /// skipped when none can be loaded.
    pub font_path: Option<PathBuf>,
    pub font_scale: f32,
    pub thickness: u32,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_scale: 16.0,
            thickness: 2,
        }
    }
}

pub struct Annotator {
    font: Option<FontVec>,
    font_scale: f32,
    thickness: u32,
}

impl Annotator {
    pub fn new(config: &AnnotationConfig) -> Self {
        Self {
            font: load_font(config.font_path.as_ref()),
            font_scale: config.font_scale,
            thickness: config.thickness.max(1),
        }
    }

    /// An annotator that draws rectangles only.
    pub fn without_labels(config: &AnnotationConfig) -> Self {
        Self {
            font: None,
            font_scale: config.font_scale,
            thickness: config.thickness.max(1),
        }
    }

    pub fn draw(&self, canvas: &mut RgbImage, bbox: BBox, class: Classification) {
        for inset in 0..self.thickness {
            let width = bbox.width.saturating_sub(2 * inset);
            let height = bbox.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(canvas, rect, BBOX_COLOR);
        }

        if let Some(font) = &self.font {
            let y = bbox.bottom() as i32 + LABEL_OFFSET;
            draw_text_mut(
                canvas,
                LABEL_COLOR,
                bbox.x as i32,
                y,
                self.font_scale,
                font,
                class.label(),
            );
        }
    }
}

fn load_font(configured: Option<&PathBuf>) -> Option<FontVec> {
    if let Some(path) = configured {
        match std::fs::read(path).map(FontVec::try_from_vec) {
            Ok(Ok(font)) => return Some(font),
            _ => warn!(path = %path.display(), "failed to load label font"),
        }
    }

    for path in SYSTEM_FONT_PATHS {
        if let Ok(Ok(font)) = std::fs::read(path).map(FontVec::try_from_vec) {
            info!("loaded label font: {path}");
            return Some(font);
        }
    }

    debug!("no label font found, annotations will omit labels");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn draws_inset_border_of_configured_thickness() {
        let mut canvas = RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]));
        let annotator = Annotator::without_labels(&AnnotationConfig::default());

        annotator.draw(&mut canvas, BBox::new(10, 10, 20, 20), Classification::Table);

        assert_eq!(*canvas.get_pixel(10, 10), BBOX_COLOR);
        assert_eq!(*canvas.get_pixel(11, 11), BBOX_COLOR);
        assert_eq!(*canvas.get_pixel(29, 29), BBOX_COLOR);
        assert_eq!(*canvas.get_pixel(12, 12), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(20, 20), Rgb([255, 255, 255]));
    }

    #[test]
    fn label_off_canvas_is_clipped() {
        let mut canvas = RgbImage::from_pixel(40, 40, Rgb([255, 255, 255]));
        let annotator = Annotator::new(&AnnotationConfig::default());
        annotator.draw(&mut canvas, BBox::new(5, 20, 30, 19), Classification::Footer);
        assert_eq!(*canvas.get_pixel(5, 20), BBOX_COLOR);
    }
}
