use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::OcrError;
use crate::core::geometry::BBox;
use crate::core::model::Classification;
use crate::core::text_metrics::{analyze, count_digits, TextMetrics};
use crate::ocr::{OcrMode, TextExtractor};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// A region starting above this fraction of the page height may be a header.
    pub header_band: f64,
    /// A region starting below this fraction of the page height may be a footer.
    pub footer_band: f64,
    pub short_text_chars: usize,
    pub short_text_words: usize,
    pub max_digits: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            header_band: 0.2,
            footer_band: 0.8,
            short_text_chars: 50,
            short_text_words: 10,
            max_digits: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Band {
    Top,
    Bottom,
}

/// Assigns one [`Classification`] per region: a positional header/footer
/// check first, then the metrics ladder over layout-mode OCR text.
#[derive(Debug, Clone, Default)]
pub struct RegionClassifier {
    config: ClassifierConfig,
}

impl RegionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn classify<E: TextExtractor + ?Sized>(
        &self,
        image: &RgbImage,
        bbox: BBox,
        full_image_height: u32,
        ocr: &E,
    ) -> Result<Classification, OcrError> {
        let crop = imageops::crop_imm(image, bbox.x, bbox.y, bbox.width, bbox.height).to_image();

        if let Some(band) = self.band(bbox.y, full_image_height) {
            let text = ocr.extract_text(&crop, OcrMode::Default)?;
            if self.is_short_marginal_text(text.trim()) {
                let class = match band {
                    Band::Top => Classification::Header,
                    Band::Bottom => Classification::Footer,
                };
                debug!(?bbox, %class, "positional match");
                return Ok(class);
            }
        }

        let text = ocr.extract_text(&crop, OcrMode::UniformBlock)?;
        let metrics = analyze(&text);
        Ok(classify_text(metrics.as_ref()))
    }

    fn band(&self, y: u32, full_image_height: u32) -> Option<Band> {
        let y = y as f64;
        let height = full_image_height as f64;
        if y < height * self.config.header_band {
            Some(Band::Top)
        } else if y > height * self.config.footer_band {
            Some(Band::Bottom)
        } else {
            None
        }
    }

    fn is_short_marginal_text(&self, text: &str) -> bool {
        text.chars().count() < self.config.short_text_chars
            && text.split_whitespace().count() < self.config.short_text_words
            && count_digits(text) < self.config.max_digits
    }
}

/// `numerator / denominator`, or `None` for a zero denominator so that the
/// guarded condition evaluates to false.
fn ratio(numerator: f64, denominator: usize) -> Option<f64> {
    (denominator != 0).then(|| numerator / denominator as f64)
}

/// Priority-ordered decision over [`TextMetrics`]; the first matching rule wins.
pub fn classify_text(metrics: Option<&TextMetrics>) -> Classification {
    let Some(m) = metrics else {
        return Classification::Image;
    };

    let char_density = ratio(m.text_length as f64, m.num_lines * m.max_line_length);
    let avg_words_per_line = ratio(m.word_count as f64, m.num_lines);
    let number_ending_share = ratio(m.lines_with_number_endings as f64, m.num_lines);
    let table_score = match (
        ratio(m.table_line_count as f64, m.num_lines),
        ratio(m.num_count as f64, m.text_length),
        ratio(m.special_char_count as f64, m.text_length),
        number_ending_share,
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => Some(a + b + c + d),
        _ => None,
    };

    let is_table = (table_score.is_some_and(|s| s > 0.4)
        && m.column_count >= 2
        && m.num_lines >= 2)
        || (number_ending_share.is_some_and(|s| s > 0.5) && m.num_lines >= 2);

    if is_table {
        Classification::Table
    } else if m.avg_line_length < 40.0
        && m.num_lines > 3
        && avg_words_per_line.is_some_and(|w| w < 7.0)
    {
        Classification::List
    } else if m.num_lines <= 2 && 20 < m.text_length && m.text_length < 200 {
        Classification::Caption
    } else if m.avg_line_length > 40.0
        && m.num_lines > 1
        && char_density.is_some_and(|d| d > 0.6)
        && avg_words_per_line.is_some_and(|w| w > 6.0)
    {
        Classification::Paragraph
    } else if m.num_lines <= 3 && m.text_length < 100 && m.unique_word_ratio > 0.8 {
        Classification::Title
    } else if m.text_length < 50 {
        Classification::Blurb
    } else {
        Classification::Unclassified
    }
}
