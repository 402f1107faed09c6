use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use pretty_assertions::assert_eq;

use docblocks::core::geometry::BBox;
use docblocks::core::model::Classification;
use docblocks::export::{Annotator, DirectoryUploader, Exporter, ImageUploader, JsonExporter};
use docblocks::ocr::{OcrMode, TesseractBridge, TextExtractor};
use docblocks::pipeline::{LayoutConfig, LayoutPipeline};
use docblocks::segment::{BoxMerger, MorphologicalDetector, RegionDetector};
use docblocks::{LayoutError, OcrError, UploadError};

/// OCR stand-in that answers by crop height, which identifies each synthetic
/// region after dilation.
struct HeightKeyedOcr {
    texts: Vec<(u32, &'static str)>,
}

impl TextExtractor for HeightKeyedOcr {
    fn extract_text(&self, image: &RgbImage, _mode: OcrMode) -> Result<String, OcrError> {
        Ok(self
            .texts
            .iter()
            .find(|(height, _)| *height == image.height())
            .map(|(_, text)| text.to_string())
            .unwrap_or_default())
    }
}

struct NullUploader;

impl ImageUploader for NullUploader {
    fn upload(&self, _image: &RgbImage) -> Result<String, UploadError> {
        Ok(String::new())
    }
}

const TABLE_TEXT: &str = "Region      Q1 2023      Q2 2023      Q3 2023\n\
North       1,204.50     1,310.75     1,422.00\n\
South       980.25       1,015.00     1,120.40\n\
East        1,450.00     1,502.10     1,611.90\n\
West        870.60       910.30       1,004.80\n";

const PARAGRAPH_TEXT: &str = "The regional results above reflect steady growth across all markets\n\
during the first three quarters, with the strongest gains coming from\n\
the eastern territories where new distribution agreements took effect\n";

/// A page with a header, a table, a paragraph, a picture and a footer.
fn synthetic_page() -> DynamicImage {
    let mut page = RgbImage::from_pixel(800, 1000, Rgb([255, 255, 255]));
    let black = Rgb([0, 0, 0]);
    draw_filled_rect_mut(&mut page, Rect::at(300, 40).of_size(200, 20), black);
    draw_filled_rect_mut(&mut page, Rect::at(50, 300).of_size(700, 120), black);
    draw_filled_rect_mut(&mut page, Rect::at(50, 500).of_size(700, 90), black);
    draw_filled_rect_mut(&mut page, Rect::at(50, 650).of_size(300, 150), black);
    draw_filled_rect_mut(&mut page, Rect::at(300, 900).of_size(200, 24), black);
    DynamicImage::ImageRgb8(page)
}

fn synthetic_ocr() -> HeightKeyedOcr {
    // drawn heights plus 16px of dilation growth
    HeightKeyedOcr {
        texts: vec![
            (36, "Page 3"),
            (136, TABLE_TEXT),
            (106, PARAGRAPH_TEXT),
            (166, ""),
            (40, "Confidential"),
        ],
    }
}

fn temp_output_dir() -> Result<tempfile::TempDir> {
    Ok(tempfile::Builder::new().prefix("docblocks-test").tempdir()?)
}

#[test]
fn classifies_every_region_of_a_synthetic_page() {
    let config = LayoutConfig::default();
    let pipeline = LayoutPipeline::new(&config, synthetic_ocr(), NullUploader)
        .with_annotator(Annotator::without_labels(&config.annotation));

    let result = pipeline.run(&synthetic_page());

    let classes: Vec<Classification> = result.blocks.iter().map(|b| b.classification).collect();
    assert_eq!(
        classes,
        vec![
            Classification::Header,
            Classification::Table,
            Classification::Paragraph,
            Classification::Image,
            Classification::Footer,
        ]
    );
    assert_eq!(result.blocks[0].bbox(), BBox::new(292, 32, 216, 36));
    assert_eq!(result.blocks[1].text, TABLE_TEXT);
}

#[test]
fn writes_annotated_image_and_json() -> Result<()> {
    let out = temp_output_dir()?;
    let input = out.path().join("page.png");
    synthetic_page().save(&input)?;

    let config = LayoutConfig::default();
    let uploader = DirectoryUploader::new(out.path().to_path_buf()).with_folder("segmented");
    let pipeline = LayoutPipeline::new(&config, synthetic_ocr(), uploader)
        .with_annotator(Annotator::without_labels(&config.annotation));

    let result = pipeline.run_path(&input)?;
    JsonExporter::new(out.path().to_path_buf()).export(&result)?;

    let url = result.segmented_image_url.clone().expect("upload should succeed");
    let annotated = image::open(PathBuf::from(&url))?;
    assert_eq!((annotated.width(), annotated.height()), (800, 1000));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("layout.json"))?)?;
    assert_eq!(json["segmented_image_url"], url.as_str());
    assert_eq!(json["blocks"].as_array().map(Vec::len), Some(5));
    assert_eq!(json["blocks"][1]["classification"], "Table");
    assert_eq!(json["blocks"][4]["coordinates"]["top"], 892);
    Ok(())
}

#[test]
fn unreadable_image_path_fails_fast() {
    let pipeline = LayoutPipeline::new(&LayoutConfig::default(), synthetic_ocr(), NullUploader);
    let err = pipeline
        .run_path(&PathBuf::from("/nonexistent/page.png"))
        .unwrap_err();
    assert!(matches!(err, LayoutError::ImageDecode { .. }));
}

#[test]
fn detector_output_merges_into_disjoint_regions() {
    let page = synthetic_page();
    let raw = MorphologicalDetector::default().detect(&page);
    let merged = BoxMerger::default().merge(&raw, page.width(), page.height());
    assert_eq!(merged.len(), 5);
    for (i, a) in merged.iter().enumerate() {
        for b in &merged[i + 1..] {
            assert!(!a.intersects_padded(b, 5));
        }
    }
}

#[test]
#[ignore] // requires a local tesseract install
fn tesseract_reads_rendered_page() -> Result<()> {
    let out = temp_output_dir()?;
    let pipeline = LayoutPipeline::new(
        &LayoutConfig::default(),
        TesseractBridge::new(),
        DirectoryUploader::new(out.path().to_path_buf()),
    );
    let result = pipeline.run(&synthetic_page());
    assert_eq!(result.blocks.len(), 5);
    Ok(())
}
