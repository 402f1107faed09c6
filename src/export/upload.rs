use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::info;
use uuid::Uuid;

use crate::core::error::UploadError;

const JPEG_QUALITY: u8 = 90;

/// Publishes the annotated page image and returns a reference to it.
pub trait ImageUploader {
    fn upload(&self, image: &RgbImage) -> Result<String, UploadError>;
}

/// Stores annotated images as `<uuid>.jpg` files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    root: PathBuf,
    folder: Option<String>,
}

impl DirectoryUploader {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            folder: None,
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    fn target_dir(&self) -> PathBuf {
        match &self.folder {
            Some(folder) => self.root.join(folder),
            None => self.root.clone(),
        }
    }
}

impl ImageUploader for DirectoryUploader {
    fn upload(&self, image: &RgbImage) -> Result<String, UploadError> {
        let dir = self.target_dir();
        fs::create_dir_all(&dir).map_err(|source| UploadError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{}.jpg", Uuid::new_v4()));
        let file = File::create(&path).map_err(|source| UploadError::Io {
            path: path.clone(),
            source,
        })?;

        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        encoder.encode_image(image).map_err(UploadError::Encode)?;

        info!(path = %path.display(), "stored annotated image");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn writes_jpeg_under_folder() {
        let dir = tempfile::tempdir().unwrap();
        let uploader = DirectoryUploader::new(dir.path().to_path_buf()).with_folder("segmented");
        let image = RgbImage::from_pixel(32, 16, Rgb([0, 128, 255]));

        let reference = uploader.upload(&image).unwrap();

        let path = PathBuf::from(&reference);
        assert!(path.starts_with(dir.path().join("segmented")));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
    }

    #[test]
    fn unwritable_root_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = DirectoryUploader::new(blocker)
            .upload(&RgbImage::new(2, 2))
            .unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }
}
