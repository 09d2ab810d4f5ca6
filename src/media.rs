// ABOUTME: Image assets for the deckhand library
// ABOUTME: Detects image formats and keeps a named library of uploaded pictures

use crate::errors::{DeckError, Result};
use crate::utils;
use image::io::Reader as ImageReader;
use log::{info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Sniff the format from the leading bytes.
    pub fn detect(bytes: &[u8]) -> Result<Self> {
        match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => Ok(ImageFormat::Png),
            Ok(image::ImageFormat::Jpeg) => Ok(ImageFormat::Jpeg),
            Ok(other) => Err(DeckError::ValidationError(format!(
                "Unsupported image format: {:?}",
                other
            ))),
            Err(e) => Err(DeckError::ImageError(e.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }
}

/// An embedded picture. The bytes are shared between document snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub name: String,
    pub format: ImageFormat,
    pub bytes: Arc<[u8]>,
}

impl ImageData {
    pub fn new(name: &str, bytes: Vec<u8>) -> Result<Self> {
        let format = ImageFormat::detect(&bytes)?;
        Ok(Self {
            name: name.to_string(),
            format,
            bytes: bytes.into(),
        })
    }

    /// Pixel dimensions, read from the image header.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(&self.bytes[..]))
            .with_guessed_format()
            .map_err(DeckError::FileReadError)?;
        Ok(reader.into_dimensions()?)
    }
}

/// Uploaded pictures addressable by file name.
#[derive(Debug, Clone, Default)]
pub struct MediaLibrary {
    images: BTreeMap<String, ImageData>,
}

impl MediaLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let image = ImageData::new(name, bytes)?;
        self.images.insert(name.to_string(), image);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ImageData> {
        self.images.get(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Load every PNG/JPEG in `dir`, keyed by file name.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        utils::validate_directory_exists(dir)?;
        let mut library = Self::new();

        for pattern in ["*.png", "*.jpg", "*.jpeg"] {
            let glob_pattern = format!("{}/{}", dir.to_string_lossy(), pattern);
            let entries = glob::glob(&glob_pattern)
                .map_err(|e| DeckError::ValidationError(format!("Invalid glob pattern: {}", e)))?;
            for path in entries.flatten() {
                let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                    continue;
                };
                let bytes = fs::read(&path).map_err(DeckError::FileReadError)?;
                match library.insert(&name, bytes) {
                    Ok(()) => info!("Loaded image {}", name),
                    Err(e) => warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use tempfile::tempdir;

    fn encoded(format: ImageOutputFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(6, 3, Rgb([10, 20, 30]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, format)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_detects_png_and_jpeg() {
        let png = ImageData::new("a.png", encoded(ImageOutputFormat::Png)).unwrap();
        assert_eq!(png.format, ImageFormat::Png);
        assert_eq!(png.dimensions().unwrap(), (6, 3));

        let jpeg = ImageData::new("b.jpg", encoded(ImageOutputFormat::Jpeg(80))).unwrap();
        assert_eq!(jpeg.format.extension(), "jpeg");

        assert!(ImageData::new("c.txt", b"not an image".to_vec()).is_err());
    }

    #[test]
    fn test_load_dir_skips_bad_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.png"), encoded(ImageOutputFormat::Png)).unwrap();
        fs::write(dir.path().join("broken.png"), b"garbage").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let library = MediaLibrary::load_dir(dir.path()).unwrap();
        assert_eq!(library.len(), 1);
        assert!(library.get("good.png").is_some());
        assert!(library.get("broken.png").is_none());
    }
}
