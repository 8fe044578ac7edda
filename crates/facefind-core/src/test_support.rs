//! Model-free extractors and fixtures for unit tests.

use crate::detector::DetectorError;
use crate::extract::{ExtractError, SignatureExtractor};
use crate::types::{BoundingBox, QueryFace, Signature};
use image::{ImageFormat, Rgb, RgbImage};
use std::path::Path;

/// Write an 8×8 solid-colour PNG (PNG bytes whatever the extension).
pub fn write_image(path: &Path, rgb: [u8; 3]) {
    RgbImage::from_pixel(8, 8, Rgb(rgb))
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// One face per image whose signature is the mean colour scaled to [0, 1].
/// An all-black image has no face.
pub struct ColorExtractor;

impl SignatureExtractor for ColorExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Vec<QueryFace>, ExtractError> {
        let n = (image.width() * image.height()).max(1) as f32;
        let mut sum = [0.0f32; 3];
        for p in image.pixels() {
            for c in 0..3 {
                sum[c] += p.0[c] as f32;
            }
        }
        if sum.iter().all(|&s| s == 0.0) {
            return Ok(Vec::new());
        }
        Ok(vec![QueryFace {
            signature: Signature::new(sum.iter().map(|s| s / n / 255.0).collect()),
            bounding_box: BoundingBox::new(0, image.width() as i32, image.height() as i32, 0),
        }])
    }
}

/// Returns a fixed list of faces for every image.
pub struct FixedExtractor(pub Vec<QueryFace>);

impl SignatureExtractor for FixedExtractor {
    fn extract(&mut self, _image: &RgbImage) -> Result<Vec<QueryFace>, ExtractError> {
        Ok(self.0.clone())
    }
}

/// Fails every extraction.
pub struct FailingExtractor;

impl SignatureExtractor for FailingExtractor {
    fn extract(&mut self, _image: &RgbImage) -> Result<Vec<QueryFace>, ExtractError> {
        Err(DetectorError::InferenceFailed("model exploded".into()).into())
    }
}
