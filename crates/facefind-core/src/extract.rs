//! Signature extraction: image in, (signature, location) per face out.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::QueryFace;
use image::{ImageReader, RgbImage};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// SCRFD detection model file name.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("cannot read image {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// Finds faces in an image and computes a signature for each.
///
/// Faces come back most confident first. An image with no faces yields an
/// empty list, not an error.
pub trait SignatureExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Vec<QueryFace>, ExtractError>;
}

/// Load an image from disk as 8-bit RGB.
///
/// The format is sniffed from the file contents, falling back to the extension.
pub fn load_image(path: &Path) -> Result<RgbImage, ExtractError> {
    let decode = || -> Result<RgbImage, image::ImageError> {
        let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
        Ok(img.to_rgb8())
    };
    decode().map_err(|source| ExtractError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// SCRFD detection + ArcFace recognition.
pub struct OnnxExtractor {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxExtractor {
    pub fn new(detector: FaceDetector, recognizer: FaceRecognizer) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    /// Load both models from `model_dir` using the standard file names.
    pub fn load(model_dir: &Path, intra_threads: usize) -> Result<Self, ExtractError> {
        let detector = FaceDetector::load(&model_dir.join(DETECTOR_MODEL_FILE), intra_threads)?;
        let recognizer = FaceRecognizer::load(&model_dir.join(RECOGNIZER_MODEL_FILE), intra_threads)?;
        Ok(Self::new(detector, recognizer))
    }
}

impl SignatureExtractor for OnnxExtractor {
    fn extract(&mut self, image: &RgbImage) -> Result<Vec<QueryFace>, ExtractError> {
        let detections = self.detector.detect(image)?;
        let mut faces = Vec::with_capacity(detections.len());

        for det in &detections {
            let signature = match self.recognizer.extract(image, det) {
                Ok(sig) => sig,
                Err(RecognizerError::NoLandmarks) => {
                    tracing::debug!(confidence = det.confidence, "skipping detection without landmarks");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            faces.push(QueryFace {
                signature,
                bounding_box: det.to_bounding_box(image.width(), image.height()),
            });
        }

        Ok(faces)
    }
}
