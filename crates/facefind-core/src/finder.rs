//! Search pipeline: find the enrolled people in one photograph.

use crate::extract::{self, ExtractError, SignatureExtractor};
use crate::gallery::Gallery;
use crate::matcher::Matcher;
use crate::types::MatchVerdict;
use image::RgbImage;
use std::path::Path;
use thiserror::Error;

/// Default matching tolerance (maximum accepted distance).
pub const DEFAULT_TOLERANCE: f32 = 0.6;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("no known faces enrolled; nothing to match against")]
    EmptyGallery,
    #[error("tolerance must be within [0.0, 1.0], got {0}")]
    InvalidTolerance(f32),
    #[error("search image: {0}")]
    SearchImage(#[from] ExtractError),
}

/// Accept tolerances in [0.0, 1.0].
pub fn validate_tolerance(tolerance: f32) -> Result<f32, FinderError> {
    if (0.0..=1.0).contains(&tolerance) {
        Ok(tolerance)
    } else {
        Err(FinderError::InvalidTolerance(tolerance))
    }
}

/// Identify every face in `image`.
///
/// An empty gallery fails before any extraction work. No faces in the image
/// is a valid result: an empty verdict list.
pub fn search<E, M>(
    gallery: &Gallery,
    image: &RgbImage,
    extractor: &mut E,
    matcher: &M,
    tolerance: f32,
) -> Result<Vec<MatchVerdict>, FinderError>
where
    E: SignatureExtractor + ?Sized,
    M: Matcher + ?Sized,
{
    if gallery.is_empty() {
        return Err(FinderError::EmptyGallery);
    }
    let tolerance = validate_tolerance(tolerance)?;

    let queries = extractor.extract(image)?;
    if queries.is_empty() {
        tracing::info!("no faces found in search image");
        return Ok(Vec::new());
    }

    let verdicts = matcher.match_all(&queries, gallery, tolerance);
    tracing::info!(
        faces = verdicts.len(),
        known = verdicts.iter().filter(|v| v.is_known()).count(),
        tolerance,
        "search complete"
    );
    Ok(verdicts)
}

/// Load the image at `path`, then [`search`] it.
pub fn search_path<E, M>(
    gallery: &Gallery,
    path: &Path,
    extractor: &mut E,
    matcher: &M,
    tolerance: f32,
) -> Result<Vec<MatchVerdict>, FinderError>
where
    E: SignatureExtractor + ?Sized,
    M: Matcher + ?Sized,
{
    if gallery.is_empty() {
        return Err(FinderError::EmptyGallery);
    }
    let image = extract::load_image(path)?;
    tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "search image loaded");
    search(gallery, &image, extractor, matcher, tolerance)
}
