//! Draw search results onto the searched photograph.

use crate::extract::{self, ExtractError};
use crate::types::{BoundingBox, MatchVerdict};
use ab_glyph::{FontRef, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KNOWN_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const UNKNOWN_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Height of the filled label band along the bottom edge of each box.
pub const LABEL_BAND_HEIGHT: i32 = 35;
const LABEL_SCALE: f32 = 18.0;
const LABEL_INSET: i32 = 6;
const BORDER_WIDTH: i32 = 2;

static LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error(transparent)]
    Load(#[from] ExtractError),
    #[error("label font: {0}")]
    Font(#[from] InvalidFont),
    #[error("save annotated image {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Inclusive pixel rectangle, or `None` when it has no area.
fn rect(left: i32, top: i32, right: i32, bottom: i32) -> Option<Rect> {
    if right < left || bottom < top {
        return None;
    }
    Some(Rect::at(left, top).of_size((right - left + 1) as u32, (bottom - top + 1) as u32))
}

/// `"Alice (93.12%)"`
pub fn label_text(verdict: &MatchVerdict) -> String {
    format!("{} ({:.2}%)", verdict.name, verdict.confidence * 100.0)
}

fn draw_verdict(image: &mut RgbImage, font: &FontRef<'_>, verdict: &MatchVerdict) {
    let color = if verdict.is_known() { KNOWN_COLOR } else { UNKNOWN_COLOR };
    let BoundingBox { top, right, bottom, left } = verdict.bounding_box;

    // Border grows inward, one hollow rect per pixel of width.
    for inset in 0..BORDER_WIDTH {
        if let Some(r) = rect(left + inset, top + inset, right - inset, bottom - inset) {
            draw_hollow_rect_mut(image, r, color);
        }
    }

    let band_top = bottom - LABEL_BAND_HEIGHT;
    let Some(band) = rect(left, band_top, right, bottom) else {
        return;
    };
    draw_filled_rect_mut(image, band, color);
    draw_text_mut(
        image,
        LABEL_TEXT_COLOR,
        left + LABEL_INSET,
        band_top + (LABEL_BAND_HEIGHT - LABEL_SCALE as i32) / 2,
        PxScale::from(LABEL_SCALE),
        font,
        &label_text(verdict),
    );
}

/// Box and label every face: green when identified, red when unknown.
pub fn annotate(image: &mut RgbImage, verdicts: &[MatchVerdict]) -> Result<(), AnnotateError> {
    let font = FontRef::try_from_slice(LABEL_FONT)?;
    for verdict in verdicts {
        draw_verdict(image, &font, verdict);
    }
    Ok(())
}

/// Load `source`, annotate it and save to `output` (format from the extension).
pub fn annotate_to_file(source: &Path, verdicts: &[MatchVerdict], output: &Path) -> Result<(), AnnotateError> {
    let mut image = extract::load_image(source)?;
    annotate(&mut image, verdicts)?;
    image.save(output).map_err(|source| AnnotateError::Save {
        path: output.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %output.display(), faces = verdicts.len(), "annotated image saved");
    Ok(())
}
