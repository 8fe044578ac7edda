//! facefind-core — identify enrolled people in a photograph.
//!
//! Enrollment builds a [`Gallery`] of (name, signature) pairs from a labelled
//! directory; the [`Matcher`] decides, per face found in a search image,
//! which enrolled identity it is. Signatures come from SCRFD detection and
//! ArcFace recognition running on ONNX Runtime.

pub mod alignment;
pub mod annotate;
pub mod detector;
pub mod enrollment;
pub mod extract;
pub mod finder;
pub mod gallery;
pub mod matcher;
pub mod recognizer;
pub mod report;
pub mod types;

#[cfg(test)]
mod test_support;

pub use extract::{OnnxExtractor, SignatureExtractor};
pub use finder::{FinderError, DEFAULT_TOLERANCE};
pub use gallery::Gallery;
pub use matcher::{DistanceMatcher, Matcher};
pub use types::{BoundingBox, GalleryEntry, MatchVerdict, QueryFace, Signature, UNKNOWN_NAME};

use std::path::PathBuf;

/// Default ONNX model directory: `$XDG_DATA_HOME/facefind/models`,
/// else `~/.local/share/facefind/models`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("facefind/models")
}
