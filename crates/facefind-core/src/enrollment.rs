//! Gallery enrollment from a labelled directory tree.
//!
//! Layout is fixed at two levels: `root/<person name>/<image>`. Every image
//! under a person's directory is enrolled under that name.

use crate::extract::{self, ExtractError, SignatureExtractor};
use crate::gallery::Gallery;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Image extensions picked up during discovery (case-insensitive).
pub const ENROLLMENT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Traversal failure. Fatal: no gallery can be built.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("known-faces directory not found: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("known-faces path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("cannot read directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-image enrollment failure. The image is skipped and enrollment continues.
#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("cannot process {}: {source}", .path.display())]
    Extraction {
        path: PathBuf,
        #[source]
        source: ExtractError,
    },
    #[error("no face found in {}", .0.display())]
    NoFaceFound(PathBuf),
}

/// One image to enroll, labelled with the person's name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EnrollmentSource {
    pub name: String,
    pub path: PathBuf,
}

/// Result of enrolling a directory.
#[derive(Debug)]
pub struct EnrollmentOutcome {
    pub gallery: Gallery,
    /// Number of images that produced an entry.
    pub enrolled: usize,
    pub skipped: Vec<EnrollmentError>,
}

fn read_dir(path: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let io_err = |source| DiscoveryError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::read_dir(path)
        .map_err(io_err)?
        .map(|entry| entry.map(|e| e.path()).map_err(io_err))
        .collect()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            ENROLLMENT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List every (name, image path) pair under `root`, sorted by name then path.
///
/// Files directly under `root`, hidden entries, nested directories and
/// files without an image extension are skipped.
pub fn discover(root: &Path) -> Result<Vec<EnrollmentSource>, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }

    let mut sources = Vec::new();
    for person_dir in read_dir(root)? {
        if !person_dir.is_dir() || is_hidden(&person_dir) {
            continue;
        }
        let Some(name) = person_dir.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        for path in read_dir(&person_dir)? {
            if path.is_file() && !is_hidden(&path) && has_image_extension(&path) {
                sources.push(EnrollmentSource {
                    name: name.clone(),
                    path,
                });
            }
        }
    }

    sources.sort();
    tracing::debug!(root = %root.display(), images = sources.len(), "enrollment sources discovered");
    Ok(sources)
}

/// Enroll one image: its most confident face is added under `source.name`.
fn enroll_one<E>(
    gallery: &mut Gallery,
    source: &EnrollmentSource,
    extractor: &mut E,
) -> Result<(), EnrollmentError>
where
    E: SignatureExtractor + ?Sized,
{
    let extraction = |source_err| EnrollmentError::Extraction {
        path: source.path.clone(),
        source: source_err,
    };
    let image = extract::load_image(&source.path).map_err(extraction)?;
    let faces = extractor.extract(&image).map_err(extraction)?;

    let face = faces
        .into_iter()
        .next()
        .ok_or_else(|| EnrollmentError::NoFaceFound(source.path.clone()))?;
    gallery.enroll(source.name.clone(), face.signature);
    Ok(())
}

/// Enroll each source in order. Failures are logged and collected, never fatal.
pub fn enroll_sources<E>(sources: &[EnrollmentSource], extractor: &mut E) -> EnrollmentOutcome
where
    E: SignatureExtractor + ?Sized,
{
    let mut gallery = Gallery::new();
    let mut skipped = Vec::new();

    for source in sources {
        match enroll_one(&mut gallery, source, extractor) {
            Ok(()) => {
                tracing::info!(name = %source.name, path = %source.path.display(), "enrolled face");
            }
            Err(e) => {
                tracing::warn!(name = %source.name, error = %e, "skipping enrollment image");
                skipped.push(e);
            }
        }
    }

    EnrollmentOutcome {
        enrolled: gallery.len(),
        gallery,
        skipped,
    }
}

/// Discover and enroll every image under `root`.
pub fn enroll_directory<E>(root: &Path, extractor: &mut E) -> Result<EnrollmentOutcome, DiscoveryError>
where
    E: SignatureExtractor + ?Sized,
{
    let sources = discover(root)?;
    let outcome = enroll_sources(&sources, extractor);
    tracing::info!(
        enrolled = outcome.enrolled,
        skipped = outcome.skipped.len(),
        identities = outcome.gallery.names().len(),
        "enrollment complete"
    );
    Ok(outcome)
}
