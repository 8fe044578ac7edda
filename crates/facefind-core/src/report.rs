//! JSON export of search results.

use crate::types::MatchVerdict;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write report {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One face in the exported report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub confidence: f32,
    /// `[top, right, bottom, left]`
    pub location: [i32; 4],
    /// Position of the face in the search results.
    pub match_index: usize,
}

impl From<&MatchVerdict> for ReportEntry {
    fn from(v: &MatchVerdict) -> Self {
        Self {
            name: v.name.clone(),
            confidence: v.confidence,
            location: v.bounding_box.to_array(),
            match_index: v.query_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub timestamp: DateTime<Local>,
    pub search_image: String,
    pub tolerance: f32,
    pub total_faces_found: usize,
    pub results: Vec<ReportEntry>,
}

impl SearchReport {
    /// Build a report stamped with the current local time.
    pub fn new(search_image: &Path, tolerance: f32, verdicts: &[MatchVerdict]) -> Self {
        Self::at(Local::now(), search_image, tolerance, verdicts)
    }

    pub fn at(timestamp: DateTime<Local>, search_image: &Path, tolerance: f32, verdicts: &[MatchVerdict]) -> Self {
        Self {
            timestamp,
            search_image: search_image.display().to_string(),
            tolerance,
            total_faces_found: verdicts.len(),
            results: verdicts.iter().map(ReportEntry::from).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), faces = self.total_faces_found, "report written");
        Ok(())
    }
}
