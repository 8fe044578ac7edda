use serde::{Deserialize, Serialize};

/// Name reported for a query face that matches no enrolled identity.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Face signature vector (512-dimensional for ArcFace).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub values: Vec<f32>,
    /// Model version that produced this signature (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Signature {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            model_version: None,
        }
    }

    /// Euclidean distance between two signatures. Smaller = more similar.
    ///
    /// Signatures of different length are incomparable: the distance is
    /// infinite, so they never fall within any tolerance.
    pub fn distance(&self, other: &Signature) -> f32 {
        if self.len() != other.len() {
            return f32::INFINITY;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Face location in pixel coordinates, ordered (top, right, bottom, left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl BoundingBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// `[top, right, bottom, left]`, the layout used in exported reports.
    pub fn to_array(&self) -> [i32; 4] {
        [self.top, self.right, self.bottom, self.left]
    }
}

/// One enrolled (name, signature) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub name: String,
    pub signature: Signature,
}

/// A face found in the search image.
#[derive(Debug, Clone)]
pub struct QueryFace {
    pub signature: Signature,
    pub bounding_box: BoundingBox,
}

/// Decision for one query face.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchVerdict {
    /// Position of the face in the query sequence.
    pub query_index: usize,
    pub name: String,
    /// `1 - distance`, clamped to [0, 1]. 0.0 for unknown faces.
    pub confidence: f32,
    /// Raw distance to the chosen gallery entry; `None` for unknown faces.
    pub distance: Option<f32>,
    pub bounding_box: BoundingBox,
}

impl MatchVerdict {
    pub fn unknown(query_index: usize, bounding_box: BoundingBox) -> Self {
        Self {
            query_index,
            name: UNKNOWN_NAME.to_string(),
            confidence: 0.0,
            distance: None,
            bounding_box,
        }
    }

    pub fn is_known(&self) -> bool {
        self.name != UNKNOWN_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identical() {
        let a = Signature::new(vec![0.3, -0.2, 0.9]);
        assert_eq!(a.distance(&a.clone()), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        let a = Signature::new(vec![0.0, 0.0]);
        let b = Signature::new(vec![3.0, 4.0]);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_symmetric() {
        let a = Signature::new(vec![0.1, 0.7, -0.4]);
        let b = Signature::new(vec![-0.5, 0.2, 0.3]);
        assert_eq!(a.distance(&b), b.distance(&a));
        assert!(a.distance(&b) > 0.0);
    }

    #[test]
    fn test_distance_length_mismatch_is_infinite() {
        let entry = Signature::new(vec![0.9, 0.9, 0.9]);
        assert_eq!(Signature::new(vec![0.9]).distance(&entry), f32::INFINITY);
        assert_eq!(Signature::new(vec![]).distance(&entry), f32::INFINITY);
        assert_eq!(entry.distance(&Signature::new(vec![])), f32::INFINITY);
        assert_eq!(Signature::new(vec![]).distance(&Signature::new(vec![])), 0.0);
    }

    #[test]
    fn test_bounding_box_array_order() {
        let bbox = BoundingBox::new(10, 80, 90, 20);
        assert_eq!(bbox.to_array(), [10, 80, 90, 20]);
        assert_eq!(bbox.width(), 60);
        assert_eq!(bbox.height(), 80);
    }

    #[test]
    fn test_unknown_verdict() {
        let v = MatchVerdict::unknown(3, BoundingBox::new(0, 1, 1, 0));
        assert_eq!(v.name, UNKNOWN_NAME);
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.query_index, 3);
        assert!(v.distance.is_none());
        assert!(!v.is_known());
    }
}
