//! Face-matching decision engine.
//!
//! Compares query signatures against every gallery entry and decides,
//! per face, which enrolled identity it is (if any) and with what confidence.

use crate::gallery::Gallery;
use crate::types::{MatchVerdict, QueryFace};

/// Strategy for comparing a query face against a gallery of enrolled faces.
///
/// Implementations hold no state between calls. The gallery must be
/// non-empty; callers check this before matching.
pub trait Matcher {
    fn match_face(
        &self,
        query_index: usize,
        query: &QueryFace,
        gallery: &Gallery,
        tolerance: f32,
    ) -> MatchVerdict;

    /// Match every query in order. Output has one verdict per query, in input order.
    fn match_all(&self, queries: &[QueryFace], gallery: &Gallery, tolerance: f32) -> Vec<MatchVerdict> {
        queries
            .iter()
            .enumerate()
            .map(|(i, query)| self.match_face(i, query, gallery, tolerance))
            .collect()
    }
}

/// Euclidean-distance matcher.
///
/// `tolerance` is an inclusive upper bound on distance: lower = stricter.
/// Always iterates ALL gallery entries, no early exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct DistanceMatcher;

impl DistanceMatcher {
    /// Distance from `query` to every entry, index-aligned with the gallery.
    pub fn distances(query: &QueryFace, gallery: &Gallery) -> Vec<f32> {
        gallery
            .iter()
            .map(|entry| query.signature.distance(&entry.signature))
            .collect()
    }
}

impl Matcher for DistanceMatcher {
    fn match_face(
        &self,
        query_index: usize,
        query: &QueryFace,
        gallery: &Gallery,
        tolerance: f32,
    ) -> MatchVerdict {
        let distances = Self::distances(query, gallery);
        let matches: Vec<bool> = distances.iter().map(|&d| d <= tolerance).collect();

        if !matches.contains(&true) {
            return MatchVerdict::unknown(query_index, query.bounding_box);
        }

        // Closest entry over the whole gallery, not only the flagged ones.
        // Strict `<` keeps the first-enrolled entry on ties; a NaN in front
        // is never displaced and fails its flag below.
        let mut best_idx = 0;
        for (i, &d) in distances.iter().enumerate().skip(1) {
            if d < distances[best_idx] {
                best_idx = i;
            }
        }

        if !matches[best_idx] {
            tracing::debug!(
                query_index,
                best_idx,
                distance = distances[best_idx],
                "closest entry outside tolerance; reporting unknown"
            );
            return MatchVerdict::unknown(query_index, query.bounding_box);
        }

        let entry = &gallery.entries()[best_idx];
        let distance = distances[best_idx];

        MatchVerdict {
            query_index,
            name: entry.name.clone(),
            confidence: (1.0 - distance).clamp(0.0, 1.0),
            distance: Some(distance),
            bounding_box: query.bounding_box,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, Signature, UNKNOWN_NAME};

    fn gallery(entries: &[(&str, Vec<f32>)]) -> Gallery {
        let mut g = Gallery::new();
        for (name, values) in entries {
            g.enroll(*name, Signature::new(values.clone()));
        }
        g
    }

    fn query(values: Vec<f32>) -> QueryFace {
        QueryFace {
            signature: Signature::new(values),
            bounding_box: BoundingBox::new(10, 110, 120, 20),
        }
    }

    #[test]
    fn test_exact_match_full_confidence() {
        let g = gallery(&[("Alice", vec![0.2, 0.4, 0.1])]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.2, 0.4, 0.1]), &g, 0.6);
        assert_eq!(v.name, "Alice");
        assert!((v.confidence - 1.0).abs() < 1e-6);
        assert_eq!(v.distance, Some(0.0));
    }

    #[test]
    fn test_exact_match_at_zero_tolerance() {
        let g = gallery(&[("Alice", vec![0.5, 0.5])]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.5, 0.5]), &g, 0.0);
        assert_eq!(v.name, "Alice");
        assert_eq!(v.confidence, 1.0);
    }

    #[test]
    fn test_outside_tolerance_is_unknown() {
        let g = gallery(&[("Alice", vec![0.0, 0.0])]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.9, 0.0]), &g, 0.6);
        assert_eq!(v.name, UNKNOWN_NAME);
        assert_eq!(v.confidence, 0.0);
        assert!(v.distance.is_none());
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let g = gallery(&[("Alice", vec![0.0, 0.0])]);
        let q = query(vec![0.5, 0.0]);
        let v = DistanceMatcher.match_face(0, &q, &g, 0.5);
        assert_eq!(v.name, "Alice");
        assert!((v.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_tie_prefers_first_enrolled() {
        let g = gallery(&[("Alice", vec![0.3, 0.0]), ("Bob", vec![0.0, 0.3])]);
        for _ in 0..5 {
            let v = DistanceMatcher.match_face(0, &query(vec![0.0, 0.0]), &g, 0.6);
            assert_eq!(v.name, "Alice");
            assert!((v.confidence - 0.7).abs() < 1e-6);
        }
    }

    #[test]
    fn test_closest_entry_wins() {
        let g = gallery(&[
            ("decoy", vec![0.4, 0.0]),
            ("Bob", vec![0.1, 0.0]),
            ("Carol", vec![0.2, 0.0]),
        ]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.0, 0.0]), &g, 0.6);
        assert_eq!(v.name, "Bob");
        assert!((v.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_repeated_name_entries() {
        let g = gallery(&[
            ("Alice", vec![0.9, 0.0]),
            ("Bob", vec![0.35, 0.0]),
            ("Alice", vec![0.05, 0.0]),
        ]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.0, 0.0]), &g, 0.6);
        assert_eq!(v.name, "Alice");
        assert!((v.distance.unwrap() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_closest_unflagged_falls_through_to_unknown() {
        // The NaN entry sorts first under argmin but never passes the
        // tolerance check, so the flagged exact match is not reported.
        let g = gallery(&[("ghost", vec![f32::NAN, 0.0]), ("Alice", vec![0.0, 0.0])]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.0, 0.0]), &g, 0.6);
        assert_eq!(v.name, UNKNOWN_NAME);
        assert_eq!(v.confidence, 0.0);
    }

    #[test]
    fn test_empty_query_signature_is_unknown() {
        let g = gallery(&[("Alice", vec![0.9, 0.9, 0.9])]);
        let v = DistanceMatcher.match_face(0, &query(vec![]), &g, 0.0);
        assert_eq!(v.name, UNKNOWN_NAME);
        assert_eq!(v.confidence, 0.0);
        assert!(v.distance.is_none());
    }

    #[test]
    fn test_mismatched_length_never_matches() {
        let g = gallery(&[("Alice", vec![0.9, 0.9, 0.9]), ("Bob", vec![0.0])]);
        let v = DistanceMatcher.match_face(0, &query(vec![0.9]), &g, 1.0);
        // Alice shares the prefix exactly but has a different length; Bob is
        // the only comparable entry.
        assert_eq!(v.name, "Bob");
        assert!((v.distance.unwrap() - 0.9).abs() < 1e-6);

        let v = DistanceMatcher.match_face(0, &query(vec![0.9]), &g, 0.5);
        assert_eq!(v.name, UNKNOWN_NAME);
    }

    #[test]
    fn test_confidence_clamped_for_large_tolerance() {
        let g = gallery(&[("Alice", vec![0.0, 0.0])]);
        let v = DistanceMatcher.match_face(0, &query(vec![1.5, 0.0]), &g, 2.0);
        assert_eq!(v.name, "Alice");
        assert_eq!(v.confidence, 0.0);
        assert!((v.distance.unwrap() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_box_passed_through() {
        let g = gallery(&[("Alice", vec![0.0])]);
        let q = QueryFace {
            signature: Signature::new(vec![5.0]),
            bounding_box: BoundingBox::new(1, 2, 3, 4),
        };
        let v = DistanceMatcher.match_face(7, &q, &g, 0.6);
        assert_eq!(v.bounding_box, BoundingBox::new(1, 2, 3, 4));
        assert_eq!(v.query_index, 7);
    }

    #[test]
    fn test_match_all_preserves_order() {
        let g = gallery(&[("Alice", vec![0.0, 0.0]), ("Bob", vec![1.0, 1.0])]);
        let queries = vec![
            query(vec![1.0, 1.0]),
            query(vec![5.0, 5.0]),
            query(vec![0.0, 0.0]),
            query(vec![0.95, 1.0]),
        ];
        let verdicts = DistanceMatcher.match_all(&queries, &g, 0.6);
        assert_eq!(verdicts.len(), 4);
        let names: Vec<&str> = verdicts.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["Bob", UNKNOWN_NAME, "Alice", "Bob"]);
        for (i, v) in verdicts.iter().enumerate() {
            assert_eq!(v.query_index, i);
        }
    }

    #[test]
    fn test_match_all_empty_queries() {
        let g = gallery(&[("Alice", vec![0.0])]);
        assert!(DistanceMatcher.match_all(&[], &g, 0.6).is_empty());
    }

    #[test]
    fn test_tolerance_monotonicity() {
        let g = gallery(&[
            ("Alice", vec![0.0, 0.0]),
            ("Bob", vec![0.8, 0.0]),
            ("Carol", vec![0.0, 0.45]),
        ]);
        let probes = [vec![0.3, 0.3], vec![0.5, 0.0], vec![1.2, 0.9], vec![0.0, 0.2]];
        let tolerances = [0.0, 0.1, 0.25, 0.4, 0.5, 0.6, 0.8, 1.0];

        for p in &probes {
            let q = query(p.clone());
            let mut was_known = false;
            for &t in &tolerances {
                let known = DistanceMatcher.match_face(0, &q, &g, t).is_known();
                assert!(known || !was_known, "match lost when tolerance rose to {t} for {p:?}");
                was_known = known;
            }
        }
    }

    #[test]
    fn test_distances_index_aligned() {
        let g = gallery(&[("a", vec![3.0, 4.0]), ("b", vec![0.0, 0.0])]);
        let d = DistanceMatcher::distances(&query(vec![0.0, 0.0]), &g);
        assert_eq!(d.len(), 2);
        assert!((d[0] - 5.0).abs() < 1e-6);
        assert_eq!(d[1], 0.0);
    }
}
