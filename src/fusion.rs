//! # Recognition Fusion
//!
//! Merges the fragments recognized on the untouched photograph (pass A) with
//! those recognized on the enhanced image (pass B).
//!
//! Pass A is the only source of geometry: the enhanced image may have been
//! upscaled, so its polygons do not line up with the photograph. Pass B can
//! only improve the text and confidence of a fragment pass A already has.

use std::collections::HashMap;

use crate::observability::record_fusion_metrics;
use crate::recognition::Fragment;

/// Deduplication key of a fragment: trimmed, lowercased text.
pub fn fusion_key(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Merge two recognition passes.
///
/// # Arguments
///
/// * `pass_a` - Fragments from the untouched image (trusted geometry)
/// * `pass_b` - Fragments from the enhanced image
///
/// # Returns
///
/// One fragment per distinct key of pass A, in first-seen order. A pass-B
/// fragment with the same key and a higher confidence replaces the text and
/// confidence but never the polygon. Pass-B keys unknown to pass A are dropped.
///
/// # Examples
///
/// ```rust
/// use address_ocr::fusion::merge_passes;
/// use address_ocr::recognition::{Fragment, Point};
///
/// let a = vec![Fragment::new(vec![Point::new(0.0, 0.0)], "дом", 0.4)];
/// let b = vec![Fragment::new(vec![Point::new(9.0, 9.0)], "ДОМ", 0.9)];
///
/// let merged = merge_passes(&a, &b);
/// assert_eq!(merged[0].text, "ДОМ");
/// assert_eq!(merged[0].polygon, a[0].polygon);
/// ```
pub fn merge_passes(pass_a: &[Fragment], pass_b: &[Fragment]) -> Vec<Fragment> {
    let mut merged: Vec<Fragment> = Vec::with_capacity(pass_a.len());
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(pass_a.len());

    for fragment in pass_a {
        let key = fusion_key(&fragment.text);
        if key.is_empty() {
            continue;
        }
        match positions.get(&key) {
            Some(&position) => merged[position] = fragment.clone(),
            None => {
                positions.insert(key, merged.len());
                merged.push(fragment.clone());
            }
        }
    }

    let mut replaced = 0usize;
    let mut discarded = 0usize;
    for fragment in pass_b {
        let key = fusion_key(&fragment.text);
        if key.is_empty() {
            continue;
        }
        match positions.get(&key) {
            Some(&position) => {
                let stored = &mut merged[position];
                if fragment.confidence > stored.confidence {
                    stored.text = fragment.text.clone();
                    stored.confidence = fragment.confidence;
                    replaced += 1;
                }
            }
            None => discarded += 1,
        }
    }

    tracing::debug!(
        pass_a = pass_a.len(),
        pass_b = pass_b.len(),
        merged = merged.len(),
        replaced,
        discarded,
        "Recognition passes fused"
    );
    record_fusion_metrics(replaced, discarded);

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::Point;

    fn fragment(x: f32, text: &str, confidence: f32) -> Fragment {
        Fragment::new(vec![Point::new(x, 0.0), Point::new(x + 10.0, 10.0)], text, confidence)
    }

    #[test]
    fn test_higher_confidence_text_keeps_pass_a_geometry() {
        let a = vec![fragment(1.0, "дом", 0.4)];
        let b = vec![fragment(50.0, "дом", 0.9)];

        let merged = merge_passes(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].polygon, a[0].polygon);
        assert_eq!(merged[0].confidence, 0.9);
    }

    #[test]
    fn test_lower_confidence_is_ignored() {
        let a = vec![fragment(1.0, "ленина", 0.5)];
        let b = vec![fragment(50.0, "Ленина ", 0.3)];

        let merged = merge_passes(&a, &b);
        assert_eq!(merged, a);
    }

    #[test]
    fn test_unknown_pass_b_keys_are_dropped() {
        let a = vec![fragment(1.0, "Садовая", 0.8)];
        let b = vec![fragment(5.0, "25", 0.99)];

        let merged = merge_passes(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "Садовая");
    }

    #[test]
    fn test_blank_fragments_are_ignored() {
        let a = vec![fragment(1.0, "  ", 0.9), fragment(2.0, "ул", 0.6)];
        let b = vec![fragment(3.0, "", 1.0)];

        let merged = merge_passes(&a, &b);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "ул");
    }

    #[test]
    fn test_duplicate_keys_in_pass_a_keep_first_position() {
        let a = vec![
            fragment(1.0, "ул", 0.6),
            fragment(2.0, "Мира", 0.7),
            fragment(3.0, "УЛ", 0.5),
        ];

        let merged = merge_passes(&a, &[]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text, "УЛ");
        assert_eq!(merged[1].text, "Мира");
    }
}
