//! Serializable preference state - the persistence boundary.
//!
//! The engine defines only the shape of the snapshot and the import
//! policy; the storage medium (a file, browser storage, a database
//! row) belongs to an external collaborator. Snapshots are plain JSON
//! via serde, with the camelCase field names the frontend state used.
//!
//! Import policy on a dictionary-size mismatch: reject the snapshot and
//! leave the live model untouched. Resizing or re-zeroing would silently
//! discard or misalign learned weights; rejection keeps the failure
//! visible to the caller while guaranteeing no partial mutation.

use serde::{Deserialize, Serialize};

use crate::dictionary::TagDictionary;

/// JSON-serializable snapshot of a preference model.
///
/// Round-trip invariant: importing an exported snapshot reproduces
/// numerically identical weights and comparison count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferenceState {
    /// Dense weight vector; length must equal `tag_dict.size()`.
    pub weight_vector: Vec<f64>,
    /// Number of non-skip choices the model has learned from.
    pub comparison_count: u64,
    /// The dictionary the weights were learned against, if any.
    pub tag_dict: Option<TagDictionary>,
}

impl UserPreferenceState {
    /// An empty snapshot: no dictionary, no weights, zero comparisons.
    pub fn empty() -> Self {
        Self {
            weight_vector: Vec::new(),
            comparison_count: 0,
            tag_dict: None,
        }
    }

    /// Check the snapshot's internal consistency.
    ///
    /// A snapshot is coherent when its weight vector length matches its
    /// own embedded dictionary size (or both are absent/empty).
    pub fn is_coherent(&self) -> bool {
        match &self.tag_dict {
            Some(dict) => self.weight_vector.len() == dict.size(),
            None => self.weight_vector.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_coherent() {
        assert!(UserPreferenceState::empty().is_coherent());
    }

    #[test]
    fn test_mismatched_lengths_incoherent() {
        let state = UserPreferenceState {
            weight_vector: vec![0.0; 4],
            comparison_count: 2,
            tag_dict: Some(TagDictionary::from_tags(["FPS", "MOBA"])),
        };
        assert!(!state.is_coherent());

        let headless = UserPreferenceState {
            weight_vector: vec![1.0],
            comparison_count: 0,
            tag_dict: None,
        };
        assert!(!headless.is_coherent());
    }

    #[test]
    fn test_json_shape() {
        let state = UserPreferenceState {
            weight_vector: vec![0.5, -0.25],
            comparison_count: 3,
            tag_dict: Some(TagDictionary::from_tags(["FPS", "MOBA"])),
        };

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["weightVector"][0], 0.5);
        assert_eq!(json["comparisonCount"], 3);
        assert_eq!(json["tagDict"]["tagToIndex"]["FPS"], 0);

        let back: UserPreferenceState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
