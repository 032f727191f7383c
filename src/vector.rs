//! Sparse feature vectors over the tag space.
//!
//! A game's tag profile is represented only by the indices and values
//! of tags actually present; implicit zeros are omitted. Indices are
//! stored in ascending order so the dot product against the dense
//! weight vector is a single linear walk with no per-call key lookups.
//!
//! ## Feature scaling
//!
//! Raw tag vote counts span several orders of magnitude (a popular
//! tag can carry 90k+ votes). Features use `ln(1 + votes)` to compress
//! that range while keeping the mapping monotonic; a zero vote count
//! (or an absent tag) contributes exactly 0, so an empty tag set
//! always scores 0 under any weight vector.

use crate::dictionary::TagDictionary;
use crate::types::GameRecord;

/// A sparse vector in the tag feature space.
///
/// Invariants: `indices` are unique, ascending, all `< dim`, and
/// `indices.len() == values.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    indices: Vec<usize>,
    values: Vec<f64>,
    dim: usize,
}

impl SparseVector {
    /// Declared dimension (the tag dictionary size).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// True if no tag survived vectorization.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Dot product against a dense weight vector.
    ///
    /// The weight slice is assumed to have length `dim`; out-of-range
    /// indices contribute nothing rather than panic.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, v)| weights.get(i).map(|w| w * v))
            .sum()
    }
}

/// Convert a game's tag votes into a sparse feature vector.
///
/// Tags absent from the dictionary are silently dropped. Total and
/// deterministic: a game with no tags, or only unknown tags, yields an
/// empty vector, never an error.
pub fn vectorize(game: &GameRecord, dict: &TagDictionary) -> SparseVector {
    let mut entries: Vec<(usize, f64)> = game
        .tags
        .iter()
        .filter_map(|(tag, &votes)| {
            dict.index_of(tag)
                .map(|index| (index, feature_value(votes)))
        })
        .collect();

    entries.sort_unstable_by_key(|&(index, _)| index);

    let (indices, values) = entries.into_iter().unzip();
    SparseVector {
        indices,
        values,
        dim: dict.size(),
    }
}

/// Log-scaled feature magnitude for a raw vote count.
fn feature_value(votes: u32) -> f64 {
    (1.0 + f64::from(votes)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> TagDictionary {
        TagDictionary::from_tags(["FPS", "MOBA", "Shooter"])
    }

    #[test]
    fn test_vectorize_basic() {
        let game = GameRecord::new(1, "g", &[("Shooter", 100), ("FPS", 10)]);
        let vec = vectorize(&game, &dict());

        assert_eq!(vec.dim(), 3);
        assert_eq!(vec.nnz(), 2);

        let entries: Vec<_> = vec.iter().collect();
        // Ascending index order regardless of hash-map iteration order.
        assert_eq!(entries[0].0, 0);
        assert_eq!(entries[1].0, 2);
        assert!((entries[0].1 - 11.0_f64.ln()).abs() < 1e-12);
        assert!((entries[1].1 - 101.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_tags_dropped() {
        let game = GameRecord::new(1, "g", &[("FPS", 5), ("Farming Sim", 999)]);
        let vec = vectorize(&game, &dict());
        assert_eq!(vec.nnz(), 1);
        assert_eq!(vec.iter().next().unwrap().0, 0);
    }

    #[test]
    fn test_empty_and_all_unknown_yield_empty() {
        let empty = GameRecord::new(1, "g", &[]);
        assert!(vectorize(&empty, &dict()).is_empty());

        let unknown = GameRecord::new(2, "h", &[("Roguelike", 42)]);
        assert!(vectorize(&unknown, &dict()).is_empty());
    }

    #[test]
    fn test_empty_vector_dots_to_zero() {
        let empty = GameRecord::new(1, "g", &[]);
        let vec = vectorize(&empty, &dict());
        let weights = vec![3.0, -2.0, 5.0];
        assert_eq!(vec.dot(&weights), 0.0);
    }

    #[test]
    fn test_dot_product() {
        let game = GameRecord::new(1, "g", &[("FPS", 1), ("MOBA", 1)]);
        let vec = vectorize(&game, &dict());
        // Both features are ln(2).
        let weights = vec![2.0, -1.0, 100.0];
        let expected = 2.0_f64.ln() * (2.0 - 1.0);
        assert!((vec.dot(&weights) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_vectorize_is_deterministic() {
        let game = GameRecord::new(1, "g", &[("FPS", 7), ("Shooter", 3), ("MOBA", 1)]);
        let a = vectorize(&game, &dict());
        let b = vectorize(&game, &dict());
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_votes_contribute_zero() {
        let game = GameRecord::new(1, "g", &[("FPS", 0)]);
        let vec = vectorize(&game, &dict());
        assert_eq!(vec.nnz(), 1);
        assert_eq!(vec.iter().next().unwrap().1, 0.0);
        assert_eq!(vec.dot(&[10.0, 10.0, 10.0]), 0.0);
    }
}
