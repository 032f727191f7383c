//! Tag dictionary - the fixed bijection between tag names and feature indices.
//!
//! The dictionary is built once per session from the full catalog and
//! defines the model's dimensionality. It is immutable after
//! construction: rebuilding it invalidates any weight vector learned
//! against the old index assignment, which is why state import checks
//! vector length against dictionary size.
//!
//! Tag ordering is deterministic (lexicographic over the catalog's
//! unique tag names) so the same catalog always yields the same index
//! assignment.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::GameRecord;

/// Bijection between tag names and dense feature indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDictionary {
    tag_to_index: HashMap<String, usize>,
    index_to_tag: Vec<String>,
}

impl TagDictionary {
    /// Build a dictionary from an explicit tag ordering.
    ///
    /// Duplicate names keep their first index; later occurrences are
    /// ignored so the mapping stays a bijection.
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tag_to_index = HashMap::new();
        let mut index_to_tag = Vec::new();

        for tag in tags {
            let tag = tag.into();
            if !tag_to_index.contains_key(&tag) {
                tag_to_index.insert(tag.clone(), index_to_tag.len());
                index_to_tag.push(tag);
            }
        }

        Self {
            tag_to_index,
            index_to_tag,
        }
    }

    /// Build a dictionary from every tag appearing anywhere in a catalog.
    ///
    /// Tags are assigned indices in lexicographic order, making the
    /// feature space reproducible across sessions over the same catalog.
    pub fn from_catalog(games: &[GameRecord]) -> Self {
        let unique: BTreeSet<&str> = games
            .iter()
            .flat_map(|g| g.tags.keys().map(String::as_str))
            .collect();

        Self::from_tags(unique.into_iter().map(str::to_string))
    }

    /// Vocabulary size = model dimensionality.
    pub fn size(&self) -> usize {
        self.index_to_tag.len()
    }

    /// Feature index for a tag name, if the tag is known.
    pub fn index_of(&self, tag: &str) -> Option<usize> {
        self.tag_to_index.get(tag).copied()
    }

    /// Tag name at a feature index, if in range.
    pub fn tag_at(&self, index: usize) -> Option<&str> {
        self.index_to_tag.get(index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bijection() {
        let dict = TagDictionary::from_tags(["FPS", "Shooter", "MOBA"]);
        assert_eq!(dict.size(), 3);

        for i in 0..dict.size() {
            let tag = dict.tag_at(i).unwrap();
            assert_eq!(dict.index_of(tag), Some(i));
        }
    }

    #[test]
    fn test_duplicates_keep_first_index() {
        let dict = TagDictionary::from_tags(["FPS", "MOBA", "FPS"]);
        assert_eq!(dict.size(), 2);
        assert_eq!(dict.index_of("FPS"), Some(0));
        assert_eq!(dict.index_of("MOBA"), Some(1));
    }

    #[test]
    fn test_unknown_tag() {
        let dict = TagDictionary::from_tags(["FPS"]);
        assert_eq!(dict.index_of("Farming Sim"), None);
        assert_eq!(dict.tag_at(7), None);
    }

    #[test]
    fn test_from_catalog_is_sorted_and_deduped() {
        let games = vec![
            GameRecord::new(1, "a", &[("Shooter", 10), ("FPS", 5)]),
            GameRecord::new(2, "b", &[("FPS", 3), ("MOBA", 9)]),
        ];

        let dict = TagDictionary::from_catalog(&games);
        assert_eq!(dict.size(), 3);
        // Lexicographic assignment regardless of catalog order.
        assert_eq!(dict.index_of("FPS"), Some(0));
        assert_eq!(dict.index_of("MOBA"), Some(1));
        assert_eq!(dict.index_of("Shooter"), Some(2));
    }

    #[test]
    fn test_from_empty_catalog() {
        let dict = TagDictionary::from_catalog(&[]);
        assert_eq!(dict.size(), 0);
    }
}
