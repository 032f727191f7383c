//! Core types for tasterank - the pairwise preference-learning engine.
//!
//! This module holds the data shapes exchanged with collaborators:
//! catalog records coming in, recommendations and summaries going out,
//! and the tunable knobs for the model and the pair selector.
//!
//! Catalog records use the camelCase field names of the master catalog
//! export, so a `master.json` produced by the backend deserializes
//! directly. Fields the engine never inspects (price, cover art,
//! descriptions) ride along in an opaque extras map.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single game from the catalog.
///
/// The engine reads exactly two things: the stable `app_id` and the
/// `tags` mapping from tag name to popularity vote count. Everything
/// else is passthrough data preserved for whoever consumes the ranked
/// output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Stable catalog identifier (Steam app id in the master catalog).
    pub app_id: u64,
    /// Display name.
    pub name: String,
    /// Tag name -> popularity vote count. May be empty.
    #[serde(default)]
    pub tags: HashMap<String, u32>,
    /// Opaque catalog fields the engine never inspects.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GameRecord {
    /// Build a bare record with just id, name and tags (test/fixture helper).
    pub fn new(app_id: u64, name: impl Into<String>, tags: &[(&str, u32)]) -> Self {
        Self {
            app_id,
            name: name.into(),
            tags: tags.iter().map(|(t, v)| (t.to_string(), *v)).collect(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Which side of a comparison the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickSide {
    Left,
    Right,
    Skip,
}

/// A comparison pair handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePair {
    pub left: GameRecord,
    pub right: GameRecord,
}

/// One recorded user decision. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub left_game: GameRecord,
    pub right_game: GameRecord,
    pub pick: PickSide,
    /// Milliseconds since the Unix epoch at the time of the choice.
    pub timestamp: u64,
}

/// A game with its model score and 1-based rank position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecommendation {
    pub game: GameRecord,
    pub score: f64,
    pub rank: usize,
}

/// A learned tag weight, as surfaced in the preference summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagWeight {
    pub tag: String,
    pub weight: f64,
}

/// Human-readable view of what the model has learned so far.
///
/// `liked_tags` holds the strongest positive weights in descending
/// order; `disliked_tags` holds the strongest negative weights,
/// mildest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSummary {
    pub liked_tags: Vec<TagWeight>,
    pub disliked_tags: Vec<TagWeight>,
}

/// Comparison progress for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressInfo {
    pub current: usize,
    pub total: usize,
}

/// Tunable knobs for the preference model.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// SGD step size for the pairwise logistic update.
    pub learning_rate: f64,
    /// Minimum |weight| for a tag to show up in the summary.
    pub summary_threshold: f64,
    /// Maximum liked/disliked tags returned by the summary.
    pub summary_limit: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            summary_threshold: 0.01,
            summary_limit: 5,
        }
    }
}

/// Tunable knobs for the pair selector.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Session ends once this many choices are recorded.
    pub target_comparisons: usize,
    /// Recent pairs excluded from re-selection (unordered match).
    pub diversity_window: usize,
    /// Below this uncertainty the selector falls back to random pairs.
    pub min_uncertainty: f64,
    /// Number of initial choices made with the random bootstrap policy.
    pub bootstrap_choices: usize,
    /// Cap on candidate pairs sampled per uncertainty-phase selection.
    pub max_candidate_pairs: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            target_comparisons: 20,
            diversity_window: 5,
            min_uncertainty: 0.1,
            bootstrap_choices: 3,
            max_candidate_pairs: 100,
        }
    }
}
