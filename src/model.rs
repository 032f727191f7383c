//! Pairwise logistic preference model.
//!
//! The model learns a linear score function over the tag feature space
//! from pairwise choices, Bradley-Terry style: the probability that A
//! beats B is `sigmoid(score(A) - score(B))`, and each observed choice
//! nudges the weight vector toward matching that probability via one
//! SGD step.
//!
//! ## Update rule
//!
//! ```text
//! diff     = score(winner) - score(loser)
//! p        = sigmoid(clamp(diff))          # model's current belief
//! gradient = 1 - p                         # how surprised it was
//! w += lr * gradient * vectorize(winner)
//! w -= lr * gradient * vectorize(loser)
//! ```
//!
//! The exponent argument is clamped to [-60, 60] before exponentiating,
//! so overflow/NaN can never reach the weight vector.
//!
//! ## Read/write asymmetry
//!
//! `update` on an uninitialized model is a contract violation and
//! returns `ModelNotInitialized`; `score` on an uninitialized model
//! degrades to 0 so read paths keep working during session setup.

use log::debug;

use crate::dictionary::TagDictionary;
use crate::error::TasteError;
use crate::state::UserPreferenceState;
use crate::types::{GameRecommendation, GameRecord, ModelConfig, PreferenceSummary, TagWeight};
use crate::vector::vectorize;

/// Clamp bound for the logistic exponent argument.
const SCORE_DIFF_CLAMP: f64 = 60.0;

/// Numerically safe logistic function.
pub(crate) fn sigmoid(x: f64) -> f64 {
    let x = x.clamp(-SCORE_DIFF_CLAMP, SCORE_DIFF_CLAMP);
    1.0 / (1.0 + (-x).exp())
}

/// Callback invoked synchronously after every weight-mutating operation.
pub type ChangeListener = Box<dyn FnMut(&PreferenceSummary)>;

/// Weight vector and dictionary, present only after `initialize`.
struct Bound {
    dict: TagDictionary,
    weights: Vec<f64>,
}

/// The learned preference model.
///
/// Caller-owned and explicit: there is no ambient singleton instance.
/// Mutating calls (`update`, `reset`, `import_state`) must be
/// serialized by the caller; reads observe only fully-applied updates.
pub struct PreferenceModel {
    bound: Option<Bound>,
    comparison_count: u64,
    config: ModelConfig,
    listener: Option<ChangeListener>,
}

impl PreferenceModel {
    /// Create an uninitialized model with default knobs.
    pub fn new() -> Self {
        Self::with_config(ModelConfig::default())
    }

    /// Create an uninitialized model with explicit knobs.
    pub fn with_config(config: ModelConfig) -> Self {
        Self {
            bound: None,
            comparison_count: 0,
            config,
            listener: None,
        }
    }

    /// Bind a tag dictionary and zero the weight vector.
    ///
    /// Idempotent and safe to call repeatedly; discards prior learning.
    pub fn initialize(&mut self, dict: TagDictionary) {
        let weights = vec![0.0; dict.size()];
        self.bound = Some(Bound { dict, weights });
        self.comparison_count = 0;
    }

    /// True once a dictionary has been bound.
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// Non-skip choices learned from so far.
    pub fn comparison_count(&self) -> u64 {
        self.comparison_count
    }

    /// Install a callback fired after `update`, `reset` and successful
    /// `import_state`, receiving the fresh summary. Replaces any
    /// previously installed listener.
    pub fn set_change_listener(&mut self, listener: ChangeListener) {
        self.listener = Some(listener);
    }

    /// Linear score of a game under the current weights.
    ///
    /// Pure in `(weights, game)`; an uninitialized model scores
    /// everything 0 rather than failing.
    pub fn score(&self, game: &GameRecord) -> f64 {
        match &self.bound {
            Some(bound) => vectorize(game, &bound.dict).dot(&bound.weights),
            None => 0.0,
        }
    }

    /// Apply one pairwise SGD step for an observed `winner > loser` choice.
    ///
    /// Increments the comparison count by exactly 1. The full weight
    /// delta is applied before this returns; no partial state is ever
    /// observable.
    pub fn update(&mut self, winner: &GameRecord, loser: &GameRecord) -> Result<(), TasteError> {
        let bound = self.bound.as_mut().ok_or(TasteError::ModelNotInitialized)?;

        let winner_vec = vectorize(winner, &bound.dict);
        let loser_vec = vectorize(loser, &bound.dict);

        let diff = winner_vec.dot(&bound.weights) - loser_vec.dot(&bound.weights);
        let probability = sigmoid(diff);
        let gradient = 1.0 - probability;
        let step = self.config.learning_rate * gradient;

        for (index, value) in winner_vec.iter() {
            bound.weights[index] += step * value;
        }
        for (index, value) in loser_vec.iter() {
            bound.weights[index] -= step * value;
        }

        self.comparison_count += 1;
        debug!(
            "update: {} > {} (p={:.3}, gradient={:.3}, n={})",
            winner.app_id, loser.app_id, probability, gradient, self.comparison_count
        );

        self.notify();
        Ok(())
    }

    /// Score a collection and return it sorted by descending score.
    ///
    /// The sort is stable: games with equal scores keep their input
    /// order. Ranks are 1-based positions in the sorted output.
    pub fn rank(&self, games: &[GameRecord]) -> Vec<GameRecommendation> {
        let mut scored: Vec<(f64, &GameRecord)> =
            games.iter().map(|g| (self.score(g), g)).collect();

        // Stable sort preserves input order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (score, game))| GameRecommendation {
                game: game.clone(),
                score,
                rank: i + 1,
            })
            .collect()
    }

    /// Top liked and disliked tags under the current weights.
    ///
    /// Entries with |weight| at or below the significance threshold are
    /// dropped. Liked tags come strongest-first; disliked tags come
    /// mildest-first (severity ascending). Empty when uninitialized.
    pub fn summary(&self) -> PreferenceSummary {
        let Some(bound) = &self.bound else {
            return PreferenceSummary::default();
        };

        let mut significant: Vec<TagWeight> = bound
            .weights
            .iter()
            .enumerate()
            .filter(|(_, w)| w.abs() > self.config.summary_threshold)
            .filter_map(|(i, &w)| {
                bound.dict.tag_at(i).map(|tag| TagWeight {
                    tag: tag.to_string(),
                    weight: w,
                })
            })
            .collect();

        significant.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let limit = self.config.summary_limit;
        let liked_tags: Vec<TagWeight> = significant
            .iter()
            .filter(|t| t.weight > 0.0)
            .take(limit)
            .cloned()
            .collect();

        // Keeping the overall descending order means the negative tail
        // reads mildest-first.
        let negatives: Vec<TagWeight> = significant
            .iter()
            .filter(|t| t.weight < 0.0)
            .cloned()
            .collect();
        let skip = negatives.len().saturating_sub(limit);
        let disliked_tags = negatives.into_iter().skip(skip).collect();

        PreferenceSummary {
            liked_tags,
            disliked_tags,
        }
    }

    /// Zero the weights (if bound) and the comparison count.
    pub fn reset(&mut self) {
        if let Some(bound) = &mut self.bound {
            bound.weights.fill(0.0);
        }
        self.comparison_count = 0;
        self.notify();
    }

    /// Snapshot the current weights, count and dictionary.
    pub fn export_state(&self) -> UserPreferenceState {
        match &self.bound {
            Some(bound) => UserPreferenceState {
                weight_vector: bound.weights.clone(),
                comparison_count: self.comparison_count,
                tag_dict: Some(bound.dict.clone()),
            },
            None => UserPreferenceState::empty(),
        }
    }

    /// Restore a snapshot.
    ///
    /// Rejects incoherent snapshots and, when a dictionary is already
    /// bound, snapshots whose dictionary size differs from it. On any
    /// rejection the current state is left completely untouched; the
    /// error is a value-level signal, not a crash.
    pub fn import_state(&mut self, state: &UserPreferenceState) -> Result<(), TasteError> {
        if !state.is_coherent() {
            return Err(TasteError::IncompatibleState(format!(
                "weight vector length {} does not match embedded dictionary",
                state.weight_vector.len()
            )));
        }

        let Some(dict) = &state.tag_dict else {
            // Coherent but dictionary-less: an empty first-session
            // snapshot. Nothing to restore.
            return Ok(());
        };

        if let Some(bound) = &self.bound {
            if bound.dict.size() != dict.size() {
                return Err(TasteError::IncompatibleState(format!(
                    "snapshot dictionary size {} does not match bound size {}",
                    dict.size(),
                    bound.dict.size()
                )));
            }
        }

        self.bound = Some(Bound {
            dict: dict.clone(),
            weights: state.weight_vector.clone(),
        });
        self.comparison_count = state.comparison_count;
        self.notify();
        Ok(())
    }

    fn notify(&mut self) {
        if self.listener.is_some() {
            let summary = self.summary();
            if let Some(listener) = &mut self.listener {
                listener(&summary);
            }
        }
    }
}

impl Default for PreferenceModel {
    fn default() -> Self {
        Self::new()
    }
}
