//! Active pair selection - bootstrap, uncertainty sampling, diversity.
//!
//! The selector owns the candidate pool and the append-only choice
//! history, and decides which comparison to show next:
//!
//! 1. **Bootstrap phase** (first few choices): uniform random pairs,
//!    so early updates are not biased by an untrained model.
//! 2. **Uncertainty phase**: sample a bounded set of candidate pairs
//!    and pick the one the model is least decisive about, i.e. where
//!    `sigmoid(score(a) - score(b))` is closest to 0.5. That is the
//!    comparison whose outcome carries the most information.
//!
//! Both phases exclude the diversity window - the most recently shown
//! pairs (unordered match on game ids) - to avoid repetitive queries.
//! When every eligible pair sits inside the window, or the best
//! uncertainty falls below the floor, selection degrades to an
//! unrestricted random pair rather than stalling the session.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::TasteError;
use crate::model::{PreferenceModel, sigmoid};
use crate::types::{ChoiceRecord, GamePair, GameRecord, PickSide, ProgressInfo, SelectorConfig};

/// Pool size below which candidate pairs are enumerated exactly
/// instead of rejection-sampled. 64 games is 2016 pairs.
const EXACT_ENUMERATION_POOL: usize = 64;

/// Attempts before rejection sampling gives up on avoiding the window.
const REJECTION_ATTEMPTS: usize = 32;

/// Unordered pair key: game ids in ascending order.
fn pair_key(a: &GameRecord, b: &GameRecord) -> (u64, u64) {
    if a.app_id <= b.app_id {
        (a.app_id, b.app_id)
    } else {
        (b.app_id, a.app_id)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Selects comparison pairs and records their outcomes.
///
/// Caller-owned, like the model it feeds. The selector never owns the
/// `PreferenceModel`; scoring and update access is passed in per call
/// so one model can serve ranking and selection without shared
/// ambient state.
pub struct PairSelector {
    pool: Vec<GameRecord>,
    history: Vec<ChoiceRecord>,
    config: SelectorConfig,
    rng: StdRng,
}

impl PairSelector {
    /// Create a selector with default knobs and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_config(SelectorConfig::default())
    }

    /// Create a selector with explicit knobs.
    pub fn with_config(config: SelectorConfig) -> Self {
        Self {
            pool: Vec::new(),
            history: Vec::new(),
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the RNG with a seeded one for reproducible selection.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the candidate pool and clear the choice history.
    pub fn initialize_with_games(&mut self, games: Vec<GameRecord>) {
        self.pool = games;
        self.history.clear();
    }

    /// True while the session target is unmet and the pool can still
    /// form a pair.
    pub fn has_more_pairs(&self) -> bool {
        self.history.len() < self.config.target_comparisons && self.pool.len() >= 2
    }

    /// Select the next comparison pair, or `None` when the session is
    /// complete or the pool is too small.
    pub fn next_pair(&mut self, model: &PreferenceModel) -> Option<GamePair> {
        if !self.has_more_pairs() {
            return None;
        }

        if self.history.len() < self.config.bootstrap_choices {
            return self.bootstrap_pair();
        }

        match self.uncertainty_pair(model) {
            Some(pair) => Some(pair),
            // Nothing qualified, or the model is already decisive about
            // every sampled pair. Degrade to the bootstrap policy.
            None => self.bootstrap_pair(),
        }
    }

    /// Append a choice and, for non-skip picks, train the model.
    ///
    /// A skip grows the history (and thus session progress) but never
    /// touches the weights.
    pub fn record_choice(
        &mut self,
        model: &mut PreferenceModel,
        left: &GameRecord,
        right: &GameRecord,
        pick: PickSide,
    ) -> Result<(), TasteError> {
        match pick {
            PickSide::Left => model.update(left, right)?,
            PickSide::Right => model.update(right, left)?,
            PickSide::Skip => {}
        }

        self.history.push(ChoiceRecord {
            left_game: left.clone(),
            right_game: right.clone(),
            pick,
            timestamp: now_millis(),
        });
        Ok(())
    }

    /// Session progress: choices made vs. the target.
    pub fn progress(&self) -> ProgressInfo {
        ProgressInfo {
            current: self.history.len(),
            total: self.config.target_comparisons,
        }
    }

    /// Clear the history and reset the model's learned state.
    pub fn reset_progress(&mut self, model: &mut PreferenceModel) {
        self.history.clear();
        model.reset();
    }

    /// Snapshot of the choice history. The live history is append-only
    /// and never handed out for mutation.
    pub fn choice_history(&self) -> Vec<ChoiceRecord> {
        self.history.clone()
    }

    /// Unordered keys of the most recently shown pairs.
    fn window(&self) -> HashSet<(u64, u64)> {
        let start = self.history.len().saturating_sub(self.config.diversity_window);
        self.history[start..]
            .iter()
            .map(|c| pair_key(&c.left_game, &c.right_game))
            .collect()
    }

    /// Uniform random pair outside the diversity window, falling back
    /// to an unrestricted random pair when the window covers everything.
    fn bootstrap_pair(&mut self) -> Option<GamePair> {
        let n = self.pool.len();
        if n < 2 {
            return None;
        }

        let window = self.window();

        if n <= EXACT_ENUMERATION_POOL {
            let eligible: Vec<(usize, usize)> = all_index_pairs(n)
                .filter(|&(i, j)| !window.contains(&pair_key(&self.pool[i], &self.pool[j])))
                .collect();
            if let Some(&(i, j)) = eligible.choose(&mut self.rng) {
                return Some(self.make_pair(i, j));
            }
        } else {
            for _ in 0..REJECTION_ATTEMPTS {
                let (i, j) = self.random_index_pair();
                if !window.contains(&pair_key(&self.pool[i], &self.pool[j])) {
                    return Some(self.make_pair(i, j));
                }
            }
        }

        // Every candidate sits inside the window; keep the session
        // moving with an unrestricted pair.
        let (i, j) = self.random_index_pair();
        debug!("bootstrap fallback: diversity window exhausted");
        Some(self.make_pair(i, j))
    }

    /// Most informative pair among a bounded sample, excluding the
    /// diversity window. `None` when nothing qualifies or the best
    /// uncertainty is below the configured floor.
    fn uncertainty_pair(&mut self, model: &PreferenceModel) -> Option<GamePair> {
        let n = self.pool.len();
        let total_pairs = n * (n - 1) / 2;
        let cap = self.config.max_candidate_pairs.min(total_pairs);
        if cap == 0 {
            return None;
        }

        let candidates: Vec<(usize, usize)> = if total_pairs <= self.config.max_candidate_pairs {
            all_index_pairs(n).collect()
        } else {
            let mut seen = HashSet::with_capacity(cap);
            let mut attempts = 0;
            while seen.len() < cap && attempts < cap * 8 {
                let (i, j) = self.random_index_pair();
                seen.insert((i.min(j), i.max(j)));
                attempts += 1;
            }
            seen.into_iter().collect()
        };

        let window = self.window();
        let mut scores: Vec<Option<f64>> = vec![None; n];
        let mut score_of = |idx: usize, pool: &[GameRecord]| -> f64 {
            *scores[idx].get_or_insert_with(|| model.score(&pool[idx]))
        };

        let mut best: Option<((usize, usize), f64)> = None;
        for (i, j) in candidates {
            if window.contains(&pair_key(&self.pool[i], &self.pool[j])) {
                continue;
            }
            let diff = score_of(i, &self.pool) - score_of(j, &self.pool);
            let uncertainty = 1.0 - 2.0 * (sigmoid(diff) - 0.5).abs();
            if best.map_or(true, |(_, u)| uncertainty > u) {
                best = Some(((i, j), uncertainty));
            }
        }

        match best {
            Some(((i, j), uncertainty)) if uncertainty >= self.config.min_uncertainty => {
                debug!(
                    "uncertainty pick: {} vs {} (u={:.3})",
                    self.pool[i].app_id, self.pool[j].app_id, uncertainty
                );
                Some(self.make_pair(i, j))
            }
            _ => None,
        }
    }

    /// Two distinct random pool indices.
    fn random_index_pair(&mut self) -> (usize, usize) {
        let n = self.pool.len();
        let i = self.rng.gen_range(0..n);
        let mut j = self.rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        (i, j)
    }

    fn make_pair(&self, i: usize, j: usize) -> GamePair {
        GamePair {
            left: self.pool[i].clone(),
            right: self.pool[j].clone(),
        }
    }
}

impl Default for PairSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// All unordered index pairs `(i, j)` with `i < j`.
fn all_index_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i + 1..n).map(move |j| (i, j)))
}

#[cfg(test)]
mod tests {
    use crate::dictionary::TagDictionary;

    use super::*;

    fn pool(n: u64) -> Vec<GameRecord> {
        (1..=n)
            .map(|id| GameRecord::new(id, format!("game-{id}"), &[("FPS", id as u32 * 10)]))
            .collect()
    }

    fn model_for(games: &[GameRecord]) -> PreferenceModel {
        let mut model = PreferenceModel::new();
        model.initialize(TagDictionary::from_catalog(games));
        model
    }

    #[test]
    fn test_no_pair_from_undersized_pool() {
        let games = pool(1);
        let model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(1);
        selector.initialize_with_games(games);

        assert!(!selector.has_more_pairs());
        assert!(selector.next_pair(&model).is_none());
    }

    #[test]
    fn test_no_pair_once_target_reached() {
        let games = pool(4);
        let mut model = model_for(&games);

        let mut selector = PairSelector::with_config(SelectorConfig {
            target_comparisons: 2,
            ..SelectorConfig::default()
        })
        .with_seed(2);
        selector.initialize_with_games(games.clone());

        for _ in 0..2 {
            let pair = selector.next_pair(&model).unwrap();
            selector
                .record_choice(&mut model, &pair.left, &pair.right, PickSide::Left)
                .unwrap();
        }

        assert!(!selector.has_more_pairs());
        assert!(selector.next_pair(&model).is_none());
        assert_eq!(selector.progress(), ProgressInfo { current: 2, total: 2 });
    }

    #[test]
    fn test_skip_advances_progress_but_not_model() {
        let games = pool(3);
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(3);
        selector.initialize_with_games(games.clone());

        selector
            .record_choice(&mut model, &games[0], &games[1], PickSide::Skip)
            .unwrap();

        assert_eq!(selector.progress().current, 1);
        assert_eq!(model.comparison_count(), 0);
        assert_eq!(selector.choice_history()[0].pick, PickSide::Skip);
    }

    #[test]
    fn test_right_pick_trains_toward_right_game() {
        let shooter = GameRecord::new(1, "shooter", &[("FPS", 1000)]);
        let moba = GameRecord::new(2, "moba", &[("MOBA", 1000)]);
        let games = vec![shooter.clone(), moba.clone()];
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(4);
        selector.initialize_with_games(games);

        for _ in 0..5 {
            selector
                .record_choice(&mut model, &shooter, &moba, PickSide::Right)
                .unwrap();
        }

        assert_eq!(model.comparison_count(), 5);
        assert!(model.score(&moba) > model.score(&shooter));
    }

    #[test]
    fn test_diversity_window_avoids_recent_pairs() {
        let games = pool(6); // 15 possible pairs, window of 5
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(5);
        selector.initialize_with_games(games);

        let mut recent: Vec<(u64, u64)> = Vec::new();
        for _ in 0..10 {
            let pair = selector.next_pair(&model).unwrap();
            let key = pair_key(&pair.left, &pair.right);

            // 15 candidate pairs and at most 5 in the window, so an
            // eligible pair always exists and must be chosen.
            assert!(
                !recent.contains(&key),
                "pair {key:?} repeats inside the diversity window"
            );

            selector
                .record_choice(&mut model, &pair.left, &pair.right, PickSide::Skip)
                .unwrap();
            recent.push(key);
            if recent.len() > 5 {
                recent.remove(0);
            }
        }
    }

    #[test]
    fn test_window_exhaustion_falls_back_to_random() {
        // 3 games = 3 possible pairs, all inside a window of 5 after
        // three choices. Selection must still produce a pair.
        let games = pool(3);
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(6);
        selector.initialize_with_games(games);

        for _ in 0..6 {
            let pair = selector.next_pair(&model).expect("fallback must yield a pair");
            selector
                .record_choice(&mut model, &pair.left, &pair.right, PickSide::Skip)
                .unwrap();
        }
    }

    #[test]
    fn test_uncertainty_phase_yields_pairs_after_bootstrap() {
        let games = pool(8);
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(7);
        selector.initialize_with_games(games);

        // Walk well past the bootstrap phase.
        for step in 0..10 {
            let pair = selector.next_pair(&model).unwrap();
            assert_ne!(pair.left.app_id, pair.right.app_id, "step {step}");
            selector
                .record_choice(&mut model, &pair.left, &pair.right, PickSide::Left)
                .unwrap();
        }
        assert_eq!(selector.progress().current, 10);
    }

    #[test]
    fn test_reset_progress_clears_history_and_model() {
        let games = pool(4);
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(8);
        selector.initialize_with_games(games.clone());

        selector
            .record_choice(&mut model, &games[0], &games[1], PickSide::Left)
            .unwrap();
        assert_eq!(model.comparison_count(), 1);

        selector.reset_progress(&mut model);
        assert_eq!(selector.progress().current, 0);
        assert_eq!(model.comparison_count(), 0);
        assert!(selector.choice_history().is_empty());
    }

    #[test]
    fn test_history_snapshot_is_a_copy() {
        let games = pool(3);
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(9);
        selector.initialize_with_games(games.clone());
        selector
            .record_choice(&mut model, &games[0], &games[1], PickSide::Skip)
            .unwrap();

        let mut snapshot = selector.choice_history();
        snapshot.clear();
        assert_eq!(selector.choice_history().len(), 1);
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let games = pool(10);
        let model = model_for(&games);

        let mut a = PairSelector::new().with_seed(42);
        a.initialize_with_games(games.clone());
        let mut b = PairSelector::new().with_seed(42);
        b.initialize_with_games(games);

        let pa = a.next_pair(&model).unwrap();
        let pb = b.next_pair(&model).unwrap();
        assert_eq!(pair_key(&pa.left, &pa.right), pair_key(&pb.left, &pb.right));
    }

    #[test]
    fn test_initialize_with_games_clears_history() {
        let games = pool(3);
        let mut model = model_for(&games);

        let mut selector = PairSelector::new().with_seed(10);
        selector.initialize_with_games(games.clone());
        selector
            .record_choice(&mut model, &games[0], &games[1], PickSide::Skip)
            .unwrap();

        selector.initialize_with_games(pool(5));
        assert_eq!(selector.progress().current, 0);
    }
}
