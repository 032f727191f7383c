//! tasterank - pairwise preference learning for game discovery.
//!
//! A user repeatedly picks the game they prefer from a pair; an online
//! linear model learns tag-level preferences from each pick and
//! re-ranks the whole catalog after every choice.
//!
//! # Architecture
//!
//! ```text
//! Catalog → TagDictionary → vectorize → PreferenceModel ⇄ PairSelector
//!    ↓           ↓              ↓            ↓                 ↓
//!  serde      bijection     ln(1+votes)  logistic SGD    uncertainty
//!  records    name↔index    sparse vec   + ranking       sampling
//! ```
//!
//! - [`dictionary::TagDictionary`] fixes the tag-name ↔ feature-index
//!   mapping and the model's dimensionality for a session.
//! - [`vector::vectorize`] turns a game's tag votes into a sparse
//!   feature vector.
//! - [`model::PreferenceModel`] learns a weight vector via pairwise
//!   logistic (Bradley-Terry) updates and ranks arbitrary collections.
//! - [`selector::PairSelector`] picks the next comparison by
//!   uncertainty sampling under a diversity window and records choices.
//!
//! The engine is single-threaded and fully synchronous. It owns no
//! persistence medium and no network; those belong to collaborators
//! that consume [`state::UserPreferenceState`] snapshots and ranked
//! output.

pub mod dictionary;
pub mod error;
pub mod model;
pub mod selector;
pub mod state;
pub mod types;
pub mod vector;

pub use dictionary::TagDictionary;
pub use error::TasteError;
pub use model::{ChangeListener, PreferenceModel};
pub use selector::PairSelector;
pub use state::UserPreferenceState;
pub use types::{
    ChoiceRecord, GamePair, GameRecommendation, GameRecord, ModelConfig, PickSide,
    PreferenceSummary, ProgressInfo, SelectorConfig, TagWeight,
};
pub use vector::{SparseVector, vectorize};
