//! Roommate Match - compatibility scoring for student housing matchmaking
//!
//! This library scores how well two users' roommate preferences fit together.
//! Rule-based similarities for cleanliness, noise tolerance, study schedule and
//! budget are always computed; when a trained predictor is available its
//! estimate is blended in, otherwise the rules are renormalized on their own.

pub mod config;
pub mod core;
pub mod models;

// Re-export commonly used types
pub use self::core::{Matcher, PredictorState, Scorer, SharedScorer};
pub use models::{PreferenceRecord, CompatibilityResult, ScoreBreakdown, ScoringMode, FeatureVector, ScoringWeights};
