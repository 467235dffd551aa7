// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    PreferenceRecord, FeatureVector, FEATURE_COUNT, CompatibilityResult, ScoreBreakdown, ScoringMode,
    Dimension, LearnedWeights, FallbackWeights, ScoringWeights,
};
pub use requests::{RankRequest, Candidate};
pub use responses::{RankResponse, RankedMatch, ErrorResponse};
