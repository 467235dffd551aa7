// Core algorithm exports
pub mod matcher;
pub mod normalizer;
pub mod predictor;
pub mod scoring;
pub mod similarity;

pub use matcher::{Matcher, RankResult, DEFAULT_MIN_SCORE};
pub use normalizer::{encode, encode_study_habits, FeatureScaler, Normalizer};
pub use predictor::{
    load_network, load_scaler, Activation, ArtifactError, CompatibilityPredictor, DenseLayer, DenseNetwork,
    LearnedModel, PredictorState, UnavailableReason,
};
pub use scoring::{Scorer, SharedScorer, NEUTRAL_SCORE};
pub use similarity::{budget_match, cleanliness_match, noise_match, schedule_match, BUDGET_NORMALIZATION};
