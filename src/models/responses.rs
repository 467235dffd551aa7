use serde::{Deserialize, Serialize};
use crate::models::domain::{CompatibilityResult, ScoringMode};

/// A candidate that passed the score threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMatch {
    pub id: String,
    #[serde(flatten)]
    pub compatibility: CompatibilityResult,
}

/// Response written by the batch ranking tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    pub matches: Vec<RankedMatch>,
    pub total_candidates: usize,
    pub skipped: usize,
    pub mode: ScoringMode,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
