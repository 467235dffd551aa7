use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::PreferenceRecord;

/// Request to rank candidates against a subject
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankRequest {
    #[serde(default)]
    pub subject: PreferenceRecord,
    #[validate(nested)]
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[validate(range(min = 1, max = 1000))]
    #[serde(default)]
    pub limit: Option<u32>,
}

/// A potential roommate and their preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Candidate {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", alias = "userId")]
    pub id: String,
    #[serde(default)]
    pub preferences: PreferenceRecord,
}

impl Candidate {
    pub fn new(id: impl Into<String>, preferences: PreferenceRecord) -> Self {
        Self {
            id: id.into(),
            preferences,
        }
    }
}
