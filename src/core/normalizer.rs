use crate::models::{FeatureVector, PreferenceRecord, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CLEANLINESS: f64 = 3.0;
pub const DEFAULT_NOISE_LEVEL: f64 = 50.0;
pub const DEFAULT_BUDGET: f64 = 1000.0;

/// Code for "afternoon", also used for missing or unrecognized habits
pub const DEFAULT_STUDY_HABITS_CODE: f64 = 1.0;

/// Encode a study habit category, case-insensitively
///
/// morning = 0, afternoon = 1, night = 2; anything else encodes as afternoon.
#[inline]
pub fn encode_study_habits(habits: Option<&str>) -> f64 {
    match habits.map(|h| h.trim().to_lowercase()).as_deref() {
        Some("morning") => 0.0,
        Some("afternoon") => 1.0,
        Some("night") => 2.0,
        _ => DEFAULT_STUDY_HABITS_CODE,
    }
}

/// Encode a record into its raw (unscaled) feature vector
///
/// Missing fields take their neutral defaults so the vector is always complete.
pub fn encode(record: &PreferenceRecord) -> FeatureVector {
    FeatureVector([
        record.cleanliness.map(f64::from).unwrap_or(DEFAULT_CLEANLINESS),
        record.noise_level.unwrap_or(DEFAULT_NOISE_LEVEL),
        record.budget.unwrap_or(DEFAULT_BUDGET),
        encode_study_habits(record.study_habits.as_deref()),
    ])
}

/// Fitted standardization transform: `(x - mean) / scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: [f64; FEATURE_COUNT],
    pub scale: [f64; FEATURE_COUNT],
}

impl FeatureScaler {
    pub fn new(mean: [f64; FEATURE_COUNT], scale: [f64; FEATURE_COUNT]) -> Self {
        Self { mean, scale }
    }

    /// Pass-through transform
    pub fn identity() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }

    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut scaled = [0.0; FEATURE_COUNT];
        for (i, value) in features.values().iter().enumerate() {
            // Constant features were fitted with a zero scale
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            scaled[i] = (value - self.mean[i]) / scale;
        }
        FeatureVector(scaled)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.mean.iter().chain(self.scale.iter()).all(|v| v.is_finite())
    }
}

/// Turns preference records into predictor-ready feature vectors
#[derive(Debug, Clone)]
pub struct Normalizer {
    scaler: Option<FeatureScaler>,
}

impl Normalizer {
    /// Normalizer that only encodes, without scaling
    pub fn unscaled() -> Self {
        Self { scaler: None }
    }

    pub fn with_scaler(scaler: FeatureScaler) -> Self {
        Self {
            scaler: Some(scaler),
        }
    }

    /// Encode a record and apply the fitted scaling, if any. Never fails.
    pub fn normalize(&self, record: &PreferenceRecord) -> FeatureVector {
        let raw = encode(record);
        match &self.scaler {
            Some(scaler) => scaler.transform(&raw),
            None => raw,
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::unscaled()
    }
}
