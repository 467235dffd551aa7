use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Number of features produced per preference record
pub const FEATURE_COUNT: usize = 4;

const CLEANLINESS: &str = "cleanliness";
const NOISE_LEVEL: &str = "noiseLevel";
const STUDY_HABITS: &str = "studyHabits";
const BUDGET: &str = "budget";
const SOCIAL_LEVEL: &str = "socialLevel";
const WAKE_UP_TIME: &str = "wakeUpTime";
const SLEEP_TIME: &str = "sleepTime";

/// Sub-objects the mobile client nests preferences under
const NESTED_SECTIONS: [&str; 2] = ["lifestyle", "location"];

/// Roommate preferences for one user
///
/// Every field is optional: an absent field means "unknown" and is scored
/// with a neutral default, never as zero. Parsing is lenient: a value of the
/// wrong type or outside its domain is dropped instead of failing the record.
/// Keys outside the known vocabulary are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceRecord {
    /// Tidiness preference, 1 (relaxed) to 5 (very clean)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanliness: Option<u8>,
    /// Noise tolerance as a percentage, 0 (quiet) to 100 (loud)
    #[serde(rename = "noiseLevel", skip_serializing_if = "Option::is_none")]
    pub noise_level: Option<f64>,
    /// Free-form study schedule category, e.g. "morning" or "night"
    #[serde(rename = "studyHabits", skip_serializing_if = "Option::is_none")]
    pub study_habits: Option<String>,
    /// Monthly budget, in whatever currency the caller uses for the pair
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(rename = "socialLevel", skip_serializing_if = "Option::is_none")]
    pub social_level: Option<String>,
    #[serde(rename = "wakeUpTime", skip_serializing_if = "Option::is_none")]
    pub wake_up_time: Option<String>,
    #[serde(rename = "sleepTime", skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<String>,
    /// Keys outside the known vocabulary, passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PreferenceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from loosely-typed JSON
    ///
    /// Accepts both the flat shape (`{"cleanliness": 4, ...}`) and the nested
    /// shape with `lifestyle` / `location` sub-objects. Nested values are read
    /// first and flat keys override them. Anything that is not a JSON object
    /// yields the empty record.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let mut record = Self::default();

        for section in NESTED_SECTIONS {
            if let Some(Value::Object(nested)) = object.get(section) {
                record.absorb_known(nested);
            }
        }

        record.absorb_known(object);

        for (key, value) in object {
            if !is_known_key(key) {
                record.extra.insert(key.clone(), value.clone());
            }
        }

        record
    }

    /// True when the record carries no data at all
    pub fn is_empty(&self) -> bool {
        self.cleanliness.is_none()
            && self.noise_level.is_none()
            && self.study_habits.is_none()
            && self.budget.is_none()
            && self.social_level.is_none()
            && self.wake_up_time.is_none()
            && self.sleep_time.is_none()
            && self.extra.is_empty()
    }

    pub fn with_cleanliness(mut self, level: u8) -> Self {
        self.cleanliness = Some(level);
        self
    }

    pub fn with_noise_level(mut self, level: f64) -> Self {
        self.noise_level = Some(level);
        self
    }

    pub fn with_study_habits(mut self, habits: impl Into<String>) -> Self {
        self.study_habits = Some(habits.into());
        self
    }

    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    fn absorb_known(&mut self, fields: &Map<String, Value>) {
        if let Some(level) = fields.get(CLEANLINESS).and_then(parse_cleanliness) {
            self.cleanliness = Some(level);
        }
        if let Some(level) = fields.get(NOISE_LEVEL).and_then(parse_noise_level) {
            self.noise_level = Some(level);
        }
        if let Some(habits) = fields.get(STUDY_HABITS).and_then(parse_text) {
            self.study_habits = Some(habits);
        }
        if let Some(budget) = fields.get(BUDGET).and_then(parse_budget) {
            self.budget = Some(budget);
        }
        if let Some(level) = fields.get(SOCIAL_LEVEL).and_then(parse_text) {
            self.social_level = Some(level);
        }
        if let Some(time) = fields.get(WAKE_UP_TIME).and_then(parse_text) {
            self.wake_up_time = Some(time);
        }
        if let Some(time) = fields.get(SLEEP_TIME).and_then(parse_text) {
            self.sleep_time = Some(time);
        }
    }
}

impl<'de> Deserialize<'de> for PreferenceRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        CLEANLINESS | NOISE_LEVEL | STUDY_HABITS | BUDGET | SOCIAL_LEVEL | WAKE_UP_TIME | SLEEP_TIME
    )
}

/// Read a finite number, accepting numeric strings
fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn parse_cleanliness(value: &Value) -> Option<u8> {
    let level = parse_number(value)?;
    if level.fract() != 0.0 || !(1.0..=5.0).contains(&level) {
        return None;
    }
    Some(level as u8)
}

fn parse_noise_level(value: &Value) -> Option<f64> {
    parse_number(value).filter(|level| (0.0..=100.0).contains(level))
}

fn parse_budget(value: &Value) -> Option<f64> {
    parse_number(value).filter(|budget| *budget >= 0.0)
}

fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

/// Fixed-order numeric encoding of a preference record:
/// `[cleanliness, noiseLevel, budget, studyHabitsCode]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector(pub [f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }
}

/// Which aggregation produced a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Learned estimate blended with rule similarities
    Learned,
    /// Rule similarities only
    Fallback,
}

/// Per-dimension values behind a compatibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ml_score: Option<f64>,
    pub cleanliness_match: f64,
    pub noise_match: f64,
    pub schedule_match: f64,
    pub budget_match: f64,
}

impl ScoreBreakdown {
    /// Labeled values in display order, `ml_score` first when present
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut entries = Vec::with_capacity(5);
        if let Some(ml_score) = self.ml_score {
            entries.push(("ml_score", ml_score));
        }
        entries.push(("cleanliness_match", self.cleanliness_match));
        entries.push(("noise_match", self.noise_match));
        entries.push(("schedule_match", self.schedule_match));
        entries.push(("budget_match", self.budget_match));
        entries
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(label, _)| *label == name)
            .map(|(_, value)| value)
    }
}

/// Compatibility of an ordered pair of preference records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    total_score: f64,
    breakdown: ScoreBreakdown,
    mode: ScoringMode,
}

impl CompatibilityResult {
    pub(crate) fn new(total_score: f64, breakdown: ScoreBreakdown, mode: ScoringMode) -> Self {
        Self {
            total_score,
            breakdown,
            mode,
        }
    }

    /// Nominally in [0, 1]; the learned term is not clamped
    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }
}

/// Dimensions of the rule-based weight tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Cleanliness,
    NoiseLevel,
    StudyHabits,
    Budget,
    SleepSchedule,
    SocialLevel,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Cleanliness,
        Dimension::NoiseLevel,
        Dimension::StudyHabits,
        Dimension::Budget,
        Dimension::SleepSchedule,
        Dimension::SocialLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Cleanliness => "cleanliness",
            Dimension::NoiseLevel => "noiseLevel",
            Dimension::StudyHabits => "studyHabits",
            Dimension::Budget => "budget",
            Dimension::SleepSchedule => "sleepSchedule",
            Dimension::SocialLevel => "socialLevel",
        }
    }
}

/// Weights used when a learned predictor is available
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnedWeights {
    pub ml: f64,
    pub cleanliness: f64,
    pub noise: f64,
    pub schedule: f64,
    pub budget: f64,
}

impl Default for LearnedWeights {
    fn default() -> Self {
        Self {
            ml: 0.4,
            cleanliness: 0.2,
            noise: 0.2,
            schedule: 0.1,
            budget: 0.1,
        }
    }
}

/// Weights used in fallback mode
///
/// `sleep_schedule` and `social_level` are reserved: no similarity function
/// exists for them, so they never contribute and are dropped by
/// renormalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackWeights {
    pub cleanliness: f64,
    pub noise_level: f64,
    pub study_habits: f64,
    pub budget: f64,
    pub sleep_schedule: f64,
    pub social_level: f64,
}

impl FallbackWeights {
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Cleanliness => self.cleanliness,
            Dimension::NoiseLevel => self.noise_level,
            Dimension::StudyHabits => self.study_habits,
            Dimension::Budget => self.budget,
            Dimension::SleepSchedule => self.sleep_schedule,
            Dimension::SocialLevel => self.social_level,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }
}

impl Default for FallbackWeights {
    fn default() -> Self {
        Self {
            cleanliness: 0.25,
            noise_level: 0.20,
            study_habits: 0.15,
            budget: 0.10,
            sleep_schedule: 0.15,
            social_level: 0.15,
        }
    }
}

/// Scoring weights for both modes
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoringWeights {
    pub learned: LearnedWeights,
    pub fallback: FallbackWeights,
}

impl LearnedWeights {
    pub fn sum(&self) -> f64 {
        self.ml + self.cleanliness + self.noise + self.schedule + self.budget
    }

    fn values(&self) -> [(&'static str, f64); 5] {
        [
            ("ml", self.ml),
            ("cleanliness", self.cleanliness),
            ("noise", self.noise),
            ("schedule", self.schedule),
            ("budget", self.budget),
        ]
    }
}

impl ScoringWeights {
    /// Describe weights that make totals meaningless; empty when sane
    ///
    /// Weights must be finite and non-negative, and the learned blend must sum
    /// to 1. Fallback weights are renormalized so their sum is free.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (name, weight) in self.learned.values() {
            if !weight.is_finite() || weight < 0.0 {
                problems.push(format!("learned weight {} is {}", name, weight));
            }
        }
        for dimension in Dimension::ALL {
            let weight = self.fallback.weight(dimension);
            if !weight.is_finite() || weight < 0.0 {
                problems.push(format!("fallback weight {} is {}", dimension.as_str(), weight));
            }
        }

        let learned_sum = self.learned.sum();
        if learned_sum.is_finite() && (learned_sum - 1.0).abs() > 1e-6 {
            problems.push(format!("learned weights sum to {}, expected 1", learned_sum));
        }

        problems
    }
}
