use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{FallbackWeights, LearnedWeights, ScoringWeights};
use tracing::warn;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Where to find the trained predictor and its feature scaler
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_predictor_path")]
    pub predictor_path: String,
    #[serde(default = "default_scaler_path")]
    pub scaler_path: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            predictor_path: default_predictor_path(),
            scaler_path: default_scaler_path(),
        }
    }
}

fn default_true() -> bool { true }
fn default_predictor_path() -> String { "models/roommate_matching_model.json".to_string() }
fn default_scaler_path() -> String { "models/feature_scaler.json".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub learned_weights: LearnedWeightsConfig,
    #[serde(default)]
    pub fallback_weights: FallbackWeightsConfig,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            learned_weights: LearnedWeightsConfig::default(),
            fallback_weights: FallbackWeightsConfig::default(),
            min_score: default_min_score(),
            default_limit: default_limit(),
        }
    }
}

impl ScoringSettings {
    /// Weight tables from configuration; questionable values are logged, not rejected
    pub fn weights(&self) -> ScoringWeights {
        let learned = &self.learned_weights;
        let fallback = &self.fallback_weights;
        let weights = ScoringWeights {
            learned: LearnedWeights {
                ml: learned.ml,
                cleanliness: learned.cleanliness,
                noise: learned.noise,
                schedule: learned.schedule,
                budget: learned.budget,
            },
            fallback: FallbackWeights {
                cleanliness: fallback.cleanliness,
                noise_level: fallback.noise_level,
                study_habits: fallback.study_habits,
                budget: fallback.budget,
                sleep_schedule: fallback.sleep_schedule,
                social_level: fallback.social_level,
            },
        };

        for problem in weights.problems() {
            warn!("Suspicious scoring weights: {}", problem);
        }

        weights
    }
}

fn default_min_score() -> f64 { 0.3 }
fn default_limit() -> usize { 50 }

#[derive(Debug, Clone, Deserialize)]
pub struct LearnedWeightsConfig {
    #[serde(default = "default_ml_weight")]
    pub ml: f64,
    #[serde(default = "default_learned_cleanliness_weight")]
    pub cleanliness: f64,
    #[serde(default = "default_learned_noise_weight")]
    pub noise: f64,
    #[serde(default = "default_learned_schedule_weight")]
    pub schedule: f64,
    #[serde(default = "default_learned_budget_weight")]
    pub budget: f64,
}

impl Default for LearnedWeightsConfig {
    fn default() -> Self {
        Self {
            ml: default_ml_weight(),
            cleanliness: default_learned_cleanliness_weight(),
            noise: default_learned_noise_weight(),
            schedule: default_learned_schedule_weight(),
            budget: default_learned_budget_weight(),
        }
    }
}

fn default_ml_weight() -> f64 { 0.4 }
fn default_learned_cleanliness_weight() -> f64 { 0.2 }
fn default_learned_noise_weight() -> f64 { 0.2 }
fn default_learned_schedule_weight() -> f64 { 0.1 }
fn default_learned_budget_weight() -> f64 { 0.1 }

#[derive(Debug, Clone, Deserialize)]
pub struct FallbackWeightsConfig {
    #[serde(default = "default_cleanliness_weight")]
    pub cleanliness: f64,
    #[serde(default = "default_noise_level_weight")]
    pub noise_level: f64,
    #[serde(default = "default_study_habits_weight")]
    pub study_habits: f64,
    #[serde(default = "default_budget_weight")]
    pub budget: f64,
    #[serde(default = "default_sleep_schedule_weight")]
    pub sleep_schedule: f64,
    #[serde(default = "default_social_level_weight")]
    pub social_level: f64,
}

impl Default for FallbackWeightsConfig {
    fn default() -> Self {
        Self {
            cleanliness: default_cleanliness_weight(),
            noise_level: default_noise_level_weight(),
            study_habits: default_study_habits_weight(),
            budget: default_budget_weight(),
            sleep_schedule: default_sleep_schedule_weight(),
            social_level: default_social_level_weight(),
        }
    }
}

fn default_cleanliness_weight() -> f64 { 0.25 }
fn default_noise_level_weight() -> f64 { 0.20 }
fn default_study_habits_weight() -> f64 { 0.15 }
fn default_budget_weight() -> f64 { 0.10 }
fn default_sleep_schedule_weight() -> f64 { 0.15 }
fn default_social_level_weight() -> f64 { 0.15 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ROOMMATE_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., ROOMMATE__MODEL__PREDICTOR_PATH -> model.predictor_path
            .add_source(
                Environment::with_prefix("ROOMMATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("ROOMMATE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
