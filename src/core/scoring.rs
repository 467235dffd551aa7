use crate::core::normalizer::Normalizer;
use crate::core::predictor::{LearnedModel, PredictorState};
use crate::core::similarity::{budget_match, cleanliness_match, noise_match, schedule_match};
use crate::models::{
    CompatibilityResult, Dimension, FallbackWeights, FeatureVector, LearnedWeights, PreferenceRecord,
    ScoreBreakdown, ScoringMode, ScoringWeights,
};
use std::sync::{Arc, OnceLock};
use tracing::{info, trace, warn};

/// Total used when no dimension carries any weight
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Rule similarity of one dimension, with whether both sides were known
#[derive(Debug, Clone, Copy)]
struct DimensionScore {
    dimension: Dimension,
    value: f64,
    observed: bool,
}

/// Compatibility scorer for ordered pairs of preference records
///
/// Holds the predictor state decided at construction and nothing else, so a
/// single instance can be shared by any number of concurrent callers.
///
/// Scoring formula with a learned predictor:
/// total = (
///     ml_score * 0.4 +
///     cleanliness_match * 0.2 +
///     noise_match * 0.2 +
///     schedule_match * 0.1 +
///     budget_match * 0.1
/// )
///
/// Without one, only dimensions known on both sides contribute, weighted by
/// the fallback table and divided by the sum of the weights that contributed.
#[derive(Debug, Clone)]
pub struct Scorer {
    state: PredictorState,
    weights: ScoringWeights,
}

impl Scorer {
    pub fn new(state: PredictorState, weights: ScoringWeights) -> Self {
        match &state {
            PredictorState::Available(_) => info!("Scorer using learned predictor"),
            PredictorState::Unavailable(reason) => info!("Scorer in fallback mode: {}", reason),
        }
        Self { state, weights }
    }

    /// Rule-based scorer with default weights
    pub fn fallback() -> Self {
        Self::new(PredictorState::disabled(), ScoringWeights::default())
    }

    pub fn mode(&self) -> ScoringMode {
        if self.state.is_available() {
            ScoringMode::Learned
        } else {
            ScoringMode::Fallback
        }
    }

    /// Feature vector the predictor would receive for `record`
    pub fn normalize(&self, record: &PreferenceRecord) -> FeatureVector {
        match &self.state {
            PredictorState::Available(model) => model.normalizer().normalize(record),
            PredictorState::Unavailable(_) => Normalizer::unscaled().normalize(record),
        }
    }

    /// Score `user` against `other`. Never fails.
    ///
    /// The learned path feeds the pair to the predictor in this order, so
    /// `score(a, b)` and `score(b, a)` may differ.
    pub fn score(&self, user: &PreferenceRecord, other: &PreferenceRecord) -> CompatibilityResult {
        let dimensions = rule_similarities(user, other);

        let ml_score = match &self.state {
            PredictorState::Available(model) => learned_estimate(model, user, other),
            PredictorState::Unavailable(_) => None,
        };

        let breakdown = ScoreBreakdown {
            ml_score,
            cleanliness_match: dimensions[0].value,
            noise_match: dimensions[1].value,
            schedule_match: dimensions[2].value,
            budget_match: dimensions[3].value,
        };

        let result = match ml_score {
            Some(ml_score) => CompatibilityResult::new(
                learned_total(ml_score, &breakdown, &self.weights.learned),
                breakdown,
                ScoringMode::Learned,
            ),
            None => CompatibilityResult::new(
                fallback_total(&dimensions, &self.weights.fallback),
                breakdown,
                ScoringMode::Fallback,
            ),
        };

        trace!(
            "Scored pair: total={:.4} mode={:?}",
            result.total_score(),
            result.mode()
        );

        result
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::fallback()
    }
}

fn rule_similarities(user: &PreferenceRecord, other: &PreferenceRecord) -> [DimensionScore; 4] {
    [
        DimensionScore {
            dimension: Dimension::Cleanliness,
            value: cleanliness_match(user.cleanliness, other.cleanliness),
            observed: user.cleanliness.is_some() && other.cleanliness.is_some(),
        },
        DimensionScore {
            dimension: Dimension::NoiseLevel,
            value: noise_match(user.noise_level, other.noise_level),
            observed: user.noise_level.is_some() && other.noise_level.is_some(),
        },
        DimensionScore {
            dimension: Dimension::StudyHabits,
            value: schedule_match(user.study_habits.as_deref(), other.study_habits.as_deref()),
            observed: user.study_habits.is_some() && other.study_habits.is_some(),
        },
        DimensionScore {
            dimension: Dimension::Budget,
            value: budget_match(user.budget, other.budget),
            observed: user.budget.is_some() && other.budget.is_some(),
        },
    ]
}

fn learned_estimate(model: &LearnedModel, user: &PreferenceRecord, other: &PreferenceRecord) -> Option<f64> {
    let user_features = model.normalizer().normalize(user);
    let other_features = model.normalizer().normalize(other);
    let estimate = model.predict(&user_features, &other_features);

    if estimate.is_finite() {
        Some(estimate)
    } else {
        warn!("Predictor returned a non-finite estimate, scoring pair with rules only");
        None
    }
}

fn learned_total(ml_score: f64, breakdown: &ScoreBreakdown, weights: &LearnedWeights) -> f64 {
    weights.ml * ml_score
        + weights.cleanliness * breakdown.cleanliness_match
        + weights.noise * breakdown.noise_match
        + weights.schedule * breakdown.schedule_match
        + weights.budget * breakdown.budget_match
}

/// Weighted average over the dimensions known on both sides
fn fallback_total(dimensions: &[DimensionScore], weights: &FallbackWeights) -> f64 {
    let (weighted_sum, weight_sum) = dimensions
        .iter()
        .filter(|d| d.observed)
        .fold((0.0, 0.0), |(sum, total), d| {
            let weight = weights.weight(d.dimension);
            trace!("Fallback dimension {}: {:.4} x {}", d.dimension.as_str(), d.value, weight);
            (sum + weight * d.value, total + weight)
        });

    if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        NEUTRAL_SCORE
    }
}

/// Lazily-built scorer shared by all callers
///
/// The first caller runs the loader; concurrent first callers block until it
/// finishes and everyone receives the same instance.
#[derive(Debug, Default)]
pub struct SharedScorer {
    cell: OnceLock<Arc<Scorer>>,
}

impl SharedScorer {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn get_or_init<F>(&self, load: F) -> Arc<Scorer>
    where
        F: FnOnce() -> Scorer,
    {
        Arc::clone(self.cell.get_or_init(|| Arc::new(load())))
    }

    pub fn get(&self) -> Option<Arc<Scorer>> {
        self.cell.get().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalizer::FeatureScaler;
    use crate::core::predictor::CompatibilityPredictor;

    #[derive(Debug)]
    struct FixedPredictor(f64);

    impl CompatibilityPredictor for FixedPredictor {
        fn predict(&self, _user: &FeatureVector, _other: &FeatureVector) -> f64 {
            self.0
        }
    }

    fn learned_scorer(ml_score: f64) -> Scorer {
        Scorer::new(
            PredictorState::available(Arc::new(FixedPredictor(ml_score)), FeatureScaler::identity()),
            ScoringWeights::default(),
        )
    }

    fn full_record(cleanliness: u8, noise: f64, habits: &str, budget: f64) -> PreferenceRecord {
        PreferenceRecord::new()
            .with_cleanliness(cleanliness)
            .with_noise_level(noise)
            .with_study_habits(habits)
            .with_budget(budget)
    }

    #[test]
    fn test_learned_formula() {
        let scorer = learned_scorer(0.8);
        let user = full_record(4, 30.0, "night", 1000.0);
        let other = full_record(3, 50.0, "morning", 1500.0);

        let result = scorer.score(&user, &other);
        let expected = 0.4 * 0.8 + 0.2 * 0.75 + 0.2 * 0.8 + 0.1 * 0.3 + 0.1 * 0.5;

        assert_eq!(result.mode(), ScoringMode::Learned);
        assert!((result.total_score() - expected).abs() < 1e-12);
        assert_eq!(result.breakdown().ml_score, Some(0.8));
    }

    #[test]
    fn test_learned_mode_uses_neutral_defaults() {
        let scorer = learned_scorer(0.8);
        let result = scorer.score(&PreferenceRecord::new(), &PreferenceRecord::new());
        let expected = 0.4 * 0.8 + 0.6 * 0.5;
        assert!((result.total_score() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fallback_scenario() {
        let scorer = Scorer::fallback();
        let user = full_record(5, 20.0, "night", 800.0);
        let other = full_record(1, 80.0, "morning", 1800.0);

        let result = scorer.score(&user, &other);
        let breakdown = result.breakdown();

        assert_eq!(result.mode(), ScoringMode::Fallback);
        assert_eq!(breakdown.ml_score, None);
        assert_eq!(breakdown.cleanliness_match, 0.0);
        assert!((breakdown.noise_match - 0.4).abs() < 1e-12);
        assert_eq!(breakdown.schedule_match, 0.3);
        assert_eq!(breakdown.budget_match, 0.0);

        let expected = (0.25 * 0.0 + 0.20 * 0.4 + 0.15 * 0.3 + 0.10 * 0.0) / 0.70;
        assert!((result.total_score() - expected).abs() < 1e-9);
        assert!((result.total_score() - 0.1786).abs() < 1e-4);
    }

    #[test]
    fn test_fallback_renormalizes_over_known_dimensions() {
        let scorer = Scorer::fallback();
        let user = PreferenceRecord::new().with_cleanliness(4).with_budget(1000.0);
        let other = PreferenceRecord::new().with_cleanliness(3).with_budget(1500.0);

        let result = scorer.score(&user, &other);
        let expected = (0.25 * 0.75 + 0.10 * 0.5) / 0.35;

        assert!((result.total_score() - expected).abs() < 1e-12);
        // Unknown dimensions still show the neutral value
        assert_eq!(result.breakdown().noise_match, 0.5);
        assert_eq!(result.breakdown().schedule_match, 0.5);
    }

    #[test]
    fn test_empty_records_are_neutral() {
        let result = Scorer::fallback().score(&PreferenceRecord::new(), &PreferenceRecord::new());

        assert_eq!(result.total_score(), 0.5);
        for (_, value) in result.breakdown().entries() {
            assert_eq!(value, 0.5);
        }
    }

    #[test]
    fn test_one_sided_records_are_neutral() {
        let user = full_record(5, 10.0, "night", 700.0);
        let result = Scorer::fallback().score(&user, &PreferenceRecord::new());
        assert_eq!(result.total_score(), 0.5);
    }

    #[test]
    fn test_non_finite_estimate_falls_back() {
        let scorer = learned_scorer(f64::NAN);
        let user = full_record(5, 20.0, "night", 800.0);
        let other = full_record(5, 20.0, "night", 800.0);

        let result = scorer.score(&user, &other);
        assert_eq!(result.mode(), ScoringMode::Fallback);
        assert_eq!(result.total_score(), 1.0);
    }

    #[test]
    fn test_score_is_idempotent() {
        let scorer = learned_scorer(0.63);
        let user = full_record(2, 45.0, "afternoon", 1200.0);
        let other = full_record(4, 70.0, "Afternoon", 950.0);

        let first = scorer.score(&user, &other);
        let second = scorer.score(&user, &other);
        assert_eq!(first.total_score().to_bits(), second.total_score().to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_normalize_uses_loaded_scaler() {
        let scaler = FeatureScaler::new([3.0, 50.0, 1000.0, 1.0], [2.0, 10.0, 100.0, 1.0]);
        let scorer = Scorer::new(
            PredictorState::available(Arc::new(FixedPredictor(0.5)), scaler),
            ScoringWeights::default(),
        );
        let features = scorer.normalize(&PreferenceRecord::new().with_cleanliness(5));
        assert_eq!(features.values(), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_shared_scorer_initializes_once() {
        let shared = SharedScorer::new();
        let calls = std::sync::atomic::AtomicUsize::new(0);

        let instances: Vec<Arc<Scorer>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        shared.get_or_init(|| {
                            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                            Scorer::fallback()
                        })
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
