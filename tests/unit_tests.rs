// Unit tests for Roommate Match

use roommate_match::core::{
    normalizer::{encode, encode_study_habits},
    similarity::{budget_match, cleanliness_match, noise_match, schedule_match},
    Scorer,
};
use roommate_match::models::{PreferenceRecord, ScoringMode};

fn record(cleanliness: u8, noise: f64, habits: &str, budget: f64) -> PreferenceRecord {
    PreferenceRecord::new()
        .with_cleanliness(cleanliness)
        .with_noise_level(noise)
        .with_study_habits(habits)
        .with_budget(budget)
}

#[test]
fn test_cleanliness_identical_levels() {
    for level in 1..=5 {
        assert_eq!(cleanliness_match(Some(level), Some(level)), 1.0);
    }
}

#[test]
fn test_cleanliness_extremes() {
    assert_eq!(cleanliness_match(Some(1), Some(5)), 0.0);
    assert_eq!(cleanliness_match(Some(5), Some(1)), 0.0);
}

#[test]
fn test_cleanliness_decreases_with_gap() {
    for u in 1..=5u8 {
        for o in 1..=5u8 {
            for p in 1..=5u8 {
                let gap_o = (i16::from(u) - i16::from(o)).abs();
                let gap_p = (i16::from(u) - i16::from(p)).abs();
                if gap_o < gap_p {
                    assert!(cleanliness_match(Some(u), Some(o)) > cleanliness_match(Some(u), Some(p)));
                }
            }
        }
    }
}

#[test]
fn test_missing_side_is_exactly_neutral() {
    assert_eq!(noise_match(None, Some(40.0)), 0.5);
    assert_eq!(noise_match(Some(40.0), None), 0.5);
    assert_eq!(budget_match(None, Some(40.0)), 0.5);
    assert_eq!(budget_match(Some(40.0), None), 0.5);
    assert_eq!(cleanliness_match(None, None), 0.5);
    assert_eq!(schedule_match(None, Some("night")), 0.5);
}

#[test]
fn test_schedule_case_insensitive() {
    assert_eq!(schedule_match(Some("Morning"), Some("morning")), 1.0);
    assert_eq!(schedule_match(Some("NIGHT"), Some("night")), 1.0);
    assert_eq!(schedule_match(Some("morning"), Some("night")), 0.3);
}

#[test]
fn test_encoding_defaults_and_codes() {
    assert_eq!(encode(&PreferenceRecord::new()).values(), &[3.0, 50.0, 1000.0, 1.0]);
    assert_eq!(encode_study_habits(Some("Night")), 2.0);
    assert_eq!(encode_study_habits(Some("evening")), 1.0);
}

#[test]
fn test_fallback_scenario_score() {
    let scorer = Scorer::fallback();
    let a = record(5, 20.0, "night", 800.0);
    let b = record(1, 80.0, "morning", 1800.0);

    let result = scorer.score(&a, &b);

    assert_eq!(result.mode(), ScoringMode::Fallback);
    assert!((result.total_score() - 0.178_571_428_571).abs() < 1e-9);
}

#[test]
fn test_fallback_two_dimensions_weighted_average() {
    let scorer = Scorer::fallback();
    let a = PreferenceRecord::new().with_cleanliness(2).with_budget(600.0);
    let b = PreferenceRecord::new().with_cleanliness(5).with_budget(700.0);

    let result = scorer.score(&a, &b);

    let cleanliness = 0.25;
    let budget = 0.9;
    let expected = (0.25 * cleanliness + 0.10 * budget) / (0.25 + 0.10);
    assert!((result.total_score() - expected).abs() < 1e-12);
    // A sum over the full table would be much lower
    assert!(result.total_score() > 0.25 * cleanliness + 0.10 * budget);
}

#[test]
fn test_all_missing_is_neutral() {
    let result = Scorer::fallback().score(&PreferenceRecord::new(), &PreferenceRecord::new());

    assert_eq!(result.total_score(), 0.5);
    assert_eq!(result.breakdown().ml_score, None);
    assert!(result.breakdown().entries().iter().all(|(_, v)| *v == 0.5));
}

#[test]
fn test_fallback_is_symmetric_for_rules() {
    let scorer = Scorer::fallback();
    let a = record(2, 65.0, "afternoon", 1300.0);
    let b = record(4, 15.0, "night", 700.0);

    assert_eq!(scorer.score(&a, &b).total_score(), scorer.score(&b, &a).total_score());
}
