/// Similarity used when either side of a dimension is unknown
pub const NEUTRAL_SIMILARITY: f64 = 0.5;

/// Similarity for two different study habits
pub const SCHEDULE_MISMATCH: f64 = 0.3;

/// Budget difference at which the budget similarity reaches zero
pub const BUDGET_NORMALIZATION: f64 = 1000.0;

/// Widest possible cleanliness gap (1 vs 5)
const CLEANLINESS_RANGE: f64 = 4.0;

/// Widest possible noise tolerance gap (0 vs 100)
const NOISE_RANGE: f64 = 100.0;

/// Cleanliness similarity (0-1)
/// Identical levels score 1.0, opposite ends of the 1-5 scale score 0.0
#[inline]
pub fn cleanliness_match(user: Option<u8>, other: Option<u8>) -> f64 {
    match (user, other) {
        (Some(u), Some(o)) => 1.0 - (f64::from(u) - f64::from(o)).abs() / CLEANLINESS_RANGE,
        _ => NEUTRAL_SIMILARITY,
    }
}

/// Noise tolerance similarity (0-1), linear in the percentage gap
#[inline]
pub fn noise_match(user: Option<f64>, other: Option<f64>) -> f64 {
    match (user, other) {
        (Some(u), Some(o)) => 1.0 - (u - o).abs() / NOISE_RANGE,
        _ => NEUTRAL_SIMILARITY,
    }
}

/// Study schedule similarity
/// Case-insensitive equality scores 1.0; different habits still get partial credit
#[inline]
pub fn schedule_match(user: Option<&str>, other: Option<&str>) -> f64 {
    match (user, other) {
        (Some(u), Some(o)) => {
            if u.to_lowercase() == o.to_lowercase() {
                1.0
            } else {
                SCHEDULE_MISMATCH
            }
        }
        _ => NEUTRAL_SIMILARITY,
    }
}

/// Budget similarity (0-1)
/// Decreases linearly with the difference and bottoms out at `BUDGET_NORMALIZATION`
#[inline]
pub fn budget_match(user: Option<f64>, other: Option<f64>) -> f64 {
    match (user, other) {
        (Some(u), Some(o)) => (1.0 - (u - o).abs() / BUDGET_NORMALIZATION).max(0.0),
        _ => NEUTRAL_SIMILARITY,
    }
}
