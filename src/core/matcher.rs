use crate::core::scoring::Scorer;
use crate::models::{Candidate, PreferenceRecord, RankedMatch};
use std::sync::Arc;
use tracing::debug;

/// Minimum total score a candidate needs to be returned
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

/// Result of ranking a set of candidates
#[derive(Debug)]
pub struct RankResult {
    pub matches: Vec<RankedMatch>,
    pub total_candidates: usize,
    /// Candidates skipped because they have no preferences at all
    pub skipped: usize,
}

/// Ranks potential roommates for a user
///
/// # Pipeline Stages
/// 1. Skip candidates without preferences
/// 2. Score every remaining candidate against the subject
/// 3. Keep candidates above the minimum score
/// 4. Sort by score (descending) and truncate
#[derive(Debug, Clone)]
pub struct Matcher {
    scorer: Arc<Scorer>,
    min_score: f64,
}

impl Matcher {
    pub fn new(scorer: Arc<Scorer>, min_score: f64) -> Self {
        Self { scorer, min_score }
    }

    pub fn with_default_threshold(scorer: Arc<Scorer>) -> Self {
        Self::new(scorer, DEFAULT_MIN_SCORE)
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Rank candidates for `subject`
    ///
    /// # Arguments
    /// * `subject` - Preferences of the user looking for a roommate
    /// * `candidates` - Potential roommates
    /// * `limit` - Maximum number of matches to return
    pub fn rank(&self, subject: &PreferenceRecord, candidates: Vec<Candidate>, limit: usize) -> RankResult {
        let total_candidates = candidates.len();
        let mut skipped = 0;

        let mut matches: Vec<RankedMatch> = candidates
            .into_iter()
            // Stage 1: nothing to compare against
            .filter(|candidate| {
                let empty = candidate.preferences.is_empty();
                if empty {
                    debug!("Candidate {} has no preferences, skipping", candidate.id);
                    skipped += 1;
                }
                !empty
            })
            // Stage 2 & 3: score and threshold
            .filter_map(|candidate| {
                let compatibility = self.scorer.score(subject, &candidate.preferences);
                debug!(
                    "Compatibility with candidate {}: {:.4}",
                    candidate.id,
                    compatibility.total_score()
                );

                if compatibility.total_score() > self.min_score {
                    Some(RankedMatch {
                        id: candidate.id,
                        compatibility,
                    })
                } else {
                    None
                }
            })
            .collect();

        // Stage 4: stable sort keeps input order for equal scores
        matches.sort_by(|a, b| {
            b.compatibility
                .total_score()
                .partial_cmp(&a.compatibility.total_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        matches.truncate(limit);

        RankResult {
            matches,
            total_candidates,
            skipped,
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::with_default_threshold(Arc::new(Scorer::fallback()))
    }
}
