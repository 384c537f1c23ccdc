use std::cmp::Ordering;
use std::collections::HashMap;

use crate::core::scoring::score_spot;
use crate::models::{Preferences, ScoredSpot, ScoringWeights, StudySpot};

/// Walking distance in meters, keyed by spot id
pub type DistanceMap = HashMap<String, f64>;

/// Scores a catalog against one set of preferences.
///
/// # Pipeline
/// 1. Per-factor weighted scoring of every spot
/// 2. Min-max normalization of the batch to 0-100
/// 3. Ordering by score, then distance, then catalog position
///
/// Holds no per-request state, so one `Ranker` can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: ScoringWeights,
}

impl Ranker {
    /// Create a ranker; weights that are negative or do not sum to 100 are
    /// replaced with the defaults
    pub fn new(weights: ScoringWeights) -> Self {
        if weights.is_valid() {
            Self { weights }
        } else {
            tracing::warn!(
                "Invalid scoring weights {:?} (total {}), using defaults",
                weights,
                weights.total()
            );
            Self::with_default_weights()
        }
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Rank `spots` against `preferences`
    ///
    /// Spots missing from `distances` (or all spots when it is `None`) are
    /// treated as unknown distance: no proximity credit and last among equal
    /// scores.
    pub fn rank(
        &self,
        preferences: &Preferences,
        spots: &[StudySpot],
        distances: Option<&DistanceMap>,
    ) -> Vec<ScoredSpot> {
        let mut scored: Vec<ScoredSpot> = spots
            .iter()
            .map(|spot| {
                let distance = distances.and_then(|map| map.get(&spot.id).copied());
                let breakdown = score_spot(spot, preferences, distance, &self.weights);
                ScoredSpot::with_breakdown(spot, breakdown, distance)
            })
            .collect();

        normalize_scores(&mut scored);

        // Stable sort keeps catalog order for full ties
        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| compare_distance(a.distance, b.distance))
        });

        tracing::debug!(
            "Ranked {} spots (distances known for {})",
            scored.len(),
            scored.iter().filter(|s| s.distance.is_some()).count()
        );

        scored
    }

    /// Every spot at score 100 in catalog order, without scoring
    pub fn show_all(&self, spots: &[StudySpot]) -> Vec<ScoredSpot> {
        spots.iter().map(|spot| ScoredSpot::new(spot, 100.0)).collect()
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Rescale raw scores so the batch spans 0-100
///
/// A batch where every raw score is equal maps entirely to 0.
pub fn normalize_scores(scored: &mut [ScoredSpot]) {
    let Some((min, max)) = scored.iter().fold(None, |range, s| match range {
        None => Some((s.score, s.score)),
        Some((min, max)) => Some((f64::min(min, s.score), f64::max(max, s.score))),
    }) else {
        return;
    };

    let range = if max == min { 1.0 } else { max - min };
    for spot in scored.iter_mut() {
        spot.score = (spot.score - min) / range * 100.0;
    }
}

/// Ascending distance with unknown distances last
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
