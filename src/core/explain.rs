use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::hours::{hours_fit, HoursFit};
use crate::core::scoring::score_spot;
use crate::models::{Preferences, ScoreBreakdown, ScoringWeights, StudySpot};

/// One line of a match explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFactor {
    pub factor: String,
    pub detail: String,
}

impl MatchFactor {
    fn new(factor: &str, detail: impl Into<String>) -> Self {
        Self {
            factor: factor.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for MatchFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- {}: {}", self.factor, self.detail)
    }
}

/// Why a spot scored the way it did for a given set of preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchExplanation {
    pub factors: Vec<MatchFactor>,
    pub breakdown: ScoreBreakdown,
}

impl MatchExplanation {
    /// Plain-text rendering, one factor per line
    pub fn summary(&self) -> String {
        let mut text = String::from("Match factors:\n");
        for factor in &self.factors {
            text.push_str(&factor.to_string());
            text.push('\n');
        }
        text
    }
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "Unknown".to_string(), |v| v.to_string())
}

/// Build the explanation for `spot`
///
/// Categorical preferences are listed whenever they are set, showing the
/// spot's actual value. Amenities, access, hours and proximity are listed
/// only when they earned credit.
pub fn explain_match(
    spot: &StudySpot,
    preferences: &Preferences,
    distance: Option<f64>,
    weights: &ScoringWeights,
) -> MatchExplanation {
    let mut factors = Vec::new();

    if !preferences.noise_level().is_any() {
        factors.push(MatchFactor::new("Noise Level", or_unknown(spot.noise_level)));
    }
    if !preferences.indoor_outdoor().is_any() {
        factors.push(MatchFactor::new("Location Type", or_unknown(spot.indoor_outdoor)));
    }
    if !preferences.space_type().is_any() {
        factors.push(MatchFactor::new("Space Type", or_unknown(spot.space_type.as_ref())));
    }

    for (amenity, wanted) in preferences.amenities() {
        if *wanted && spot.amenities.has(*amenity) {
            factors.push(MatchFactor::new("Has amenity", amenity.as_str()));
        }
    }

    if preferences.access_required() && spot.access_required {
        factors.push(MatchFactor::new("Access", "Meets access requirement"));
    }

    if let Some(hours) = spot.hours() {
        let detail = match hours_fit(hours, preferences.hours()) {
            HoursFit::Contains => Some("covers your whole window"),
            HoursFit::Overlaps => Some("partly overlaps your window"),
            HoursFit::Disjoint => None,
        };
        if let Some(detail) = detail {
            factors.push(MatchFactor::new(
                "Hours",
                format!("{}-{} ({})", hours.open_time, hours.close_time, detail),
            ));
        }
    }

    if let Some(meters) = distance.filter(|d| d.is_finite()) {
        factors.push(MatchFactor::new("Distance", format!("{:.0} m", meters)));
    }

    MatchExplanation {
        factors,
        breakdown: score_spot(spot, preferences, distance, weights),
    }
}
