use crate::core::hours::{hours_fit, HoursFit};
use crate::models::{
    MaxDistance, Preference, Preferences, ScoreBreakdown, ScoringWeights, StudySpot,
};

/// Calculate the raw per-factor contributions for a single spot
///
/// Factor rules:
/// - proximity: `w * (1 - clamp(distance / max, 0, 1))`, only with a known distance
/// - amenities: `w / n` for each amenity both wanted and present
/// - noise: full on `Any` or exact match, half for adjacent levels
/// - space type and indoor/outdoor: full on exact match only
/// - access: full unless access is required and the spot lacks it
/// - hours: full when contained, half when overlapping
///
/// Missing spot attributes contribute nothing to their factor.
pub fn score_spot(
    spot: &StudySpot,
    preferences: &Preferences,
    distance: Option<f64>,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    ScoreBreakdown {
        proximity: proximity_score(distance, preferences.max_distance()) * weights.proximity,
        amenities: amenity_score(spot, preferences) * weights.amenities,
        noise: noise_score(spot, preferences) * weights.noise,
        space_type: space_type_score(spot, preferences) * weights.space_type,
        indoor_outdoor: indoor_outdoor_score(spot, preferences) * weights.indoor_outdoor,
        access: access_score(spot, preferences) * weights.access,
        hours: hours_score(spot, preferences) * weights.hours,
    }
}

/// Proximity fraction (0-1); closer is linearly better
#[inline]
pub fn proximity_score(distance: Option<f64>, max_distance: MaxDistance) -> f64 {
    let Some(distance) = distance.filter(|d| d.is_finite()) else {
        return 0.0;
    };

    let ratio = match max_distance {
        MaxDistance::Unbounded => 0.0,
        MaxDistance::Meters(max) if max > 0.0 => (distance / max).clamp(0.0, 1.0),
        MaxDistance::Meters(_) => return 0.0,
    };

    1.0 - ratio
}

/// Fraction of the amenity vocabulary that is both wanted and present
#[inline]
pub fn amenity_score(spot: &StudySpot, preferences: &Preferences) -> f64 {
    let keys = preferences.amenities();
    if keys.is_empty() {
        return 0.0;
    }

    let satisfied = keys
        .iter()
        .filter(|(amenity, wanted)| **wanted && spot.amenities.has(**amenity))
        .count();

    satisfied as f64 / keys.len() as f64
}

#[inline]
pub fn noise_score(spot: &StudySpot, preferences: &Preferences) -> f64 {
    let wanted = match preferences.noise_level() {
        Preference::Any => return 1.0,
        Preference::Exactly(level) => *level,
    };

    match spot.noise_level {
        Some(level) if level == wanted => 1.0,
        Some(level) if level.is_adjacent(wanted) => 0.5,
        _ => 0.0,
    }
}

#[inline]
pub fn space_type_score(spot: &StudySpot, preferences: &Preferences) -> f64 {
    match (preferences.space_type(), &spot.space_type) {
        (Preference::Exactly(wanted), Some(space)) if wanted.matches(space) => 1.0,
        _ => 0.0,
    }
}

#[inline]
pub fn indoor_outdoor_score(spot: &StudySpot, preferences: &Preferences) -> f64 {
    match (preferences.indoor_outdoor(), spot.indoor_outdoor) {
        (Preference::Exactly(wanted), Some(setting)) if *wanted == setting => 1.0,
        _ => 0.0,
    }
}

#[inline]
pub fn access_score(spot: &StudySpot, preferences: &Preferences) -> f64 {
    if !preferences.access_required() || spot.access_required {
        1.0
    } else {
        0.0
    }
}

#[inline]
pub fn hours_score(spot: &StudySpot, preferences: &Preferences) -> f64 {
    let Some(available) = spot.hours() else {
        return 0.0;
    };

    match hours_fit(available, preferences.hours()) {
        HoursFit::Contains => 1.0,
        HoursFit::Overlaps => 0.5,
        HoursFit::Disjoint => 0.0,
    }
}
