use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::models::domain::{
    ClockTime, ClosingTime, Coordinates, IndoorOutdoor, InvalidCoordinates, NoiseLevel, SpaceType,
    UnknownValue,
};
use crate::models::preferences::{MaxDistance, Preference, Preferences};

/// Transport input that could not be turned into domain values
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: UnknownValue,
    },

    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    #[error("Both originLat and originLng are required")]
    IncompleteOrigin,

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn parse_field<T>(field: &'static str, raw: Option<&str>) -> Result<Option<T>, RequestError>
where
    T: std::str::FromStr<Err = UnknownValue>,
{
    raw.map(|value| value.parse())
        .transpose()
        .map_err(|reason| RequestError::InvalidField { field, reason })
}

/// Supplied distances must be finite and non-negative meters
fn validate_distances(distances: &HashMap<String, f64>) -> Result<(), ValidationError> {
    match distances.iter().find(|(_, meters)| !meters.is_finite() || **meters < 0.0) {
        Some((id, meters)) => {
            tracing::debug!("Rejecting distance {} for spot {}", meters, id);
            Err(ValidationError::new("invalid_distance"))
        }
        None => Ok(()),
    }
}

/// Where walking distances are measured from
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Coordinates(Coordinates),
    Address(String),
}

/// Body of `POST /api/preferences/apply` and `POST /api/studyspots/{id}/details`
///
/// Every field is optional; missing fields take the preference defaults.
/// Amenity and space-type selections use the front-end keys (`wifi`,
/// `group_study`, ...) or the catalog names.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PreferencesRequest {
    pub show_all: bool,
    pub noise_level: Option<String>,
    pub indoor_outdoor: Option<String>,
    pub selected_amenities: Vec<String>,
    pub selected_space_types: Vec<String>,
    pub access_required: bool,
    #[validate(range(min = 0.0))]
    pub max_distance: Option<f64>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    #[validate(custom(function = "validate_distances"))]
    pub distances_from_user: Option<HashMap<String, f64>>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub origin_lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub origin_lng: Option<f64>,
    pub origin_address: Option<String>,
}

impl PreferencesRequest {
    /// Build the preference set for this request
    ///
    /// Unknown noise, setting or time values are rejected. Unknown amenity keys
    /// are skipped, and only the first selected space type is used.
    pub fn to_preferences(&self) -> Result<Preferences, RequestError> {
        let mut prefs = Preferences::new();

        if let Some(noise) =
            parse_field::<Preference<NoiseLevel>>("noiseLevel", self.noise_level.as_deref())?
        {
            prefs.set_noise_level(noise);
        }
        if let Some(setting) =
            parse_field::<Preference<IndoorOutdoor>>("indoorOutdoor", self.indoor_outdoor.as_deref())?
        {
            prefs.set_indoor_outdoor(setting);
        }

        let space_type = match self.selected_space_types.first() {
            Some(key) => key.parse::<Preference<SpaceType>>().unwrap_or_default(),
            None => Preference::Any,
        };
        prefs.set_space_type(space_type);

        for key in &self.selected_amenities {
            if !prefs.set_amenity(key, true) {
                tracing::debug!("Ignoring unknown amenity selection: {}", key);
            }
        }

        prefs.set_access_required(self.access_required);
        prefs.set_max_distance(MaxDistance::from(self.max_distance));

        if let Some(open) = parse_field::<ClockTime>("openTime", self.open_time.as_deref())? {
            prefs.set_open_time(open);
        }
        if let Some(close) = parse_field::<ClosingTime>("closeTime", self.close_time.as_deref())? {
            prefs.set_close_time(close);
        }

        Ok(prefs)
    }

    /// Origin to resolve distances from; coordinates win over an address
    pub fn origin(&self) -> Result<Option<Origin>, RequestError> {
        match (self.origin_lat, self.origin_lng) {
            (Some(latitude), Some(longitude)) => {
                Ok(Some(Origin::Coordinates(Coordinates::new(latitude, longitude)?)))
            }
            (None, None) => Ok(self
                .origin_address
                .as_deref()
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(|address| Origin::Address(address.to_string()))),
            _ => Err(RequestError::IncompleteOrigin),
        }
    }
}

/// Query of `GET /api/walk`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WalkQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub origin_lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub origin_lng: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub dest_lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub dest_lng: f64,
}

impl WalkQuery {
    pub fn endpoints(&self) -> Result<(Coordinates, Coordinates), InvalidCoordinates> {
        Ok((
            Coordinates::new(self.origin_lat, self.origin_lng)?,
            Coordinates::new(self.dest_lat, self.dest_lng)?,
        ))
    }
}

/// Query of `GET /api/geocode`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeocodeQuery {
    #[validate(length(min = 1))]
    pub address: String,
}
