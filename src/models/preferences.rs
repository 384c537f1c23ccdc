use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::models::domain::{
    Amenity, ClockTime, ClosingTime, IndoorOutdoor, NoiseLevel, OperatingHours, SpaceType,
};

/// A categorical preference: either a specific value or "Any".
///
/// `Any` parses case-insensitively and serializes as the literal `"Any"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preference<T> {
    Any,
    Exactly(T),
}

impl<T> Default for Preference<T> {
    fn default() -> Self {
        Self::Any
    }
}

impl<T> Preference<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Any => None,
            Self::Exactly(value) => Some(value),
        }
    }
}

impl<T: FromStr> FromStr for Preference<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("any") {
            Ok(Self::Any)
        } else {
            s.parse().map(Self::Exactly)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Preference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Exactly(value) => fmt::Display::fmt(value, f),
        }
    }
}

impl<T: fmt::Display> Serialize for Preference<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de, T> Deserialize<'de> for Preference<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Upper bound used to normalize the proximity factor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum MaxDistance {
    #[default]
    Unbounded,
    Meters(f64),
}

impl From<Option<f64>> for MaxDistance {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unbounded, Self::Meters)
    }
}

impl From<MaxDistance> for Option<f64> {
    fn from(value: MaxDistance) -> Self {
        match value {
            MaxDistance::Unbounded => None,
            MaxDistance::Meters(meters) => Some(meters),
        }
    }
}

/// Selection criteria for one ranking request.
///
/// A fresh value is built per request. Every field starts at a default that
/// disables its factor's preference; [`Preferences::reset`] restores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    noise_level: Preference<NoiseLevel>,
    indoor_outdoor: Preference<IndoorOutdoor>,
    space_type: Preference<SpaceType>,
    access_required: bool,
    max_distance: MaxDistance,
    #[serde(flatten)]
    hours: OperatingHours,
    #[serde(deserialize_with = "amenity_flags")]
    amenities: BTreeMap<Amenity, bool>,
}

/// Amenity flags merged over the full vocabulary; unknown names are dropped
fn amenity_flags<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<Amenity, bool>, D::Error> {
    let raw = BTreeMap::<String, bool>::deserialize(deserializer)?;
    let mut flags: BTreeMap<Amenity, bool> =
        Amenity::ALL.iter().map(|amenity| (*amenity, false)).collect();

    for (name, wanted) in raw {
        match name.parse::<Amenity>() {
            Ok(amenity) => {
                flags.insert(amenity, wanted);
            }
            Err(_) => tracing::debug!("Ignoring unknown amenity preference: {}", name),
        }
    }

    Ok(flags)
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            noise_level: Preference::Any,
            indoor_outdoor: Preference::Any,
            space_type: Preference::Any,
            access_required: false,
            max_distance: MaxDistance::Unbounded,
            hours: OperatingHours::default(),
            amenities: Amenity::ALL.iter().map(|amenity| (*amenity, false)).collect(),
        }
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn noise_level(&self) -> &Preference<NoiseLevel> {
        &self.noise_level
    }

    pub fn indoor_outdoor(&self) -> &Preference<IndoorOutdoor> {
        &self.indoor_outdoor
    }

    pub fn space_type(&self) -> &Preference<SpaceType> {
        &self.space_type
    }

    pub fn access_required(&self) -> bool {
        self.access_required
    }

    pub fn max_distance(&self) -> MaxDistance {
        self.max_distance
    }

    pub fn hours(&self) -> OperatingHours {
        self.hours
    }

    /// Amenity flags; always keyed by the full vocabulary
    pub fn amenities(&self) -> &BTreeMap<Amenity, bool> {
        &self.amenities
    }

    pub fn wants(&self, amenity: Amenity) -> bool {
        self.amenities.get(&amenity).copied().unwrap_or(false)
    }

    pub fn set_noise_level(&mut self, noise_level: Preference<NoiseLevel>) {
        self.noise_level = noise_level;
    }

    pub fn set_indoor_outdoor(&mut self, indoor_outdoor: Preference<IndoorOutdoor>) {
        self.indoor_outdoor = indoor_outdoor;
    }

    pub fn set_space_type(&mut self, space_type: Preference<SpaceType>) {
        self.space_type = space_type;
    }

    pub fn set_access_required(&mut self, access_required: bool) {
        self.access_required = access_required;
    }

    pub fn set_max_distance(&mut self, max_distance: MaxDistance) {
        self.max_distance = max_distance;
    }

    pub fn set_open_time(&mut self, open_time: ClockTime) {
        self.hours.open_time = open_time;
    }

    pub fn set_close_time(&mut self, close_time: ClosingTime) {
        self.hours.close_time = close_time;
    }

    /// Set an amenity flag by name.
    ///
    /// Returns `false` and leaves the preferences untouched when `key` is not
    /// in the amenity vocabulary.
    pub fn set_amenity(&mut self, key: &str, wanted: bool) -> bool {
        match key.parse::<Amenity>() {
            Ok(amenity) => {
                self.amenities.insert(amenity, wanted);
                true
            }
            Err(_) => false,
        }
    }

    /// Restore every field, amenity flags included, to its default
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
