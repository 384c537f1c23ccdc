use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Seconds in a full day; the value of the end-of-day closing sentinel.
pub const DAY_SECONDS: u32 = 86_400;

/// A vocabulary value that did not match any known variant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// How loud a study spot is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NoiseLevel {
    Silent,
    Moderate,
    Loud,
}

impl NoiseLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "Silent",
            Self::Moderate => "Moderate",
            Self::Loud => "Loud",
        }
    }

    /// Levels one step apart on the Silent < Moderate < Loud scale
    pub fn is_adjacent(self, other: NoiseLevel) -> bool {
        self.step().abs_diff(other.step()) == 1
    }

    fn step(self) -> u8 {
        match self {
            Self::Silent => 0,
            Self::Moderate => 1,
            Self::Loud => 2,
        }
    }
}

impl FromStr for NoiseLevel {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "moderate" => Ok(Self::Moderate),
            "loud" => Ok(Self::Loud),
            _ => Err(UnknownValue::new("noise level", s)),
        }
    }
}

/// Indoor or outdoor location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IndoorOutdoor {
    Indoor,
    Outdoor,
}

impl IndoorOutdoor {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Indoor => "Indoor",
            Self::Outdoor => "Outdoor",
        }
    }
}

impl FromStr for IndoorOutdoor {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indoor" => Ok(Self::Indoor),
            "outdoor" => Ok(Self::Outdoor),
            _ => Err(UnknownValue::new("indoor/outdoor value", s)),
        }
    }
}

/// Kind of space offered by a study spot.
///
/// The set is open: names outside the known vocabulary are kept verbatim in
/// [`SpaceType::Other`] and compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SpaceType {
    OpenArea,
    QuietRoom,
    GroupStudyRoom,
    OutdoorSeating,
    Library,
    Other(String),
}

impl SpaceType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::OpenArea => "Open Area",
            Self::QuietRoom => "Quiet Room",
            Self::GroupStudyRoom => "Group Study Room",
            Self::OutdoorSeating => "Outdoor Seating",
            Self::Library => "Library",
            Self::Other(name) => name,
        }
    }

    /// Case-insensitive equality, including for unknown space types
    pub fn matches(&self, other: &SpaceType) -> bool {
        match (self, other) {
            (Self::Other(a), Self::Other(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => self == other,
        }
    }
}

impl FromStr for SpaceType {
    type Err = Infallible;

    /// Accepts display names ("Group Study Room") and front-end keys ("group_study")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let space = match s.trim().to_ascii_lowercase().as_str() {
            "open area" | "open_area" => Self::OpenArea,
            "quiet room" | "quiet_room" => Self::QuietRoom,
            "group study room" | "group_study" => Self::GroupStudyRoom,
            "outdoor seating" | "outdoor_seating" => Self::OutdoorSeating,
            "library" | "library_classroom" => Self::Library,
            _ => Self::Other(s.trim().to_string()),
        };
        Ok(space)
    }
}

/// Amenity vocabulary shared by spots and preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Amenity {
    WiFi,
    Washrooms,
    PrivateRoom,
    Projector,
    FoodOrDrinks,
}

impl Amenity {
    pub const ALL: [Amenity; 5] = [
        Amenity::WiFi,
        Amenity::Washrooms,
        Amenity::PrivateRoom,
        Amenity::Projector,
        Amenity::FoodOrDrinks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WiFi => "WiFi",
            Self::Washrooms => "Washrooms",
            Self::PrivateRoom => "PrivateRoom",
            Self::Projector => "Projector",
            Self::FoodOrDrinks => "FoodOrDrinks",
        }
    }
}

impl FromStr for Amenity {
    type Err = UnknownValue;

    /// Accepts catalog names ("PrivateRoom") and front-end keys ("private_rooms")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wifi" => Ok(Self::WiFi),
            "washrooms" => Ok(Self::Washrooms),
            "privateroom" | "private_rooms" => Ok(Self::PrivateRoom),
            "projector" | "projectors" => Ok(Self::Projector),
            "foodordrinks" | "food_drink_allowed" => Ok(Self::FoodOrDrinks),
            _ => Err(UnknownValue::new("amenity", s)),
        }
    }
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.as_str().to_string()
            }
        }
    )*};
}

string_conversions!(NoiseLevel, IndoorOutdoor, SpaceType, Amenity);

impl TryFrom<String> for NoiseLevel {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for IndoorOutdoor {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for Amenity {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<String> for SpaceType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(space) => space,
            Err(never) => match never {},
        }
    }
}

/// Amenities present at a spot.
///
/// Serialized as a map of amenity name to a 0/1 flag. Only a flag of exactly
/// 1 marks an amenity as present; unknown names are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, i64>", into = "BTreeMap<String, u8>")]
pub struct AmenitySet(BTreeSet<Amenity>);

impl AmenitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, amenity: Amenity) -> bool {
        self.0.contains(&amenity)
    }

    pub fn insert(&mut self, amenity: Amenity) {
        self.0.insert(amenity);
    }

    pub fn iter(&self) -> impl Iterator<Item = Amenity> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Amenity> for AmenitySet {
    fn from_iter<I: IntoIterator<Item = Amenity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, i64>> for AmenitySet {
    fn from(flags: BTreeMap<String, i64>) -> Self {
        flags
            .into_iter()
            .filter_map(|(name, flag)| match name.parse::<Amenity>() {
                Ok(amenity) => (flag == 1).then_some(amenity),
                Err(_) => {
                    tracing::debug!("Ignoring unknown amenity key: {}", name);
                    None
                }
            })
            .collect()
    }
}

impl From<AmenitySet> for BTreeMap<String, u8> {
    fn from(set: AmenitySet) -> Self {
        Amenity::ALL
            .iter()
            .map(|amenity| (amenity.as_str().to_string(), u8::from(set.has(*amenity))))
            .collect()
    }
}

/// Time of day with minute precision, stored as seconds since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 3600 + minute * 60))
    }

    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use chrono::{NaiveTime, Timelike};

        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map(|time| Self(time.num_seconds_from_midnight() / 60 * 60))
            .map_err(|_| UnknownValue::new("time of day", s))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 3600, self.0 % 3600 / 60)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Closing time of an opening window.
///
/// `EndOfDay` ("24:00") is distinct from `At(00:00)`. An `At` time earlier
/// than the opening time wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClosingTime {
    At(ClockTime),
    #[default]
    EndOfDay,
}

impl ClosingTime {
    pub fn seconds(self) -> u32 {
        match self {
            Self::At(time) => time.seconds(),
            Self::EndOfDay => DAY_SECONDS,
        }
    }
}

impl FromStr for ClosingTime {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "24:00" | "24:00:00" => Ok(Self::EndOfDay),
            other => other.parse().map(Self::At),
        }
    }
}

impl fmt::Display for ClosingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(time) => fmt::Display::fmt(time, f),
            Self::EndOfDay => f.write_str("24:00"),
        }
    }
}

impl TryFrom<String> for ClosingTime {
    type Error = UnknownValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClosingTime> for String {
    fn from(value: ClosingTime) -> Self {
        value.to_string()
    }
}

/// An opening window; defaults to the whole day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OperatingHours {
    pub open_time: ClockTime,
    pub close_time: ClosingTime,
}

impl OperatingHours {
    pub fn new(open_time: ClockTime, close_time: ClosingTime) -> Self {
        Self {
            open_time,
            close_time,
        }
    }
}

/// A validated latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidCoordinates {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    Latitude(f64),
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    Longitude(f64),
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        let coordinates = Self {
            latitude,
            longitude,
        };
        coordinates.validate()?;
        Ok(coordinates)
    }

    pub fn validate(&self) -> Result<(), InvalidCoordinates> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(InvalidCoordinates::Latitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(InvalidCoordinates::Longitude(self.longitude));
        }
        Ok(())
    }
}

/// A catalog study spot.
///
/// Matching attributes that fail to parse are kept as `None` so a single bad
/// field scores zero on its factor instead of rejecting the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySpot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "default_open_time", deserialize_with = "lenient")]
    pub open_time: Option<ClockTime>,
    #[serde(default = "default_close_time", deserialize_with = "lenient")]
    pub close_time: Option<ClosingTime>,
    #[serde(default, deserialize_with = "lenient")]
    pub noise_level: Option<NoiseLevel>,
    #[serde(default, deserialize_with = "lenient")]
    pub indoor_outdoor: Option<IndoorOutdoor>,
    #[serde(default, deserialize_with = "lenient")]
    pub space_type: Option<SpaceType>,
    #[serde(default)]
    pub access_required: bool,
    #[serde(default)]
    pub amenities: AmenitySet,
}

impl StudySpot {
    /// Opening window, or `None` when either bound failed to parse
    pub fn hours(&self) -> Option<OperatingHours> {
        Some(OperatingHours::new(self.open_time?, self.close_time?))
    }

    pub fn coordinates(&self) -> Result<Coordinates, InvalidCoordinates> {
        Coordinates::new(self.latitude, self.longitude)
    }
}

fn default_open_time() -> Option<ClockTime> {
    Some(ClockTime::MIDNIGHT)
}

fn default_close_time() -> Option<ClosingTime> {
    Some(ClosingTime::EndOfDay)
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Treating unparseable catalog value as unknown: {}", e);
            None
        }
    }))
}

/// Raw (pre-normalization) contribution of each factor to a spot's score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub proximity: f64,
    pub amenities: f64,
    pub noise: f64,
    pub space_type: f64,
    pub indoor_outdoor: f64,
    pub access: f64,
    pub hours: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.proximity
            + self.amenities
            + self.noise
            + self.space_type
            + self.indoor_outdoor
            + self.access
            + self.hours
    }
}

/// A ranked spot: a snapshot of the catalog record plus its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredSpot {
    #[serde(flatten)]
    pub spot: StudySpot,
    pub score: f64,
    /// Input distance in meters; `None` when unknown, which ranks last
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
}

impl ScoredSpot {
    pub fn new(spot: &StudySpot, score: f64) -> Self {
        Self {
            spot: spot.clone(),
            score,
            distance: None,
            breakdown: None,
        }
    }

    pub fn with_breakdown(spot: &StudySpot, breakdown: ScoreBreakdown, distance: Option<f64>) -> Self {
        Self {
            spot: spot.clone(),
            score: breakdown.total(),
            distance,
            breakdown: Some(breakdown),
        }
    }

    pub fn id(&self) -> &str {
        &self.spot.id
    }
}

/// Scoring weights per factor, in points out of 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub proximity: f64,
    pub amenities: f64,
    pub noise: f64,
    pub space_type: f64,
    pub indoor_outdoor: f64,
    pub access: f64,
    pub hours: f64,
}

impl ScoringWeights {
    pub const DEFAULT: ScoringWeights = ScoringWeights {
        proximity: 20.0,
        amenities: 20.0,
        noise: 15.0,
        space_type: 15.0,
        indoor_outdoor: 10.0,
        access: 10.0,
        hours: 10.0,
    };

    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Every weight finite and non-negative, summing to 100
    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|w| w.is_finite() && *w >= 0.0)
            && (self.total() - 100.0).abs() < 1e-9
    }

    fn as_array(&self) -> [f64; 7] {
        [
            self.proximity,
            self.amenities,
            self.noise,
            self.space_type,
            self.indoor_outdoor,
            self.access,
            self.hours,
        ]
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_parsing_is_case_insensitive() {
        assert_eq!("silent".parse::<NoiseLevel>().unwrap(), NoiseLevel::Silent);
        assert_eq!(" OUTDOOR ".parse::<IndoorOutdoor>().unwrap(), IndoorOutdoor::Outdoor);
        assert_eq!("group study room".parse::<SpaceType>().unwrap(), SpaceType::GroupStudyRoom);
        assert_eq!("food_drink_allowed".parse::<Amenity>().unwrap(), Amenity::FoodOrDrinks);
        assert!("whisper".parse::<NoiseLevel>().is_err());
    }

    #[test]
    fn test_unknown_space_type_is_kept() {
        let rooftop: SpaceType = "Rooftop".parse().unwrap();
        assert_eq!(rooftop, SpaceType::Other("Rooftop".to_string()));
        assert!(rooftop.matches(&SpaceType::Other("ROOFTOP".to_string())));
        assert!(!rooftop.matches(&SpaceType::Library));
    }

    #[test]
    fn test_noise_adjacency() {
        assert!(NoiseLevel::Silent.is_adjacent(NoiseLevel::Moderate));
        assert!(NoiseLevel::Loud.is_adjacent(NoiseLevel::Moderate));
        assert!(!NoiseLevel::Silent.is_adjacent(NoiseLevel::Loud));
        assert!(!NoiseLevel::Silent.is_adjacent(NoiseLevel::Silent));
    }

    #[test]
    fn test_closing_time_sentinel() {
        assert_eq!("24:00".parse::<ClosingTime>().unwrap(), ClosingTime::EndOfDay);
        assert_eq!(
            "00:00".parse::<ClosingTime>().unwrap(),
            ClosingTime::At(ClockTime::MIDNIGHT)
        );
        assert_eq!(ClosingTime::EndOfDay.seconds(), DAY_SECONDS);
        assert_eq!(ClosingTime::EndOfDay.to_string(), "24:00");
    }

    #[test]
    fn test_clock_time_formats() {
        let time: ClockTime = "08:30".parse().unwrap();
        assert_eq!(time, ClockTime::from_hm(8, 30).unwrap());
        assert_eq!(time.to_string(), "08:30");
        assert_eq!("21:15:42".parse::<ClockTime>().unwrap().to_string(), "21:15");
        assert!(ClockTime::from_hm(24, 0).is_none());
    }

    #[test]
    fn test_amenity_set_ignores_unknown_and_non_binary_flags() {
        let json = r#"{"WiFi": 1, "Projector": 0, "Sauna": 1, "Washrooms": 2}"#;
        let set: AmenitySet = serde_json::from_str(json).unwrap();

        assert!(set.has(Amenity::WiFi));
        assert!(!set.has(Amenity::Projector));
        assert!(!set.has(Amenity::Washrooms));
        assert_eq!(set.iter().count(), 1);
    }

    #[test]
    fn test_study_spot_tolerates_bad_fields() {
        let json = r#"{
            "id": "x",
            "name": "Odd Spot",
            "latitude": 49.26,
            "longitude": -123.25,
            "openTime": "late",
            "noiseLevel": "Whisper",
            "indoorOutdoor": "Indoor"
        }"#;
        let spot: StudySpot = serde_json::from_str(json).unwrap();

        assert_eq!(spot.noise_level, None);
        assert_eq!(spot.indoor_outdoor, Some(IndoorOutdoor::Indoor));
        assert_eq!(spot.open_time, None);
        assert_eq!(spot.close_time, Some(ClosingTime::EndOfDay));
        assert!(spot.hours().is_none());
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(49.26, -123.25).is_ok());
        assert_eq!(
            Coordinates::new(91.0, 0.0),
            Err(InvalidCoordinates::Latitude(91.0))
        );
        assert!(Coordinates::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_default_weights_sum_to_100() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.total(), 100.0);
        assert!(weights.is_valid());

        let skewed = ScoringWeights {
            proximity: 50.0,
            ..ScoringWeights::DEFAULT
        };
        assert!(!skewed.is_valid());
    }
}
