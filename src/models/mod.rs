// Model exports
pub mod domain;
pub mod preferences;
pub mod requests;
pub mod responses;

pub use domain::{
    Amenity, AmenitySet, ClockTime, ClosingTime, Coordinates, IndoorOutdoor, InvalidCoordinates,
    NoiseLevel, OperatingHours, ScoreBreakdown, ScoredSpot, ScoringWeights, SpaceType, StudySpot,
    UnknownValue, DAY_SECONDS,
};
pub use preferences::{MaxDistance, Preference, Preferences};
pub use requests::{GeocodeQuery, Origin, PreferencesRequest, RequestError, WalkQuery};
pub use responses::{
    DetailsResponse, ErrorResponse, GeocodeResponse, HealthResponse, MapsKeyResponse,
    ResetResponse, WalkResponse,
};
