//! Study Spot Match - preference-weighted ranking of campus study spots
//!
//! The core is a pure scoring engine: weighted per-factor scores for every
//! spot, min-max normalized to 0-100 across the batch, then ordered by score
//! and distance. Around it sit the catalog, OSRM/Nominatim clients and the
//! actix-web API.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{explain_match, haversine_meters, DistanceMap, Ranker};
pub use models::{Preferences, PreferencesRequest, ScoredSpot, ScoringWeights, StudySpot};
pub use services::Catalog;
