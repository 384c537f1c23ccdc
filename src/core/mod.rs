// Core algorithm exports
pub mod distance;
pub mod explain;
pub mod hours;
pub mod ranker;
pub mod scoring;

pub use distance::haversine_meters;
pub use explain::{explain_match, MatchExplanation, MatchFactor};
pub use hours::{hours_fit, HoursFit};
pub use ranker::{normalize_scores, DistanceMap, Ranker};
pub use scoring::score_spot;
