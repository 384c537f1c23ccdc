use serde::{Deserialize, Serialize};

use crate::core::explain::MatchFactor;
use crate::models::domain::{ScoreBreakdown, StudySpot};
use crate::models::preferences::Preferences;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_size: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(error: &str, message: impl ToString, status_code: u16) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status_code,
        }
    }
}

/// Response of `POST /api/preferences/reset`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub status: String,
    pub preferences: Preferences,
}

/// Response of `POST /api/studyspots/{id}/details`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsResponse {
    pub spot: StudySpot,
    pub explanation: String,
    pub factors: Vec<MatchFactor>,
    pub breakdown: ScoreBreakdown,
    pub distance: Option<f64>,
}

/// Response of `GET /api/walk`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkResponse {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// Response of `GET /api/geocode`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapsKeyResponse {
    pub api_key: String,
}
