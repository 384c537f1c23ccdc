use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::explain_match;
use crate::models::{DetailsResponse, PreferencesRequest};
use crate::routes::{ApiError, AppState};

/// Configure all study-spot routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/studyspots/all", web::get().to(list_spots))
        .route("/studyspots/{id}", web::get().to(get_spot))
        .route("/studyspots/{id}/details", web::post().to(spot_details));
}

/// GET /api/studyspots/all
async fn list_spots(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.catalog.all())
}

/// GET /api/studyspots/{id}
async fn get_spot(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let spot = state.catalog.get(&id).ok_or_else(|| spot_not_found(&id))?;
    Ok(HttpResponse::Ok().json(spot))
}

/// Explain how a spot matches the given preferences
///
/// POST /api/studyspots/{id}/details
///
/// Takes the same body as `/api/preferences/apply`. Only `distancesFromUser`
/// is consulted for the spot's distance; no lookups are made.
async fn spot_details(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<PreferencesRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    req.validate().map_err(|e| ApiError::bad_request("Validation failed", e))?;

    let spot = state.catalog.get(&id).ok_or_else(|| spot_not_found(&id))?;
    let preferences = req.to_preferences()?;
    let distance = req
        .distances_from_user
        .as_ref()
        .and_then(|distances| distances.get(&id).copied());

    let explanation = explain_match(spot, &preferences, distance, state.ranker.weights());

    tracing::debug!("Explained spot {} with {} factors", id, explanation.factors.len());

    Ok(HttpResponse::Ok().json(DetailsResponse {
        spot: spot.clone(),
        explanation: explanation.summary(),
        factors: explanation.factors,
        breakdown: explanation.breakdown,
        distance,
    }))
}

fn spot_not_found(id: &str) -> ApiError {
    ApiError::not_found("Study spot not found", format!("No study spot with id {}", id))
}
