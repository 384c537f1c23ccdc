use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::DistanceMap;
use crate::models::{Origin, Preferences, PreferencesRequest, ResetResponse};
use crate::routes::{ApiError, AppState};

/// Configure preference routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/preferences/apply", web::post().to(apply_preferences))
        .route("/preferences/reset", web::post().to(reset_preferences));
}

/// Rank the catalog against the submitted preferences
///
/// POST /api/preferences/apply
///
/// Request body:
/// ```json
/// {
///   "showAll": false,
///   "noiseLevel": "Silent",
///   "indoorOutdoor": "Any",
///   "selectedAmenities": ["wifi", "projectors"],
///   "selectedSpaceTypes": ["library_classroom"],
///   "accessRequired": false,
///   "maxDistance": 1500,
///   "openTime": "09:00",
///   "closeTime": "17:00",
///   "distancesFromUser": {"1": 420.0},
///   "originLat": 49.2606,
///   "originLng": -123.2460,
///   "originAddress": "6138 Student Union Blvd"
/// }
/// ```
async fn apply_preferences(
    state: web::Data<AppState>,
    req: web::Json<PreferencesRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate().map_err(|e| {
        tracing::info!("Validation failed for apply request: {:?}", e);
        ApiError::bad_request("Validation failed", e)
    })?;

    let spots = state.catalog.all();

    if req.show_all {
        tracing::info!("Returning all {} spots unscored", spots.len());
        return Ok(HttpResponse::Ok().json(state.ranker.show_all(spots)));
    }

    let preferences = req.to_preferences()?;
    let distances = resolve_distances(&state, &req).await?;

    let ranked = state.ranker.rank(&preferences, spots, distances.as_ref());

    tracing::info!(
        "Ranked {} spots (top: {})",
        ranked.len(),
        ranked.first().map(|s| s.id()).unwrap_or("-")
    );

    Ok(HttpResponse::Ok().json(ranked))
}

/// Distances from the request body, else looked up from the request origin
///
/// A failed geocode leaves every distance unknown instead of failing the request.
async fn resolve_distances(
    state: &AppState,
    req: &PreferencesRequest,
) -> Result<Option<DistanceMap>, ApiError> {
    if let Some(distances) = &req.distances_from_user {
        return Ok(Some(distances.clone()));
    }

    let origin = match req.origin()? {
        Some(Origin::Coordinates(coordinates)) => coordinates,
        Some(Origin::Address(address)) => match state.geocoder.geocode(&address).await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::warn!("Could not geocode origin {:?}, ranking without distances: {}", address, e);
                return Ok(None);
            }
        },
        None => return Ok(None),
    };

    Ok(Some(state.distances.resolve(origin, state.catalog.all()).await))
}

/// POST /api/preferences/reset
///
/// Preferences live in each request, so this only reports the defaults.
async fn reset_preferences() -> HttpResponse {
    HttpResponse::Ok().json(ResetResponse {
        status: "success".to_string(),
        preferences: Preferences::default(),
    })
}
