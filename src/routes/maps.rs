use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::models::{GeocodeQuery, GeocodeResponse, MapsKeyResponse, WalkQuery, WalkResponse};
use crate::routes::{ApiError, AppState};
use crate::services::GeocodingError;

/// Configure map helper routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/walk", web::get().to(walking_distance))
        .route("/geocode", web::get().to(geocode))
        .route("/google-maps-api-key", web::get().to(maps_api_key));
}

/// Walking distance and duration between two points
///
/// GET /api/walk?originLat=..&originLng=..&destLat=..&destLng=..
async fn walking_distance(
    state: web::Data<AppState>,
    query: web::Query<WalkQuery>,
) -> Result<HttpResponse, ApiError> {
    query
        .validate()
        .map_err(|e| ApiError::bad_request("Invalid coordinates", e))?;
    let (origin, destination) = query
        .endpoints()
        .map_err(|e| ApiError::bad_request("Invalid coordinates", e))?;

    let route = state
        .routing
        .walking_route(origin, destination)
        .await
        .map_err(|e| {
            tracing::warn!("Walking route lookup failed: {}", e);
            ApiError::bad_gateway("Routing failed", e)
        })?;

    Ok(HttpResponse::Ok().json(WalkResponse {
        distance_meters: route.distance_meters,
        duration_seconds: route.duration_seconds,
    }))
}

/// GET /api/geocode?address=..
async fn geocode(
    state: web::Data<AppState>,
    query: web::Query<GeocodeQuery>,
) -> Result<HttpResponse, ApiError> {
    query
        .validate()
        .map_err(|e| ApiError::bad_request("Validation failed", e))?;

    let coordinates = state.geocoder.geocode(&query.address).await.map_err(|e| match e {
        GeocodingError::EmptyAddress => ApiError::bad_request("Invalid address", e),
        GeocodingError::NotFound(_) => ApiError::not_found("Address not found", e),
        _ => {
            tracing::warn!("Geocoding failed for {:?}: {}", query.address, e);
            ApiError::bad_gateway("Geocoding failed", e)
        }
    })?;

    Ok(HttpResponse::Ok().json(GeocodeResponse {
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
    }))
}

/// GET /api/google-maps-api-key
async fn maps_api_key(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let api_key = state
        .maps_api_key
        .clone()
        .ok_or_else(|| ApiError::not_found("Not configured", "No maps API key is configured"))?;

    Ok(HttpResponse::Ok().json(MapsKeyResponse { api_key }))
}
