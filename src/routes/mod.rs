// Route exports
pub mod maps;
pub mod preferences;
pub mod spots;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;
use crate::core::Ranker;
use crate::models::{ErrorResponse, HealthResponse, RequestError, ScoringWeights};
use crate::services::{
    Catalog, CatalogError, DistanceResolver, Geocoder, GeocodingError, RoutingClient, RoutingError,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub ranker: Ranker,
    pub routing: Arc<RoutingClient>,
    pub geocoder: Arc<Geocoder>,
    pub distances: Arc<DistanceResolver>,
    pub maps_api_key: Option<String>,
}

/// Errors that prevent the service from starting
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Routing client error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Geocoder error: {0}")]
    Geocoding(#[from] GeocodingError),
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Result<Self, StartupError> {
        let catalog = match &settings.catalog.path {
            Some(path) => Catalog::from_path(path)?,
            None => Catalog::bundled()?,
        };
        tracing::info!("Catalog loaded with {} study spots", catalog.len());

        let ranker = Ranker::new(ScoringWeights::from(&settings.scoring.weights));

        let routing = Arc::new(RoutingClient::new(
            settings.routing.osrm_url.clone(),
            &settings.routing.user_agent,
            settings.routing.timeout(),
        )?);

        let geocoder = Arc::new(Geocoder::new(
            settings.routing.nominatim_url.clone(),
            &settings.routing.user_agent,
            settings.routing.timeout(),
            settings.cache.geocode_capacity,
            Duration::from_secs(settings.cache.geocode_ttl_secs),
        )?);

        let distances = Arc::new(DistanceResolver::new(
            Arc::clone(&routing),
            settings.routing.resolver_options(),
        ));

        let maps_api_key = settings
            .maps
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            catalog: Arc::new(catalog),
            ranker,
            routing,
            geocoder,
            distances,
            maps_api_key,
        })
    }
}

/// JSON error returned by handlers
#[derive(Debug)]
pub struct ApiError(pub ErrorResponse);

impl ApiError {
    pub fn new(status: StatusCode, error: &str, message: impl ToString) -> Self {
        Self(ErrorResponse::new(error, message, status.as_u16()))
    }

    pub fn bad_request(error: &str, message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn not_found(error: &str, message: impl ToString) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, message)
    }

    pub fn bad_gateway(error: &str, message: impl ToString) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, error, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        let error = match &err {
            RequestError::Validation(_) => "Validation failed",
            _ => "Invalid request",
        };
        Self::bad_request(error, err)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::bad_request("invalid_json", format!("Invalid JSON: {}", err)).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    ApiError::bad_request("invalid_query", format!("Invalid query: {}", err)).into()
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size: state.catalog.len(),
        timestamp: chrono::Utc::now(),
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health_check))
            .configure(spots::configure)
            .configure(preferences::configure)
            .configure(maps::configure),
    );
}
