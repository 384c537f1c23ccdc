use crate::models::{Coordinates, InvalidCoordinates};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when asking the routing service for a walk
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error(transparent)]
    InvalidCoordinates(#[from] InvalidCoordinates),

    #[error("Routing service rate limit exceeded")]
    RateLimited,

    #[error("Routing service error: {0}")]
    ApiError(String),

    #[error("Routing error: {0}")]
    NoRoute(String),

    #[error("No walking route found between these coordinates")]
    EmptyRoute,
}

impl RoutingError {
    /// Whether retrying the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Walking distance and duration between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkingRoute {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
}

/// OSRM client for the `foot` profile
#[derive(Debug, Clone)]
pub struct RoutingClient {
    base_url: String,
    client: Client,
}

impl RoutingClient {
    pub fn new(base_url: String, user_agent: &str, timeout: Duration) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Fetch the walking route between two points
    pub async fn walking_route(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<WalkingRoute, RoutingError> {
        origin.validate()?;
        destination.validate()?;

        // OSRM takes longitude first
        let url = format!(
            "{}/route/v1/foot/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.base_url.trim_end_matches('/'),
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        );

        tracing::debug!("Requesting walking route: {}", url);

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(RoutingError::RateLimited),
            status if status.is_server_error() => {
                return Err(RoutingError::ApiError(status.to_string()));
            }
            _ => {}
        }

        // OSRM reports bad queries as 400 with a JSON body carrying the reason
        let body: OsrmResponse = response.json().await?;

        if body.code != "Ok" {
            return Err(RoutingError::NoRoute(
                body.message.unwrap_or_else(|| body.code.clone()),
            ));
        }

        let route = body.routes.first().ok_or(RoutingError::EmptyRoute)?;

        Ok(WalkingRoute {
            distance_meters: route.distance,
            duration_seconds: route.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    const ROUTE_PATH: &str = r"^/route/v1/foot/";

    fn client_for(server: &ServerGuard) -> RoutingClient {
        RoutingClient::new(server.url(), "study-spot-match-tests", Duration::from_secs(5)).unwrap()
    }

    fn campus() -> (Coordinates, Coordinates) {
        (
            Coordinates::new(49.2606, -123.2460).unwrap(),
            Coordinates::new(49.2667, -123.2562).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_walking_route_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(ROUTE_PATH.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"code":"Ok","routes":[{"distance":1042.7,"duration":751.3}]}"#)
            .create_async()
            .await;

        let (origin, destination) = campus();
        let route = client_for(&server).walking_route(origin, destination).await.unwrap();

        mock.assert_async().await;
        assert_eq!(route.distance_meters, 1042.7);
        assert_eq!(route.duration_seconds, 751.3);
    }

    #[tokio::test]
    async fn test_longitude_comes_first_in_path() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/route/v1/foot/-123\.246000,49\.260600;-123\.256200,49\.266700".to_string()),
            )
            .with_status(200)
            .with_body(r#"{"code":"Ok","routes":[{"distance":1.0,"duration":1.0}]}"#)
            .create_async()
            .await;

        let (origin, destination) = campus();
        client_for(&server).walking_route(origin, destination).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(ROUTE_PATH.to_string()))
            .with_status(429)
            .create_async()
            .await;

        let (origin, destination) = campus();
        let err = client_for(&server).walking_route(origin, destination).await.unwrap_err();

        assert!(matches!(err, RoutingError::RateLimited));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_no_route_code() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(ROUTE_PATH.to_string()))
            .with_status(400)
            .with_body(r#"{"code":"NoRoute","message":"Impossible route between points"}"#)
            .create_async()
            .await;

        let (origin, destination) = campus();
        let err = client_for(&server).walking_route(origin, destination).await.unwrap_err();

        assert!(matches!(err, RoutingError::NoRoute(ref msg) if msg == "Impossible route between points"));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_route_list() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(ROUTE_PATH.to_string()))
            .with_status(200)
            .with_body(r#"{"code":"Ok","routes":[]}"#)
            .create_async()
            .await;

        let (origin, destination) = campus();
        let err = client_for(&server).walking_route(origin, destination).await.unwrap_err();

        assert!(matches!(err, RoutingError::EmptyRoute));
    }

    #[tokio::test]
    async fn test_invalid_coordinates_skip_the_request() {
        let server = Server::new_async().await;
        let bad = Coordinates {
            latitude: 95.0,
            longitude: 0.0,
        };

        let (origin, _) = campus();
        let err = client_for(&server).walking_route(origin, bad).await.unwrap_err();

        assert!(matches!(err, RoutingError::InvalidCoordinates(InvalidCoordinates::Latitude(_))));
    }
}
