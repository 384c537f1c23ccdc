use crate::models::Coordinates;
use moka::future::Cache;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when geocoding an address
#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Address cannot be empty")]
    EmptyAddress,

    #[error("No results found for address: {0}")]
    NotFound(String),

    #[error("Geocoding service rate limit exceeded")]
    RateLimited,

    #[error("Geocoding service error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn coordinates(&self) -> Result<Coordinates, GeocodingError> {
        let latitude = self
            .lat
            .parse()
            .map_err(|_| GeocodingError::InvalidResponse(format!("bad latitude {:?}", self.lat)))?;
        let longitude = self
            .lon
            .parse()
            .map_err(|_| GeocodingError::InvalidResponse(format!("bad longitude {:?}", self.lon)))?;

        Coordinates::new(latitude, longitude)
            .map_err(|e| GeocodingError::InvalidResponse(e.to_string()))
    }
}

/// Nominatim search client with an in-memory TTL cache
pub struct Geocoder {
    base_url: String,
    client: Client,
    cache: Cache<String, Coordinates>,
}

/// Cache key: trimmed, lowercased, inner whitespace collapsed
fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl Geocoder {
    pub fn new(
        base_url: String,
        user_agent: &str,
        timeout: Duration,
        cache_capacity: u64,
        cache_ttl: Duration,
    ) -> Result<Self, GeocodingError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(cache_capacity)
            .time_to_live(cache_ttl)
            .build();

        Ok(Self {
            base_url,
            client,
            cache,
        })
    }

    /// Resolve an address to coordinates, using the cache when possible
    pub async fn geocode(&self, address: &str) -> Result<Coordinates, GeocodingError> {
        let key = normalize_address(address);
        if key.is_empty() {
            return Err(GeocodingError::EmptyAddress);
        }

        if let Some(coordinates) = self.cache.get(&key).await {
            tracing::debug!("Geocode cache hit for {:?}", key);
            return Ok(coordinates);
        }

        let coordinates = self.search(address.trim()).await?;
        self.cache.insert(key, coordinates).await;

        Ok(coordinates)
    }

    async fn search(&self, address: &str) -> Result<Coordinates, GeocodingError> {
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(address)
        );

        tracing::debug!("Geocoding address: {}", url);

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(GeocodingError::RateLimited),
            status if !status.is_success() => {
                return Err(GeocodingError::ApiError(status.to_string()));
            }
            _ => {}
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| GeocodingError::InvalidResponse(e.to_string()))?;

        places
            .first()
            .ok_or_else(|| GeocodingError::NotFound(address.to_string()))?
            .coordinates()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn geocoder_for(server: &ServerGuard) -> Geocoder {
        Geocoder::new(
            server.url(),
            "study-spot-match-tests",
            Duration::from_secs(5),
            100,
            Duration::from_secs(60),
        )
        .unwrap()
    }

    fn search_matcher() -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
        ])
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(
            normalize_address("  6138 Student Union   Blvd\tVancouver "),
            "6138 student union blvd vancouver"
        );
        assert_eq!(normalize_address("   "), "");
    }

    #[tokio::test]
    async fn test_geocode_success_is_cached() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                search_matcher(),
                Matcher::UrlEncoded("q".into(), "1961 East Mall".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat":"49.2675","lon":"-123.2527","display_name":"IKB"}]"#)
            .expect(1)
            .create_async()
            .await;

        let geocoder = geocoder_for(&server);
        let first = geocoder.geocode("1961 East Mall").await.unwrap();
        let second = geocoder.geocode("  1961 EAST mall ").await.unwrap();

        mock.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(first.latitude, 49.2675);
        assert_eq!(first.longitude, -123.2527);
    }

    #[tokio::test]
    async fn test_geocode_no_results() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(search_matcher())
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = geocoder_for(&server).geocode("Nowhere Street").await.unwrap_err();
        assert!(matches!(err, GeocodingError::NotFound(ref addr) if addr == "Nowhere Street"));
    }

    #[tokio::test]
    async fn test_geocode_rate_limited() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(search_matcher())
            .with_status(429)
            .create_async()
            .await;

        let err = geocoder_for(&server).geocode("Main Mall").await.unwrap_err();
        assert!(matches!(err, GeocodingError::RateLimited));
    }

    #[tokio::test]
    async fn test_empty_address_skips_the_request() {
        let server = Server::new_async().await;
        let err = geocoder_for(&server).geocode("   ").await.unwrap_err();
        assert!(matches!(err, GeocodingError::EmptyAddress));
    }

    #[tokio::test]
    async fn test_garbage_coordinates_are_invalid() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(search_matcher())
            .with_status(200)
            .with_body(r#"[{"lat":"north","lon":"-123.25"}]"#)
            .create_async()
            .await;

        let err = geocoder_for(&server).geocode("Main Mall").await.unwrap_err();
        assert!(matches!(err, GeocodingError::InvalidResponse(_)));
    }
}
