use crate::core::{haversine_meters, DistanceMap};
use crate::models::{Coordinates, StudySpot};
use crate::services::routing::{RoutingClient, RoutingError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Tuning for concurrent distance lookups
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Upper bound on in-flight routing requests
    pub max_concurrency: usize,
    /// Retries after a rate-limited response
    pub max_retries: u32,
    /// First backoff delay; doubles on each retry
    pub backoff: Duration,
    /// Ceiling for a single backoff delay
    pub max_backoff: Duration,
    /// Use the great-circle distance when routing fails
    pub straight_line_fallback: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_retries: 3,
            backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            straight_line_fallback: true,
        }
    }
}

/// Resolves walking distances from one origin to many spots
pub struct DistanceResolver {
    routing: Arc<RoutingClient>,
    options: ResolverOptions,
}

impl DistanceResolver {
    pub fn new(routing: Arc<RoutingClient>, options: ResolverOptions) -> Self {
        Self { routing, options }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Look up the walking distance to every spot concurrently
    ///
    /// Spots whose lookup fails are left out of the map (unknown distance)
    /// unless the straight-line fallback is enabled.
    pub async fn resolve(&self, origin: Coordinates, spots: &[StudySpot]) -> DistanceMap {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for spot in spots {
            let destination = match spot.coordinates() {
                Ok(coordinates) => coordinates,
                Err(e) => {
                    tracing::warn!("Skipping distance lookup for spot {}: {}", spot.id, e);
                    continue;
                }
            };

            let id = spot.id.clone();
            let routing = Arc::clone(&self.routing);
            let semaphore = Arc::clone(&semaphore);
            let options = self.options.clone();

            tasks.spawn(async move {
                let result = match semaphore.acquire_owned().await {
                    Ok(_permit) => route_with_backoff(&routing, origin, destination, &options).await,
                    Err(_) => Err(RoutingError::ApiError("lookup cancelled".to_string())),
                };
                (id, destination, result)
            });
        }

        let mut distances = DistanceMap::with_capacity(spots.len());
        let mut failures = 0usize;

        while let Some(joined) = tasks.join_next().await {
            let (id, destination, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::warn!("Distance lookup task failed: {}", e);
                    failures += 1;
                    continue;
                }
            };

            match result {
                Ok(meters) => {
                    distances.insert(id, meters);
                }
                Err(e) if self.options.straight_line_fallback => {
                    tracing::debug!("Routing to spot {} failed ({}), using straight line", id, e);
                    failures += 1;
                    distances.insert(id, haversine_meters(origin, destination));
                }
                Err(e) => {
                    tracing::warn!("Routing to spot {} failed: {}", id, e);
                    failures += 1;
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                "{} of {} distance lookups failed (fallback {})",
                failures,
                spots.len(),
                if self.options.straight_line_fallback { "on" } else { "off" }
            );
        }

        distances
    }
}

async fn route_with_backoff(
    routing: &RoutingClient,
    origin: Coordinates,
    destination: Coordinates,
    options: &ResolverOptions,
) -> Result<f64, RoutingError> {
    let mut attempt = 0;
    loop {
        match routing.walking_route(origin, destination).await {
            Ok(route) => return Ok(route.distance_meters),
            Err(e) if e.is_retryable() && attempt < options.max_retries => {
                let delay = backoff_delay(options, attempt);
                tracing::debug!("Routing rate limited, retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Exponential delay for the given retry attempt, capped at `max_backoff`
fn backoff_delay(options: &ResolverOptions, attempt: u32) -> Duration {
    options
        .backoff
        .saturating_mul(2u32.saturating_pow(attempt))
        .min(options.max_backoff)
}
