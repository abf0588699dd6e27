//! In-memory service fakes for development and testing.
//!
//! Responses are scripted up front; every request is recorded so tests can
//! inspect exactly what would have gone over the wire.

use crate::environment::{FareApi, PlaceSearch, ServiceFuture};
use crate::error::FareError;
use crate::types::{
    Coordinates, FareExplanation, LocationSuggestion, ManualPredictResponse, RideContext,
    RidePayload, SmartPredictRequest, SmartPredictResponse,
};
use farecast_runtime::HealthCheck;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A scripted reply: optional latency, then the result
#[derive(Debug, Clone)]
struct Scripted<T> {
    latency: Duration,
    result: Result<T, FareError>,
}

/// Scripted fare service
///
/// Replies are consumed in order; once the script runs out the default
/// reply is used.
#[derive(Clone, Default)]
pub struct MockFareApi {
    smart: Arc<Mutex<VecDeque<Scripted<SmartPredictResponse>>>>,
    manual: Arc<Mutex<VecDeque<Scripted<ManualPredictResponse>>>>,
    smart_requests: Arc<Mutex<Vec<SmartPredictRequest>>>,
    manual_requests: Arc<Mutex<Vec<RidePayload>>>,
    healthy: Arc<Mutex<Option<bool>>>,
}

impl MockFareApi {
    /// A fake that answers every request successfully and immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a smart prediction reply
    #[must_use]
    pub fn with_smart_reply(self, latency: Duration, result: Result<SmartPredictResponse, FareError>) -> Self {
        lock(&self.smart).push_back(Scripted { latency, result });
        self
    }

    /// Queue a manual prediction reply
    #[must_use]
    pub fn with_manual_reply(self, latency: Duration, result: Result<ManualPredictResponse, FareError>) -> Self {
        lock(&self.manual).push_back(Scripted { latency, result });
        self
    }

    /// Make the health probe fail
    #[must_use]
    pub fn unhealthy(self) -> Self {
        *lock(&self.healthy) = Some(false);
        self
    }

    /// Smart requests received so far
    #[must_use]
    pub fn smart_requests(&self) -> Vec<SmartPredictRequest> {
        lock(&self.smart_requests).clone()
    }

    /// Manual requests received so far
    #[must_use]
    pub fn manual_requests(&self) -> Vec<RidePayload> {
        lock(&self.manual_requests).clone()
    }
}

impl FareApi for MockFareApi {
    fn predict(&self, payload: RidePayload) -> ServiceFuture<ManualPredictResponse> {
        lock(&self.manual_requests).push(payload);
        let scripted = lock(&self.manual).pop_front().unwrap_or(Scripted {
            latency: Duration::ZERO,
            result: Ok(manual_response(250.0, 1.25)),
        });
        Box::pin(reply(scripted))
    }

    fn smart_predict(&self, request: SmartPredictRequest) -> ServiceFuture<SmartPredictResponse> {
        lock(&self.smart_requests).push(request);
        let scripted = lock(&self.smart).pop_front().unwrap_or(Scripted {
            latency: Duration::ZERO,
            result: Ok(smart_response(180.0, 1.2)),
        });
        Box::pin(reply(scripted))
    }

    fn health(&self) -> Pin<Box<dyn Future<Output = HealthCheck> + Send>> {
        let healthy = lock(&self.healthy).unwrap_or(true);
        Box::pin(async move {
            if healthy {
                HealthCheck::healthy("fare-api")
            } else {
                HealthCheck::unhealthy("fare-api", "mock service down")
            }
        })
    }
}

async fn reply<T>(scripted: Scripted<T>) -> Result<T, FareError> {
    if !scripted.latency.is_zero() {
        tokio::time::sleep(scripted.latency).await;
    }
    scripted.result
}

/// Scripted place search
///
/// Every query returns the candidates whose name contains the query
/// (case-insensitive), or fails when configured to.
#[derive(Clone, Default)]
pub struct MockPlaceSearch {
    places: Arc<Vec<LocationSuggestion>>,
    failing: bool,
    latency: Duration,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockPlaceSearch {
    /// A fake knowing `places`
    #[must_use]
    pub fn new(places: Vec<LocationSuggestion>) -> Self {
        Self {
            places: Arc::new(places),
            ..Self::default()
        }
    }

    /// A fake whose every lookup fails
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queries received so far
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

impl PlaceSearch for MockPlaceSearch {
    fn search(&self, query: String) -> ServiceFuture<Vec<LocationSuggestion>> {
        lock(&self.queries).push(query.clone());

        let result = if self.failing {
            Err(FareError::Transport("mock lookup failed".to_string()))
        } else {
            let needle = query.to_lowercase();
            Ok(self
                .places
                .iter()
                .filter(|p| p.display_name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        };

        Box::pin(reply(Scripted {
            latency: self.latency,
            result,
        }))
    }
}

/// A place suggestion
#[must_use]
pub fn place(name: &str, latitude: f64, longitude: f64) -> LocationSuggestion {
    LocationSuggestion {
        display_name: name.to_string(),
        coordinates: Coordinates::new(latitude, longitude),
    }
}

/// A complete smart prediction response
#[must_use]
pub fn smart_response(base_fare: f64, surge_multiplier: f64) -> SmartPredictResponse {
    SmartPredictResponse {
        base_fare,
        final_fare: (base_fare * surge_multiplier * 100.0).round() / 100.0,
        surge_multiplier,
        context: RideContext {
            distance_km: 12.4,
            duration_min: 31.0,
            weather: "Clear".to_string(),
            traffic: "Moderate".to_string(),
            demand: "Medium".to_string(),
        },
        explanation: FareExplanation {
            traffic_impact: "Moderate traffic".to_string(),
            weather_impact: "Clear skies".to_string(),
            demand_impact: "Normal demand".to_string(),
        },
    }
}

/// A manual prediction response
#[must_use]
pub const fn manual_response(final_fare: f64, surge_multiplier: f64) -> ManualPredictResponse {
    ManualPredictResponse {
        final_fare,
        surge_multiplier,
    }
}
