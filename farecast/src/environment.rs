//! Injected dependencies shared by every booking reducer.
//!
//! The remote services sit behind [`FareApi`] and [`PlaceSearch`] so the
//! reducers can run against in-memory fakes (see [`crate::mocks`]).

use crate::config::Timings;
use crate::error::FareError;
use crate::types::{
    LocationSuggestion, ManualPredictResponse, RidePayload, SmartPredictRequest,
    SmartPredictResponse,
};
use farecast_core::environment::{Clock, SystemClock};
use farecast_runtime::{HealthCheck, HealthReport};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result of a remote service call
pub type ServiceResult<T> = Result<T, FareError>;

/// Boxed future returned by service traits
pub type ServiceFuture<T> = Pin<Box<dyn Future<Output = ServiceResult<T>> + Send>>;

/// Fare prediction service
pub trait FareApi: Send + Sync {
    /// Estimate a fare from fully specified ride conditions
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the service answers with a
    /// non-success status, or the body cannot be decoded
    fn predict(&self, payload: RidePayload) -> ServiceFuture<ManualPredictResponse>;

    /// Estimate a fare from pickup/drop text and optional coordinates
    ///
    /// # Errors
    ///
    /// Same as [`FareApi::predict`]
    fn smart_predict(&self, request: SmartPredictRequest) -> ServiceFuture<SmartPredictResponse>;

    /// Probe the service
    fn health(&self) -> Pin<Box<dyn Future<Output = HealthCheck> + Send>>;
}

/// Place-name search service
pub trait PlaceSearch: Send + Sync {
    /// Candidates for a partial place name, best match first
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails; callers treat that as "no suggestions"
    fn search(&self, query: String) -> ServiceFuture<Vec<LocationSuggestion>>;
}

/// Environment for the booking reducers
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Fare prediction service
    pub fare_api: Arc<dyn FareApi>,
    /// Place search service
    pub places: Arc<dyn PlaceSearch>,
    /// Clock used to stamp results
    pub clock: Arc<dyn Clock>,
    /// Timer settings
    pub timings: Timings,
}

impl BookingEnvironment {
    /// Create an environment from its parts
    #[must_use]
    pub fn new(
        fare_api: Arc<dyn FareApi>,
        places: Arc<dyn PlaceSearch>,
        clock: Arc<dyn Clock>,
        timings: Timings,
    ) -> Self {
        Self {
            fare_api,
            places,
            clock,
            timings,
        }
    }

    /// Environment using the system clock
    #[must_use]
    pub fn with_system_clock(
        fare_api: Arc<dyn FareApi>,
        places: Arc<dyn PlaceSearch>,
        timings: Timings,
    ) -> Self {
        Self::new(fare_api, places, Arc::new(SystemClock), timings)
    }

    /// Probe the remote services, warning about any that look unwell
    pub async fn health(&self) -> HealthReport {
        let report = HealthReport::new(vec![self.fare_api.health().await]);
        for check in report.checks.iter().filter(|c| !c.status.is_healthy()) {
            tracing::warn!(
                component = %check.component,
                status = ?check.status,
                message = check.message.as_deref().unwrap_or(""),
                "Service is not healthy"
            );
        }
        report
    }
}

impl std::fmt::Debug for BookingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEnvironment")
            .field("timings", &self.timings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockFareApi, MockPlaceSearch};
    use farecast_runtime::HealthStatus;
    use farecast_testing::{init_test_tracing, test_clock};

    fn env(fare_api: MockFareApi) -> BookingEnvironment {
        BookingEnvironment::new(
            Arc::new(fare_api),
            Arc::new(MockPlaceSearch::default()),
            Arc::new(test_clock()),
            Timings::default(),
        )
    }

    #[tokio::test]
    async fn health_reports_a_reachable_fare_service() {
        let report = env(MockFareApi::new()).health().await;
        assert!(report.is_healthy());
        assert_eq!(report.checks[0].component, "fare-api");
    }

    #[tokio::test]
    async fn health_reports_a_down_fare_service() {
        init_test_tracing();
        let report = env(MockFareApi::new().unhealthy()).health().await;

        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert_eq!(report.checks[0].message.as_deref(), Some("mock service down"));
    }
}
