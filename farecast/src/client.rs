//! HTTP clients for the fare prediction and place search services

use crate::config::{ApiConfig, PlaceSearchConfig};
use crate::environment::{FareApi, PlaceSearch, ServiceFuture, ServiceResult};
use crate::error::FareError;
use crate::types::{
    Coordinates, LocationSuggestion, ManualPredictResponse, RidePayload, SmartPredictRequest,
    SmartPredictResponse,
};
use farecast_runtime::HealthCheck;
use farecast_runtime::metrics::{FareApiMetrics, PlaceSearchMetrics};
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

fn parse_url(url: String) -> Result<Url, FareError> {
    Url::parse(&url).map_err(|e| FareError::InvalidEndpoint {
        url,
        reason: e.to_string(),
    })
}

fn build_client(timeout: Duration, user_agent: &str) -> Result<Client, FareError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .map_err(|e| FareError::Transport(e.to_string()))
}

/// Fare prediction service client
#[derive(Clone)]
pub struct HttpFareClient {
    client: Client,
    predict_url: Url,
    smart_predict_url: Url,
    health_url: Url,
}

impl HttpFareClient {
    /// Create a client for the configured service
    ///
    /// # Errors
    ///
    /// Returns [`FareError::InvalidEndpoint`] if the base URL is not a valid URL.
    pub fn new(config: &ApiConfig) -> Result<Self, FareError> {
        Ok(Self {
            client: build_client(config.timeout(), &config.user_agent)?,
            predict_url: parse_url(config.predict_url())?,
            smart_predict_url: parse_url(config.smart_predict_url())?,
            health_url: parse_url(config.health_url())?,
        })
    }

    async fn post<B, T>(&self, endpoint: &'static str, url: &Url, body: &B) -> ServiceResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let start = Instant::now();
        let result = self.try_post(url, body).await;
        FareApiMetrics::record_request(endpoint, result.is_ok(), start.elapsed());

        match &result {
            Ok(_) => tracing::debug!(endpoint, elapsed_ms = start.elapsed().as_millis(), "Fare request succeeded"),
            Err(error) => tracing::warn!(endpoint, %error, "Fare request failed"),
        }
        result
    }

    async fn try_post<B, T>(&self, url: &Url, body: &B) -> ServiceResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| FareError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FareError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FareError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FareError::Decode(e.to_string()))
    }

    /// Probe `/health`
    pub async fn check_health(&self) -> HealthCheck {
        let start = Instant::now();
        let result = self.client.get(self.health_url.clone()).send().await;
        FareApiMetrics::record_request(
            "health",
            result.as_ref().is_ok_and(|r| r.status().is_success()),
            start.elapsed(),
        );

        match result {
            Ok(response) if response.status().is_success() => HealthCheck::healthy("fare-api"),
            Ok(response) => {
                let status = response.status();
                HealthCheck::degraded("fare-api", format!("Health probe returned {status}"))
                    .with_metadata("status", status.as_u16().to_string())
            },
            Err(error) => HealthCheck::unhealthy("fare-api", error.to_string()),
        }
    }
}

impl FareApi for HttpFareClient {
    fn predict(&self, payload: RidePayload) -> ServiceFuture<ManualPredictResponse> {
        let client = self.clone();
        Box::pin(async move {
            client
                .post("predict", &client.predict_url, &payload)
                .await
        })
    }

    fn smart_predict(&self, request: SmartPredictRequest) -> ServiceFuture<SmartPredictResponse> {
        let client = self.clone();
        Box::pin(async move {
            client
                .post("smart_predict", &client.smart_predict_url, &request)
                .await
        })
    }

    fn health(&self) -> Pin<Box<dyn Future<Output = HealthCheck> + Send>> {
        let client = self.clone();
        Box::pin(async move { client.check_health().await })
    }
}

/// A candidate as the place search service returns it
#[derive(Debug, serde::Deserialize)]
struct PlaceCandidate {
    display_name: String,
    lat: String,
    lon: String,
}

impl PlaceCandidate {
    fn into_suggestion(self) -> Option<LocationSuggestion> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        Some(LocationSuggestion {
            display_name: self.display_name,
            coordinates: Coordinates::new(latitude, longitude),
        })
    }
}

/// Nominatim-compatible place search client
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    search_url: Url,
    country: String,
    limit: u32,
}

impl NominatimClient {
    /// Create a client for the configured service
    ///
    /// # Errors
    ///
    /// Returns [`FareError::InvalidEndpoint`] if the base URL is not a valid URL.
    pub fn new(config: &PlaceSearchConfig, api: &ApiConfig) -> Result<Self, FareError> {
        Ok(Self {
            client: build_client(api.timeout(), &api.user_agent)?,
            search_url: parse_url(config.search_url())?,
            country: config.country.clone(),
            limit: config.limit,
        })
    }

    /// Look up candidates for `query`
    ///
    /// Candidates whose coordinates do not parse are dropped.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status or malformed body.
    pub async fn lookup(&self, query: &str) -> ServiceResult<Vec<LocationSuggestion>> {
        let start = Instant::now();
        let result = self.try_lookup(query).await;
        PlaceSearchMetrics::record_query(result.is_ok(), start.elapsed());

        if let Err(error) = &result {
            tracing::debug!(query, %error, "Place lookup failed");
        }
        result
    }

    async fn try_lookup(&self, query: &str) -> ServiceResult<Vec<LocationSuggestion>> {
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(self.search_url.clone())
            .query(&[
                ("format", "json"),
                ("q", query),
                ("limit", limit.as_str()),
                ("countrycodes", self.country.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FareError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FareError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FareError::Transport(e.to_string()))?;
        let candidates: Vec<PlaceCandidate> =
            serde_json::from_slice(&bytes).map_err(|e| FareError::Decode(e.to_string()))?;

        let total = candidates.len();
        let suggestions: Vec<_> = candidates
            .into_iter()
            .filter_map(PlaceCandidate::into_suggestion)
            .collect();
        if suggestions.len() < total {
            tracing::debug!(dropped = total - suggestions.len(), "Dropped candidates with unparsable coordinates");
        }

        Ok(suggestions)
    }
}

impl PlaceSearch for NominatimClient {
    fn search(&self, query: String) -> ServiceFuture<Vec<LocationSuggestion>> {
        let client = self.clone();
        Box::pin(async move { client.lookup(&query).await })
    }
}
