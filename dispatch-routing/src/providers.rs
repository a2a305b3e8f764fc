use async_trait::async_trait;
use dispatch_shared::RouteInfo;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// A single provider call failed. Recovered locally by the fallback chain,
/// never surfaced to the coordinator. Timeouts land in `Http` and are
/// treated exactly like any other provider error.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("response missing {0}")]
    MissingData(&'static str),
}

/// Directions provider: road distance and drive time between two points.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn route(&self, origin: (f64, f64), destination: (f64, f64)) -> Result<RouteInfo, ProviderError>;
}

/// Address-to-coordinates provider.
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn geocode(&self, address: &str) -> Result<(f64, f64), ProviderError>;
}

fn http_client(timeout_seconds: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Google Maps (primary)
// ---------------------------------------------------------------------------

pub struct GoogleMaps {
    client: reqwest::Client,
    api_key: String,
    region: String,
    language: String,
}

impl GoogleMaps {
    pub fn new(api_key: impl Into<String>, region: impl Into<String>, language: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            client: http_client(timeout_seconds),
            api_key: api_key.into(),
            region: region.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: MetricValue,
    duration: MetricValue,
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GeocodeLocation,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    lat: f64,
    lng: f64,
}

#[async_trait]
impl RouteProvider for GoogleMaps {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn route(&self, origin: (f64, f64), destination: (f64, f64)) -> Result<RouteInfo, ProviderError> {
        let response = self
            .client
            .get("https://maps.googleapis.com/maps/api/directions/json")
            .query(&[
                ("origin", format!("{},{}", origin.0, origin.1)),
                ("destination", format!("{},{}", destination.0, destination.1)),
                ("key", self.api_key.clone()),
                ("region", self.region.clone()),
                ("language", self.language.clone()),
                ("mode", "driving".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: DirectionsResponse = response.json().await?;
        let leg = body
            .routes
            .first()
            .and_then(|r| r.legs.first())
            .ok_or(ProviderError::MissingData("routes[0].legs[0]"))?;

        Ok(RouteInfo {
            km: leg.distance.value / 1000.0,
            minutes: leg.duration.value / 60.0,
        })
    }
}

#[async_trait]
impl GeocodeProvider for GoogleMaps {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn geocode(&self, address: &str) -> Result<(f64, f64), ProviderError> {
        let response = self
            .client
            .get("https://maps.googleapis.com/maps/api/geocode/json")
            .query(&[
                ("address", address),
                ("key", self.api_key.as_str()),
                ("region", self.region.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let body: GeocodeResponse = response.json().await?;
        if body.status != "OK" {
            return Err(ProviderError::MissingData("status OK"));
        }
        let location = body
            .results
            .first()
            .map(|r| &r.geometry.location)
            .ok_or(ProviderError::MissingData("results[0]"))?;

        Ok((location.lat, location.lng))
    }
}

// ---------------------------------------------------------------------------
// OpenRouteService (secondary)
// ---------------------------------------------------------------------------

pub struct OpenRouteService {
    client: reqwest::Client,
    api_key: String,
    language: String,
}

impl OpenRouteService {
    pub fn new(api_key: impl Into<String>, language: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            client: http_client(timeout_seconds),
            api_key: api_key.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrsDirectionsResponse {
    #[serde(default)]
    routes: Vec<OrsRoute>,
}

#[derive(Debug, Deserialize)]
struct OrsRoute {
    summary: OrsSummary,
}

#[derive(Debug, Deserialize)]
struct OrsSummary {
    /// km when the request asks for `units: km`
    distance: f64,
    /// seconds
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct OrsGeocodeResponse {
    #[serde(default)]
    features: Vec<OrsFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsFeature {
    geometry: OrsGeometry,
}

#[derive(Debug, Deserialize)]
struct OrsGeometry {
    /// [lng, lat]
    coordinates: Vec<f64>,
}

#[async_trait]
impl RouteProvider for OpenRouteService {
    fn name(&self) -> &'static str {
        "ors"
    }

    async fn route(&self, origin: (f64, f64), destination: (f64, f64)) -> Result<RouteInfo, ProviderError> {
        let body = serde_json::json!({
            "coordinates": [[origin.1, origin.0], [destination.1, destination.0]],
            "units": "km",
            "language": self.language,
        });

        let response = self
            .client
            .post("https://api.openrouteservice.org/v2/directions/driving-car")
            .header("Authorization", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let parsed: OrsDirectionsResponse = response.json().await?;
        let summary = parsed
            .routes
            .first()
            .map(|r| &r.summary)
            .ok_or(ProviderError::MissingData("routes[0].summary"))?;

        Ok(RouteInfo {
            km: summary.distance,
            minutes: summary.duration / 60.0,
        })
    }
}

#[async_trait]
impl GeocodeProvider for OpenRouteService {
    fn name(&self) -> &'static str {
        "ors"
    }

    async fn geocode(&self, address: &str) -> Result<(f64, f64), ProviderError> {
        let response = self
            .client
            .get("https://api.openrouteservice.org/geocode/search")
            .header("Authorization", &self.api_key)
            .query(&[("text", address), ("size", "1"), ("lang", self.language.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let parsed: OrsGeocodeResponse = response.json().await?;
        let coords = parsed
            .features
            .first()
            .map(|f| &f.geometry.coordinates)
            .ok_or(ProviderError::MissingData("features[0]"))?;
        if coords.len() < 2 {
            return Err(ProviderError::MissingData("geometry.coordinates"));
        }

        Ok((coords[1], coords[0]))
    }
}
