//! Metro directions via the external routing provider.
//!
//! This is a deliberately thin adapter: the provider computes the route;
//! we only shape its transit steps into rail segments and line changes.
//! Anything beyond SUBWAY/RAIL steps is ignored.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::geo::Coordinate;

/// Default routing endpoint.
const DEFAULT_ENDPOINT: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

/// Errors from the metro directions client.
#[derive(Debug, thiserror::Error)]
pub enum MetroError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("no metro routes found")]
    NoRoutes,
}

/// Configuration for the metro client.
#[derive(Debug, Clone)]
pub struct MetroConfig {
    pub api_key: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl MetroConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: 15,
        }
    }

    /// Point at a different endpoint (for testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// One rail ride between two stations on a single line.
#[derive(Debug, Clone)]
pub struct MetroSegment {
    pub line_name: String,
    pub vehicle_type: String,
    pub departure_station: String,
    pub arrival_station: String,
    pub num_stops: i64,
    pub duration_seconds: i64,
    /// Stations in travel order, endpoints included.
    pub stations: Vec<String>,
}

/// An interchange between two lines.
#[derive(Debug, Clone)]
pub struct LineChange {
    pub station: String,
    pub from_line: String,
    pub to_line: String,
}

/// A complete metro route.
#[derive(Debug, Clone)]
pub struct MetroRoute {
    pub total_duration_seconds: i64,
    pub total_distance_meters: i64,
    pub segments: Vec<MetroSegment>,
    pub line_changes: Vec<LineChange>,
}

impl MetroRoute {
    /// Every station touched, in travel order, deduplicated.
    pub fn stations(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut ordered = Vec::new();
        for segment in &self.segments {
            for station in &segment.stations {
                if seen.insert(station.clone()) {
                    ordered.push(station.clone());
                }
            }
        }
        ordered
    }
}

/// Thin HTTP client for the external routing provider.
pub struct MetroClient {
    http: reqwest::Client,
    endpoint: String,
}

impl MetroClient {
    pub fn new(config: MetroConfig) -> Result<Self, MetroError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| MetroError::Upstream {
            status: 0,
            message: "invalid API key format".to_string(),
        })?;
        headers.insert("X-Goog-Api-Key", api_key);
        headers.insert("X-Goog-FieldMask", HeaderValue::from_static("routes"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint,
        })
    }

    /// Compute a metro route between two coordinates.
    pub async fn route(
        &self,
        pickup: Coordinate,
        drop: Coordinate,
    ) -> Result<MetroRoute, MetroError> {
        let payload = json!({
            "origin": { "location": { "latLng": {
                "latitude": pickup.lat(), "longitude": pickup.lng() } } },
            "destination": { "location": { "latLng": {
                "latitude": drop.lat(), "longitude": drop.lng() } } },
            "travelMode": "TRANSIT",
            "transitPreferences": { "allowedTravelModes": ["SUBWAY"] },
            "computeAlternativeRoutes": false,
            "languageCode": "en",
            "regionCode": "IN",
        });

        let response = self.http.post(&self.endpoint).json(&payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MetroError::Upstream {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let parsed: RoutesResponse =
            serde_json::from_str(&body).map_err(|e| MetroError::Json(e.to_string()))?;

        let route = parsed
            .routes
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(MetroError::NoRoutes)?;

        let shaped = shape_route(route);
        debug!(
            segments = shaped.segments.len(),
            changes = shaped.line_changes.len(),
            "metro route shaped"
        );
        Ok(shaped)
    }
}

#[derive(Debug, Deserialize)]
struct RoutesResponse {
    routes: Option<Vec<ApiRoute>>,
}

#[derive(Debug, Deserialize)]
struct ApiRoute {
    duration: Option<String>,
    #[serde(rename = "distanceMeters")]
    distance_meters: Option<i64>,
    legs: Option<Vec<ApiLeg>>,
}

#[derive(Debug, Deserialize)]
struct ApiLeg {
    steps: Option<Vec<ApiStep>>,
}

#[derive(Debug, Deserialize)]
struct ApiStep {
    #[serde(rename = "travelMode")]
    travel_mode: Option<String>,
    #[serde(rename = "staticDuration")]
    static_duration: Option<String>,
    #[serde(rename = "transitDetails")]
    transit_details: Option<ApiTransitDetails>,
}

#[derive(Debug, Deserialize)]
struct ApiTransitDetails {
    #[serde(rename = "stopDetails")]
    stop_details: Option<ApiStopDetails>,
    #[serde(rename = "transitLine")]
    transit_line: Option<ApiTransitLine>,
    headsign: Option<String>,
    #[serde(rename = "stopCount")]
    stop_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiStopDetails {
    #[serde(rename = "departureStop")]
    departure_stop: Option<ApiStop>,
    #[serde(rename = "arrivalStop")]
    arrival_stop: Option<ApiStop>,
    #[serde(rename = "intermediateStops")]
    intermediate_stops: Option<Vec<ApiStop>>,
}

#[derive(Debug, Deserialize)]
struct ApiStop {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTransitLine {
    name: Option<String>,
    #[serde(rename = "nameShort")]
    name_short: Option<String>,
    vehicle: Option<ApiVehicle>,
}

#[derive(Debug, Deserialize)]
struct ApiVehicle {
    #[serde(rename = "type")]
    vehicle_type: Option<String>,
}

/// Parse a provider duration like "930s" into seconds.
fn parse_duration_secs(s: &str) -> i64 {
    s.strip_suffix('s').and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn stop_name(stop: Option<&ApiStop>) -> String {
    stop.and_then(|s| s.name.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Shape a raw provider route into rail segments and line changes.
fn shape_route(route: ApiRoute) -> MetroRoute {
    let mut segments = Vec::new();

    for leg in route.legs.unwrap_or_default() {
        for step in leg.steps.unwrap_or_default() {
            if step.travel_mode.as_deref() != Some("TRANSIT") {
                continue;
            }
            let Some(transit) = step.transit_details else {
                continue;
            };

            let line = transit.transit_line.as_ref();
            let vehicle_type = line
                .and_then(|l| l.vehicle.as_ref())
                .and_then(|v| v.vehicle_type.clone())
                .unwrap_or_else(|| "SUBWAY".to_string());
            if vehicle_type != "SUBWAY" && vehicle_type != "RAIL" {
                continue;
            }

            let stop_details = transit.stop_details.as_ref();
            let departure_station = stop_name(stop_details.and_then(|d| d.departure_stop.as_ref()));
            let arrival_station = stop_name(stop_details.and_then(|d| d.arrival_stop.as_ref()));

            let line_name = line
                .and_then(|l| l.name_short.clone().or_else(|| l.name.clone()))
                .or_else(|| transit.headsign.clone())
                .unwrap_or_else(|| "Unknown Line".to_string());

            let mut stations = vec![departure_station.clone()];
            for stop in stop_details
                .and_then(|d| d.intermediate_stops.as_ref())
                .into_iter()
                .flatten()
            {
                stations.push(stop.name.clone().unwrap_or_else(|| "Unknown".to_string()));
            }
            stations.push(arrival_station.clone());

            segments.push(MetroSegment {
                line_name,
                vehicle_type,
                departure_station,
                arrival_station,
                num_stops: transit.stop_count.unwrap_or(0),
                duration_seconds: step
                    .static_duration
                    .as_deref()
                    .map(parse_duration_secs)
                    .unwrap_or(0),
                stations,
            });
        }
    }

    let line_changes = derive_line_changes(&segments);

    MetroRoute {
        total_duration_seconds: route.duration.as_deref().map(parse_duration_secs).unwrap_or(0),
        total_distance_meters: route.distance_meters.unwrap_or(0),
        segments,
        line_changes,
    }
}

fn derive_line_changes(segments: &[MetroSegment]) -> Vec<LineChange> {
    segments
        .windows(2)
        .filter(|pair| pair[0].line_name != pair[1].line_name)
        .map(|pair| LineChange {
            station: pair[1].departure_station.clone(),
            from_line: pair[0].line_name.clone(),
            to_line: pair[1].line_name.clone(),
        })
        .collect()
}
