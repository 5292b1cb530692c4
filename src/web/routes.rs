//! HTTP route handlers.
//!
//! The transport boundary is the only place where failures become status
//! codes: bad input is a 400, anything unexpected is a generic 500. A
//! disabled subsystem (no feed, no metro key) answers with an empty
//! success body rather than an error.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{error, warn};

use crate::geo::Coordinate;
use crate::planner::{ItineraryPlanner, QueryTime};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/compare-fares", post(compare_fares))
        .route("/api/bus-routes", post(bus_routes))
        .route("/api/metro-route", post(metro_route))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Validate a trip request body into a coordinate pair.
///
/// The body is parsed manually so that absent or non-numeric coordinates
/// surface as a 400 with a useful message.
fn parse_trip_request(body: &Bytes) -> Result<(Coordinate, Coordinate), AppError> {
    let req: TripRequest = serde_json::from_slice(body).map_err(|e| AppError::BadRequest {
        message: format!("invalid JSON body: {e}"),
    })?;

    let pickup = coordinate_from(req.pickup, "pickup")?;
    let drop = coordinate_from(req.drop, "drop")?;
    Ok((pickup, drop))
}

fn coordinate_from(body: Option<CoordBody>, which: &str) -> Result<Coordinate, AppError> {
    let body = body.ok_or_else(|| AppError::BadRequest {
        message: format!("missing {which} coordinate"),
    })?;
    let (Some(lat), Some(lng)) = (body.lat, body.lng) else {
        return Err(AppError::BadRequest {
            message: format!("{which} coordinate must have numeric lat and lng"),
        });
    };
    Coordinate::new(lat, lng).map_err(|e| AppError::BadRequest {
        message: format!("{which}: {e}"),
    })
}

/// Aggregate fare estimates across all platforms.
async fn compare_fares(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompareFaresResponse>, AppError> {
    let (pickup, drop) = parse_trip_request(&body)?;

    let quotes = state.aggregator.get_quotes(pickup, drop).await;
    let estimates: Vec<FareQuoteDto> = quotes.iter().map(FareQuoteDto::from_quote).collect();

    Ok(Json(CompareFaresResponse {
        success: true,
        count: estimates.len(),
        estimates,
    }))
}

/// Plan bus itineraries from the static schedule.
async fn bus_routes(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BusRoutesResponse>, AppError> {
    let (pickup, drop) = parse_trip_request(&body)?;

    let routes = match &state.schedule {
        Some(index) => {
            let planner = ItineraryPlanner::new(index, &state.planner_config);
            planner
                .find_itineraries(pickup, drop, QueryTime::now_local())
                .iter()
                .map(BusRouteDto::from_itinerary)
                .collect()
        }
        // Feed unavailable: planning is disabled, not an error
        None => Vec::new(),
    };

    Ok(Json(BusRoutesResponse {
        success: true,
        count: routes.len(),
        routes,
    }))
}

/// Metro directions through the external provider.
async fn metro_route(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MetroRoutesResponse>, AppError> {
    let (pickup, drop) = parse_trip_request(&body)?;

    let routes = match &state.metro {
        Some(client) => match client.route(pickup, drop).await {
            Ok(route) => vec![MetroRouteDto::from_route(&route)],
            Err(e) => {
                warn!(error = %e, "metro route lookup failed");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Ok(Json(MetroRoutesResponse {
        success: true,
        count: routes.len(),
        routes,
    }))
}

/// Application error type; the sole translator from failures to HTTP.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Internal { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Internal { message } => {
                // Full detail stays in the log; the caller gets a generic body
                error!(%message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: message,
        });
        (status, body).into_response()
    }
}
