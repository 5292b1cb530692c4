//! Wire data transfer objects.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::metro::MetroRoute;
use crate::planner::{Itinerary, Segment};
use crate::quotes::FareQuote;

/// Request body for fare comparison and bus routing.
#[derive(Debug, Deserialize)]
pub struct TripRequest {
    pub pickup: Option<CoordBody>,
    pub drop: Option<CoordBody>,
}

/// A coordinate as submitted by the client. Fields are optional so that
/// absence can be reported as a 400 rather than a deserialization failure.
#[derive(Debug, Deserialize)]
pub struct CoordBody {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A fare estimate on the wire.
#[derive(Debug, Serialize)]
pub struct FareQuoteDto {
    pub platform: String,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: String,
    pub price: i64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    pub source: String,
    pub confidence: String,
}

impl FareQuoteDto {
    pub fn from_quote(quote: &FareQuote) -> Self {
        Self {
            platform: quote.platform.clone(),
            vehicle_type: quote.vehicle_class.clone(),
            price: quote.price,
            currency: quote.currency.clone(),
            eta: quote.eta.clone(),
            source: quote.provenance.as_str().to_string(),
            confidence: quote.confidence.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompareFaresResponse {
    pub success: bool,
    pub count: usize,
    pub estimates: Vec<FareQuoteDto>,
}

/// A bare lat/lng on the wire.
#[derive(Debug, Serialize)]
pub struct LatLngDto {
    pub lat: f64,
    pub lng: f64,
}

impl LatLngDto {
    fn from_coord(c: Coordinate) -> Self {
        Self {
            lat: c.lat(),
            lng: c.lng(),
        }
    }
}

/// A stop along an itinerary's map path.
#[derive(Debug, Serialize)]
pub struct PathPointDto {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub sequence: usize,
}

/// One itinerary segment on the wire.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentDto {
    Walk {
        from: LatLngDto,
        to: LatLngDto,
        distance: String,
        duration: String,
        polyline: Vec<LatLngDto>,
    },
    Bus {
        route_name: String,
        board_stop: String,
        alight_stop: String,
        departure_time: String,
        arrival_time: String,
        stops_count: usize,
        distance: String,
        duration: String,
        fare: i64,
        polyline: Vec<LatLngDto>,
    },
    Wait {
        stop: String,
        duration: String,
    },
}

impl SegmentDto {
    fn from_segment(segment: &Segment) -> Self {
        match segment {
            Segment::Walk(w) => SegmentDto::Walk {
                from: LatLngDto::from_coord(w.from),
                to: LatLngDto::from_coord(w.to),
                distance: format_km(w.distance_km),
                duration: format_mins(w.duration_mins),
                polyline: w.polyline().into_iter().map(LatLngDto::from_coord).collect(),
            },
            Segment::Bus(b) => SegmentDto::Bus {
                route_name: b.route_short_name.clone(),
                board_stop: b.board_stop().name.clone(),
                alight_stop: b.alight_stop().name.clone(),
                departure_time: b.depart.to_string(),
                arrival_time: b.arrive.to_string(),
                stops_count: b.stops.len() - 1,
                distance: format_km(b.distance_km),
                duration: format_mins(b.duration_mins),
                fare: b.fare,
                polyline: b.polyline().map(LatLngDto::from_coord).collect(),
            },
            Segment::Wait(w) => SegmentDto::Wait {
                stop: w.stop.name.clone(),
                duration: format_mins(w.wait_mins),
            },
        }
    }
}

/// A bus itinerary on the wire.
#[derive(Debug, Serialize)]
pub struct BusRouteDto {
    pub route_name: String,
    pub start_stop: String,
    pub end_stop: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub stops_count: usize,
    pub fare: i64,
    pub path: Vec<PathPointDto>,
    pub segments: Vec<SegmentDto>,
    pub total_distance: String,
}

impl BusRouteDto {
    pub fn from_itinerary(it: &Itinerary) -> Self {
        // Bus stops in travel order; a transfer stop closes one leg and
        // opens the next, so collapse consecutive duplicates.
        let mut path: Vec<PathPointDto> = Vec::new();
        for stop in it.path() {
            if path.last().is_some_and(|last| last.name == stop.name) {
                continue;
            }
            path.push(PathPointDto {
                lat: stop.coord.lat(),
                lng: stop.coord.lng(),
                name: stop.name.clone(),
                sequence: path.len() + 1,
            });
        }

        Self {
            route_name: it.route_label(),
            start_stop: it
                .board_stop()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            end_stop: it
                .alight_stop()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
            departure_time: it.departure().to_string(),
            arrival_time: it.arrival().to_string(),
            duration: format_mins(it.total_duration_mins()),
            stops_count: path.len().saturating_sub(1),
            fare: it.total_fare(),
            path,
            segments: it.segments().iter().map(SegmentDto::from_segment).collect(),
            total_distance: format_km(it.total_distance_km()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BusRoutesResponse {
    pub success: bool,
    pub count: usize,
    pub routes: Vec<BusRouteDto>,
}

/// A metro segment on the wire.
#[derive(Debug, Serialize)]
pub struct MetroSegmentDto {
    pub line_name: String,
    pub vehicle_type: String,
    pub departure_station: String,
    pub arrival_station: String,
    pub num_stops: i64,
    pub duration_seconds: i64,
    pub duration: String,
    pub stations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LineChangeDto {
    pub station: String,
    pub from_line: String,
    pub to_line: String,
}

/// A metro route on the wire.
#[derive(Debug, Serialize)]
pub struct MetroRouteDto {
    pub total_duration_seconds: i64,
    pub total_duration: String,
    pub total_distance_meters: i64,
    pub segments: Vec<MetroSegmentDto>,
    pub metro_stations: Vec<String>,
    pub line_changes: Vec<LineChangeDto>,
}

impl MetroRouteDto {
    pub fn from_route(route: &MetroRoute) -> Self {
        Self {
            total_duration_seconds: route.total_duration_seconds,
            total_duration: format_mins(route.total_duration_seconds / 60),
            total_distance_meters: route.total_distance_meters,
            segments: route
                .segments
                .iter()
                .map(|s| MetroSegmentDto {
                    line_name: s.line_name.clone(),
                    vehicle_type: s.vehicle_type.clone(),
                    departure_station: s.departure_station.clone(),
                    arrival_station: s.arrival_station.clone(),
                    num_stops: s.num_stops,
                    duration_seconds: s.duration_seconds,
                    duration: format_mins(s.duration_seconds / 60),
                    stations: s.stations.clone(),
                })
                .collect(),
            metro_stations: route.stations(),
            line_changes: route
                .line_changes
                .iter()
                .map(|c| LineChangeDto {
                    station: c.station.clone(),
                    from_line: c.from_line.clone(),
                    to_line: c.to_line.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetroRoutesResponse {
    pub success: bool,
    pub count: usize,
    pub routes: Vec<MetroRouteDto>,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

fn format_mins(mins: i64) -> String {
    format!("{mins} mins")
}

fn format_km(km: f64) -> String {
    format!("{km:.1} km")
}
