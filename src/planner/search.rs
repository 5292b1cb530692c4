//! Direct and one-transfer itinerary search.
//!
//! The search works over the representative call pattern of each route:
//! a route is usable when the board stop precedes the alight stop on that
//! pattern, and a concrete trip is then chosen as the earliest feasible
//! boarding. Transfer discovery scans forward along pickup-side routes for
//! stops covered by drop-side routes.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Local, NaiveDate, Timelike};
use tracing::{debug, info, instrument};

use crate::geo::Coordinate;
use crate::gtfs::{ScheduleIndex, Stop, StopTime};

use super::config::PlannerConfig;
use super::itinerary::{BusLeg, Itinerary, PathStop, TransferWait, WalkLeg};

/// The planning reference instant: a service date plus seconds since that
/// day's local midnight.
#[derive(Debug, Clone, Copy)]
pub struct QueryTime {
    pub date: NaiveDate,
    pub secs: i32,
}

impl QueryTime {
    /// Capture the host wall clock as a planning reference.
    pub fn now_local() -> Self {
        let now = Local::now();
        let t = now.time();
        Self {
            date: now.date_naive(),
            secs: (t.hour() * 3600 + t.minute() * 60 + t.second()) as i32,
        }
    }

    pub fn new(date: NaiveDate, secs: i32) -> Self {
        Self { date, secs }
    }
}

/// A nearby stop with its straight-line distance from an endpoint.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    stop: &'a Stop,
    distance_km: f64,
}

/// A concrete trip chosen for a board/alight pair.
struct TripSelection<'a> {
    board: &'a StopTime,
    alight: &'a StopTime,
    /// The trip's full call sequence, ordered.
    calls: &'a [StopTime],
}

/// Itinerary planner over an immutable schedule index.
pub struct ItineraryPlanner<'a> {
    index: &'a ScheduleIndex,
    config: &'a PlannerConfig,
}

impl<'a> ItineraryPlanner<'a> {
    pub fn new(index: &'a ScheduleIndex, config: &'a PlannerConfig) -> Self {
        Self { index, config }
    }

    /// Find up to `max_results` itineraries from pickup to drop, departing
    /// at or after the query time.
    ///
    /// Returns an empty list when either endpoint has no stop within the
    /// search radius, or nothing runs. Never fails on valid coordinates.
    #[instrument(skip_all)]
    pub fn find_itineraries(
        &self,
        pickup: Coordinate,
        drop: Coordinate,
        at: QueryTime,
    ) -> Vec<Itinerary> {
        let pickup_stops = self.nearby_stops(pickup);
        let drop_stops = self.nearby_stops(drop);

        debug!(
            pickup_stops = pickup_stops.len(),
            drop_stops = drop_stops.len(),
            "resolved nearby stops"
        );

        if pickup_stops.is_empty() || drop_stops.is_empty() {
            return Vec::new();
        }

        let mut itineraries = self.direct_search(pickup, drop, &pickup_stops, &drop_stops, at);
        let direct_found = itineraries.len();

        if direct_found < self.config.direct_target {
            let transfers = self.transfer_search(pickup, drop, &pickup_stops, &drop_stops, at);
            itineraries.extend(transfers);
        }

        itineraries.retain(|it| it.total_duration_mins() < self.config.max_duration_mins);
        // Stable sort: ties keep search insertion order
        itineraries.sort_by_key(Itinerary::total_duration_mins);
        itineraries.truncate(self.config.max_results);

        info!(
            direct = direct_found,
            returned = itineraries.len(),
            "itinerary search complete"
        );

        itineraries
    }

    /// Stops within the search radius, nearest first, capped.
    fn nearby_stops(&self, origin: Coordinate) -> Vec<Candidate<'a>> {
        let mut candidates: Vec<Candidate<'a>> = self
            .index
            .stops()
            .map(|stop| Candidate {
                stop,
                distance_km: origin.distance_km(&stop.coord),
            })
            .filter(|c| c.distance_km <= self.config.radius_km)
            .collect();

        candidates.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        candidates.truncate(self.config.max_nearby_stops);
        candidates
    }

    /// Map each route serving any candidate stop to the nearest such stop.
    ///
    /// Candidates must be ordered nearest-first; the first stop seen for a
    /// route wins.
    fn nearest_by_route(&self, candidates: &[Candidate<'a>]) -> BTreeMap<&'a str, Candidate<'a>> {
        let mut by_route: BTreeMap<&str, Candidate<'a>> = BTreeMap::new();
        for cand in candidates {
            for route_id in self.index.routes_at(&cand.stop.id) {
                by_route.entry(route_id).or_insert(*cand);
            }
        }
        by_route
    }

    /// One-bus itineraries over routes serving both endpoints.
    fn direct_search(
        &self,
        pickup: Coordinate,
        drop: Coordinate,
        pickup_stops: &[Candidate<'a>],
        drop_stops: &[Candidate<'a>],
        at: QueryTime,
    ) -> Vec<Itinerary> {
        let pickup_routes = self.nearest_by_route(pickup_stops);
        let drop_routes = self.nearest_by_route(drop_stops);

        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut results = Vec::new();

        for (&route_id, board_cand) in &pickup_routes {
            let Some(alight_cand) = drop_routes.get(route_id) else {
                continue;
            };
            if board_cand.stop.id == alight_cand.stop.id {
                continue;
            }

            // Direction check against the representative call pattern
            let (Some(bi), Some(ai)) = (
                self.index.position_on_route(route_id, &board_cand.stop.id),
                self.index.position_on_route(route_id, &alight_cand.stop.id),
            ) else {
                continue;
            };
            if bi >= ai {
                continue;
            }

            let Some(selection) =
                self.select_trip(route_id, &board_cand.stop.id, &alight_cand.stop.id, at.secs, at.date)
            else {
                continue;
            };

            let short_name = self
                .index
                .route(route_id)
                .map(|r| r.short_name.clone())
                .unwrap_or_else(|| route_id.to_string());
            let key = (
                short_name.clone(),
                board_cand.stop.name.clone(),
                alight_cand.stop.name.clone(),
            );
            if !seen.insert(key) {
                continue;
            }

            if let Some(bus) = self.assemble_leg(route_id, &short_name, &selection) {
                let walk_in = WalkLeg::between(
                    pickup,
                    bus.board_stop().coord,
                    self.config.walk_speed_m_per_min,
                );
                let walk_out = WalkLeg::between(
                    bus.alight_stop().coord,
                    drop,
                    self.config.walk_speed_m_per_min,
                );
                results.push(Itinerary::direct(walk_in, bus, walk_out));
            }
        }

        debug!(found = results.len(), "direct search done");
        results
    }

    /// One-transfer itineraries through a shared stop.
    fn transfer_search(
        &self,
        pickup: Coordinate,
        drop: Coordinate,
        pickup_stops: &[Candidate<'a>],
        drop_stops: &[Candidate<'a>],
        at: QueryTime,
    ) -> Vec<Itinerary> {
        let top = self.config.transfer_top_stops;
        let pickup_routes = self.nearest_by_route(&pickup_stops[..pickup_stops.len().min(top)]);
        let drop_routes = self.nearest_by_route(&drop_stops[..drop_stops.len().min(top)]);

        // Every stop lying on a drop-side route, mapped to those routes
        let mut transfer_index: HashMap<&str, Vec<&str>> = HashMap::new();
        for &drop_route in drop_routes.keys() {
            for stop_id in self.index.route_stops(drop_route) {
                transfer_index
                    .entry(stop_id.as_str())
                    .or_default()
                    .push(drop_route);
            }
        }

        let mut seen: HashSet<(String, String, String)> = HashSet::new();
        let mut results = Vec::new();

        for (&pickup_route, board_cand) in &pickup_routes {
            let pattern = self.index.route_stops(pickup_route);
            let Some(board_pos) = pattern.iter().position(|s| *s == board_cand.stop.id) else {
                continue;
            };

            // Scan forward from the board stop for reachable transfer stops
            for transfer_stop in &pattern[board_pos + 1..] {
                let Some(drop_route_ids) = transfer_index.get(transfer_stop.as_str()) else {
                    continue;
                };

                for &drop_route in drop_route_ids {
                    if drop_route == pickup_route {
                        continue;
                    }
                    let Some(alight_cand) = drop_routes.get(drop_route) else {
                        continue;
                    };

                    // The transfer stop must precede the final alight stop
                    let (Some(ti), Some(ai)) = (
                        self.index.position_on_route(drop_route, transfer_stop),
                        self.index.position_on_route(drop_route, &alight_cand.stop.id),
                    ) else {
                        continue;
                    };
                    if ti >= ai {
                        continue;
                    }

                    let key = (
                        pickup_route.to_string(),
                        transfer_stop.clone(),
                        drop_route.to_string(),
                    );
                    if seen.contains(&key) {
                        continue;
                    }

                    let Some(first) = self.select_trip(
                        pickup_route,
                        &board_cand.stop.id,
                        transfer_stop,
                        at.secs,
                        at.date,
                    ) else {
                        continue;
                    };
                    let arrive_transfer = first.alight.arrival.secs();

                    let Some(second) = self.select_trip(
                        drop_route,
                        transfer_stop,
                        &alight_cand.stop.id,
                        arrive_transfer,
                        at.date,
                    ) else {
                        continue;
                    };

                    let wait_secs = i64::from(second.board.departure.secs() - arrive_transfer);
                    let wait_mins = wait_secs / 60;
                    if wait_secs < 0 || wait_mins >= self.config.max_transfer_wait_mins {
                        continue;
                    }

                    seen.insert(key);

                    let first_name = self
                        .index
                        .route(pickup_route)
                        .map(|r| r.short_name.clone())
                        .unwrap_or_else(|| pickup_route.to_string());
                    let second_name = self
                        .index
                        .route(drop_route)
                        .map(|r| r.short_name.clone())
                        .unwrap_or_else(|| drop_route.to_string());

                    let (Some(first_leg), Some(second_leg)) = (
                        self.assemble_leg(pickup_route, &first_name, &first),
                        self.assemble_leg(drop_route, &second_name, &second),
                    ) else {
                        continue;
                    };

                    let Some(transfer_point) = self.path_stop(transfer_stop) else {
                        continue;
                    };

                    let walk_in = WalkLeg::between(
                        pickup,
                        first_leg.board_stop().coord,
                        self.config.walk_speed_m_per_min,
                    );
                    let walk_out = WalkLeg::between(
                        second_leg.alight_stop().coord,
                        drop,
                        self.config.walk_speed_m_per_min,
                    );
                    let wait = TransferWait {
                        stop: transfer_point,
                        wait_mins,
                    };

                    results.push(Itinerary::with_transfer(
                        walk_in, first_leg, wait, second_leg, walk_out,
                    ));
                }
            }
        }

        debug!(found = results.len(), "transfer search done");
        results
    }

    /// Choose the earliest feasible trip on a route for a board/alight pair.
    ///
    /// Considers only trips whose service runs on the query date, boarding
    /// at or after `earliest_secs`, and reaching the alight stop at a later
    /// sequence position on the same trip.
    fn select_trip(
        &self,
        route_id: &str,
        board_stop_id: &str,
        alight_stop_id: &str,
        earliest_secs: i32,
        date: NaiveDate,
    ) -> Option<TripSelection<'a>> {
        let mut boardings: Vec<&StopTime> = self
            .index
            .stop_times_at(board_stop_id)
            .iter()
            .filter(|st| {
                self.index
                    .trip(&st.trip_id)
                    .is_some_and(|trip| {
                        trip.route_id == route_id
                            && self.index.is_service_active(&trip.service_id, date)
                    })
            })
            .collect();
        boardings.sort_by_key(|st| st.departure);

        for board in boardings {
            if board.departure.secs() < earliest_secs {
                continue;
            }
            let calls = self.index.stop_times_of_trip(&board.trip_id);
            let alight = calls
                .iter()
                .find(|st| st.stop_id == alight_stop_id && st.sequence > board.sequence);
            if let Some(alight) = alight {
                return Some(TripSelection {
                    board,
                    alight,
                    calls,
                });
            }
        }
        None
    }

    /// Materialize the bus leg for a selection, with the call sequence
    /// between board and alight inclusive.
    fn assemble_leg(
        &self,
        route_id: &str,
        short_name: &str,
        selection: &TripSelection<'a>,
    ) -> Option<BusLeg> {
        let board_pos = selection
            .calls
            .iter()
            .position(|st| st.sequence == selection.board.sequence)?;
        let alight_pos = selection
            .calls
            .iter()
            .position(|st| st.sequence == selection.alight.sequence)?;

        let mut stops = Vec::with_capacity(alight_pos - board_pos + 1);
        for st in &selection.calls[board_pos..=alight_pos] {
            stops.push(self.path_stop(&st.stop_id)?);
        }

        Some(BusLeg::assemble(
            route_id.to_string(),
            short_name.to_string(),
            selection.board.trip_id.clone(),
            stops,
            selection.board.departure,
            selection.alight.arrival,
        ))
    }

    fn path_stop(&self, stop_id: &str) -> Option<PathStop> {
        let stop = self.index.stop(stop_id)?;
        Some(PathStop {
            id: stop.id.clone(),
            name: stop.name.clone(),
            coord: stop.coord,
        })
    }
}
