//! Derived schedule indices.
//!
//! Built once from the parsed feed in a single deterministic pass, then
//! shared read-only across request tasks. Nothing here is mutated after
//! `build` returns.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::loader::GtfsFeed;
use super::model::{Route, ServiceCalendar, Stop, StopTime, Trip};

/// Immutable lookup structure over a loaded feed.
pub struct ScheduleIndex {
    stops: HashMap<String, Stop>,
    routes: HashMap<String, Route>,
    trips: HashMap<String, Trip>,
    calendars: HashMap<String, ServiceCalendar>,

    /// Every call at a stop, in feed order.
    stop_times_by_stop: HashMap<String, Vec<StopTime>>,
    /// A trip's calls ordered by stop sequence.
    stop_times_by_trip: HashMap<String, Vec<StopTime>>,
    /// Every route with any trip calling at a stop.
    routes_by_stop: HashMap<String, BTreeSet<String>>,
    /// Ordered stop ids of one representative trip per route.
    ///
    /// The representative is the first trip seen in feed order, so the list
    /// approximates the route's canonical call pattern. Branch variants of
    /// the same route are not represented.
    stops_by_route: HashMap<String, Vec<String>>,
}

impl ScheduleIndex {
    /// Build all indices from a parsed feed.
    pub fn build(feed: GtfsFeed) -> Self {
        let stops: HashMap<String, Stop> =
            feed.stops.into_iter().map(|s| (s.id.clone(), s)).collect();
        let routes: HashMap<String, Route> =
            feed.routes.into_iter().map(|r| (r.id.clone(), r)).collect();
        let calendars: HashMap<String, ServiceCalendar> = feed
            .calendars
            .into_iter()
            .map(|c| (c.service_id.clone(), c))
            .collect();

        // First trip seen per route is that route's representative.
        let mut representative: HashMap<String, String> = HashMap::new();
        let mut trips: HashMap<String, Trip> = HashMap::with_capacity(feed.trips.len());
        for trip in feed.trips {
            representative
                .entry(trip.route_id.clone())
                .or_insert_with(|| trip.id.clone());
            trips.insert(trip.id.clone(), trip);
        }

        let mut stop_times_by_stop: HashMap<String, Vec<StopTime>> = HashMap::new();
        let mut stop_times_by_trip: HashMap<String, Vec<StopTime>> = HashMap::new();
        let mut routes_by_stop: HashMap<String, BTreeSet<String>> = HashMap::new();

        for st in feed.stop_times {
            let Some(trip) = trips.get(&st.trip_id) else {
                warn!(trip_id = %st.trip_id, "stop_time references unknown trip; dropped");
                continue;
            };
            routes_by_stop
                .entry(st.stop_id.clone())
                .or_default()
                .insert(trip.route_id.clone());
            stop_times_by_stop
                .entry(st.stop_id.clone())
                .or_default()
                .push(st.clone());
            stop_times_by_trip.entry(st.trip_id.clone()).or_default().push(st);
        }

        for calls in stop_times_by_trip.values_mut() {
            calls.sort_by_key(|st| st.sequence);
        }

        let mut stops_by_route: HashMap<String, Vec<String>> = HashMap::new();
        for (route_id, trip_id) in &representative {
            let Some(calls) = stop_times_by_trip.get(trip_id) else {
                continue;
            };
            stops_by_route.insert(
                route_id.clone(),
                calls.iter().map(|st| st.stop_id.clone()).collect(),
            );
        }

        debug!(
            stops = stops.len(),
            routes = routes.len(),
            trips = trips.len(),
            "schedule index built"
        );

        Self {
            stops,
            routes,
            trips,
            calendars,
            stop_times_by_stop,
            stop_times_by_trip,
            routes_by_stop,
            stops_by_route,
        }
    }

    pub fn stop(&self, id: &str) -> Option<&Stop> {
        self.stops.get(id)
    }

    pub fn route(&self, id: &str) -> Option<&Route> {
        self.routes.get(id)
    }

    pub fn trip(&self, id: &str) -> Option<&Trip> {
        self.trips.get(id)
    }

    /// Iterate all stops (arbitrary order).
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.values()
    }

    /// Calls at a stop, in feed order. Empty if the stop is unknown.
    pub fn stop_times_at(&self, stop_id: &str) -> &[StopTime] {
        self.stop_times_by_stop
            .get(stop_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// A trip's calls ordered by sequence. Empty if the trip is unknown.
    pub fn stop_times_of_trip(&self, trip_id: &str) -> &[StopTime] {
        self.stop_times_by_trip
            .get(trip_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Routes with any trip calling at a stop.
    pub fn routes_at(&self, stop_id: &str) -> impl Iterator<Item = &str> {
        self.routes_by_stop
            .get(stop_id)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Ordered call pattern of a route's representative trip.
    pub fn route_stops(&self, route_id: &str) -> &[String] {
        self.stops_by_route
            .get(route_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Position of a stop on a route's representative call pattern.
    pub fn position_on_route(&self, route_id: &str, stop_id: &str) -> Option<usize> {
        self.route_stops(route_id).iter().position(|s| s == stop_id)
    }

    /// Whether a service runs on the given date.
    ///
    /// Services without a calendar entry are treated as always active, a
    /// permissive fallback for incomplete feeds.
    pub fn is_service_active(&self, service_id: &str, date: NaiveDate) -> bool {
        match self.calendars.get(service_id) {
            Some(cal) => cal.is_active_on(date),
            None => true,
        }
    }
}
