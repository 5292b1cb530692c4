//! Itinerary types.
//!
//! An itinerary is an ordered, connected sequence of segments: it always
//! begins and ends with a walk, bus legs are bounded by walk or transfer
//! endpoints, and totals are plain sums over the segments.

use crate::fares::bus_slab_fare;
use crate::geo::{Coordinate, haversine_km};
use crate::gtfs::GtfsTime;

/// A stop as referenced from an itinerary: enough to render a map path.
#[derive(Debug, Clone)]
pub struct PathStop {
    pub id: String,
    pub name: String,
    pub coord: Coordinate,
}

/// A pedestrian leg between two coordinates.
#[derive(Debug, Clone)]
pub struct WalkLeg {
    pub from: Coordinate,
    pub to: Coordinate,
    pub distance_km: f64,
    pub duration_mins: i64,
}

impl WalkLeg {
    /// Build a walk between two points at the given pedestrian speed,
    /// rounding the duration up to whole minutes.
    pub fn between(from: Coordinate, to: Coordinate, speed_m_per_min: f64) -> Self {
        let distance_km = haversine_km(&from, &to);
        let duration_mins = ((distance_km * 1000.0) / speed_m_per_min).ceil() as i64;
        Self {
            from,
            to,
            distance_km,
            duration_mins,
        }
    }

    /// Two-point polyline for rendering.
    pub fn polyline(&self) -> [Coordinate; 2] {
        [self.from, self.to]
    }
}

/// A bus ride from a board stop to an alight stop on one trip.
#[derive(Debug, Clone)]
pub struct BusLeg {
    pub route_id: String,
    pub route_short_name: String,
    pub trip_id: String,
    /// Full call sequence board..alight inclusive, in travel order.
    pub stops: Vec<PathStop>,
    pub distance_km: f64,
    pub duration_mins: i64,
    pub depart: GtfsTime,
    pub arrive: GtfsTime,
    /// Slab fare for this leg alone; transfer fares are additive.
    pub fare: i64,
}

impl BusLeg {
    /// Assemble a leg from its call sequence and times.
    ///
    /// Distance is the sum of great-circle hops across the included stops;
    /// the fare slab is applied to that distance.
    pub fn assemble(
        route_id: String,
        route_short_name: String,
        trip_id: String,
        stops: Vec<PathStop>,
        depart: GtfsTime,
        arrive: GtfsTime,
    ) -> Self {
        let distance_km = stops
            .windows(2)
            .map(|pair| haversine_km(&pair[0].coord, &pair[1].coord))
            .sum();
        let duration_secs = i64::from(arrive.secs() - depart.secs());
        let duration_mins = {
            let d = duration_secs / 60;
            let r = duration_secs % 60;
            if r > 0 { d + 1 } else { d }
        };
        let fare = bus_slab_fare(distance_km);
        Self {
            route_id,
            route_short_name,
            trip_id,
            stops,
            distance_km,
            duration_mins,
            depart,
            arrive,
            fare,
        }
    }

    pub fn board_stop(&self) -> &PathStop {
        &self.stops[0]
    }

    pub fn alight_stop(&self) -> &PathStop {
        &self.stops[self.stops.len() - 1]
    }

    /// Stops strictly between board and alight.
    pub fn intermediate_stops(&self) -> &[PathStop] {
        &self.stops[1..self.stops.len() - 1]
    }

    /// Stop coordinates in travel order.
    pub fn polyline(&self) -> impl Iterator<Item = Coordinate> {
        self.stops.iter().map(|s| s.coord)
    }
}

/// Waiting at a stop between two bus legs. Zero distance.
#[derive(Debug, Clone)]
pub struct TransferWait {
    pub stop: PathStop,
    pub wait_mins: i64,
}

/// One piece of an itinerary.
#[derive(Debug, Clone)]
pub enum Segment {
    Walk(WalkLeg),
    Bus(BusLeg),
    Wait(TransferWait),
}

impl Segment {
    pub fn duration_mins(&self) -> i64 {
        match self {
            Segment::Walk(w) => w.duration_mins,
            Segment::Bus(b) => b.duration_mins,
            Segment::Wait(w) => w.wait_mins,
        }
    }

    pub fn distance_km(&self) -> f64 {
        match self {
            Segment::Walk(w) => w.distance_km,
            Segment::Bus(b) => b.distance_km,
            Segment::Wait(_) => 0.0,
        }
    }
}

/// A complete door-to-door bus itinerary.
#[derive(Debug, Clone)]
pub struct Itinerary {
    segments: Vec<Segment>,
}

impl Itinerary {
    /// Walk, Bus, Walk.
    pub fn direct(walk_to_stop: WalkLeg, bus: BusLeg, walk_from_stop: WalkLeg) -> Self {
        Self {
            segments: vec![
                Segment::Walk(walk_to_stop),
                Segment::Bus(bus),
                Segment::Walk(walk_from_stop),
            ],
        }
    }

    /// Walk, Bus, Wait, Bus, Walk.
    pub fn with_transfer(
        walk_to_stop: WalkLeg,
        first: BusLeg,
        wait: TransferWait,
        second: BusLeg,
        walk_from_stop: WalkLeg,
    ) -> Self {
        Self {
            segments: vec![
                Segment::Walk(walk_to_stop),
                Segment::Bus(first),
                Segment::Wait(wait),
                Segment::Bus(second),
                Segment::Walk(walk_from_stop),
            ],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn bus_legs(&self) -> impl Iterator<Item = &BusLeg> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Bus(b) => Some(b),
            _ => None,
        })
    }

    /// Total wall-clock duration: the sum of segment durations.
    pub fn total_duration_mins(&self) -> i64 {
        self.segments.iter().map(Segment::duration_mins).sum()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.segments.iter().map(Segment::distance_km).sum()
    }

    /// Total fare: sum of per-leg slab fares. No integrated ticketing.
    pub fn total_fare(&self) -> i64 {
        self.bus_legs().map(|b| b.fare).sum()
    }

    /// Departure of the first bus leg.
    pub fn departure(&self) -> GtfsTime {
        self.bus_legs().next().map(|b| b.depart).unwrap_or(GtfsTime::from_secs(0))
    }

    /// Arrival of the last bus leg.
    pub fn arrival(&self) -> GtfsTime {
        self.bus_legs().last().map(|b| b.arrive).unwrap_or(GtfsTime::from_secs(0))
    }

    /// Route labels joined for display, e.g. "R1" or "R1 → R2".
    pub fn route_label(&self) -> String {
        self.bus_legs()
            .map(|b| b.route_short_name.as_str())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// First board stop of the itinerary.
    pub fn board_stop(&self) -> Option<&PathStop> {
        self.bus_legs().next().map(BusLeg::board_stop)
    }

    /// Last alight stop of the itinerary.
    pub fn alight_stop(&self) -> Option<&PathStop> {
        self.bus_legs().last().map(BusLeg::alight_stop)
    }

    /// Every stop touched by bus legs, in travel order.
    pub fn path(&self) -> impl Iterator<Item = &PathStop> {
        self.segments.iter().flat_map(|s| {
            let stops: &[PathStop] = match s {
                Segment::Bus(b) => &b.stops,
                _ => &[],
            };
            stops.iter()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn path_stop(id: &str, lat: f64, lng: f64) -> PathStop {
        PathStop {
            id: id.into(),
            name: format!("Stop {id}"),
            coord: coord(lat, lng),
        }
    }

    fn sample_bus() -> BusLeg {
        BusLeg::assemble(
            "R1".into(),
            "R1".into(),
            "T1".into(),
            vec![
                path_stop("S1", 28.700, 77.100),
                path_stop("S2", 28.702, 77.102),
                path_stop("S3", 28.705, 77.105),
            ],
            GtfsTime::parse("10:00:00").unwrap(),
            GtfsTime::parse("10:10:00").unwrap(),
        )
    }

    #[test]
    fn walk_duration_rounds_up() {
        // 100m at 80 m/min = 1.25 min, rounds up to 2
        let from = coord(28.7000, 77.1000);
        let to = coord(28.7009, 77.1000); // ~100m north
        let walk = WalkLeg::between(from, to, 80.0);
        assert_eq!(walk.duration_mins, 2);
    }

    #[test]
    fn walk_zero_distance() {
        let a = coord(28.7, 77.1);
        let walk = WalkLeg::between(a, a, 80.0);
        assert_eq!(walk.distance_km, 0.0);
        assert_eq!(walk.duration_mins, 0);
    }

    #[test]
    fn walk_polyline_is_endpoints() {
        let from = coord(28.7000, 77.1000);
        let to = coord(28.7009, 77.1000);
        let walk = WalkLeg::between(from, to, 80.0);
        assert_eq!(walk.polyline(), [from, to]);
    }

    #[test]
    fn bus_leg_endpoints_and_intermediates() {
        let bus = sample_bus();
        assert_eq!(bus.board_stop().id, "S1");
        assert_eq!(bus.alight_stop().id, "S3");
        assert_eq!(bus.intermediate_stops().len(), 1);
        assert_eq!(bus.duration_mins, 10);
        // Short hop distances fall in the cheapest slab
        assert_eq!(bus.fare, 5);
    }

    #[test]
    fn bus_distance_is_hop_sum() {
        let bus = sample_bus();
        let direct = haversine_km(&bus.board_stop().coord, &bus.alight_stop().coord);
        // Hop sum through S2 is at least the straight line
        assert!(bus.distance_km >= direct - 1e-9);
    }

    #[test]
    fn bus_polyline_follows_call_sequence() {
        let bus = sample_bus();
        let polyline: Vec<_> = bus.polyline().collect();
        assert_eq!(polyline.len(), 3);
        assert_eq!(polyline[0], bus.board_stop().coord);
        assert_eq!(polyline[2], bus.alight_stop().coord);
    }

    #[test]
    fn direct_itinerary_totals() {
        let bus = sample_bus();
        let walk1 = WalkLeg::between(coord(28.7001, 77.1001), bus.board_stop().coord, 80.0);
        let walk2 = WalkLeg::between(bus.alight_stop().coord, coord(28.7051, 77.1051), 80.0);
        let it = Itinerary::direct(walk1.clone(), bus.clone(), walk2.clone());

        assert_eq!(it.segments().len(), 3);
        assert_eq!(
            it.total_duration_mins(),
            walk1.duration_mins + bus.duration_mins + walk2.duration_mins
        );
        assert_eq!(it.total_fare(), bus.fare);
        assert_eq!(it.route_label(), "R1");
        assert_eq!(it.departure().to_string(), "10:00:00");
        assert_eq!(it.arrival().to_string(), "10:10:00");
    }

    #[test]
    fn transfer_itinerary_totals() {
        let first = sample_bus();
        let second = BusLeg::assemble(
            "R2".into(),
            "R2".into(),
            "T2".into(),
            vec![
                path_stop("S3", 28.705, 77.105),
                path_stop("S4", 28.708, 77.108),
            ],
            GtfsTime::parse("10:15:00").unwrap(),
            GtfsTime::parse("10:25:00").unwrap(),
        );
        let wait = TransferWait {
            stop: path_stop("S3", 28.705, 77.105),
            wait_mins: 5,
        };
        let walk1 = WalkLeg::between(coord(28.7001, 77.1001), first.board_stop().coord, 80.0);
        let walk2 = WalkLeg::between(second.alight_stop().coord, coord(28.7081, 77.1081), 80.0);

        let it = Itinerary::with_transfer(walk1, first.clone(), wait, second.clone(), walk2);

        assert_eq!(it.segments().len(), 5);
        // Per-leg slab fares are additive
        assert_eq!(it.total_fare(), first.fare + second.fare);
        assert_eq!(it.route_label(), "R1 → R2");
        assert_eq!(it.board_stop().unwrap().id, "S1");
        assert_eq!(it.alight_stop().unwrap().id, "S4");

        let sum: i64 = it.segments().iter().map(Segment::duration_mins).sum();
        assert_eq!(it.total_duration_mins(), sum);
    }
}
