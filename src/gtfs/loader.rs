//! Static feed loading.
//!
//! Reads the five tabular feed files with header-driven column mapping.
//! Real-world feeds are messy: fields are trimmed, empty rows are skipped,
//! and a row whose required fields are missing or unparsable is skipped with
//! a warning rather than failing the whole load.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{info, warn};

use crate::geo::Coordinate;

use super::model::{GtfsTime, Route, ServiceCalendar, Stop, StopTime, Trip};

/// Errors from feed loading.
///
/// Any of these puts the bus planner into disabled mode; they are not
/// surfaced to API callers.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A mandatory feed file is absent.
    #[error("missing feed file: {0}")]
    MissingFile(PathBuf),

    /// A feed file lacks a required header column.
    #[error("{file}: missing required column {column}")]
    MissingColumn { file: &'static str, column: String },

    /// I/O or CSV-level failure.
    #[error("failed to read {file}: {source}")]
    Read {
        file: &'static str,
        #[source]
        source: csv::Error,
    },
}

/// Raw parsed feed, input to [`super::ScheduleIndex::build`].
///
/// Row order is preserved from the files; index construction depends on it
/// for stable representative-trip selection.
#[derive(Debug, Default)]
pub struct GtfsFeed {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<ServiceCalendar>,
}

/// Load a feed directory containing `stops.txt`, `routes.txt`, `trips.txt`,
/// `stop_times.txt` and optionally `calendar.txt`.
///
/// A missing calendar file is tolerated: services without a calendar entry
/// are treated as always active.
pub fn load_feed(dir: &Path) -> Result<GtfsFeed, FeedError> {
    let stops = parse_stops(open_required(dir, "stops.txt")?)?;
    let routes = parse_routes(open_required(dir, "routes.txt")?)?;
    let trips = parse_trips(open_required(dir, "trips.txt")?)?;
    let stop_times = parse_stop_times(open_required(dir, "stop_times.txt")?)?;

    let calendar_path = dir.join("calendar.txt");
    let calendars = if calendar_path.is_file() {
        parse_calendar(File::open(&calendar_path).map_err(|_| FeedError::MissingFile(calendar_path))?)?
    } else {
        warn!("calendar.txt absent; treating all services as always active");
        Vec::new()
    };

    info!(
        stops = stops.len(),
        routes = routes.len(),
        trips = trips.len(),
        stop_times = stop_times.len(),
        calendars = calendars.len(),
        "loaded GTFS feed"
    );

    Ok(GtfsFeed {
        stops,
        routes,
        trips,
        stop_times,
        calendars,
    })
}

fn open_required(dir: &Path, name: &'static str) -> Result<File, FeedError> {
    let path = dir.join(name);
    File::open(&path).map_err(|_| FeedError::MissingFile(path))
}

/// Header-driven column lookup for one file.
struct Columns {
    file: &'static str,
    header: StringRecord,
}

impl Columns {
    fn from_reader<R: io::Read>(
        file: &'static str,
        reader: &mut csv::Reader<R>,
    ) -> Result<Self, FeedError> {
        let header = reader
            .headers()
            .map_err(|source| FeedError::Read { file, source })?
            .clone();
        Ok(Self { file, header })
    }

    fn required(&self, name: &str) -> Result<usize, FeedError> {
        self.header
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| FeedError::MissingColumn {
                file: self.file,
                column: name.to_string(),
            })
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h.trim() == name)
    }
}

fn field<'r>(record: &'r StringRecord, idx: usize) -> Option<&'r str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

fn reader_from<R: io::Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(input)
}

fn parse_stops<R: io::Read>(input: R) -> Result<Vec<Stop>, FeedError> {
    const FILE: &str = "stops.txt";
    let mut reader = reader_from(input);
    let cols = Columns::from_reader(FILE, &mut reader)?;

    let id = cols.required("stop_id")?;
    let name = cols.required("stop_name")?;
    let lat = cols.required("stop_lat")?;
    let lon = cols.required("stop_lon")?;

    let mut stops = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| FeedError::Read { file: FILE, source })?;
        if is_blank(&record) {
            continue;
        }

        let parsed = (|| {
            let id = field(&record, id)?.to_string();
            let name = field(&record, name)?.to_string();
            let lat: f64 = field(&record, lat)?.parse().ok()?;
            let lon: f64 = field(&record, lon)?.parse().ok()?;
            let coord = Coordinate::new(lat, lon).ok()?;
            Some(Stop { id, name, coord })
        })();

        match parsed {
            Some(stop) => stops.push(stop),
            None => warn!(file = FILE, row = line + 2, "skipping unparsable row"),
        }
    }
    Ok(stops)
}

fn parse_routes<R: io::Read>(input: R) -> Result<Vec<Route>, FeedError> {
    const FILE: &str = "routes.txt";
    let mut reader = reader_from(input);
    let cols = Columns::from_reader(FILE, &mut reader)?;

    let id = cols.required("route_id")?;
    let short_name = cols.required("route_short_name")?;
    let long_name = cols.required("route_long_name")?;
    let route_type = cols.required("route_type")?;

    let mut routes = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| FeedError::Read { file: FILE, source })?;
        if is_blank(&record) {
            continue;
        }

        let parsed = (|| {
            let id = field(&record, id)?.to_string();
            // Names may legitimately be blank in sparse feeds
            let short_name = field(&record, short_name).unwrap_or_default().to_string();
            let long_name = field(&record, long_name).unwrap_or_default().to_string();
            let route_type: i32 = field(&record, route_type)?.parse().ok()?;
            Some(Route {
                id,
                short_name,
                long_name,
                route_type,
            })
        })();

        match parsed {
            Some(route) => routes.push(route),
            None => warn!(file = FILE, row = line + 2, "skipping unparsable row"),
        }
    }
    Ok(routes)
}

fn parse_trips<R: io::Read>(input: R) -> Result<Vec<Trip>, FeedError> {
    const FILE: &str = "trips.txt";
    let mut reader = reader_from(input);
    let cols = Columns::from_reader(FILE, &mut reader)?;

    let route_id = cols.required("route_id")?;
    let service_id = cols.required("service_id")?;
    let trip_id = cols.required("trip_id")?;
    let headsign = cols.optional("trip_headsign");

    let mut trips = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| FeedError::Read { file: FILE, source })?;
        if is_blank(&record) {
            continue;
        }

        let parsed = (|| {
            Some(Trip {
                id: field(&record, trip_id)?.to_string(),
                route_id: field(&record, route_id)?.to_string(),
                service_id: field(&record, service_id)?.to_string(),
                headsign: headsign.and_then(|i| field(&record, i)).map(str::to_string),
            })
        })();

        match parsed {
            Some(trip) => trips.push(trip),
            None => warn!(file = FILE, row = line + 2, "skipping unparsable row"),
        }
    }
    Ok(trips)
}

fn parse_stop_times<R: io::Read>(input: R) -> Result<Vec<StopTime>, FeedError> {
    const FILE: &str = "stop_times.txt";
    let mut reader = reader_from(input);
    let cols = Columns::from_reader(FILE, &mut reader)?;

    let trip_id = cols.required("trip_id")?;
    let arrival = cols.required("arrival_time")?;
    let departure = cols.required("departure_time")?;
    let stop_id = cols.required("stop_id")?;
    let sequence = cols.required("stop_sequence")?;

    let mut stop_times = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| FeedError::Read { file: FILE, source })?;
        if is_blank(&record) {
            continue;
        }

        let parsed = (|| {
            Some(StopTime {
                trip_id: field(&record, trip_id)?.to_string(),
                stop_id: field(&record, stop_id)?.to_string(),
                sequence: field(&record, sequence)?.parse().ok()?,
                arrival: GtfsTime::parse(field(&record, arrival)?).ok()?,
                departure: GtfsTime::parse(field(&record, departure)?).ok()?,
            })
        })();

        match parsed {
            Some(st) => stop_times.push(st),
            None => warn!(file = FILE, row = line + 2, "skipping unparsable row"),
        }
    }
    Ok(stop_times)
}

const DAY_COLUMNS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

fn parse_calendar<R: io::Read>(input: R) -> Result<Vec<ServiceCalendar>, FeedError> {
    const FILE: &str = "calendar.txt";
    let mut reader = reader_from(input);
    let cols = Columns::from_reader(FILE, &mut reader)?;

    let service_id = cols.required("service_id")?;
    let mut day_idx = [0usize; 7];
    for (i, day) in DAY_COLUMNS.iter().enumerate() {
        day_idx[i] = cols.required(day)?;
    }
    let start_date = cols.required("start_date")?;
    let end_date = cols.required("end_date")?;

    let mut calendars = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|source| FeedError::Read { file: FILE, source })?;
        if is_blank(&record) {
            continue;
        }

        let parsed = (|| {
            let service_id = field(&record, service_id)?.to_string();
            let mut active_days = [false; 7];
            for (i, &col) in day_idx.iter().enumerate() {
                active_days[i] = match field(&record, col)? {
                    "1" => true,
                    "0" => false,
                    _ => return None,
                };
            }
            let start_date = parse_yyyymmdd(field(&record, start_date)?)?;
            let end_date = parse_yyyymmdd(field(&record, end_date)?)?;
            Some(ServiceCalendar {
                service_id,
                active_days,
                start_date,
                end_date,
            })
        })();

        match parsed {
            Some(cal) => calendars.push(cal),
            None => warn!(file = FILE, row = line + 2, "skipping unparsable row"),
        }
    }
    Ok(calendars)
}

fn parse_yyyymmdd(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_stops_basic() {
        let csv = "stop_id,stop_name,stop_lat,stop_lon\n\
                   S1,Ashok Vihar,28.7000,77.1000\n\
                   S2,Model Town,28.7020,77.1020\n";
        let stops = parse_stops(csv.as_bytes()).unwrap();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].id, "S1");
        assert_eq!(stops[0].name, "Ashok Vihar");
        assert!((stops[1].coord.lat() - 28.702).abs() < 1e-9);
    }

    #[test]
    fn parse_stops_header_order_independent() {
        let csv = "stop_lon,stop_id,stop_lat,stop_name\n\
                   77.1000,S1,28.7000,Ashok Vihar\n";
        let stops = parse_stops(csv.as_bytes()).unwrap();
        assert_eq!(stops[0].id, "S1");
        assert!((stops[0].coord.lng() - 77.1).abs() < 1e-9);
    }

    #[test]
    fn parse_stops_skips_bad_rows() {
        let csv = "stop_id,stop_name,stop_lat,stop_lon\n\
                   S1,Good,28.7000,77.1000\n\
                   S2,NoCoords,,\n\
                   S3,BadLat,not-a-number,77.1\n\
                   ,,,\n\
                   S4,AlsoGood,28.8000,77.2000\n";
        let stops = parse_stops(csv.as_bytes()).unwrap();
        let ids: Vec<_> = stops.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["S1", "S4"]);
    }

    #[test]
    fn parse_stops_trims_fields() {
        let csv = "stop_id,stop_name,stop_lat,stop_lon\n\
                   \" S1 \", \"Ashok Vihar\" , 28.7 , 77.1 \n";
        let stops = parse_stops(csv.as_bytes()).unwrap();
        assert_eq!(stops[0].id, "S1");
        assert_eq!(stops[0].name, "Ashok Vihar");
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "stop_id,stop_name,stop_lat\nS1,Foo,28.7\n";
        let err = parse_stops(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, FeedError::MissingColumn { .. }));
    }

    #[test]
    fn parse_trips_optional_headsign() {
        let with = "route_id,service_id,trip_id,trip_headsign\nR1,WK,T1,Azadpur\n";
        let trips = parse_trips(with.as_bytes()).unwrap();
        assert_eq!(trips[0].headsign.as_deref(), Some("Azadpur"));

        let without = "route_id,service_id,trip_id\nR1,WK,T1\n";
        let trips = parse_trips(without.as_bytes()).unwrap();
        assert_eq!(trips[0].headsign, None);
    }

    #[test]
    fn parse_stop_times_basic() {
        let csv = "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                   T1,10:00:00,10:00:00,S1,1\n\
                   T1,10:05:00,10:05:00,S2,2\n\
                   T1,25:04:00,25:04:00,S3,3\n";
        let sts = parse_stop_times(csv.as_bytes()).unwrap();
        assert_eq!(sts.len(), 3);
        assert_eq!(sts[2].arrival.secs(), 90240);
        assert_eq!(sts[1].sequence, 2);
    }

    #[test]
    fn parse_stop_times_skips_bad_time() {
        let csv = "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                   T1,10:00:00,10:00:00,S1,1\n\
                   T1,xx:yy:zz,10:05:00,S2,2\n";
        let sts = parse_stop_times(csv.as_bytes()).unwrap();
        assert_eq!(sts.len(), 1);
    }

    #[test]
    fn parse_calendar_basic() {
        let csv = "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                   WK,1,1,1,1,1,0,0,20240101,20241231\n\
                   WE,0,0,0,0,0,1,1,20240101,20241231\n";
        let cals = parse_calendar(csv.as_bytes()).unwrap();
        assert_eq!(cals.len(), 2);
        assert_eq!(cals[0].active_days, [true, true, true, true, true, false, false]);
        assert_eq!(
            cals[1].start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn parse_calendar_rejects_bad_flags() {
        let csv = "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                   WK,yes,1,1,1,1,0,0,20240101,20241231\n";
        let cals = parse_calendar(csv.as_bytes()).unwrap();
        assert!(cals.is_empty());
    }

    #[test]
    fn load_feed_missing_mandatory_file() {
        let dir = tempfile::tempdir().unwrap();
        // Only stops.txt present
        std::fs::write(
            dir.path().join("stops.txt"),
            "stop_id,stop_name,stop_lat,stop_lon\nS1,A,28.7,77.1\n",
        )
        .unwrap();

        let err = load_feed(dir.path()).unwrap_err();
        assert!(matches!(err, FeedError::MissingFile(_)));
    }

    #[test]
    fn load_feed_missing_calendar_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("stops.txt"),
            "stop_id,stop_name,stop_lat,stop_lon\nS1,A,28.7,77.1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("routes.txt"),
            "route_id,route_short_name,route_long_name,route_type\nR1,R1,Ring Road,3\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("trips.txt"),
            "route_id,service_id,trip_id\nR1,WK,T1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("stop_times.txt"),
            "trip_id,arrival_time,departure_time,stop_id,stop_sequence\nT1,10:00:00,10:00:00,S1,1\n",
        )
        .unwrap();

        let feed = load_feed(dir.path()).unwrap();
        assert_eq!(feed.stops.len(), 1);
        assert!(feed.calendars.is_empty());
    }
}
