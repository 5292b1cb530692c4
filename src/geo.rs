//! Geographic primitives.
//!
//! All distances in this crate are great-circle (haversine) distances; we
//! have no road geometry, so straight-line hops between coordinates are the
//! best available approximation.

use std::fmt;

/// Mean Earth radius in kilometres.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Error returned when constructing an invalid coordinate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinate: {reason}")]
pub struct InvalidCoordinate {
    reason: &'static str,
}

/// A WGS-84 latitude/longitude pair.
///
/// Guaranteed finite and in range by construction: latitude in [-90, 90],
/// longitude in [-180, 180].
///
/// # Examples
///
/// ```
/// use transit_server::geo::Coordinate;
///
/// let delhi = Coordinate::new(28.7041, 77.1025).unwrap();
/// assert_eq!(delhi.lat(), 28.7041);
///
/// assert!(Coordinate::new(91.0, 0.0).is_err());
/// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
/// ```
#[derive(Clone, Copy, PartialEq)]
pub struct Coordinate {
    lat: f64,
    lng: f64,
}

impl Coordinate {
    /// Construct a coordinate, validating range and finiteness.
    pub fn new(lat: f64, lng: f64) -> Result<Self, InvalidCoordinate> {
        if !lat.is_finite() || !lng.is_finite() {
            return Err(InvalidCoordinate {
                reason: "latitude and longitude must be finite",
            });
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(InvalidCoordinate {
                reason: "latitude must be in [-90, 90]",
            });
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(InvalidCoordinate {
                reason: "longitude must be in [-180, 180]",
            });
        }
        Ok(Self { lat, lng })
    }

    /// Returns the latitude in degrees.
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Returns the longitude in degrees.
    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Great-circle distance to another coordinate in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self, other)
    }

    /// Initial bearing towards another coordinate, in degrees clockwise
    /// from north, normalised to [0, 360).
    pub fn bearing_deg(&self, other: &Coordinate) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let delta_lambda = (other.lng - self.lng).to_radians();

        let y = delta_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// Haversine great-circle distance between two coordinates in kilometres.
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lng - a.lng).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    #[test]
    fn valid_coordinates() {
        assert!(Coordinate::new(0.0, 0.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(28.7041, 77.1025).is_ok());
    }

    #[test]
    fn reject_out_of_range() {
        assert!(Coordinate::new(90.1, 0.0).is_err());
        assert!(Coordinate::new(-90.1, 0.0).is_err());
        assert!(Coordinate::new(0.0, 180.1).is_err());
        assert!(Coordinate::new(0.0, -180.1).is_err());
    }

    #[test]
    fn reject_non_finite() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinate::new(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn distance_zero_for_identical() {
        let a = coord(28.7041, 77.1025);
        assert_eq!(haversine_km(&a, &a), 0.0);
    }

    #[test]
    fn distance_known_pair() {
        // Connaught Place to India Gate, roughly 2.4 km
        let cp = coord(28.6315, 77.2167);
        let ig = coord(28.6129, 77.2295);
        let d = haversine_km(&cp, &ig);
        assert!(d > 2.0 && d < 3.0, "got {d}");
    }

    #[test]
    fn bearing_due_north() {
        let a = coord(28.0, 77.0);
        let b = coord(29.0, 77.0);
        let brg = a.bearing_deg(&b);
        assert!(brg.abs() < 1.0 || (brg - 360.0).abs() < 1.0, "got {brg}");
    }

    #[test]
    fn bearing_due_east_near_equator() {
        let a = coord(0.0, 77.0);
        let b = coord(0.0, 78.0);
        let brg = a.bearing_deg(&b);
        assert!((brg - 90.0).abs() < 1.0, "got {brg}");
    }
}
