//! # Geospatial calculations
//!
//! Two distance algorithms are provided, and they are deliberately not interchangeable:
//!
//! - [`pairwise_distance_and_bearing`] uses the haversine formula on a spherical earth of radius
//!   [`EARTH_RADIUS_KM`]. The distance is in **kilometres**.
//! - [`segment_distances`] uses the ellipsoidal (WGS84) geodesic between consecutive path nodes.
//!   Distances are in **metres**.
//!
//! Callers relying on either must not mix their outputs without converting units. Neither is in
//! the units of the drive distance accepted by the motion controller, which are robot travel units.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use geographiclib_rs::{Geodesic, InverseGeodesic};
use log::{error, warn};
use serde::Serialize;
use thiserror::Error;

use util::maths::{clamp, wrap_2pi};

use crate::path_store::{PathDocument, PathError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Radius of the spherical earth used by the haversine formula.
///
/// Units: kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A point given as latitude and longitude.
///
/// Units: decimal degrees
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat_deg: f64,
    pub lon_deg: f64
}

/// Result of the haversine calculation.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DistanceAngle {
    /// Great circle distance.
    ///
    /// Units: kilometres
    pub distance_km: f64,

    /// Central angle subtended by the two points at the centre of the earth.
    ///
    /// Units: radians
    pub central_angle_rad: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("Latitude {0} is outside [-90, 90] degrees")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180] degrees")]
    LongitudeOutOfRange(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Coordinate {
    /// Create a coordinate without checking its range.
    ///
    /// Use this for path files which store planar x/y values in the latitude/longitude slots.
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        Self { lat_deg, lon_deg }
    }

    /// Create a geodetic coordinate, checking the latitude and longitude are in range.
    pub fn geodetic(lat_deg: f64, lon_deg: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&lat_deg) {
            return Err(GeoError::LatitudeOutOfRange(lat_deg))
        }
        if !(-180.0..=180.0).contains(&lon_deg) {
            return Err(GeoError::LongitudeOutOfRange(lon_deg))
        }

        Ok(Self { lat_deg, lon_deg })
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(c: (f64, f64)) -> Self {
        Self::new(c.0, c.1)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Great circle distance and central angle between two coordinates, using the haversine formula.
///
/// The distance is in kilometres since [`EARTH_RADIUS_KM`] is. Identical points give exactly zero
/// for both values.
pub fn pairwise_distance_and_bearing(a: Coordinate, b: Coordinate) -> DistanceAngle {
    let lat_a = a.lat_deg.to_radians();
    let lat_b = b.lat_deg.to_radians();
    let dlat = lat_b - lat_a;
    let dlon = b.lon_deg.to_radians() - a.lon_deg.to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);

    // Round-off can push h just past 1 for antipodal points, which would make the sqrt NaN
    let h = clamp(h, 0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    DistanceAngle {
        distance_km: EARTH_RADIUS_KM * c,
        central_angle_rad: c
    }
}

/// Initial bearing (forward azimuth) from `a` towards `b` on a spherical earth.
///
/// Measured clockwise from north. Units: radians, in [0, 2pi).
pub fn initial_bearing(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.lat_deg.to_radians();
    let lat_b = b.lat_deg.to_radians();
    let dlon = (b.lon_deg - a.lon_deg).to_radians();

    let y = dlon.sin() * lat_b.cos();
    let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * dlon.cos();

    wrap_2pi(y.atan2(x))
}

/// Geodesic distance between two coordinates on the WGS84 ellipsoid.
///
/// Units: metres
pub fn geodesic_distance_m(a: Coordinate, b: Coordinate) -> f64 {
    geodesic_distance_with(&Geodesic::wgs84(), a, b)
}

/// Distance between each pair of consecutive nodes of a path document.
///
/// Node `x` is taken as the latitude and `y` as the longitude. Nodes are used in stored order,
/// which is expected to match their sequence numbers. Distances are geodesic, in metres.
///
/// Fails with [`PathError::MalformedPathData`] if there are fewer than two nodes, if a node is
/// missing its position, or if a latitude is outside [-90, 90] degrees. Longitudes are not range
/// checked, the geodesic solver normalises them.
pub fn segment_distances(doc: &PathDocument) -> Result<Vec<f64>, PathError> {
    let positions = doc.node_positions()?;

    if positions.len() < 2 {
        return Err(PathError::MalformedPathData(format!(
            "at least 2 nodes are needed to compute distances, found {}",
            positions.len()
        )))
    }

    if !doc.is_sequence_ordered() {
        warn!(
            "Nodes of {:?} are not in ascending sequence order, distances use stored order",
            doc.source()
        );
    }

    let coords = positions
        .into_iter()
        .enumerate()
        .map(|(i, (x, y))| {
            if !(-90.0..=90.0).contains(&x) {
                return Err(PathError::MalformedPathData(
                    format!("node {}: {}", i, GeoError::LatitudeOutOfRange(x))
                ))
            }
            Ok(Coordinate::new(x, y))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let geod = Geodesic::wgs84();

    Ok(coords
        .windows(2)
        .map(|w| geodesic_distance_with(&geod, w[0], w[1]))
        .collect())
}

/// As [`segment_distances`], but failures are logged and an empty list is returned.
pub fn segment_distances_or_empty(doc: &PathDocument) -> Vec<f64> {
    match segment_distances(doc) {
        Ok(d) => d,
        Err(e) => {
            error!("Cannot compute distances for {:?}: {}", doc.source(), e);
            Vec::new()
        }
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn geodesic_distance_with(geod: &Geodesic, a: Coordinate, b: Coordinate) -> f64 {
    geod.inverse(a.lat_deg, a.lon_deg, b.lat_deg, b.lon_deg)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use std::f64::consts::PI;
    use std::path::PathBuf;

    fn test_data(name: &str) -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "test_data", name].iter().collect()
    }

    fn round4(v: f64) -> f64 {
        (v * 10_000.0).round() / 10_000.0
    }

    const WARSAW: Coordinate = Coordinate { lat_deg: 52.2296756, lon_deg: 21.0122287 };
    const LONDON: Coordinate = Coordinate { lat_deg: 51.5074, lon_deg: 0.1278 };

    #[test]
    fn test_haversine_warsaw_london() {
        let result = pairwise_distance_and_bearing(WARSAW, LONDON);

        assert_eq!(round4(result.distance_km), 1431.1784);
        assert_eq!(round4(result.central_angle_rad), 0.2246);
    }

    #[test]
    fn test_haversine_same_point() {
        for c in [WARSAW, LONDON, Coordinate::new(0.0, 0.0), Coordinate::new(-90.0, 180.0)].iter() {
            let result = pairwise_distance_and_bearing(*c, *c);

            assert_eq!(result.distance_km, 0.0);
            assert_eq!(result.central_angle_rad, 0.0);
        }
    }

    #[test]
    fn test_haversine_symmetric() {
        let pairs = [
            (WARSAW, LONDON),
            (Coordinate::new(-33.9, 151.2), Coordinate::new(40.7, -74.0)),
            (Coordinate::new(10.0, 179.9), Coordinate::new(10.0, -179.9))
        ];

        for (a, b) in pairs.iter() {
            let ab = pairwise_distance_and_bearing(*a, *b);
            let ba = pairwise_distance_and_bearing(*b, *a);

            assert!((ab.distance_km - ba.distance_km).abs() < 1e-9);
            assert!((ab.central_angle_rad - ba.central_angle_rad).abs() < 1e-12);
        }
    }

    #[test]
    fn test_haversine_antipodal_is_finite() {
        let result = pairwise_distance_and_bearing(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 180.0)
        );

        assert!((result.central_angle_rad - PI).abs() < 1e-9);
        assert!(result.distance_km.is_finite());
    }

    #[test]
    fn test_initial_bearing() {
        let origin = Coordinate::new(35.0, 139.0);

        let north = initial_bearing(origin, Coordinate::new(36.0, 139.0));
        assert!(north.abs() < 1e-9 || (north - 2.0 * PI).abs() < 1e-9);

        let east = initial_bearing(origin, Coordinate::new(35.0, 140.0));
        assert!((east.to_degrees() - 90.0).abs() < 1.0);

        let west = initial_bearing(origin, Coordinate::new(35.0, 138.0));
        assert!((west.to_degrees() - 270.0).abs() < 1.0);
    }

    #[test]
    fn test_geodetic_range() {
        assert!(Coordinate::geodetic(90.0, -180.0).is_ok());
        assert_eq!(Coordinate::geodetic(90.5, 0.0), Err(GeoError::LatitudeOutOfRange(90.5)));
        assert_eq!(Coordinate::geodetic(0.0, 181.0), Err(GeoError::LongitudeOutOfRange(181.0)));
    }

    #[test]
    fn test_geodesic_one_degree_latitude() {
        // One degree of latitude on the WGS84 ellipsoid is ~111 km
        let d = geodesic_distance_m(Coordinate::new(35.0, 139.0), Coordinate::new(36.0, 139.0));
        assert!((d - 110_950.0).abs() < 500.0);
    }

    #[test]
    fn test_segment_distances() {
        let doc = crate::path_store::load(test_data("path_short.json")).unwrap();

        let distances = segment_distances(&doc).unwrap();

        assert_eq!(distances.len(), 3);
        assert!(distances[0] > 11.0 && distances[0] < 11.3, "{:?}", distances);
        assert!(distances[1] > 20.5 && distances[1] < 21.0, "{:?}", distances);
        assert!(distances[2] > 33.2 && distances[2] < 33.6, "{:?}", distances);
    }

    #[test]
    fn test_segment_distances_missing_position() {
        let doc = crate::path_store::load(test_data("path_missing_position.json")).unwrap();

        assert!(matches!(segment_distances(&doc), Err(PathError::MalformedPathData(_))));
        assert!(segment_distances_or_empty(&doc).is_empty());
    }

    #[test]
    fn test_segment_distances_too_few_nodes() {
        let single = PathDocument::from_value(
            json!({"nodes": [{"position": {"x": 1.0, "y": 1.0}}]}),
            "inline"
        );
        let empty = PathDocument::from_value(json!({"nodes": []}), "inline");

        assert!(matches!(segment_distances(&single), Err(PathError::MalformedPathData(_))));
        assert!(matches!(segment_distances(&empty), Err(PathError::MalformedPathData(_))));
        assert!(segment_distances_or_empty(&single).is_empty());
    }

    #[test]
    fn test_segment_distances_out_of_range() {
        let doc = PathDocument::from_value(
            json!({"nodes": [
                {"position": {"x": 120.0, "y": 1.0}},
                {"position": {"x": 1.0, "y": 1.0}}
            ]}),
            "inline"
        );

        assert!(matches!(segment_distances(&doc), Err(PathError::MalformedPathData(_))));
    }

    #[test]
    fn test_segment_distances_unwrapped_longitude() {
        // 190 and -170 degrees are the same meridian
        let doc = PathDocument::from_value(
            json!({"nodes": [
                {"position": {"x": 10.0, "y": 190.0}},
                {"position": {"x": 10.0, "y": -170.0}},
                {"position": {"x": 11.0, "y": -170.0}}
            ]}),
            "inline"
        );

        let distances = segment_distances(&doc).unwrap();

        assert_eq!(distances.len(), 2);
        assert!(distances[0].abs() < 1e-6, "{:?}", distances);
        assert!((distances[1] - 110_600.0).abs() < 500.0, "{:?}", distances);
    }

    #[test]
    fn test_segment_distances_repeated_node() {
        let doc = PathDocument::from_value(
            json!({"nodes": [
                {"position": {"x": 51.0, "y": 5.0}},
                {"position": {"x": 51.0, "y": 5.0}}
            ]}),
            "inline"
        );

        assert_eq!(segment_distances(&doc).unwrap(), vec![0.0]);
    }
}
