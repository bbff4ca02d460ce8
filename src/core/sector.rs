//! Latitude/longitude rectangles.
//!
//! Comparisons assume normalized bounds (latitude in [-90, 90], longitude in
//! [-180, 180]). Sectors are never normalized implicitly; un-normalized inputs
//! give unspecified results.

use super::{angle::Angle, constants::EXTENT_SAMPLE_DENSITY, globe::Globe, latlon::LatLon};
use crate::spatial::culling::Extent;
use crate::{GlobeError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    min_lat: Angle,
    max_lat: Angle,
    min_lon: Angle,
    max_lon: Angle,
    delta_lat: Angle,
    delta_lon: Angle,
}

impl Sector {
    pub const EMPTY_SECTOR: Sector = Sector {
        min_lat: Angle::ZERO,
        max_lat: Angle::ZERO,
        min_lon: Angle::ZERO,
        max_lon: Angle::ZERO,
        delta_lat: Angle::ZERO,
        delta_lon: Angle::ZERO,
    };

    pub const FULL_SPHERE: Sector = Sector {
        min_lat: Angle::NEG90,
        max_lat: Angle::POS90,
        min_lon: Angle::NEG180,
        max_lon: Angle::POS180,
        delta_lat: Angle::POS180,
        delta_lon: Angle::POS360,
    };

    /// Creates a sector, failing if either minimum exceeds its maximum.
    pub fn new(min_lat: Angle, max_lat: Angle, min_lon: Angle, max_lon: Angle) -> Result<Self> {
        if min_lat.degrees > max_lat.degrees || min_lon.degrees > max_lon.degrees {
            return Err(GlobeError::InvalidSector(format!(
                "min must not exceed max: lat [{}, {}], lon [{}, {}]",
                min_lat.degrees, max_lat.degrees, min_lon.degrees, max_lon.degrees
            )));
        }
        if [min_lat, max_lat, min_lon, max_lon]
            .iter()
            .any(|a| a.degrees.is_nan())
        {
            return Err(GlobeError::InvalidSector("NaN bound".to_string()));
        }
        Ok(Self::from_bounds(min_lat, max_lat, min_lon, max_lon))
    }

    pub fn from_degrees(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self> {
        Self::new(
            Angle::from_degrees(min_lat),
            Angle::from_degrees(max_lat),
            Angle::from_degrees(min_lon),
            Angle::from_degrees(max_lon),
        )
    }

    pub fn from_radians(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self> {
        Self::new(
            Angle::from_radians(min_lat),
            Angle::from_radians(max_lat),
            Angle::from_radians(min_lon),
            Angle::from_radians(max_lon),
        )
    }

    /// Internal constructor for bounds already known to be ordered.
    pub(crate) fn from_bounds(
        min_lat: Angle,
        max_lat: Angle,
        min_lon: Angle,
        max_lon: Angle,
    ) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            delta_lat: max_lat - min_lat,
            delta_lon: max_lon - min_lon,
        }
    }

    pub fn min_lat(&self) -> Angle {
        self.min_lat
    }

    pub fn max_lat(&self) -> Angle {
        self.max_lat
    }

    pub fn min_lon(&self) -> Angle {
        self.min_lon
    }

    pub fn max_lon(&self) -> Angle {
        self.max_lon
    }

    pub fn delta_lat(&self) -> Angle {
        self.delta_lat
    }

    pub fn delta_lon(&self) -> Angle {
        self.delta_lon
    }

    pub fn is_empty_sentinel(&self) -> bool {
        *self == Self::EMPTY_SECTOR
    }

    pub fn centroid(&self) -> LatLon {
        LatLon::new(
            Angle::average(self.min_lat, self.max_lat),
            Angle::average(self.min_lon, self.max_lon),
        )
    }

    /// Corners counter-clockwise from the south-west.
    pub fn corners(&self) -> [LatLon; 4] {
        [
            LatLon::new(self.min_lat, self.min_lon),
            LatLon::new(self.min_lat, self.max_lon),
            LatLon::new(self.max_lat, self.max_lon),
            LatLon::new(self.max_lat, self.min_lon),
        ]
    }

    /// True when the sectors overlap or share an edge.
    pub fn intersects(&self, other: &Sector) -> bool {
        !(other.max_lon.degrees < self.min_lon.degrees
            || other.min_lon.degrees > self.max_lon.degrees
            || other.max_lat.degrees < self.min_lat.degrees
            || other.min_lat.degrees > self.max_lat.degrees)
    }

    /// True when the sectors overlap with non-zero area.
    pub fn intersects_interior(&self, other: &Sector) -> bool {
        !(other.max_lon.degrees <= self.min_lon.degrees
            || other.min_lon.degrees >= self.max_lon.degrees
            || other.max_lat.degrees <= self.min_lat.degrees
            || other.min_lat.degrees >= self.max_lat.degrees)
    }

    pub fn contains(&self, other: &Sector) -> bool {
        other.min_lat.degrees >= self.min_lat.degrees
            && other.max_lat.degrees <= self.max_lat.degrees
            && other.min_lon.degrees >= self.min_lon.degrees
            && other.max_lon.degrees <= self.max_lon.degrees
    }

    pub fn contains_location(&self, location: &LatLon) -> bool {
        self.contains_degrees(location.lat.degrees, location.lon.degrees)
    }

    pub fn contains_degrees(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat.degrees
            && lat <= self.max_lat.degrees
            && lon >= self.min_lon.degrees
            && lon <= self.max_lon.degrees
    }

    pub fn union(&self, other: &Sector) -> Sector {
        Self::from_bounds(
            Angle::from_degrees(self.min_lat.degrees.min(other.min_lat.degrees)),
            Angle::from_degrees(self.max_lat.degrees.max(other.max_lat.degrees)),
            Angle::from_degrees(self.min_lon.degrees.min(other.min_lon.degrees)),
            Angle::from_degrees(self.max_lon.degrees.max(other.max_lon.degrees)),
        )
    }

    /// Overlapping region, or `None` when the sectors are disjoint.
    pub fn intersection(&self, other: &Sector) -> Option<Sector> {
        let min_lat = self.min_lat.degrees.max(other.min_lat.degrees);
        let max_lat = self.max_lat.degrees.min(other.max_lat.degrees);
        if min_lat > max_lat {
            return None;
        }

        let min_lon = self.min_lon.degrees.max(other.min_lon.degrees);
        let max_lon = self.max_lon.degrees.min(other.max_lon.degrees);
        if min_lon > max_lon {
            return None;
        }

        Some(Self::from_bounds(
            Angle::from_degrees(min_lat),
            Angle::from_degrees(max_lat),
            Angle::from_degrees(min_lon),
            Angle::from_degrees(max_lon),
        ))
    }

    /// Splits the sector at its midpoints into south-west, south-east, north-west, north-east.
    pub fn subdivide(&self) -> [Sector; 4] {
        let mid_lat = Angle::average(self.min_lat, self.max_lat);
        let mid_lon = Angle::average(self.min_lon, self.max_lon);

        [
            Self::from_bounds(self.min_lat, mid_lat, self.min_lon, mid_lon),
            Self::from_bounds(self.min_lat, mid_lat, mid_lon, self.max_lon),
            Self::from_bounds(mid_lat, self.max_lat, self.min_lon, mid_lon),
            Self::from_bounds(mid_lat, self.max_lat, mid_lon, self.max_lon),
        ]
    }

    /// Splits the sector into an `n` x `n` grid, rows south to north. Empty for `n == 0`.
    pub fn subdivide_into(&self, n: usize) -> Vec<Sector> {
        if n == 0 {
            return Vec::new();
        }

        let d_lat = self.delta_lat.degrees / n as f64;
        let d_lon = self.delta_lon.degrees / n as f64;
        let mut sectors = Vec::with_capacity(n * n);

        for row in 0..n {
            let lat0 = self.min_lat.degrees + d_lat * row as f64;
            let lat1 = if row + 1 == n {
                self.max_lat.degrees
            } else {
                lat0 + d_lat
            };
            for col in 0..n {
                let lon0 = self.min_lon.degrees + d_lon * col as f64;
                let lon1 = if col + 1 == n {
                    self.max_lon.degrees
                } else {
                    lon0 + d_lon
                };
                sectors.push(Self::from_bounds(
                    Angle::from_degrees(lat0),
                    Angle::from_degrees(lat1),
                    Angle::from_degrees(lon0),
                    Angle::from_degrees(lon1),
                ));
            }
        }

        sectors
    }

    /// Smallest sector containing every location. [`Sector::EMPTY_SECTOR`] for no locations.
    pub fn bounding_sector<'a>(locations: impl IntoIterator<Item = &'a LatLon>) -> Sector {
        let mut locations = locations.into_iter().peekable();
        if locations.peek().is_none() {
            return Self::EMPTY_SECTOR;
        }

        let (mut min_lat, mut max_lat) = (90.0f64, -90.0f64);
        let (mut min_lon, mut max_lon) = (180.0f64, -180.0f64);
        for location in locations {
            min_lat = min_lat.min(location.lat.degrees);
            max_lat = max_lat.max(location.lat.degrees);
            min_lon = min_lon.min(location.lon.degrees);
            max_lon = max_lon.max(location.lon.degrees);
        }

        Self::from_bounds(
            Angle::from_degrees(min_lat),
            Angle::from_degrees(max_lat),
            Angle::from_degrees(min_lon),
            Angle::from_degrees(max_lon),
        )
    }

    /// Bounds a set of locations that straddles the antimeridian as an eastern and a western sector.
    ///
    /// Positive longitudes feed the eastern sector `[min_lon, 180]` and negative ones
    /// the western sector `[-180, max_lon]`. A sign change of less than 180 degrees
    /// between consecutive locations crosses the prime meridian, which forces both
    /// inner bounds to 0. Returns `None` unless at least two distinct locations are given.
    pub fn split_bounding_sectors<'a>(
        locations: impl IntoIterator<Item = &'a LatLon>,
    ) -> Option<[Sector; 2]> {
        let (mut min_lat, mut max_lat) = (90.0f64, -90.0f64);
        let (mut min_lon, mut max_lon) = (180.0f64, -180.0f64);
        let mut first: Option<&LatLon> = None;
        let mut last: Option<&LatLon> = None;
        let mut distinct = false;

        for location in locations {
            match first {
                None => first = Some(location),
                Some(first) => distinct |= first != location,
            }
            let lat = location.lat.degrees;
            let lon = location.lon.degrees;
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
            if lon >= 0.0 && lon < min_lon {
                min_lon = lon;
            }
            if lon <= 0.0 && lon > max_lon {
                max_lon = lon;
            }

            if let Some(previous) = last {
                let last_lon = previous.lon.degrees;
                if lon.signum() != last_lon.signum() && (lon - last_lon).abs() < 180.0 {
                    min_lon = 0.0;
                    max_lon = 0.0;
                }
            }
            last = Some(location);
        }

        if !distinct {
            return None;
        }

        Some([
            Self::from_bounds(
                Angle::from_degrees(min_lat),
                Angle::from_degrees(max_lat),
                Angle::from_degrees(min_lon),
                Angle::POS180,
            ),
            Self::from_bounds(
                Angle::from_degrees(min_lat),
                Angle::from_degrees(max_lat),
                Angle::NEG180,
                Angle::from_degrees(max_lon),
            ),
        ])
    }

    /// One bounding sector, or two when the path crosses the antimeridian.
    pub fn bounding_sectors(locations: &[LatLon]) -> Vec<Sector> {
        if LatLon::path_crosses_dateline(locations) {
            if let Some(split) = Self::split_bounding_sectors(locations) {
                return split.to_vec();
            }
        }
        vec![Self::bounding_sector(locations)]
    }

    /// Cartesian corners and centroid on the globe surface.
    pub fn reference_points(&self, globe: &Globe) -> [Vector3<f64>; 5] {
        let [sw, se, ne, nw] = self.corners();
        [
            globe.compute_point_from_location(&sw),
            globe.compute_point_from_location(&se),
            globe.compute_point_from_location(&ne),
            globe.compute_point_from_location(&nw),
            globe.compute_point_from_location(&self.centroid()),
        ]
    }

    /// Minimum distance from `point` to the sector's reference points, in meters.
    pub fn distance_to(&self, globe: &Globe, point: &Vector3<f64>) -> f64 {
        self.reference_points(globe)
            .iter()
            .map(|p| (p - point).norm())
            .fold(f64::INFINITY, f64::min)
    }

    /// Bounding sphere of the sector's surface.
    ///
    /// Fitted to a regular grid of surface samples, then inflated by the sagitta
    /// of the arc between neighbouring samples so the curved surface in between
    /// stays inside.
    pub fn extent(&self, globe: &Globe) -> Extent {
        let n = EXTENT_SAMPLE_DENSITY;
        let steps = (n - 1) as f64;
        let mut points = Vec::with_capacity(n * n);

        for i in 0..n {
            let lat = self.min_lat.degrees + self.delta_lat.degrees * i as f64 / steps;
            for j in 0..n {
                let lon = self.min_lon.degrees + self.delta_lon.degrees * j as f64 / steps;
                points.push(globe.compute_point_from_position(
                    Angle::from_degrees(lat),
                    Angle::from_degrees(lon),
                    0.0,
                ));
            }
        }

        let sample_spacing = (self.delta_lat.radians().powi(2) + self.delta_lon.radians().powi(2))
            .sqrt()
            / steps;
        let sagitta = globe.radius() * (1.0 - (sample_spacing / 2.0).cos());

        match Extent::from_points(&points) {
            Some(extent) => Extent::new(extent.center, extent.radius + sagitta),
            None => Extent::new(Vector3::zeros(), 0.0),
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}), ({}, {})",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
