//! Ellipsoidal globe model.
//!
//! Cartesian coordinates are Y-up: +Y through the north pole, +Z through
//! (0, 0) and +X through (0, 90E).

use super::{
    angle::Angle,
    constants::{WGS84_EQUATORIAL_RADIUS, WGS84_ES, WGS84_POLAR_RADIUS},
    latlon::LatLon,
};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

const INVERSE_ITERATIONS: usize = 10;

/// A geographic position with an elevation in meters above the ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub location: LatLon,
    pub elevation: f64,
}

impl Position {
    pub fn new(location: LatLon, elevation: f64) -> Self {
        Self {
            location,
            elevation,
        }
    }

    pub fn from_degrees(lat: f64, lon: f64, elevation: f64) -> Self {
        Self::new(LatLon::from_degrees(lat, lon), elevation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Globe {
    equatorial_radius: f64,
    polar_radius: f64,
    es: f64,
}

impl Default for Globe {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Globe {
    pub fn wgs84() -> Self {
        Self {
            equatorial_radius: WGS84_EQUATORIAL_RADIUS,
            polar_radius: WGS84_POLAR_RADIUS,
            es: WGS84_ES,
        }
    }

    pub fn new(equatorial_radius: f64, polar_radius: f64) -> Self {
        let es = 1.0 - (polar_radius * polar_radius) / (equatorial_radius * equatorial_radius);
        Self {
            equatorial_radius,
            polar_radius,
            es,
        }
    }

    /// A perfect sphere, handy for tests.
    pub fn sphere(radius: f64) -> Self {
        Self::new(radius, radius)
    }

    pub fn equatorial_radius(&self) -> f64 {
        self.equatorial_radius
    }

    pub fn polar_radius(&self) -> f64 {
        self.polar_radius
    }

    /// Radius used to turn angular texel sizes into meters.
    pub fn radius(&self) -> f64 {
        self.equatorial_radius
    }

    pub fn eccentricity_squared(&self) -> f64 {
        self.es
    }

    pub fn compute_point_from_position(
        &self,
        lat: Angle,
        lon: Angle,
        elevation: f64,
    ) -> Vector3<f64> {
        let (sin_lat, cos_lat) = lat.radians().sin_cos();
        let (sin_lon, cos_lon) = lon.radians().sin_cos();

        let rpm = self.equatorial_radius / (1.0 - self.es * sin_lat * sin_lat).sqrt();

        Vector3::new(
            (rpm + elevation) * cos_lat * sin_lon,
            (rpm * (1.0 - self.es) + elevation) * sin_lat,
            (rpm + elevation) * cos_lat * cos_lon,
        )
    }

    pub fn compute_point_from_location(&self, location: &LatLon) -> Vector3<f64> {
        self.compute_point_from_position(location.lat, location.lon, 0.0)
    }

    pub fn compute_point(&self, position: &Position) -> Vector3<f64> {
        self.compute_point_from_position(
            position.location.lat,
            position.location.lon,
            position.elevation,
        )
    }

    /// Inverse of [`Globe::compute_point_from_position`], by fixed-point iteration on latitude.
    pub fn compute_position_from_point(&self, point: &Vector3<f64>) -> Position {
        let lon = point.x.atan2(point.z);
        let p = (point.x * point.x + point.z * point.z).sqrt();

        if p < 1e-9 {
            let lat = if point.y >= 0.0 { 90.0 } else { -90.0 };
            return Position::new(
                LatLon::new(Angle::from_degrees(lat), Angle::from_radians(lon)),
                point.y.abs() - self.polar_radius,
            );
        }

        let mut lat = point.y.atan2(p * (1.0 - self.es));
        let mut elevation = 0.0;
        for _ in 0..INVERSE_ITERATIONS {
            let sin_lat = lat.sin();
            let n = self.equatorial_radius / (1.0 - self.es * sin_lat * sin_lat).sqrt();
            elevation = p / lat.cos() - n;
            lat = point.y.atan2(p * (1.0 - self.es * n / (n + elevation)));
        }

        Position::new(
            LatLon::new(Angle::from_radians(lat), Angle::from_radians(lon)),
            elevation,
        )
    }

    /// Nearest intersection of a ray with the ellipsoid surface, if any.
    pub fn intersect_ray(
        &self,
        origin: &Vector3<f64>,
        direction: &Vector3<f64>,
    ) -> Option<Vector3<f64>> {
        // Scale Y so the ellipsoid becomes a sphere of the equatorial radius.
        let ratio = self.equatorial_radius / self.polar_radius;
        let o = Vector3::new(origin.x, origin.y * ratio, origin.z);
        let d = Vector3::new(direction.x, direction.y * ratio, direction.z);

        let a = d.dot(&d);
        let b = 2.0 * o.dot(&d);
        let c = o.dot(&o) - self.equatorial_radius * self.equatorial_radius;
        let discriminant = b * b - 4.0 * a * c;
        if a == 0.0 || discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t0 = (-b - sqrt_disc) / (2.0 * a);
        let t1 = (-b + sqrt_disc) / (2.0 * a);
        let t = if t0 >= 0.0 {
            t0
        } else if t1 >= 0.0 {
            t1
        } else {
            return None;
        };

        Some(origin + direction * t)
    }

    /// Outward surface normal at a location.
    pub fn surface_normal(&self, location: &LatLon) -> Vector3<f64> {
        let (sin_lat, cos_lat) = location.lat.radians().sin_cos();
        let (sin_lon, cos_lon) = location.lon.radians().sin_cos();
        Vector3::new(cos_lat * sin_lon, sin_lat, cos_lat * cos_lon)
    }

    /// Unit vector pointing north along the surface at a location.
    pub fn north_tangent(&self, location: &LatLon) -> Vector3<f64> {
        let (sin_lat, cos_lat) = location.lat.radians().sin_cos();
        let (sin_lon, cos_lon) = location.lon.radians().sin_cos();
        Vector3::new(-sin_lat * sin_lon, cos_lat, -sin_lat * cos_lon)
    }
}
