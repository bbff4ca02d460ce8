//! Geographic coordinates and geodesic algorithms.
//!
//! Spherical formulas (great circle, rhumb line) work in angular units and are
//! independent of any globe radius. The ellipsoidal solutions follow Vincenty
//! and take the ellipsoid radii explicitly.
//!
//! Every function here is total: a NaN produced by a degenerate configuration
//! (antipodal or polar points) is replaced by [`Angle::ZERO`] or by the input
//! position instead of being propagated.

use super::angle::Angle;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;

/// Convergence tolerance for the forward azimuth iteration, in radians.
const AZIMUTH_TOLERANCE: f64 = 1e-12;
const AZIMUTH_MAX_ITERATIONS: usize = 100;
/// Convergence tolerance for the inverse distance iteration, in radians.
const DISTANCE_TOLERANCE: f64 = 0.5e-13;
const DISTANCE_MAX_ITERATIONS: usize = 10;
/// Below this latitude change the Mercator ratio is numerically useless.
const RHUMB_FLAT_TOLERANCE: f64 = 1e-12;

/// A latitude/longitude pair. Values are not clamped or normalized.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: Angle,
    pub lon: Angle,
}

/// Which pole a closed set of locations encloses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pole {
    North,
    South,
}

impl LatLon {
    pub const ZERO: LatLon = LatLon {
        lat: Angle::ZERO,
        lon: Angle::ZERO,
    };

    pub fn new(lat: Angle, lon: Angle) -> Self {
        Self { lat, lon }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self::new(Angle::from_degrees(lat), Angle::from_degrees(lon))
    }

    pub fn from_radians(lat: f64, lon: f64) -> Self {
        Self::new(Angle::from_radians(lat), Angle::from_radians(lon))
    }

    /// Returns a copy with latitude folded into [-90, 90] and longitude wrapped into [-180, 180].
    pub fn normalized(&self) -> LatLon {
        LatLon::new(self.lat.normalized_latitude(), self.lon.normalized_longitude())
    }

    /// Arithmetic mean of a set of locations, or `None` if the set is empty.
    pub fn average<'a>(locations: impl IntoIterator<Item = &'a LatLon>) -> Option<LatLon> {
        let mut count = 0usize;
        let (mut lat, mut lon) = (0.0, 0.0);
        for location in locations {
            lat += location.lat.degrees;
            lon += location.lon.degrees;
            count += 1;
        }

        if count == 0 {
            None
        } else {
            Some(LatLon::from_degrees(lat / count as f64, lon / count as f64))
        }
    }

    /// Angular length of the great-circle arc between two locations (haversine).
    pub fn great_circle_distance(p1: &LatLon, p2: &LatLon) -> Angle {
        let (lat1, lon1) = (p1.lat.radians(), p1.lon.radians());
        let (lat2, lon2) = (p2.lat.radians(), p2.lon.radians());

        if lat1 == lat2 && lon1 == lon2 {
            return Angle::ZERO;
        }

        let a = ((lat2 - lat1) / 2.0).sin();
        let b = ((lon2 - lon1) / 2.0).sin();
        let c = a * a + lat1.cos() * lat2.cos() * b * b;
        let distance = 2.0 * c.sqrt().asin();

        if distance.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(distance)
        }
    }

    /// Initial bearing of the great-circle arc from `p1` to `p2`, clockwise from north.
    pub fn great_circle_azimuth(p1: &LatLon, p2: &LatLon) -> Angle {
        let (lat1, lon1) = (p1.lat.radians(), p1.lon.radians());
        let (lat2, lon2) = (p2.lat.radians(), p2.lon.radians());

        if lat1 == lat2 && lon1 == lon2 {
            return Angle::ZERO;
        }
        if lon1 == lon2 {
            return if lat1 > lat2 { Angle::POS180 } else { Angle::ZERO };
        }

        let y = lat2.cos() * (lon2 - lon1).sin();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * (lon2 - lon1).cos();
        let azimuth = y.atan2(x);

        if azimuth.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(azimuth)
        }
    }

    /// Location reached by travelling `distance` along a great circle with initial `azimuth`.
    pub fn great_circle_end_position(p: &LatLon, azimuth: Angle, distance: Angle) -> LatLon {
        if distance.degrees == 0.0 {
            return *p;
        }

        let (lat, lon) = (p.lat.radians(), p.lon.radians());
        let (az, d) = (azimuth.radians(), distance.radians());

        let end_lat = (lat.sin() * d.cos() + lat.cos() * d.sin() * az.cos()).asin();
        let end_lon =
            lon + (d.sin() * az.sin()).atan2(lat.cos() * d.cos() - lat.sin() * d.sin() * az.cos());

        if end_lat.is_nan() || end_lon.is_nan() {
            return *p;
        }

        LatLon::new(
            Angle::from_radians(end_lat).normalized_latitude(),
            Angle::from_radians(end_lon).normalized_longitude(),
        )
    }

    /// Angular length of the constant-bearing path between two locations.
    pub fn rhumb_distance(p1: &LatLon, p2: &LatLon) -> Angle {
        let (lat1, lon1) = (p1.lat.radians(), p1.lon.radians());
        let (lat2, lon2) = (p2.lat.radians(), p2.lon.radians());

        if lat1 == lat2 && lon1 == lon2 {
            return Angle::ZERO;
        }

        let dlat = lat2 - lat1;
        let mut dlon = lon2 - lon1;
        let dphi = mercator_ratio(lat1, lat2);
        let q = rhumb_stretch(dlat, dphi, lat1);

        // Take the shorter way across the antimeridian.
        if dlon.abs() > PI {
            dlon = if dlon > 0.0 {
                -(2.0 * PI - dlon)
            } else {
                2.0 * PI + dlon
            };
        }

        let distance = (dlat * dlat + q * q * dlon * dlon).sqrt();
        if distance.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(distance)
        }
    }

    /// Constant bearing of the rhumb line from `p1` to `p2`.
    pub fn rhumb_azimuth(p1: &LatLon, p2: &LatLon) -> Angle {
        let (lat1, lon1) = (p1.lat.radians(), p1.lon.radians());
        let (lat2, lon2) = (p2.lat.radians(), p2.lon.radians());

        if lat1 == lat2 && lon1 == lon2 {
            return Angle::ZERO;
        }

        let mut dlon = lon2 - lon1;
        let dphi = mercator_ratio(lat1, lat2);

        if dlon.abs() > PI {
            dlon = if dlon > 0.0 {
                -(2.0 * PI - dlon)
            } else {
                2.0 * PI + dlon
            };
        }

        let azimuth = dlon.atan2(dphi);
        if azimuth.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(azimuth)
        }
    }

    /// Location reached by travelling `distance` along a rhumb line with bearing `azimuth`.
    pub fn rhumb_end_position(p: &LatLon, azimuth: Angle, distance: Angle) -> LatLon {
        if distance.degrees == 0.0 {
            return *p;
        }

        let (lat, lon) = (p.lat.radians(), p.lon.radians());
        let (az, d) = (azimuth.radians(), distance.radians());

        let mut end_lat = lat + d * az.cos();
        let dphi = mercator_ratio(lat, end_lat);
        let q = rhumb_stretch(end_lat - lat, dphi, lat);
        let dlon = d * az.sin() / q;

        // Passing over a pole reflects the latitude back.
        if end_lat.abs() > FRAC_PI_2 {
            end_lat = if end_lat > 0.0 {
                PI - end_lat
            } else {
                -PI - end_lat
            };
        }

        let end_lon = (lon + dlon + PI) % (2.0 * PI) - PI;
        if end_lat.is_nan() || end_lon.is_nan() {
            return *p;
        }

        LatLon::new(
            Angle::from_radians(end_lat).normalized_latitude(),
            Angle::from_radians(end_lon).normalized_longitude(),
        )
    }

    /// Euclidean distance in the lat/lon plane, taking the short way across the antimeridian.
    pub fn linear_distance(p1: &LatLon, p2: &LatLon) -> Angle {
        let dlat = p2.lat.radians() - p1.lat.radians();
        let mut dlon = p2.lon.radians() - p1.lon.radians();

        if dlon.abs() > PI {
            dlon = if dlon > 0.0 {
                -(2.0 * PI - dlon)
            } else {
                2.0 * PI + dlon
            };
        }

        let distance = (dlat * dlat + dlon * dlon).sqrt();
        if distance.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(distance)
        }
    }

    pub fn linear_azimuth(p1: &LatLon, p2: &LatLon) -> Angle {
        let dlat = p2.lat.radians() - p1.lat.radians();
        let mut dlon = p2.lon.radians() - p1.lon.radians();

        if dlon.abs() > PI {
            dlon = if dlon > 0.0 {
                -(2.0 * PI - dlon)
            } else {
                2.0 * PI + dlon
            };
        }

        let azimuth = dlon.atan2(dlat);
        if azimuth.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(azimuth)
        }
    }

    pub fn linear_end_position(p: &LatLon, azimuth: Angle, distance: Angle) -> LatLon {
        if distance.degrees == 0.0 {
            return *p;
        }

        let (lat, lon) = (p.lat.radians(), p.lon.radians());
        let (az, d) = (azimuth.radians(), distance.radians());

        let mut end_lat = lat + d * az.cos();
        if end_lat.abs() > FRAC_PI_2 {
            end_lat = if end_lat > 0.0 {
                PI - end_lat
            } else {
                -PI - end_lat
            };
        }
        let end_lon = (lon + d * az.sin() + PI) % (2.0 * PI) - PI;

        if end_lat.is_nan() || end_lon.is_nan() {
            return *p;
        }

        LatLon::new(
            Angle::from_radians(end_lat).normalized_latitude(),
            Angle::from_radians(end_lon).normalized_longitude(),
        )
    }

    /// Plain linear interpolation of latitude and longitude. `amount` is clamped to [0, 1].
    pub fn interpolate(amount: f64, p1: &LatLon, p2: &LatLon) -> LatLon {
        if p1 == p2 {
            return *p1;
        }
        let t = amount.clamp(0.0, 1.0);
        LatLon::new(
            Angle::mix(t, p1.lat, p2.lat),
            Angle::mix(t, p1.lon, p2.lon),
        )
    }

    /// Interpolates along the great circle joining two locations.
    pub fn interpolate_great_circle(amount: f64, p1: &LatLon, p2: &LatLon) -> LatLon {
        if p1 == p2 {
            return *p1;
        }
        let t = amount.clamp(0.0, 1.0);
        let azimuth = Self::great_circle_azimuth(p1, p2);
        let distance = Self::great_circle_distance(p1, p2);
        Self::great_circle_end_position(p1, azimuth, distance * t)
    }

    /// Interpolates along the rhumb line joining two locations.
    pub fn interpolate_rhumb(amount: f64, p1: &LatLon, p2: &LatLon) -> LatLon {
        if p1 == p2 {
            return *p1;
        }
        let t = amount.clamp(0.0, 1.0);
        let azimuth = Self::rhumb_azimuth(p1, p2);
        let distance = Self::rhumb_distance(p1, p2);
        Self::rhumb_end_position(p1, azimuth, distance * t)
    }

    /// Forward azimuth from `p1` to `p2` on an ellipsoid (Vincenty).
    ///
    /// Iterates until lambda changes by less than 1e-12 radians or the iteration
    /// cap is reached; in the latter case the last estimate is returned.
    pub fn ellipsoidal_forward_azimuth(
        p1: &LatLon,
        p2: &LatLon,
        equatorial_radius: f64,
        polar_radius: f64,
    ) -> Angle {
        let f = (equatorial_radius - polar_radius) / equatorial_radius;

        let u1 = ((1.0 - f) * p1.lat.radians().tan()).atan();
        let (su1, cu1) = u1.sin_cos();
        let u2 = ((1.0 - f) * p2.lat.radians().tan()).atan();
        let (su2, cu2) = u2.sin_cos();

        let l = (p2.lon - p1.lon).radians();

        let mut lambda = l;
        let mut s_lambda = lambda.sin();
        let mut c_lambda = lambda.cos();
        let mut lambda_prev = f64::MAX;
        let mut iterations = 0;

        while (lambda - lambda_prev).abs() > AZIMUTH_TOLERANCE && iterations < AZIMUTH_MAX_ITERATIONS
        {
            iterations += 1;
            lambda_prev = lambda;

            let s_sigma = ((cu2 * s_lambda).powi(2)
                + (cu1 * su2 - su1 * cu2 * c_lambda).powi(2))
            .sqrt();
            let c_sigma = su1 * su2 + cu1 * cu2 * c_lambda;
            let sigma = s_sigma.atan2(c_sigma);
            let s_alpha = cu1 * cu2 * s_lambda / s_sigma;
            let c_alpha2 = 1.0 - s_alpha * s_alpha;

            // Equatorial lines: cos^2(alpha) vanishes and so does this term.
            let c_sigma_m2 = if c_alpha2.abs() < 1e-6 {
                0.0
            } else {
                c_sigma - 2.0 * su1 * su2 / c_alpha2
            };

            let c = f / 16.0 * c_alpha2 * (4.0 + f * (4.0 - 3.0 * c_alpha2));
            lambda = l
                + (1.0 - c)
                    * f
                    * s_alpha
                    * (sigma
                        + c * s_sigma * (c_sigma_m2 + c * c_sigma * (-1.0 + 2.0 * c_sigma_m2)));
            s_lambda = lambda.sin();
            c_lambda = lambda.cos();

            if lambda.is_nan() {
                return Angle::ZERO;
            }
        }

        let azimuth = (cu2 * s_lambda).atan2(cu1 * su2 - su1 * cu2 * c_lambda);
        if azimuth.is_nan() {
            Angle::ZERO
        } else {
            Angle::from_radians(azimuth)
        }
    }

    /// Geodesic distance in meters between two locations on an ellipsoid.
    ///
    /// Vincenty's inverse solution with Helmert's elliptic terms. Not valid for
    /// antipodal points or for either point on a pole; in those cases, or when
    /// the iteration cap is hit, the best available estimate is returned and a
    /// NaN result collapses to 0.
    pub fn ellipsoidal_distance(
        p1: &LatLon,
        p2: &LatLon,
        equatorial_radius: f64,
        polar_radius: f64,
    ) -> f64 {
        if p1 == p2 {
            return 0.0;
        }

        let f = (equatorial_radius - polar_radius) / equatorial_radius;
        let r = 1.0 - f;

        let (glat1, glon1) = (p1.lat.radians(), p1.lon.radians());
        let (glat2, glon2) = (p2.lat.radians(), p2.lon.radians());

        let mut tu1 = r * glat1.sin() / glat1.cos();
        let mut tu2 = r * glat2.sin() / glat2.cos();
        let cu1 = 1.0 / (tu1 * tu1 + 1.0).sqrt();
        let su1 = cu1 * tu1;
        let cu2 = 1.0 / (tu2 * tu2 + 1.0).sqrt();
        let mut s = cu1 * cu2;
        let baz = s * tu2;
        let faz = baz * tu1;
        let mut x = glon2 - glon1;

        let (mut sy, mut cy, mut y, mut c2a, mut cz, mut e);
        let mut iterations = 0;
        loop {
            let (sx, cx) = x.sin_cos();
            tu1 = cu2 * sx;
            tu2 = baz - su1 * cu2 * cx;
            sy = (tu1 * tu1 + tu2 * tu2).sqrt();
            cy = s * cx + faz;
            y = sy.atan2(cy);
            let sa = s * sx / sy;
            c2a = -sa * sa + 1.0;
            cz = faz + faz;
            if c2a > 0.0 {
                cz = -cz / c2a + cy;
            }
            e = cz * cz * 2.0 - 1.0;
            let c = ((-3.0 * c2a + 4.0) * f + 4.0) * c2a * f / 16.0;
            let d = x;
            x = ((e * cy * c + cz) * sy * c + y) * sa;
            x = (1.0 - c) * x * f + glon2 - glon1;

            iterations += 1;
            if (d - x).abs() <= DISTANCE_TOLERANCE || iterations >= DISTANCE_MAX_ITERATIONS {
                break;
            }
        }

        let mut x = ((1.0 / r / r - 1.0) * c2a + 1.0).sqrt() + 1.0;
        x = (x - 2.0) / x;
        let mut c = 1.0 - x;
        c = (x * x / 4.0 + 1.0) / c;
        let d = (0.375 * x * x - 1.0) * x;
        x = e * cy;
        s = 1.0 - e - e;
        s = ((((sy * sy * 4.0 - 3.0) * s * cz * d / 6.0 - x) * d / 4.0 + cz) * sy * d + y)
            * c
            * equatorial_radius
            * r;

        if s.is_nan() {
            0.0
        } else {
            s
        }
    }

    /// True when the segment between two locations crosses the antimeridian.
    ///
    /// Heuristic: the longitudes differ in sign and are more than 180 degrees
    /// apart. Segments legitimately spanning more than 180 degrees of longitude
    /// are reported as crossing too.
    pub fn locations_cross_dateline(p1: &LatLon, p2: &LatLon) -> bool {
        let (lon1, lon2) = (p1.lon.degrees, p2.lon.degrees);
        if lon1.signum() != lon2.signum() {
            let delta = (lon1 - lon2).abs();
            return delta > 180.0 && delta < 360.0;
        }
        false
    }

    /// True when any consecutive pair of the path crosses the antimeridian.
    pub fn path_crosses_dateline<'a>(locations: impl IntoIterator<Item = &'a LatLon>) -> bool {
        let mut previous: Option<&LatLon> = None;
        for location in locations {
            if let Some(prev) = previous {
                if Self::locations_cross_dateline(prev, location) {
                    return true;
                }
            }
            previous = Some(location);
        }
        false
    }

    /// Determines which pole, if any, a closed loop of locations encloses.
    ///
    /// An odd number of antimeridian crossings means a pole is enclosed. The
    /// loop is closed implicitly when the last location differs from the first.
    /// The pole is the one in the loop's hemisphere, or the one nearest its
    /// extreme latitude when the loop spans the equator.
    pub fn locations_contain_pole(locations: &[LatLon]) -> Option<Pole> {
        let mut contains_pole = false;
        let mut min_lat = 90.0f64;
        let mut max_lat = -90.0f64;

        for pair in locations.windows(2) {
            if Self::locations_cross_dateline(&pair[0], &pair[1]) {
                contains_pole = !contains_pole;
            }
        }
        if let (Some(first), Some(last)) = (locations.first(), locations.last()) {
            if first != last && Self::locations_cross_dateline(last, first) {
                contains_pole = !contains_pole;
            }
        }
        for location in locations {
            min_lat = min_lat.min(location.lat.degrees);
            max_lat = max_lat.max(location.lat.degrees);
        }

        if !contains_pole {
            None
        } else if min_lat > 0.0 {
            Some(Pole::North)
        } else if max_lat < 0.0 {
            Some(Pole::South)
        } else if max_lat.abs() >= min_lat.abs() {
            Some(Pole::North)
        } else {
            Some(Pole::South)
        }
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}

/// Difference of the Mercator northings of two latitudes.
fn mercator_ratio(lat1: f64, lat2: f64) -> f64 {
    ((lat2 / 2.0 + FRAC_PI_4).tan() / (lat1 / 2.0 + FRAC_PI_4).tan()).ln()
}

/// East-west stretch factor of a rhumb line. Nearly flat lines fall back to `cos(lat1)`.
fn rhumb_stretch(dlat: f64, dphi: f64, lat1: f64) -> f64 {
    let q = dlat / dphi;
    if dlat.abs() < RHUMB_FLAT_TOLERANCE || dphi.is_nan() || !q.is_finite() {
        lat1.cos()
    } else {
        q
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS};

    fn assert_close(a: f64, b: f64, tolerance: f64) {
        assert!((a - b).abs() <= tolerance, "{a} != {b} (tolerance {tolerance})");
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = LatLon::from_degrees(12.5, -43.0);
        assert_eq!(LatLon::great_circle_distance(&p, &p), Angle::ZERO);
        assert_eq!(LatLon::rhumb_distance(&p, &p), Angle::ZERO);
        assert_eq!(LatLon::great_circle_azimuth(&p, &p), Angle::ZERO);
        assert_eq!(LatLon::rhumb_azimuth(&p, &p), Angle::ZERO);
        assert_eq!(
            LatLon::ellipsoidal_distance(&p, &p, WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS),
            0.0
        );
    }

    #[test]
    fn test_great_circle_quarter_equator() {
        let a = LatLon::from_degrees(0.0, 0.0);
        let b = LatLon::from_degrees(0.0, 90.0);
        assert_close(LatLon::great_circle_distance(&a, &b).degrees, 90.0, 1e-9);
        assert_close(LatLon::great_circle_azimuth(&a, &b).degrees, 90.0, 1e-9);
    }

    #[test]
    fn test_meridian_azimuth_shortcut() {
        let north = LatLon::from_degrees(10.0, 5.0);
        let south = LatLon::from_degrees(-10.0, 5.0);
        assert_eq!(LatLon::great_circle_azimuth(&north, &south), Angle::POS180);
        assert_eq!(LatLon::great_circle_azimuth(&south, &north), Angle::ZERO);
    }

    #[test]
    fn test_great_circle_round_trip() {
        let p = LatLon::from_degrees(40.7128, -74.0060);
        let q = LatLon::from_degrees(51.5074, -0.1278);

        let azimuth = LatLon::great_circle_azimuth(&p, &q);
        let distance = LatLon::great_circle_distance(&p, &q);
        let end = LatLon::great_circle_end_position(&p, azimuth, distance);

        assert_close(end.lat.degrees, q.lat.degrees, 1e-9);
        assert_close(end.lon.degrees, q.lon.degrees, 1e-9);
    }

    #[test]
    fn test_end_position_zero_distance_returns_input() {
        let p = LatLon::from_degrees(1.0, 2.0);
        assert_eq!(
            LatLon::great_circle_end_position(&p, Angle::from_degrees(30.0), Angle::ZERO),
            p
        );
        assert_eq!(
            LatLon::rhumb_end_position(&p, Angle::from_degrees(30.0), Angle::ZERO),
            p
        );
    }

    #[test]
    fn test_rhumb_along_equator_uses_cosine_branch() {
        let a = LatLon::from_degrees(0.0, 0.0);
        let b = LatLon::from_degrees(0.0, 90.0);
        assert_close(LatLon::rhumb_distance(&a, &b).degrees, 90.0, 1e-9);
        assert_close(LatLon::rhumb_azimuth(&a, &b).degrees, 90.0, 1e-9);
    }

    #[test]
    fn test_rhumb_parallel_distance_scales_with_latitude() {
        let a = LatLon::from_degrees(60.0, 0.0);
        let b = LatLon::from_degrees(60.0, 10.0);
        // Along a parallel the rhumb length is dLon * cos(lat).
        assert_close(LatLon::rhumb_distance(&a, &b).degrees, 5.0, 1e-9);
    }

    #[test]
    fn test_rhumb_round_trip() {
        let p = LatLon::from_degrees(10.0, 20.0);
        let q = LatLon::from_degrees(35.0, 65.0);

        let azimuth = LatLon::rhumb_azimuth(&p, &q);
        let distance = LatLon::rhumb_distance(&p, &q);
        let end = LatLon::rhumb_end_position(&p, azimuth, distance);

        assert_close(end.lat.degrees, q.lat.degrees, 1e-8);
        assert_close(end.lon.degrees, q.lon.degrees, 1e-8);
    }

    #[test]
    fn test_rhumb_takes_short_way_across_dateline() {
        let a = LatLon::from_degrees(0.0, 170.0);
        let b = LatLon::from_degrees(0.0, -170.0);
        assert_close(LatLon::rhumb_distance(&a, &b).degrees, 20.0, 1e-9);
        assert_close(LatLon::linear_distance(&a, &b).degrees, 20.0, 1e-9);
    }

    #[test]
    fn test_vincenty_flinders_peak_to_buninyong() {
        let flinders = LatLon::new(
            Angle::from_dms(-37, 57, 3.72030).unwrap(),
            Angle::from_dms(144, 25, 29.52440).unwrap(),
        );
        let buninyong = LatLon::new(
            Angle::from_dms(-37, 39, 10.15610).unwrap(),
            Angle::from_dms(143, 55, 35.38390).unwrap(),
        );

        let distance = LatLon::ellipsoidal_distance(
            &flinders,
            &buninyong,
            WGS84_EQUATORIAL_RADIUS,
            WGS84_POLAR_RADIUS,
        );
        assert_close(distance, 54_972.271, 0.01);

        let azimuth = LatLon::ellipsoidal_forward_azimuth(
            &flinders,
            &buninyong,
            WGS84_EQUATORIAL_RADIUS,
            WGS84_POLAR_RADIUS,
        );
        // 306 52' 05.37" expressed in (-180, 180].
        assert_close(azimuth.degrees + 360.0, 306.868158, 1e-5);
    }

    #[test]
    fn test_dateline_heuristic() {
        assert!(LatLon::locations_cross_dateline(
            &LatLon::from_degrees(10.0, 179.0),
            &LatLon::from_degrees(10.0, -179.0)
        ));
        assert!(!LatLon::locations_cross_dateline(
            &LatLon::from_degrees(10.0, 10.0),
            &LatLon::from_degrees(10.0, -10.0)
        ));
        assert!(!LatLon::locations_cross_dateline(
            &LatLon::from_degrees(10.0, 170.0),
            &LatLon::from_degrees(10.0, 175.0)
        ));
    }

    #[test]
    fn test_path_crosses_dateline() {
        let path = [
            LatLon::from_degrees(0.0, 170.0),
            LatLon::from_degrees(0.0, 178.0),
            LatLon::from_degrees(0.0, -178.0),
        ];
        assert!(LatLon::path_crosses_dateline(&path));
        assert!(!LatLon::path_crosses_dateline(&path[..2]));
    }

    #[test]
    fn test_locations_contain_pole() {
        let arctic_ring = [
            LatLon::from_degrees(80.0, 0.0),
            LatLon::from_degrees(80.0, 90.0),
            LatLon::from_degrees(80.0, 179.0),
            LatLon::from_degrees(80.0, -90.0),
        ];
        assert_eq!(LatLon::locations_contain_pole(&arctic_ring), Some(Pole::North));

        let antarctic_ring: Vec<LatLon> = arctic_ring
            .iter()
            .map(|p| LatLon::new(-p.lat, p.lon))
            .collect();
        assert_eq!(LatLon::locations_contain_pole(&antarctic_ring), Some(Pole::South));

        let square = [
            LatLon::from_degrees(10.0, 10.0),
            LatLon::from_degrees(10.0, 20.0),
            LatLon::from_degrees(20.0, 20.0),
            LatLon::from_degrees(20.0, 10.0),
        ];
        assert_eq!(LatLon::locations_contain_pole(&square), None);
    }

    #[test]
    fn test_interpolation() {
        let a = LatLon::from_degrees(0.0, 0.0);
        let b = LatLon::from_degrees(0.0, 90.0);

        let mid = LatLon::interpolate_great_circle(0.5, &a, &b);
        assert_close(mid.lat.degrees, 0.0, 1e-9);
        assert_close(mid.lon.degrees, 45.0, 1e-9);

        let linear = LatLon::interpolate(2.0, &a, &b);
        assert_eq!(linear, b);

        let rhumb = LatLon::interpolate_rhumb(0.25, &a, &b);
        assert_close(rhumb.lon.degrees, 22.5, 1e-9);
    }

    #[test]
    fn test_average() {
        let points = [LatLon::from_degrees(0.0, 0.0), LatLon::from_degrees(10.0, 20.0)];
        assert_eq!(LatLon::average(&points), Some(LatLon::from_degrees(5.0, 10.0)));
        assert_eq!(LatLon::average(&[]), None);
    }
}
