use geo::{point, HaversineDistance, VincentyDistance};
use globetile::constants::{WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS};
use globetile::prelude::*;

/// Mean earth radius used by `geo` for haversine distances.
const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

#[cfg(test)]
mod geodesy_tests {
    use super::*;

    fn ll(lat: f64, lon: f64) -> LatLon {
        LatLon::from_degrees(lat, lon)
    }

    #[test]
    fn test_dateline_crossing_cases() {
        for lat in [-60.0, 0.0, 45.0] {
            assert!(LatLon::locations_cross_dateline(&ll(lat, 179.0), &ll(lat, -179.0)));
            assert!(LatLon::locations_cross_dateline(&ll(lat, -179.0), &ll(lat, 179.0)));
        }
        assert!(!LatLon::locations_cross_dateline(&ll(0.0, 10.0), &ll(0.0, -10.0)));
        assert!(!LatLon::locations_cross_dateline(&ll(0.0, 170.0), &ll(0.0, 179.0)));

        let path = [ll(10.0, 170.0), ll(10.0, 178.0), ll(10.0, -178.0)];
        assert!(LatLon::path_crosses_dateline(&path));
        assert!(!LatLon::path_crosses_dateline(&path[..2]));
    }

    #[test]
    fn test_identical_points_have_zero_distance() {
        let p = ll(37.5, -122.3);
        assert_eq!(LatLon::great_circle_distance(&p, &p).degrees, 0.0);
        assert_eq!(LatLon::rhumb_distance(&p, &p).degrees, 0.0);
        assert_eq!(LatLon::linear_distance(&p, &p).degrees, 0.0);
        assert_eq!(
            LatLon::ellipsoidal_distance(&p, &p, WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS),
            0.0
        );
    }

    #[test]
    fn test_great_circle_round_trip() {
        let start = ll(-33.9, 18.4);
        let end = ll(51.5, -0.1);

        let azimuth = LatLon::great_circle_azimuth(&start, &end);
        let distance = LatLon::great_circle_distance(&start, &end);
        let reached = LatLon::great_circle_end_position(&start, azimuth, distance);

        assert!((reached.lat.degrees - end.lat.degrees).abs() < 1e-9);
        assert!((reached.lon.degrees - end.lon.degrees).abs() < 1e-9);
    }

    #[test]
    fn test_rhumb_round_trip() {
        let start = ll(40.7, -74.0);
        let end = ll(48.9, 2.35);

        let azimuth = LatLon::rhumb_azimuth(&start, &end);
        let distance = LatLon::rhumb_distance(&start, &end);
        let reached = LatLon::rhumb_end_position(&start, azimuth, distance);

        assert!((reached.lat.degrees - end.lat.degrees).abs() < 1e-9);
        assert!((reached.lon.degrees - end.lon.degrees).abs() < 1e-9);
    }

    #[test]
    fn test_latitude_is_clamped() {
        assert_eq!(Angle::from_degrees_latitude(95.0).degrees, 90.0);
        assert_eq!(Angle::from_degrees_latitude(-123.0).degrees, -90.0);
        assert_eq!(Angle::normalized_degrees_latitude(100.0), 80.0);
        assert_eq!(Angle::normalized_degrees_longitude(190.0), -170.0);
    }

    #[test]
    fn test_haversine_matches_geo() {
        let pairs = [
            (ll(0.0, 0.0), ll(10.0, 10.0)),
            (ll(52.2, 0.1), ll(40.7, -74.0)),
            (ll(-45.0, 170.0), ll(-40.0, -175.0)),
        ];
        for (a, b) in pairs {
            let ours = LatLon::great_circle_distance(&a, &b).radians() * MEAN_EARTH_RADIUS;
            let theirs = point!(x: a.lon.degrees, y: a.lat.degrees)
                .haversine_distance(&point!(x: b.lon.degrees, y: b.lat.degrees));
            assert!(
                (ours - theirs).abs() < 1e-6 * theirs,
                "haversine {} vs {} for {} -> {}",
                ours,
                theirs,
                a,
                b
            );
        }
    }

    #[test]
    fn test_vincenty_matches_geo() {
        let pairs = [
            (ll(-37.95, 144.42), ll(-37.65, 143.93)),
            (ll(0.0, 0.0), ll(10.0, 100.0)),
            (ll(60.0, 24.9), ll(59.3, 18.1)),
        ];
        for (a, b) in pairs {
            let ours =
                LatLon::ellipsoidal_distance(&a, &b, WGS84_EQUATORIAL_RADIUS, WGS84_POLAR_RADIUS);
            let theirs = point!(x: a.lon.degrees, y: a.lat.degrees)
                .vincenty_distance(&point!(x: b.lon.degrees, y: b.lat.degrees))
                .unwrap();
            assert!(
                (ours - theirs).abs() < 1e-2,
                "vincenty {} vs {} for {} -> {}",
                ours,
                theirs,
                a,
                b
            );
        }
    }

    #[test]
    fn test_globe_point_round_trip() {
        let globe = Globe::wgs84();
        let position = Position::from_degrees(48.85, 2.35, 1200.0);
        let point = globe.compute_point(&position);
        let back = globe.compute_position_from_point(&point);

        assert!((back.location.lat.degrees - 48.85).abs() < 1e-7);
        assert!((back.location.lon.degrees - 2.35).abs() < 1e-7);
        assert!((back.elevation - 1200.0).abs() < 1e-3);
    }
}
