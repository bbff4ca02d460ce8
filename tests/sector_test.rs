use globetile::prelude::*;

#[cfg(test)]
mod sector_tests {
    use super::*;

    fn sectors() -> Vec<Sector> {
        vec![
            Sector::from_degrees(-90.0, 90.0, -180.0, 180.0).unwrap(),
            Sector::from_degrees(0.0, 36.0, 36.0, 72.0).unwrap(),
            Sector::from_degrees(-12.5, -3.25, 100.0, 101.5).unwrap(),
            Sector::from_degrees(60.0, 90.0, -180.0, -150.0).unwrap(),
        ]
    }

    #[test]
    fn test_subdivision_covers_parent() {
        for sector in sectors() {
            let children = sector.subdivide();

            let union = children[1..]
                .iter()
                .fold(children[0], |acc, child| acc.union(child));
            assert_eq!(union, sector);

            for (i, a) in children.iter().enumerate() {
                assert!(sector.contains(a));
                for b in &children[i + 1..] {
                    assert!(a.intersects(b), "siblings share an edge or corner");
                    assert!(!a.intersects_interior(b), "{} overlaps {}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_intersects_is_symmetric() {
        let all = sectors();
        for a in &all {
            for b in &all {
                assert_eq!(a.intersects(b), b.intersects(a));
                assert_eq!(a.intersection(b).is_some(), a.intersects(b));
            }
        }
    }

    #[test]
    fn test_union_contains_both() {
        let all = sectors();
        for a in &all {
            for b in &all {
                let union = a.union(b);
                assert!(union.contains(a));
                assert!(union.contains(b));
            }
        }
    }

    #[test]
    fn test_bounding_sectors_split_at_dateline() {
        let locations = [
            LatLon::from_degrees(10.0, 170.0),
            LatLon::from_degrees(20.0, -170.0),
        ];
        let split = Sector::bounding_sectors(&locations);
        assert_eq!(split.len(), 2);
        assert!(split.iter().any(|s| s.max_lon().degrees == 180.0));
        assert!(split.iter().any(|s| s.min_lon().degrees == -180.0));
    }

    #[test]
    fn test_tile_sectors_round_trip_through_grid() {
        let levels = LevelSet::new(&LevelSetConfig::default()).unwrap();
        let level = levels.level(3).unwrap();
        let delta = level.tile_delta();
        let origin = levels.tile_origin();

        for (row, col) in [(0, 0), (17, 33), (39, 79)] {
            let key = TileKey::new(3, row, col, level.cache_name());
            let sector = levels.compute_sector_for_key(&key).unwrap();
            let centroid = sector.centroid();
            assert_eq!(LevelSet::compute_row(delta.lat, centroid.lat, origin.lat), row);
            assert_eq!(LevelSet::compute_column(delta.lon, centroid.lon, origin.lon), col);
        }
    }
}
