//! The resolution pyramid of a tiled dataset.

use super::{key::TileKey, level::Level};
use crate::core::{angle::Angle, config::LevelSetConfig, latlon::LatLon, sector::Sector};
use crate::{GlobeError, Result};

/// Ordered levels of a dataset, each halving the tile span of the one before.
///
/// Level `i` tiles span `level_zero_tile_delta / 2^i`. The first
/// `num_empty_levels` levels have no data and are only used for descent.
/// Shared between the render loop and retrieval workers; the per-level absent
/// lists synchronize internally.
#[derive(Debug)]
pub struct LevelSet {
    sector: Sector,
    level_zero_tile_delta: LatLon,
    tile_origin: LatLon,
    num_level_zero_columns: i64,
    levels: Vec<Level>,
}

impl LevelSet {
    pub fn new(config: &LevelSetConfig) -> Result<Self> {
        config.validate()?;

        let [min_lat, max_lat, min_lon, max_lon] = config.sector;
        let sector = Sector::from_degrees(min_lat, max_lat, min_lon, max_lon)?;
        let level_zero_tile_delta = LatLon::from_degrees(
            config.level_zero_tile_delta[0],
            config.level_zero_tile_delta[1],
        );
        let tile_origin = LatLon::from_degrees(config.tile_origin[0], config.tile_origin[1]);
        // Columns are numbered from the tile origin around the whole globe, not
        // across the dataset sector, so regional datasets keep distinct numbers.
        let num_level_zero_columns = (360.0 / level_zero_tile_delta.lon.degrees).ceil() as i64;

        let mut levels = Vec::with_capacity(config.num_levels);
        for i in 0..config.num_levels {
            let scale = 2f64.powi(i as i32);
            let tile_delta = LatLon::from_degrees(
                level_zero_tile_delta.lat.degrees / scale,
                level_zero_tile_delta.lon.degrees / scale,
            );
            let name = if i < config.num_empty_levels {
                String::new()
            } else {
                i.to_string()
            };

            let mut level = Level::new(
                i,
                name,
                config.data_cache_name.clone(),
                config.format_suffix.clone(),
                config.tile_width,
                config.tile_height,
                tile_delta,
                &config.absent_policy,
            );
            level.set_expiry_time(config.expiry_time);
            if config.inactive_levels.contains(&i) {
                level.set_active(false);
            }
            levels.push(level);
        }

        log::debug!(
            "level set '{}': {} levels, {} level-zero columns, sector {}",
            config.data_cache_name,
            levels.len(),
            num_level_zero_columns,
            sector
        );

        Ok(Self {
            sector,
            level_zero_tile_delta,
            tile_origin,
            num_level_zero_columns,
            levels,
        })
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn level_zero_tile_delta(&self) -> LatLon {
        self.level_zero_tile_delta
    }

    pub fn tile_origin(&self) -> LatLon {
        self.tile_origin
    }

    pub fn num_level_zero_columns(&self) -> i64 {
        self.num_level_zero_columns
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn level(&self, number: usize) -> Option<&Level> {
        self.levels.get(number)
    }

    pub fn first_level(&self) -> &Level {
        &self.levels[0]
    }

    pub fn last_level(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    pub fn is_final_level(&self, number: usize) -> bool {
        number + 1 == self.levels.len()
    }

    /// True for levels without data. Out-of-range levels count as empty.
    pub fn is_level_empty(&self, number: usize) -> bool {
        self.level(number).map_or(true, Level::is_empty)
    }

    /// First level whose texels are at most `texel_size` radians, the last level if none
    /// is fine enough, or `None` when the matching level has no data.
    pub fn target_level(&self, texel_size: f64) -> Option<&Level> {
        let last = self.last_level();
        if last.texel_size() >= texel_size {
            return Some(last);
        }

        for level in &self.levels {
            if level.texel_size() <= texel_size {
                return if level.is_empty() { None } else { Some(level) };
            }
        }

        Some(last)
    }

    pub fn set_expiry_time(&self, expiry_time: u64) {
        for level in &self.levels {
            level.set_expiry_time(expiry_time);
        }
    }

    /// Unique number of a tile within its level.
    ///
    /// `None` for negative rows or columns, columns past the grid, or numbers
    /// that do not fit in a `u64`.
    pub fn tile_number(&self, key: &TileKey) -> Option<u64> {
        let row = u64::try_from(key.row).ok()?;
        let col = u64::try_from(key.col).ok()?;
        let level_scale = 1u64.checked_shl(u32::try_from(key.level).ok()?)?;
        let columns = u64::try_from(self.num_level_zero_columns.max(1))
            .ok()?
            .checked_mul(level_scale)?;
        if col >= columns {
            return None;
        }
        row.checked_mul(columns)?.checked_add(col)
    }

    /// Records a failed fetch of the tile.
    pub fn miss(&self, key: &TileKey) {
        if let (Some(level), Some(number)) = (self.level(key.level), self.tile_number(key)) {
            level.mark_resource_absent(number);
        }
    }

    /// Records a successful fetch of the tile, clearing any failure history.
    pub fn has(&self, key: &TileKey) {
        if let (Some(level), Some(number)) = (self.level(key.level), self.tile_number(key)) {
            level.unmark_resource_absent(number);
        }
    }

    /// True when the tile should not be requested: its level is empty or it failed recently.
    pub fn is_resource_absent(&self, key: &TileKey) -> bool {
        let Some(level) = self.level(key.level) else {
            return true;
        };
        if level.is_empty() {
            return true;
        }
        self.tile_number(key)
            .map_or(true, |number| level.is_resource_absent(number))
    }

    pub fn missing(&self, key: &TileKey) -> bool {
        self.is_resource_absent(key)
    }

    /// Sector covered by the tile. Exact inverse of [`LevelSet::compute_row`] and
    /// [`LevelSet::compute_column`] at the key's level.
    pub fn compute_sector_for_key(&self, key: &TileKey) -> Result<Sector> {
        let level = self.level(key.level).ok_or_else(|| {
            GlobeError::ArgumentOutOfRange(format!(
                "level {} not in level set of {} levels",
                key.level,
                self.levels.len()
            ))
        })?;

        let delta = level.tile_delta();
        let min_lat = Self::compute_row_latitude(key.row, delta.lat, self.tile_origin.lat);
        let min_lon = Self::compute_column_longitude(key.col, delta.lon, self.tile_origin.lon);

        Ok(Sector::from_bounds(
            min_lat,
            min_lat + delta.lat,
            min_lon,
            min_lon + delta.lon,
        ))
    }

    /// Row containing `latitude`. The top edge of the grid belongs to the last row.
    pub fn compute_row(delta: Angle, latitude: Angle, origin: Angle) -> i32 {
        let offset = latitude.degrees - origin.degrees;
        let mut row = (offset / delta.degrees).floor() as i32;
        if offset == 180.0 {
            row -= 1;
        }
        row
    }

    /// Column containing `longitude`. The east edge of the grid belongs to the last column.
    pub fn compute_column(delta: Angle, longitude: Angle, origin: Angle) -> i32 {
        let offset = longitude.degrees - origin.degrees;
        let mut col = (offset / delta.degrees).floor() as i32;
        if offset == 360.0 {
            col -= 1;
        }
        col
    }

    pub fn compute_row_latitude(row: i32, delta: Angle, origin: Angle) -> Angle {
        Angle::from_degrees(origin.degrees + row as f64 * delta.degrees)
    }

    pub fn compute_column_longitude(col: i32, delta: Angle, origin: Angle) -> Angle {
        Angle::from_degrees(origin.degrees + col as f64 * delta.degrees)
    }
}
