//! Configuration for level sets, tiled layers and the retrieval pool
//!
//! Level sets are described by a flat key/value parameter set, the way tiled
//! imagery datasets are usually published, or by the equivalent JSON object.
//! Layer and retrieval settings are plain structs with presets.

use super::constants::*;
use crate::{GlobeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

pub const KEY_TILE_WIDTH: &str = "TileWidth";
pub const KEY_TILE_HEIGHT: &str = "TileHeight";
pub const KEY_LEVEL_ZERO_TILE_DELTA: &str = "LevelZeroTileDelta";
pub const KEY_NUM_LEVELS: &str = "NumLevels";
pub const KEY_NUM_EMPTY_LEVELS: &str = "NumEmptyLevels";
pub const KEY_INACTIVE_LEVELS: &str = "InactiveLevels";
pub const KEY_FORMAT_SUFFIX: &str = "FormatSuffix";
pub const KEY_SECTOR: &str = "Sector";
pub const KEY_TILE_ORIGIN: &str = "TileOrigin";
pub const KEY_DATA_CACHE_NAME: &str = "DataCacheName";
pub const KEY_EXPIRY_TIME: &str = "ExpiryTime";

/// How long a failed tile stays suppressed before it is tried again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbsentPolicy {
    /// Failures tolerated before the tile is held back for the full try-again interval.
    pub max_tries: u32,
    /// A tile is always held back this long after a failure.
    pub min_check_interval_ms: u64,
    /// After this long the failure history is forgotten.
    pub try_again_interval_ms: u64,
    /// Remembered tiles per level.
    pub capacity: usize,
}

impl AbsentPolicy {
    pub fn min_check_interval(&self) -> Duration {
        Duration::from_millis(self.min_check_interval_ms)
    }

    pub fn try_again_interval(&self) -> Duration {
        Duration::from_millis(self.try_again_interval_ms)
    }
}

impl Default for AbsentPolicy {
    fn default() -> Self {
        Self {
            max_tries: ABSENT_MAX_TRIES,
            min_check_interval_ms: ABSENT_MIN_CHECK_INTERVAL_MS,
            try_again_interval_ms: ABSENT_TRY_AGAIN_INTERVAL_MS,
            capacity: ABSENT_LIST_CAPACITY,
        }
    }
}

/// Description of a tiled dataset's level pyramid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSetConfig {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Level-zero tile span as `[lat, lon]` degrees.
    pub level_zero_tile_delta: [f64; 2],
    pub num_levels: usize,
    /// Leading levels with no data of their own.
    pub num_empty_levels: usize,
    pub inactive_levels: Vec<usize>,
    pub format_suffix: String,
    /// Dataset bounds as `[min_lat, max_lat, min_lon, max_lon]` degrees.
    pub sector: [f64; 4],
    /// Grid origin as `[lat, lon]` degrees.
    pub tile_origin: [f64; 2],
    pub data_cache_name: String,
    /// Textures loaded before this time (ms since epoch) are stale. 0 disables expiry.
    pub expiry_time: u64,
    pub absent_policy: AbsentPolicy,
}

impl Default for LevelSetConfig {
    fn default() -> Self {
        Self {
            tile_width: DEFAULT_TILE_WIDTH,
            tile_height: DEFAULT_TILE_HEIGHT,
            level_zero_tile_delta: [DEFAULT_LEVEL_ZERO_TILE_DELTA, DEFAULT_LEVEL_ZERO_TILE_DELTA],
            num_levels: DEFAULT_NUM_LEVELS,
            num_empty_levels: DEFAULT_NUM_EMPTY_LEVELS,
            inactive_levels: Vec::new(),
            format_suffix: DEFAULT_FORMAT_SUFFIX.to_string(),
            sector: [-90.0, 90.0, -180.0, 180.0],
            tile_origin: [-90.0, -180.0],
            data_cache_name: DEFAULT_DATA_CACHE_NAME.to_string(),
            expiry_time: 0,
            absent_policy: AbsentPolicy::default(),
        }
    }
}

impl LevelSetConfig {
    /// Builds a configuration from flat parameters. Missing keys keep their defaults.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        for (key, value) in params {
            let value = value.trim();
            match key.as_str() {
                KEY_TILE_WIDTH => config.tile_width = parse_number(key, value)?,
                KEY_TILE_HEIGHT => config.tile_height = parse_number(key, value)?,
                KEY_LEVEL_ZERO_TILE_DELTA => {
                    config.level_zero_tile_delta = parse_list::<2>(key, value)?
                }
                KEY_NUM_LEVELS => config.num_levels = parse_number(key, value)?,
                KEY_NUM_EMPTY_LEVELS => config.num_empty_levels = parse_number(key, value)?,
                KEY_INACTIVE_LEVELS => {
                    config.inactive_levels = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| parse_number(key, s))
                        .collect::<Result<Vec<usize>>>()?
                }
                KEY_FORMAT_SUFFIX => config.format_suffix = value.to_string(),
                KEY_SECTOR => config.sector = parse_list::<4>(key, value)?,
                KEY_TILE_ORIGIN => config.tile_origin = parse_list::<2>(key, value)?,
                KEY_DATA_CACHE_NAME => config.data_cache_name = value.to_string(),
                KEY_EXPIRY_TIME => config.expiry_time = parse_number(key, value)?,
                other => log::debug!("ignoring unknown level set parameter {}", other),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Parses the JSON form of this struct. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(GlobeError::InvalidConfig(
                "tile dimensions must be positive".to_string(),
            ));
        }
        if self.num_levels == 0 {
            return Err(GlobeError::InvalidConfig(
                "a level set needs at least one level".to_string(),
            ));
        }
        if self.num_empty_levels > self.num_levels {
            return Err(GlobeError::InvalidConfig(format!(
                "{} empty levels exceed {} levels",
                self.num_empty_levels, self.num_levels
            )));
        }
        if self.level_zero_tile_delta.iter().any(|d| !(*d > 0.0)) {
            return Err(GlobeError::InvalidConfig(format!(
                "level zero tile delta must be positive, got {:?}",
                self.level_zero_tile_delta
            )));
        }
        let [min_lat, max_lat, min_lon, max_lon] = self.sector;
        if !(min_lat <= max_lat && min_lon <= max_lon) {
            return Err(GlobeError::InvalidConfig(format!(
                "invalid sector {:?}",
                self.sector
            )));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| GlobeError::InvalidConfig(format!("{key}: cannot parse '{value}'")))
}

fn parse_list<const N: usize>(key: &str, value: &str) -> Result<[f64; N]> {
    let parts = value
        .split(',')
        .map(|s| parse_number::<f64>(key, s.trim()))
        .collect::<Result<Vec<f64>>>()?;

    parts.try_into().map_err(|parts: Vec<f64>| {
        GlobeError::InvalidConfig(format!(
            "{key}: expected {N} comma separated values, got {}",
            parts.len()
        ))
    })
}

/// Per-layer tile selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub name: String,
    /// Added to the detail hint origin; positive values pull in finer levels sooner.
    pub detail_hint: f64,
    pub detail_hint_origin: f64,
    pub tile_cache_capacity: usize,
    pub request_queue_capacity: usize,
    /// Keep requesting level-zero textures even when those tiles are out of view.
    pub force_level_zero_loads: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            name: "Tiled Imagery".to_string(),
            detail_hint: 0.0,
            detail_hint_origin: DEFAULT_DETAIL_HINT_ORIGIN,
            tile_cache_capacity: DEFAULT_TILE_CACHE_CAPACITY,
            request_queue_capacity: DEFAULT_REQUEST_QUEUE_CAPACITY,
            force_level_zero_loads: false,
        }
    }
}

/// Settings for the shared retrieval worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum concurrent fetches.
    pub worker_pool_size: usize,
    /// Maximum queued plus in-flight requests.
    pub queue_capacity: usize,
    pub request_timeout_ms: u64,
    pub texture_cache_capacity: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self::balanced()
    }
}

impl RetrievalConfig {
    pub fn balanced() -> Self {
        Self {
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            queue_capacity: DEFAULT_REQUEST_QUEUE_CAPACITY,
            request_timeout_ms: 30_000,
            texture_cache_capacity: DEFAULT_TEXTURE_CACHE_CAPACITY,
        }
    }

    pub fn low_resource() -> Self {
        Self {
            worker_pool_size: 2,
            queue_capacity: 512,
            request_timeout_ms: 30_000,
            texture_cache_capacity: 256,
        }
    }

    pub fn high_performance() -> Self {
        Self {
            worker_pool_size: 16,
            queue_capacity: 4096,
            request_timeout_ms: 10_000,
            texture_cache_capacity: 4096,
        }
    }

    pub fn for_testing() -> Self {
        Self {
            worker_pool_size: 2,
            queue_capacity: 64,
            request_timeout_ms: 2_000,
            texture_cache_capacity: 64,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
