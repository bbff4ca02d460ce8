//! Engine-wide defaults for the globe, level sets and tile retrieval.
//! Keeping them in a single place makes it easier to tweak engine-wide magic numbers.

/// WGS84 semi-major axis in meters.
pub const WGS84_EQUATORIAL_RADIUS: f64 = 6_378_137.0;

/// WGS84 semi-minor axis in meters.
pub const WGS84_POLAR_RADIUS: f64 = 6_356_752.314_245;

/// WGS84 first eccentricity squared.
pub const WGS84_ES: f64 = 0.006_694_379_990_13;

/// Default tile size in pixels.
pub const DEFAULT_TILE_WIDTH: u32 = 512;
pub const DEFAULT_TILE_HEIGHT: u32 = 512;

/// Default level-zero tile span in degrees, both latitude and longitude.
pub const DEFAULT_LEVEL_ZERO_TILE_DELTA: f64 = 36.0;

pub const DEFAULT_NUM_LEVELS: usize = 19;
pub const DEFAULT_NUM_EMPTY_LEVELS: usize = 0;
pub const DEFAULT_FORMAT_SUFFIX: &str = ".dds";
pub const DEFAULT_DATA_CACHE_NAME: &str = "globetile";

/// Base exponent of the detail scale `10^-(origin + hint)`.
pub const DEFAULT_DETAIL_HINT_ORIGIN: f64 = 2.8;

/// Sectors beyond this latitude get their detail exponent dampened.
pub const POLAR_DETAIL_LATITUDE: f64 = 75.0;
pub const POLAR_DETAIL_DAMPENING: f64 = 0.9;

/// Field of view (degrees) at which the field-of-view scale is 1.
pub const REFERENCE_FIELD_OF_VIEW: f64 = 45.0;

/// Per-layer and shared request queue capacity.
pub const DEFAULT_REQUEST_QUEUE_CAPACITY: usize = 2048;

/// Maximum number of tiles remembered as absent per level.
pub const ABSENT_LIST_CAPACITY: usize = 2000;
pub const ABSENT_MAX_TRIES: u32 = 2;
pub const ABSENT_MIN_CHECK_INTERVAL_MS: u64 = 10_000;
pub const ABSENT_TRY_AGAIN_INTERVAL_MS: u64 = 60_000;

pub const DEFAULT_TILE_CACHE_CAPACITY: usize = 4096;
pub const DEFAULT_TEXTURE_CACHE_CAPACITY: usize = 1024;
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;

/// Number of samples along each side of a sector when fitting its bounding sphere.
pub const EXTENT_SAMPLE_DENSITY: usize = 5;
