use super::{cache::TextureTileCache, key::TileKey, level::Level};
use crate::core::{globe::Globe, sector::Sector};
use crate::spatial::culling::Extent;
use crate::texture::cache::{Texture, TextureCache};
use nalgebra::Vector3;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};

/// One cell of a level's tile grid that can carry a texture.
///
/// Tiles are shared through the tile cache and reused across frames, so the
/// per-frame state (priority, fallback) uses interior mutability. The fallback
/// is stored as a key into the texture cache rather than as a tile reference.
#[derive(Debug)]
pub struct TextureTile {
    key: TileKey,
    sector: Sector,
    format_suffix: Arc<str>,
    priority: AtomicU64,
    fallback: Mutex<Option<TileKey>>,
    extent: Mutex<Option<(Globe, Extent)>>,
}

impl TextureTile {
    pub fn new(sector: Sector, level: &Level, row: i32, col: i32) -> Self {
        Self {
            key: TileKey::new(level.number(), row, col, level.cache_name()),
            sector,
            format_suffix: Arc::from(level.format_suffix()),
            priority: AtomicU64::new(f64::MAX.to_bits()),
            fallback: Mutex::new(None),
            extent: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &TileKey {
        &self.key
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn level_number(&self) -> usize {
        self.key.level
    }

    pub fn row(&self) -> i32 {
        self.key.row
    }

    pub fn col(&self) -> i32 {
        self.key.col
    }

    pub fn format_suffix(&self) -> &str {
        &self.format_suffix
    }

    /// Request priority; lower values are fetched first.
    pub fn priority(&self) -> f64 {
        f64::from_bits(self.priority.load(AtomicOrdering::Relaxed))
    }

    pub fn set_priority(&self, priority: f64) {
        self.priority
            .store(priority.to_bits(), AtomicOrdering::Relaxed);
    }

    /// Ancestor whose texture is drawn in place of this tile's missing one.
    pub fn fallback_tile(&self) -> Option<TileKey> {
        self.fallback.lock().ok().and_then(|f| f.clone())
    }

    pub fn set_fallback_tile(&self, fallback: Option<TileKey>) {
        if let Ok(mut slot) = self.fallback.lock() {
            *slot = fallback;
        }
    }

    pub fn clear_fallback_tile(&self) {
        self.set_fallback_tile(None);
    }

    /// Relative resource path: `{cache}/{level}/{row}/{row}_{col}{suffix}`.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}_{}{}",
            self.key.cache_name,
            self.key.level,
            self.key.row,
            self.key.row,
            self.key.col,
            self.format_suffix
        )
    }

    pub fn centroid_point(&self, globe: &Globe) -> Vector3<f64> {
        globe.compute_point_from_location(&self.sector.centroid())
    }

    /// Bounding sphere of the tile, recomputed only when the globe changes.
    pub fn extent(&self, globe: &Globe) -> Extent {
        if let Ok(mut cached) = self.extent.lock() {
            if let Some((cached_globe, extent)) = cached.as_ref() {
                if cached_globe == globe {
                    return *extent;
                }
            }
            let extent = self.sector.extent(globe);
            *cached = Some((*globe, extent));
            return extent;
        }
        self.sector.extent(globe)
    }

    pub fn is_texture_in_memory(&self, textures: &dyn TextureCache) -> bool {
        textures.contains(&self.key)
    }

    /// True when the level has an expiry time that has passed and the texture predates it.
    pub fn is_texture_expired(&self, texture: &Texture, level: &Level, now: u64) -> bool {
        let expiry = level.expiry_time();
        expiry > 0 && expiry <= now && texture.loaded_at < expiry
    }

    /// The four children at `next_level`, reusing cached tiles and caching new ones.
    ///
    /// Order is south-west, south-east, north-west, north-east, matching
    /// [`Sector::subdivide`] and [`TileKey::children`].
    pub fn create_sub_tiles(
        &self,
        next_level: &Level,
        cache: &TextureTileCache,
    ) -> [Arc<TextureTile>; 4] {
        let sectors = self.sector.subdivide();
        let row = self.key.row * 2;
        let col = self.key.col * 2;
        let cells = [(row, col), (row, col + 1), (row + 1, col), (row + 1, col + 1)];

        std::array::from_fn(|i| {
            let (r, c) = cells[i];
            let key = TileKey::new(next_level.number(), r, c, next_level.cache_name());
            cache.get_or_insert_with(key, || TextureTile::new(sectors[i], next_level, r, c))
        })
    }
}

impl PartialEq for TextureTile {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TextureTile {}

impl Hash for TextureTile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for TextureTile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextureTile {
    /// By priority, ties broken by key.
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority()
            .total_cmp(&other.priority())
            .then_with(|| self.key.cmp(&other.key))
    }
}
