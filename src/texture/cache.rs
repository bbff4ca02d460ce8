use crate::tiles::{cache::TileCache, key::TileKey};
use crate::traits::CacheStats;
use std::fmt;
use std::sync::Arc;

/// Decoded tile imagery.
#[derive(Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// RGBA8 pixels, or the undecoded payload for passthrough textures.
    pub data: Vec<u8>,
    /// Milliseconds since the Unix epoch when the texture was loaded.
    pub loaded_at: u64,
}

impl Texture {
    pub fn new(width: u32, height: u32, data: Vec<u8>, loaded_at: u64) -> Self {
        Self {
            width,
            height,
            data,
            loaded_at,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Resident-texture store shared by the render loop and retrieval workers.
///
/// Implementations must be internally synchronized.
pub trait TextureCache: Send + Sync {
    fn contains(&self, key: &TileKey) -> bool;

    fn get(&self, key: &TileKey) -> Option<Arc<Texture>>;

    fn put(&self, key: TileKey, texture: Texture) -> Arc<Texture>;

    fn remove(&self, key: &TileKey) -> Option<Arc<Texture>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            ..CacheStats::default()
        }
    }
}

/// LRU texture cache held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextureCache {
    textures: TileCache<TileKey, Texture>,
}

impl MemoryTextureCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            textures: TileCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.textures.capacity()
    }

    pub fn clear(&self) {
        self.textures.clear();
    }
}

impl TextureCache for MemoryTextureCache {
    fn contains(&self, key: &TileKey) -> bool {
        self.textures.contains(key)
    }

    fn get(&self, key: &TileKey) -> Option<Arc<Texture>> {
        self.textures.get(key)
    }

    fn put(&self, key: TileKey, texture: Texture) -> Arc<Texture> {
        self.textures.insert(key, texture)
    }

    fn remove(&self, key: &TileKey) -> Option<Arc<Texture>> {
        self.textures.remove(key)
    }

    fn len(&self) -> usize {
        self.textures.len()
    }

    fn stats(&self) -> CacheStats {
        self.textures.stats()
    }
}
