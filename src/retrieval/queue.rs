use crate::prelude::HashSet;
use crate::texture::decoder::TextureDecoder;
use crate::tiles::{key::TileKey, level_set::LevelSet, tile::TextureTile};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A request to load one tile's texture.
///
/// Two tasks are equal when they target the same tile, whichever layer issued
/// them, so identical fetches from different layers collapse into one.
#[derive(Debug, Clone)]
pub struct RequestTask {
    pub tile: Arc<TextureTile>,
    /// File path or URL the retriever fetches.
    pub locator: String,
    /// Level set that records the outcome (`has` / `miss`).
    pub levels: Arc<LevelSet>,
    pub decoder: TextureDecoder,
    /// Name of the layer that issued the request.
    pub layer: Arc<str>,
    /// Distance-based priority; lower is fetched first.
    pub priority: f64,
}

impl RequestTask {
    /// Build a task at the tile's current priority.
    pub fn new(
        tile: Arc<TextureTile>,
        locator: String,
        levels: Arc<LevelSet>,
        decoder: TextureDecoder,
        layer: Arc<str>,
    ) -> Self {
        let priority = tile.priority();
        Self {
            tile,
            locator,
            levels,
            decoder,
            layer,
            priority,
        }
    }

    pub fn key(&self) -> &TileKey {
        self.tile.key()
    }
}

impl PartialEq for RequestTask {
    fn eq(&self, other: &Self) -> bool {
        self.tile.key() == other.tile.key()
    }
}

impl Eq for RequestTask {}

impl PartialOrd for RequestTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RequestTask {
    /// Reversed: the nearest tile compares greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.key().cmp(self.key()))
    }
}

/// Bounded priority queue of tile requests without duplicates.
///
/// When full, a nearer request displaces the farthest queued one.
#[derive(Debug)]
pub struct RequestQueue {
    /// Ordered farthest first, nearest last.
    tasks: BTreeSet<RequestTask>,
    keys: HashSet<TileKey>,
    capacity: usize,
}

impl RequestQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: BTreeSet::new(),
            keys: HashSet::default(),
            capacity: capacity.max(1),
        }
    }

    /// Adds `task` unless the queue already holds the same tile.
    ///
    /// A full queue accepts `task` only if it is nearer than the farthest
    /// queued request, which is dropped to make room.
    pub fn offer(&mut self, task: RequestTask) -> bool {
        if self.keys.contains(task.key()) {
            return false;
        }
        if self.tasks.len() >= self.capacity {
            let nearer = self
                .tasks
                .first()
                .map_or(false, |farthest| task.priority < farthest.priority);
            if !nearer {
                log::trace!("request queue full, dropping {}", task.key());
                return false;
            }
            if let Some(evicted) = self.tasks.pop_first() {
                log::trace!("request queue full, evicting {}", evicted.key());
                self.keys.remove(evicted.key());
            }
        }
        self.keys.insert(task.key().clone());
        self.tasks.insert(task);
        true
    }

    /// Removes the nearest request.
    pub fn poll(&mut self) -> Option<RequestTask> {
        let task = self.tasks.pop_last()?;
        self.keys.remove(task.key());
        Some(task)
    }

    /// The nearest request.
    pub fn peek(&self) -> Option<&RequestTask> {
        self.tasks.last()
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.keys.clear();
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_REQUEST_QUEUE_CAPACITY)
    }
}
