use std::fmt;
use std::sync::Arc;

/// Identity of a tile within a dataset: level, row and column plus the dataset's cache name.
///
/// Two tiles with the same key are the same cell of the same dataset even when
/// they belong to different layer instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub level: usize,
    pub row: i32,
    pub col: i32,
    pub cache_name: Arc<str>,
}

impl TileKey {
    pub fn new(level: usize, row: i32, col: i32, cache_name: impl Into<Arc<str>>) -> Self {
        Self {
            level,
            row,
            col,
            cache_name: cache_name.into(),
        }
    }

    /// Keys of the four children, south-west, south-east, north-west, north-east.
    pub fn children(&self) -> [TileKey; 4] {
        let level = self.level + 1;
        let (row, col) = (self.row * 2, self.col * 2);
        [
            TileKey::new(level, row, col, self.cache_name.clone()),
            TileKey::new(level, row, col + 1, self.cache_name.clone()),
            TileKey::new(level, row + 1, col, self.cache_name.clone()),
            TileKey::new(level, row + 1, col + 1, self.cache_name.clone()),
        ]
    }

    /// Key of the enclosing tile one level up, or `None` at level zero.
    pub fn parent(&self) -> Option<TileKey> {
        if self.level == 0 {
            return None;
        }
        Some(TileKey::new(
            self.level - 1,
            self.row.div_euclid(2),
            self.col.div_euclid(2),
            self.cache_name.clone(),
        ))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cache_name, self.level, self.row, self.col
        )
    }
}
