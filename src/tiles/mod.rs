pub mod absent;
pub mod cache;
pub mod key;
pub mod level;
pub mod level_set;
pub mod source;
pub mod tile;

// Re-exports for convenience
pub use absent::AbsentResourceList;
pub use cache::{TextureTileCache, TileCache};
pub use key::TileKey;
pub use level::Level;
pub use level_set::LevelSet;
pub use source::{FileTileSource, TileSource, UrlTemplateSource};
pub use tile::TextureTile;
