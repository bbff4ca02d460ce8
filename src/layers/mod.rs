pub mod base;
pub mod manager;
pub mod tiled;

// Re-exports for convenience
pub use base::{LayerCapability, LayerProperties, LayerTrait};
pub use manager::LayerManager;
pub use tiled::{FrameTiles, TiledImageLayer};
