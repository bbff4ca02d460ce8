pub mod cache;
pub mod decoder;

// Re-exports for convenience
pub use cache::{MemoryTextureCache, Texture, TextureCache};
pub use decoder::TextureDecoder;
