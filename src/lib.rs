//! # globetile
//!
//! Tiled level-of-detail quadtree and geodesy core for virtual-globe rendering.
//!
//! The crate splits a geographic region into a hierarchy of tiles, picks the
//! tiles whose resolution satisfies a screen-space error criterion every frame,
//! draws coarser ancestors while finer imagery streams in, and schedules the
//! missing tiles on an asynchronous retrieval pool. The decisions rest on
//! spherical and ellipsoidal geodesy in [`core`].

pub mod core;
pub mod layers;
pub mod prelude;
pub mod retrieval;
pub mod runtime;
pub mod spatial;
pub mod texture;
pub mod tiles;
pub mod traits;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    angle::Angle,
    config::{LayerConfig, LevelSetConfig, RetrievalConfig},
    globe::{Globe, Position},
    latlon::{LatLon, Pole},
    sector::Sector,
    view::{DrawContext, ViewState},
};

pub use layers::{
    base::{LayerCapability, LayerTrait},
    manager::LayerManager,
    tiled::{FrameTiles, TiledImageLayer},
};

pub use spatial::culling::{Extent, Frustum};

pub use texture::{
    cache::{MemoryTextureCache, Texture, TextureCache},
    decoder::TextureDecoder,
};

pub use tiles::{
    absent::AbsentResourceList, key::TileKey, level::Level, level_set::LevelSet,
    tile::TextureTile,
};

pub use retrieval::{
    queue::{RequestQueue, RequestTask},
    retriever::{FileRetriever, HttpRetriever, Retriever},
    service::{RetrievalEvent, RetrievalService},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, GlobeError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum GlobeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid sector: {0}")]
    InvalidSector(String),

    #[error("Argument out of range: {0}")]
    ArgumentOutOfRange(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] retrieval::RetrievalError),
}
