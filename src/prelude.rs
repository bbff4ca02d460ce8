//! Prelude module for common globetile types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use globetile::prelude::*;`

pub use crate::core::{
    angle::Angle,
    config::{AbsentPolicy, LayerConfig, LevelSetConfig, RetrievalConfig},
    globe::{Globe, Position},
    latlon::{LatLon, Pole},
    sector::Sector,
    view::{DrawContext, ViewState},
};

pub use crate::layers::{
    base::{LayerCapability, LayerProperties, LayerTrait},
    manager::LayerManager,
    tiled::{FrameTiles, TiledImageLayer},
};

pub use crate::spatial::culling::{Extent, Frustum};

pub use crate::texture::{MemoryTextureCache, Texture, TextureCache, TextureDecoder};

pub use crate::tiles::{
    FileTileSource, LevelSet, TextureTile, TextureTileCache, TileKey, TileSource,
    UrlTemplateSource,
};

pub use crate::retrieval::{
    FileRetriever, HttpRetriever, RequestQueue, RequestTask, RetrievalEvent, RetrievalService,
    Retriever,
};

pub use crate::runtime::{runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::traits::{CacheStats, Configurable};

pub use crate::{GlobeError, Result};

pub use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    pin::Pin,
    sync::{Arc, Mutex},
    time::Duration,
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};

pub use futures::Future;
