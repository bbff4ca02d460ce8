//! Per-frame level-of-detail selection over a level set's tile quadtree.
//!
//! Each frame the layer walks the quadtree from its top-level tiles. A tile
//! whose texels are fine enough for its distance from the eye is selected;
//! otherwise its four children are visited. Selected tiles without a resident
//! texture borrow the texture of the nearest resident ancestor and queue a
//! request for their own, so coarse imagery is drawn at once and sharpened as
//! fetches complete.

use crate::{
    core::{
        angle::Angle,
        config::{LayerConfig, LevelSetConfig},
        constants::{POLAR_DETAIL_DAMPENING, POLAR_DETAIL_LATITUDE, REFERENCE_FIELD_OF_VIEW},
        sector::Sector,
        view::DrawContext,
    },
    layers::base::{LayerCapability, LayerProperties, LayerTrait},
    retrieval::{
        queue::{RequestQueue, RequestTask},
        service::RetrievalService,
    },
    texture::decoder::TextureDecoder,
    tiles::{
        cache::TextureTileCache, key::TileKey, level::Level, level_set::LevelSet,
        source::TileSource, tile::TextureTile,
    },
    traits::Configurable,
    GlobeError, Result,
};
use std::sync::Arc;

/// Outcome of one frame's tile selection.
#[derive(Debug, Clone, Default)]
pub struct FrameTiles {
    /// Tiles to draw, each with a resident texture or a resident fallback.
    pub current: Vec<Arc<TextureTile>>,
    /// Requests queued for this frame.
    pub requested: usize,
}

/// Imagery layer backed by a multi-resolution tile pyramid.
pub struct TiledImageLayer {
    properties: LayerProperties,
    config: LayerConfig,
    levels: Arc<LevelSet>,
    source: Arc<dyn TileSource>,
    decoder: TextureDecoder,
    layer_name: Arc<str>,
    /// Tile objects shared across frames, keyed by tile identity
    tile_cache: TextureTileCache,
    top_level_tiles: Vec<Arc<TextureTile>>,
    current_tiles: Vec<Arc<TextureTile>>,
    request_queue: RequestQueue,
    at_max_resolution: bool,
}

impl TiledImageLayer {
    pub fn new(config: LayerConfig, levels: Arc<LevelSet>, source: Arc<dyn TileSource>) -> Self {
        let properties = LayerProperties::new(config.name.clone(), config.name.clone());
        Self {
            properties,
            layer_name: Arc::from(config.name.as_str()),
            tile_cache: TextureTileCache::new(config.tile_cache_capacity),
            request_queue: RequestQueue::new(config.request_queue_capacity),
            config,
            levels,
            source,
            decoder: TextureDecoder::default(),
            top_level_tiles: Vec::new(),
            current_tiles: Vec::new(),
            at_max_resolution: false,
        }
    }

    /// Builds the level set from its configuration.
    pub fn from_configs(
        config: LayerConfig,
        level_set: &LevelSetConfig,
        source: Arc<dyn TileSource>,
    ) -> Result<Self> {
        Self::validate_config(&config)?;
        let levels = Arc::new(LevelSet::new(level_set)?);
        Ok(Self::new(config, levels, source))
    }

    pub fn with_decoder(mut self, decoder: TextureDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn levels(&self) -> &Arc<LevelSet> {
        &self.levels
    }

    pub fn tile_cache(&self) -> &TextureTileCache {
        &self.tile_cache
    }

    pub fn request_queue(&self) -> &RequestQueue {
        &self.request_queue
    }

    pub fn detail_hint(&self) -> f64 {
        self.config.detail_hint
    }

    /// Positive hints select finer levels at a given distance, negative coarser.
    pub fn set_detail_hint(&mut self, detail_hint: f64) {
        self.config.detail_hint = detail_hint;
    }

    /// Whether the last frame selected any tile at the final level.
    pub fn is_at_max_resolution(&self) -> bool {
        self.at_max_resolution
    }

    /// False when the dataset lies entirely outside the frame's visible sector.
    pub fn layer_in_view(&self, dc: &DrawContext) -> bool {
        dc.visible_sector
            .map_or(true, |visible| self.levels.sector().intersects(&visible))
    }

    pub fn top_level_tiles(&mut self) -> &[Arc<TextureTile>] {
        if self.top_level_tiles.is_empty() {
            self.create_top_level_tiles();
        }
        &self.top_level_tiles
    }

    fn create_top_level_tiles(&mut self) {
        let sector = *self.levels.sector();
        let level = self.levels.first_level();
        let delta = level.tile_delta();
        let origin = self.levels.tile_origin();

        let first_row = LevelSet::compute_row(delta.lat, sector.min_lat(), origin.lat);
        let last_row = LevelSet::compute_row(delta.lat, sector.max_lat(), origin.lat);
        let first_col = LevelSet::compute_column(delta.lon, sector.min_lon(), origin.lon);
        let last_col = LevelSet::compute_column(delta.lon, sector.max_lon(), origin.lon);

        let mut tiles = Vec::new();
        for row in first_row..=last_row {
            for col in first_col..=last_col {
                let key = TileKey::new(level.number(), row, col, level.cache_name());
                let Ok(tile_sector) = self.levels.compute_sector_for_key(&key) else {
                    continue;
                };
                tiles.push(
                    self.tile_cache
                        .get_or_insert_with(key, || TextureTile::new(tile_sector, level, row, col)),
                );
            }
        }

        log::debug!(
            "layer '{}': {} top-level tiles ({}x{})",
            self.layer_name,
            tiles.len(),
            last_row - first_row + 1,
            last_col - first_col + 1
        );
        self.top_level_tiles = tiles;
    }

    /// Selects this frame's tiles and fills the request queue.
    pub fn assemble_tiles(&mut self, dc: &DrawContext) -> FrameTiles {
        self.current_tiles.clear();
        self.request_queue.clear();
        self.at_max_resolution = false;
        if self.top_level_tiles.is_empty() {
            self.create_top_level_tiles();
        }

        let top_level_tiles = self.top_level_tiles.clone();
        for tile in &top_level_tiles {
            if self.is_tile_visible(dc, tile) {
                self.add_tile_or_descendants(dc, tile, None);
            } else if self.config.force_level_zero_loads
                && !tile.is_texture_in_memory(dc.texture_cache.as_ref())
            {
                self.request_texture(dc, tile);
            }
        }

        log::debug!(
            "layer '{}': {} tiles selected, {} requests queued",
            self.layer_name,
            self.current_tiles.len(),
            self.request_queue.len()
        );

        FrameTiles {
            current: self.current_tiles.clone(),
            requested: self.request_queue.len(),
        }
    }

    /// The tiles selected by the last frame.
    pub fn current_tiles(&self) -> &[Arc<TextureTile>] {
        &self.current_tiles
    }

    /// Selected tiles ordered coarse to fine so finer tiles draw over their ancestors.
    pub fn current_tiles_sorted(&self) -> Vec<Arc<TextureTile>> {
        let mut tiles = self.current_tiles.clone();
        tiles.sort_by(|a, b| a.key().cmp(b.key()));
        tiles
    }

    /// Visible when the tile's extent meets the frustum and its sector meets the visible sector.
    pub fn is_tile_visible(&self, dc: &DrawContext, tile: &TextureTile) -> bool {
        let extent = tile.extent(&dc.globe);
        dc.view.frustum.intersects(&extent)
            && dc
                .visible_sector
                .map_or(true, |visible| tile.sector().intersects(&visible))
    }

    pub fn meets_render_criteria(&self, dc: &DrawContext, tile: &TextureTile) -> bool {
        if self.levels.is_final_level(tile.level_number()) {
            return true;
        }
        match self.levels.level(tile.level_number()) {
            Some(level) => !self.need_to_split(dc, tile.sector(), level),
            None => true,
        }
    }

    /// True when the level's texels are coarser than the eye distance allows.
    ///
    /// The allowed texel size is `eye_distance * 10^-(origin + hint) * fov_scale`,
    /// where the exponent is damped near the poles and `fov_scale` shrinks for
    /// fields of view narrower than 45 degrees.
    pub fn need_to_split(&self, dc: &DrawContext, sector: &Sector, level: &Level) -> bool {
        let texel_size_meters = level.texel_size() * dc.globe.radius();

        let mut s = self.config.detail_hint_origin + self.config.detail_hint;
        if sector.min_lat().degrees >= POLAR_DETAIL_LATITUDE
            || sector.max_lat().degrees <= -POLAR_DETAIL_LATITUDE
        {
            s *= POLAR_DETAIL_DAMPENING;
        }
        let detail_scale = 10f64.powf(-s);

        let reference = Angle::from_degrees(REFERENCE_FIELD_OF_VIEW).tan_half_angle();
        let field_of_view_scale = (dc.view.field_of_view.tan_half_angle() / reference).clamp(0.0, 1.0);

        let eye_distance_meters = sector.distance_to(&dc.globe, &dc.view.eye_point);

        texel_size_meters > eye_distance_meters * detail_scale * field_of_view_scale
    }

    /// Selects `tile` or descends into its visible children.
    ///
    /// `current_resource` is the nearest ancestor that can stand in for a
    /// missing texture. It is passed down rather than stored so siblings never
    /// see each other's ancestors.
    pub fn add_tile_or_descendants(
        &mut self,
        dc: &DrawContext,
        tile: &Arc<TextureTile>,
        current_resource: Option<&Arc<TextureTile>>,
    ) {
        if self.meets_render_criteria(dc, tile) {
            self.add_tile(dc, tile, current_resource);
            return;
        }

        let resource_for_children =
            if tile.is_texture_in_memory(dc.texture_cache.as_ref()) || tile.level_number() == 0 {
                Some(tile)
            } else {
                if !self.levels.is_level_empty(tile.level_number())
                    && !self.levels.is_resource_absent(tile.key())
                {
                    self.request_texture(dc, tile);
                }
                current_resource
            };

        let Some(next_level) = self.levels.level(tile.level_number() + 1) else {
            self.add_tile(dc, tile, current_resource);
            return;
        };
        let levels = Arc::clone(&self.levels);
        let children = tile.create_sub_tiles(next_level, &self.tile_cache);

        for child in &children {
            if levels.sector().intersects(child.sector()) && self.is_tile_visible(dc, child) {
                self.add_tile_or_descendants(dc, child, resource_for_children);
            }
        }
    }

    /// Adds `tile` to the frame if it or `current_resource` has a resident texture,
    /// requesting its texture when missing or expired.
    pub fn add_tile(
        &mut self,
        dc: &DrawContext,
        tile: &Arc<TextureTile>,
        current_resource: Option<&Arc<TextureTile>>,
    ) {
        tile.clear_fallback_tile();
        if self.levels.is_final_level(tile.level_number()) {
            self.at_max_resolution = true;
        }

        let textures = dc.texture_cache.as_ref();
        if let Some(texture) = textures.get(tile.key()) {
            let expired = self
                .levels
                .level(tile.level_number())
                .map_or(false, |level| {
                    tile.is_texture_expired(&texture, level, dc.frame_timestamp)
                });
            if expired && !self.levels.is_resource_absent(tile.key()) {
                self.request_texture(dc, tile);
            }
            self.current_tiles.push(Arc::clone(tile));
            return;
        }

        if tile.level_number() < self.levels.num_levels()
            && !self.levels.is_resource_absent(tile.key())
        {
            self.request_texture(dc, tile);
        }

        if let Some(resource) = current_resource {
            if resource.is_texture_in_memory(textures) {
                tile.set_fallback_tile(Some(resource.key().clone()));
                self.current_tiles.push(Arc::clone(tile));
            }
        }
    }

    /// Queues a request for the tile's texture, prioritized by distance to the view's reference point.
    fn request_texture(&mut self, dc: &DrawContext, tile: &Arc<TextureTile>) {
        let reference_point = dc.view.reference_point(&dc.globe);
        tile.set_priority((tile.centroid_point(&dc.globe) - reference_point).norm());

        let task = RequestTask::new(
            Arc::clone(tile),
            self.source.locator(tile),
            Arc::clone(&self.levels),
            self.decoder,
            Arc::clone(&self.layer_name),
        );
        if self.request_queue.offer(task) {
            log::trace!("requested {} at priority {:.0}", tile.key(), tile.priority());
        }
    }

    /// Moves queued requests to `service`, nearest first, until it fills up.
    /// Requests it cannot take are dropped; they are queued again next frame.
    pub fn send_requests(&mut self, service: &RetrievalService) -> usize {
        let mut sent = 0;
        let mut dropped = 0;
        while let Some(task) = self.request_queue.poll() {
            if !service.is_full() && service.add_task(task) {
                sent += 1;
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            log::trace!("layer '{}': {} requests not accepted", self.layer_name, dropped);
        }
        sent
    }
}

impl LayerTrait for TiledImageLayer {
    fn properties(&self) -> &LayerProperties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut LayerProperties {
        &mut self.properties
    }

    fn capabilities(&self) -> &'static [LayerCapability] {
        &[
            LayerCapability::PreRender,
            LayerCapability::RequestTiles,
            LayerCapability::Dispose,
        ]
    }

    fn is_layer_in_view(&self, dc: &DrawContext) -> bool {
        self.layer_in_view(dc)
    }

    fn pre_render(&mut self, dc: &DrawContext) -> Result<()> {
        self.assemble_tiles(dc);
        Ok(())
    }

    fn send_requests(&mut self, service: &RetrievalService) -> usize {
        TiledImageLayer::send_requests(self, service)
    }

    fn dispose(&mut self) {
        self.current_tiles.clear();
        self.top_level_tiles.clear();
        self.request_queue.clear();
        self.tile_cache.clear();
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl Configurable for TiledImageLayer {
    type Config = LayerConfig;

    fn config(&self) -> &LayerConfig {
        &self.config
    }

    fn set_config(&mut self, config: LayerConfig) -> Result<()> {
        Self::validate_config(&config)?;
        if config.tile_cache_capacity != self.config.tile_cache_capacity {
            self.tile_cache = TextureTileCache::new(config.tile_cache_capacity);
            self.top_level_tiles.clear();
        }
        if config.request_queue_capacity != self.config.request_queue_capacity {
            self.request_queue = RequestQueue::new(config.request_queue_capacity);
        }
        self.properties.name = config.name.clone();
        self.config = config;
        Ok(())
    }

    fn validate_config(config: &LayerConfig) -> Result<()> {
        if !config.detail_hint.is_finite() || !config.detail_hint_origin.is_finite() {
            return Err(GlobeError::InvalidConfig(
                "detail hint must be finite".to_string(),
            ));
        }
        if config.tile_cache_capacity == 0 || config.request_queue_capacity == 0 {
            return Err(GlobeError::InvalidConfig(
                "cache and queue capacities must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
