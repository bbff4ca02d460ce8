use crate::{
    core::view::DrawContext,
    layers::base::{LayerCapability, LayerTrait},
    retrieval::service::RetrievalService,
    Result,
};

use crate::prelude::HashMap;

/// Owns the globe's layers and drives them through each frame in z-order
pub struct LayerManager {
    /// All layers indexed by ID
    layers: HashMap<String, Box<dyn LayerTrait>>,
    /// Ordered list of layer IDs (sorted by z-index)
    render_order: Vec<String>,
}

impl LayerManager {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            render_order: Vec::new(),
        }
    }

    /// Adds a layer, replacing any layer with the same ID
    pub fn add_layer(&mut self, layer: Box<dyn LayerTrait>) -> Result<()> {
        let layer_id = layer.id().to_string();
        let z_index = layer.z_index();

        self.render_order.retain(|id| id != &layer_id);
        self.layers.insert(layer_id.clone(), layer);

        // Insert in sorted order by z-index
        let insert_pos = self
            .render_order
            .iter()
            .position(|id| {
                self.layers
                    .get(id)
                    .map(|l| l.z_index() > z_index)
                    .unwrap_or(false)
            })
            .unwrap_or(self.render_order.len());

        self.render_order.insert(insert_pos, layer_id);
        Ok(())
    }

    /// Removes a layer, disposing of it first
    pub fn remove_layer(&mut self, layer_id: &str) -> Option<Box<dyn LayerTrait>> {
        self.render_order.retain(|id| id != layer_id);
        let mut layer = self.layers.remove(layer_id)?;
        if layer.has_capability(LayerCapability::Dispose) {
            layer.dispose();
        }
        Some(layer)
    }

    pub fn get_layer(&self, layer_id: &str) -> Option<&dyn LayerTrait> {
        self.layers.get(layer_id).map(|l| l.as_ref())
    }

    /// Applies a function to a specific layer mutably
    pub fn with_layer_mut<F, R>(&mut self, layer_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut dyn LayerTrait) -> R,
    {
        self.layers.get_mut(layer_id).map(|layer| f(layer.as_mut()))
    }

    /// Layer IDs in z-order
    pub fn list_layers(&self) -> Vec<String> {
        self.render_order.clone()
    }

    /// Gets all layers in z-order
    pub fn layers(&self) -> Vec<&dyn LayerTrait> {
        self.render_order
            .iter()
            .filter_map(|id| self.layers.get(id).map(|l| l.as_ref()))
            .collect()
    }

    /// Runs tile selection on every enabled, in-view layer that pre-renders.
    ///
    /// A failing layer is logged and skipped so the frame still completes.
    /// Returns the number of layers that pre-rendered.
    pub fn pre_render_all(&mut self, dc: &DrawContext) -> usize {
        let mut count = 0;
        for layer_id in &self.render_order {
            let Some(layer) = self.layers.get_mut(layer_id) else {
                continue;
            };
            if !layer.is_enabled()
                || !layer.has_capability(LayerCapability::PreRender)
                || !layer.is_layer_in_view(dc)
            {
                continue;
            }
            match layer.pre_render(dc) {
                Ok(()) => count += 1,
                Err(e) => log::warn!("layer '{}' pre-render failed: {}", layer_id, e),
            }
        }
        count
    }

    /// Hands each layer's queued requests to the shared service, in z-order.
    pub fn send_requests(&mut self, service: &RetrievalService) -> usize {
        let mut sent = 0;
        for layer_id in &self.render_order {
            if let Some(layer) = self.layers.get_mut(layer_id) {
                if layer.is_enabled() && layer.has_capability(LayerCapability::RequestTiles) {
                    sent += layer.send_requests(service);
                }
            }
        }
        sent
    }

    /// Releases the caches of every layer that holds any
    pub fn dispose_all(&mut self) {
        for layer in self.layers.values_mut() {
            if layer.has_capability(LayerCapability::Dispose) {
                layer.dispose();
            }
        }
    }

    /// Updates the order based on current z-indices
    pub fn update_render_order(&mut self) {
        let layers = &self.layers;
        self.render_order
            .sort_by_key(|id| layers.get(id).map(|l| l.z_index()).unwrap_or(0));
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{angle::Angle, globe::Globe, globe::Position, view::ViewState};
    use crate::layers::base::LayerProperties;
    use crate::texture::cache::MemoryTextureCache;
    use crate::GlobeError;
    use std::sync::Arc;

    struct CountingLayer {
        properties: LayerProperties,
        frames: usize,
        fail: bool,
        disposed: bool,
    }

    impl CountingLayer {
        fn boxed(id: &str, z_index: i32) -> Box<dyn LayerTrait> {
            let mut properties = LayerProperties::new(id, id);
            properties.z_index = z_index;
            Box::new(Self {
                properties,
                frames: 0,
                fail: false,
                disposed: false,
            })
        }
    }

    impl LayerTrait for CountingLayer {
        fn properties(&self) -> &LayerProperties {
            &self.properties
        }

        fn properties_mut(&mut self) -> &mut LayerProperties {
            &mut self.properties
        }

        fn capabilities(&self) -> &'static [LayerCapability] {
            &[LayerCapability::PreRender, LayerCapability::Dispose]
        }

        fn pre_render(&mut self, _dc: &DrawContext) -> Result<()> {
            self.frames += 1;
            if self.fail {
                return Err(GlobeError::InvalidConfig("broken".to_string()));
            }
            Ok(())
        }

        fn dispose(&mut self) {
            self.disposed = true;
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    fn draw_context() -> DrawContext {
        let globe = Globe::wgs84();
        let view = ViewState::looking_down(
            &globe,
            &Position::from_degrees(0.0, 0.0, 1.0e6),
            Angle::from_degrees(45.0),
            800,
            600,
        );
        DrawContext::new(globe, view, Arc::new(MemoryTextureCache::new(4)))
    }

    fn frames(manager: &LayerManager, id: &str) -> usize {
        manager
            .get_layer(id)
            .and_then(|l| l.as_any().downcast_ref::<CountingLayer>())
            .map(|l| l.frames)
            .unwrap_or(0)
    }

    #[test]
    fn test_layers_sorted_by_z_index() {
        let mut manager = LayerManager::new();
        manager.add_layer(CountingLayer::boxed("top", 10)).unwrap();
        manager.add_layer(CountingLayer::boxed("bottom", -1)).unwrap();
        manager.add_layer(CountingLayer::boxed("middle", 5)).unwrap();

        assert_eq!(manager.list_layers(), vec!["bottom", "middle", "top"]);

        manager.with_layer_mut("bottom", |l| l.set_z_index(20));
        manager.update_render_order();
        assert_eq!(manager.list_layers(), vec!["middle", "top", "bottom"]);
    }

    #[test]
    fn test_pre_render_skips_disabled_and_survives_failures() {
        let mut manager = LayerManager::new();
        manager.add_layer(CountingLayer::boxed("a", 0)).unwrap();
        manager.add_layer(CountingLayer::boxed("b", 1)).unwrap();
        manager.add_layer(CountingLayer::boxed("c", 2)).unwrap();

        manager.with_layer_mut("b", |l| l.set_enabled(false));
        manager.with_layer_mut("c", |l| {
            if let Some(layer) = l.as_any_mut().downcast_mut::<CountingLayer>() {
                layer.fail = true;
            }
        });

        let dc = draw_context();
        assert_eq!(manager.pre_render_all(&dc), 1);
        assert_eq!(frames(&manager, "a"), 1);
        assert_eq!(frames(&manager, "b"), 0);
        assert_eq!(frames(&manager, "c"), 1);
    }

    #[test]
    fn test_remove_disposes() {
        let mut manager = LayerManager::new();
        manager.add_layer(CountingLayer::boxed("a", 0)).unwrap();

        let removed = manager.remove_layer("a").unwrap();
        let removed = removed.as_any().downcast_ref::<CountingLayer>().unwrap();
        assert!(removed.disposed);
        assert!(manager.is_empty());
        assert!(manager.remove_layer("a").is_none());
    }
}
