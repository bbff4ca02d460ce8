use crate::{core::view::DrawContext, retrieval::service::RetrievalService, Result};

/// The closed set of per-frame behaviours a layer can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerCapability {
    /// Selects what to draw before rendering (`pre_render`).
    PreRender,
    /// Issues asynchronous tile requests (`send_requests`).
    RequestTiles,
    /// Holds caches that `dispose` releases.
    Dispose,
}

impl std::fmt::Display for LayerCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerCapability::PreRender => write!(f, "pre-render"),
            LayerCapability::RequestTiles => write!(f, "request-tiles"),
            LayerCapability::Dispose => write!(f, "dispose"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LayerProperties {
    pub id: String,
    pub name: String,
    pub z_index: i32,
    pub opacity: f32,
    pub enabled: bool,
}

impl LayerProperties {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            z_index: 0,
            opacity: 1.0,
            enabled: true,
        }
    }
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self::new("default", "Default Layer")
    }
}

/// A globe layer driven once per frame by the [`super::manager::LayerManager`].
///
/// Methods tied to a capability are only called when the layer lists that
/// capability in [`LayerTrait::capabilities`].
pub trait LayerTrait: Send + Sync {
    fn properties(&self) -> &LayerProperties;

    fn properties_mut(&mut self) -> &mut LayerProperties;

    fn capabilities(&self) -> &'static [LayerCapability];

    fn has_capability(&self, capability: LayerCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn id(&self) -> &str {
        &self.properties().id
    }

    fn name(&self) -> &str {
        &self.properties().name
    }

    fn z_index(&self) -> i32 {
        self.properties().z_index
    }

    fn set_z_index(&mut self, z_index: i32) {
        self.properties_mut().z_index = z_index;
    }

    fn opacity(&self) -> f32 {
        self.properties().opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.properties_mut().opacity = opacity.clamp(0.0, 1.0);
    }

    fn is_enabled(&self) -> bool {
        self.properties().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.properties_mut().enabled = enabled;
    }

    /// Whether anything of the layer can be seen this frame.
    fn is_layer_in_view(&self, _dc: &DrawContext) -> bool {
        true
    }

    fn pre_render(&mut self, _dc: &DrawContext) -> Result<()> {
        Ok(())
    }

    /// Hands this frame's requests to `service`; returns how many were accepted.
    fn send_requests(&mut self, _service: &RetrievalService) -> usize {
        0
    }

    fn dispose(&mut self) {}

    /// Dynamic casting support
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
