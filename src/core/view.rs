//! Per-frame camera snapshot and draw context.

use super::{
    angle::Angle,
    globe::{Globe, Position},
    sector::Sector,
};
use crate::spatial::culling::Frustum;
use crate::texture::cache::TextureCache;
use nalgebra::Vector3;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read-only camera state for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub eye_position: Position,
    pub eye_point: Vector3<f64>,
    pub forward: Vector3<f64>,
    pub up: Vector3<f64>,
    /// Horizontal field of view.
    pub field_of_view: Angle,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub near_distance: f64,
    pub far_distance: f64,
    pub frustum: Frustum,
    /// Globe position under the viewport center, if the center ray hits the globe.
    pub viewport_center_position: Option<Position>,
}

impl ViewState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        globe: &Globe,
        eye_point: Vector3<f64>,
        forward: Vector3<f64>,
        up: Vector3<f64>,
        field_of_view: Angle,
        viewport_width: u32,
        viewport_height: u32,
        near_distance: f64,
        far_distance: f64,
    ) -> Self {
        let forward = forward.normalize();
        let up = up.normalize();
        let aspect = viewport_width.max(1) as f64 / viewport_height.max(1) as f64;
        let frustum = Frustum::from_camera(
            &eye_point,
            &forward,
            &up,
            field_of_view.degrees,
            aspect,
            near_distance,
            far_distance,
        );
        let viewport_center_position = globe
            .intersect_ray(&eye_point, &forward)
            .map(|hit| globe.compute_position_from_point(&hit));

        Self {
            eye_position: globe.compute_position_from_point(&eye_point),
            eye_point,
            forward,
            up,
            field_of_view,
            viewport_width,
            viewport_height,
            near_distance,
            far_distance,
            frustum,
            viewport_center_position,
        }
    }

    /// Camera above `eye`, looking straight down with north up.
    pub fn looking_down(
        globe: &Globe,
        eye: &Position,
        field_of_view: Angle,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        let altitude = eye.elevation.max(1.0);
        let eye = Position::new(eye.location, altitude);
        let eye_point = globe.compute_point(&eye);
        let forward = -globe.surface_normal(&eye.location);
        let up = globe.north_tangent(&eye.location);

        let radius = globe.radius();
        let horizon = (altitude * (2.0 * radius + altitude)).sqrt();
        let near = (altitude * 0.5).max(1.0);

        Self::new(
            globe,
            eye_point,
            forward,
            up,
            field_of_view,
            viewport_width,
            viewport_height,
            near,
            horizon + radius,
        )
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.viewport_width.max(1) as f64 / self.viewport_height.max(1) as f64
    }

    /// Point used to prioritize tile requests: the viewport center on the globe, else the eye.
    pub fn reference_point(&self, globe: &Globe) -> Vector3<f64> {
        match &self.viewport_center_position {
            Some(position) => globe.compute_point(position),
            None => self.eye_point,
        }
    }
}

/// Everything a layer needs to select and schedule tiles for one frame.
#[derive(Clone)]
pub struct DrawContext {
    pub globe: Globe,
    pub view: ViewState,
    /// Optional region outside which tiles are culled regardless of the frustum.
    pub visible_sector: Option<Sector>,
    pub texture_cache: Arc<dyn TextureCache>,
    /// Milliseconds since the Unix epoch at the start of the frame.
    pub frame_timestamp: u64,
}

impl DrawContext {
    pub fn new(globe: Globe, view: ViewState, texture_cache: Arc<dyn TextureCache>) -> Self {
        Self {
            globe,
            view,
            visible_sector: None,
            texture_cache,
            frame_timestamp: current_time_millis(),
        }
    }

    pub fn with_visible_sector(mut self, sector: Sector) -> Self {
        self.visible_sector = Some(sector);
        self
    }

    pub fn with_frame_timestamp(mut self, timestamp: u64) -> Self {
        self.frame_timestamp = timestamp;
        self
    }
}

pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
