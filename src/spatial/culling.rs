use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Bounding sphere in globe Cartesian coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub center: Vector3<f64>,
    pub radius: f64,
}

impl Extent {
    pub fn new(center: Vector3<f64>, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Smallest sphere around `points` centred on their mean. `None` for an empty slice.
    pub fn from_points(points: &[Vector3<f64>]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let center = points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / points.len() as f64;
        let radius = points
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max);

        Some(Self { center, radius })
    }

    pub fn contains_point(&self, point: &Vector3<f64>) -> bool {
        (point - self.center).norm() <= self.radius
    }

    pub fn intersects(&self, other: &Extent) -> bool {
        (other.center - self.center).norm() <= self.radius + other.radius
    }

    /// Distance from `point` to the sphere surface, or 0 inside it.
    pub fn distance_to(&self, point: &Vector3<f64>) -> f64 {
        ((point - self.center).norm() - self.radius).max(0.0)
    }
}

/// Plane `dot(normal, p) + distance = 0` with the normal facing the inside of the frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub distance: f64,
}

impl Plane {
    /// Plane through `point` with the given normal. The normal is normalized.
    pub fn from_point_normal(point: &Vector3<f64>, normal: Vector3<f64>) -> Self {
        let normal = normal.normalize();
        Self {
            distance: -normal.dot(point),
            normal,
        }
    }

    pub fn signed_distance(&self, point: &Vector3<f64>) -> f64 {
        self.normal.dot(point) + self.distance
    }
}

/// Six-plane view volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub left: Plane,
    pub right: Plane,
    pub bottom: Plane,
    pub top: Plane,
    pub near: Plane,
    pub far: Plane,
}

impl Frustum {
    /// Builds a perspective frustum from a camera basis.
    ///
    /// `forward` and `up` must be orthogonal. `horizontal_fov_degrees` is the full
    /// horizontal angle; the vertical angle follows from `aspect` (width / height).
    pub fn from_camera(
        eye: &Vector3<f64>,
        forward: &Vector3<f64>,
        up: &Vector3<f64>,
        horizontal_fov_degrees: f64,
        aspect: f64,
        near_distance: f64,
        far_distance: f64,
    ) -> Self {
        let forward = forward.normalize();
        let up = up.normalize();
        let right = forward.cross(&up).normalize();

        let half_h = (horizontal_fov_degrees * 0.5).to_radians();
        let half_v = (half_h.tan() / aspect.max(f64::EPSILON)).atan();
        let (sin_h, cos_h) = half_h.sin_cos();
        let (sin_v, cos_v) = half_v.sin_cos();

        let near_point = eye + forward * near_distance;
        let far_point = eye + forward * far_distance;

        Self {
            left: Plane::from_point_normal(eye, right * cos_h + forward * sin_h),
            right: Plane::from_point_normal(eye, -right * cos_h + forward * sin_h),
            bottom: Plane::from_point_normal(eye, up * cos_v + forward * sin_v),
            top: Plane::from_point_normal(eye, -up * cos_v + forward * sin_v),
            near: Plane::from_point_normal(&near_point, forward),
            far: Plane::from_point_normal(&far_point, -forward),
        }
    }

    pub fn planes(&self) -> [&Plane; 6] {
        [
            &self.left,
            &self.right,
            &self.bottom,
            &self.top,
            &self.near,
            &self.far,
        ]
    }

    /// Conservative sphere test: false only when the sphere lies fully outside one plane.
    pub fn intersects(&self, extent: &Extent) -> bool {
        self.planes()
            .iter()
            .all(|plane| plane.signed_distance(&extent.center) > -extent.radius)
    }

    pub fn contains_point(&self, point: &Vector3<f64>) -> bool {
        self.planes()
            .iter()
            .all(|plane| plane.signed_distance(point) >= 0.0)
    }
}
