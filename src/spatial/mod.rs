pub mod culling;

pub use culling::{Extent, Frustum, Plane};
