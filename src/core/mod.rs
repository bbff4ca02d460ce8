pub mod angle;
pub mod config;
pub mod constants;
pub mod globe;
pub mod latlon;
pub mod sector;
pub mod view;

// Re-exports for convenience
pub use angle::Angle;
pub use globe::{Globe, Position};
pub use latlon::{LatLon, Pole};
pub use sector::Sector;
pub use view::{DrawContext, ViewState};
