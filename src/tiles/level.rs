use super::absent::AbsentResourceList;
use crate::core::{config::AbsentPolicy, latlon::LatLon};
use std::sync::atomic::{AtomicU64, Ordering};

/// One resolution level of a level set.
#[derive(Debug)]
pub struct Level {
    number: usize,
    /// Empty for levels that carry no data.
    name: String,
    cache_name: String,
    format_suffix: String,
    tile_width: u32,
    tile_height: u32,
    tile_delta: LatLon,
    texel_size: f64,
    active: bool,
    expiry_time: AtomicU64,
    absent: AbsentResourceList,
}

impl Level {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        number: usize,
        name: impl Into<String>,
        cache_name: impl Into<String>,
        format_suffix: impl Into<String>,
        tile_width: u32,
        tile_height: u32,
        tile_delta: LatLon,
        absent_policy: &AbsentPolicy,
    ) -> Self {
        Self {
            number,
            name: name.into(),
            cache_name: cache_name.into(),
            format_suffix: format_suffix.into(),
            tile_width,
            tile_height,
            texel_size: tile_delta.lat.radians() / tile_height.max(1) as f64,
            tile_delta,
            active: true,
            expiry_time: AtomicU64::new(0),
            absent: AbsentResourceList::from_policy(absent_policy),
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn format_suffix(&self) -> &str {
        &self.format_suffix
    }

    /// `{cache_name}/{number}`, the directory holding this level's tiles.
    pub fn path(&self) -> String {
        format!("{}/{}", self.cache_name, self.number)
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    pub fn tile_delta(&self) -> LatLon {
        self.tile_delta
    }

    /// Angular size of one texel, in radians of latitude.
    pub fn texel_size(&self) -> f64 {
        self.texel_size
    }

    /// True when no data exists at this level.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn expiry_time(&self) -> u64 {
        self.expiry_time.load(Ordering::Relaxed)
    }

    pub fn set_expiry_time(&self, expiry_time: u64) {
        self.expiry_time.store(expiry_time, Ordering::Relaxed);
    }

    pub fn absent_resources(&self) -> &AbsentResourceList {
        &self.absent
    }

    pub fn mark_resource_absent(&self, tile_number: u64) {
        self.absent.mark_resource_absent(tile_number);
    }

    pub fn unmark_resource_absent(&self, tile_number: u64) {
        self.absent.unmark_resource_absent(tile_number);
    }

    pub fn is_resource_absent(&self, tile_number: u64) -> bool {
        self.absent.is_resource_absent(tile_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texel_size() {
        let level = Level::new(
            0,
            "0",
            "imagery",
            ".png",
            512,
            512,
            LatLon::from_degrees(36.0, 36.0),
            &AbsentPolicy::default(),
        );
        let expected = 36f64.to_radians() / 512.0;
        assert!((level.texel_size() - expected).abs() < 1e-15);
        assert_eq!(level.path(), "imagery/0");
        assert!(!level.is_empty());
    }

    #[test]
    fn test_empty_name_means_empty_level() {
        let level = Level::new(
            0,
            "",
            "imagery",
            ".png",
            512,
            512,
            LatLon::from_degrees(36.0, 36.0),
            &AbsentPolicy::default(),
        );
        assert!(level.is_empty());
    }

    #[test]
    fn test_expiry_time_is_shared() {
        let level = Level::new(
            1,
            "1",
            "imagery",
            ".png",
            256,
            256,
            LatLon::from_degrees(18.0, 18.0),
            &AbsentPolicy::default(),
        );
        assert_eq!(level.expiry_time(), 0);
        level.set_expiry_time(1_000);
        assert_eq!(level.expiry_time(), 1_000);
    }
}
