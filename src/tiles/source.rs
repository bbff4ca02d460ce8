use super::tile::TextureTile;
use std::path::PathBuf;

/// Anything that can produce a resource locator for a tile.
pub trait TileSource: Send + Sync {
    /// Build the locator (file path or URL) for the requested `tile`.
    fn locator(&self, tile: &TextureTile) -> String;
}

/// Tiles stored on disk beneath a root directory, laid out as [`TextureTile::path`].
#[derive(Debug, Clone)]
pub struct FileTileSource {
    root: PathBuf,
}

impl FileTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl TileSource for FileTileSource {
    fn locator(&self, tile: &TextureTile) -> String {
        self.root.join(tile.path()).to_string_lossy().into_owned()
    }
}

/// URL template with `{cache}`, `{level}`, `{row}`, `{col}` and `{suffix}` placeholders.
///
/// ```
/// # use globetile::tiles::source::UrlTemplateSource;
/// let source = UrlTemplateSource::new("https://tiles.example.com/{cache}/{level}/{row}/{col}{suffix}");
/// assert!(source.template().contains("{level}"));
/// ```
#[derive(Debug, Clone)]
pub struct UrlTemplateSource {
    template: String,
}

impl UrlTemplateSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl TileSource for UrlTemplateSource {
    fn locator(&self, tile: &TextureTile) -> String {
        let key = tile.key();
        self.template
            .replace("{cache}", &key.cache_name)
            .replace("{level}", &key.level.to_string())
            .replace("{row}", &key.row.to_string())
            .replace("{col}", &key.col.to_string())
            .replace("{suffix}", tile.format_suffix())
    }
}
