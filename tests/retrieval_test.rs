use async_trait::async_trait;
use globetile::prelude::*;
use globetile::retrieval::RetrievalError;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

/// Serves a one-pixel RGBA payload for every locator except those containing "missing".
struct PixelRetriever {
    calls: AtomicUsize,
}

impl PixelRetriever {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Retriever for PixelRetriever {
    async fn retrieve(&self, locator: &str) -> std::result::Result<Vec<u8>, RetrievalError> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        if locator.contains("missing") {
            Err(RetrievalError::NotFound(locator.to_string()))
        } else {
            Ok(vec![255, 255, 255, 255])
        }
    }
}

fn two_level_config() -> LevelSetConfig {
    LevelSetConfig {
        num_levels: 2,
        level_zero_tile_delta: [180.0, 360.0],
        ..LevelSetConfig::default()
    }
}

fn pixel_layer(name: &str, root: &str) -> TiledImageLayer {
    let config = LayerConfig {
        name: name.to_string(),
        ..LayerConfig::default()
    };
    TiledImageLayer::from_configs(config, &two_level_config(), Arc::new(FileTileSource::new(root)))
        .unwrap()
        .with_decoder(TextureDecoder::Rgba {
            width: 1,
            height: 1,
        })
}

fn draw_context(textures: Arc<dyn TextureCache>) -> DrawContext {
    let globe = Globe::wgs84();
    let view = ViewState::looking_down(
        &globe,
        &Position::from_degrees(0.0, 0.0, 1.0e6),
        Angle::from_degrees(45.0),
        1024,
        768,
    );
    DrawContext::new(globe, view, textures)
}

async fn drain_events(service: &RetrievalService, count: usize) -> Vec<RetrievalEvent> {
    let mut events = Vec::new();
    for _ in 0..300 {
        events.extend(service.try_recv_completed());
        if events.len() >= count && !service.has_pending() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    events
}

#[cfg(all(test, feature = "tokio-runtime"))]
mod retrieval_tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[tokio::test]
    async fn test_frame_loop_sharpens_after_retrieval() {
        init_logging();
        let textures: Arc<dyn TextureCache> = Arc::new(MemoryTextureCache::new(64));
        let retriever = Arc::new(PixelRetriever::new());
        let service = RetrievalService::new(
            RetrievalConfig::for_testing(),
            Arc::clone(&retriever) as Arc<dyn Retriever>,
            Arc::clone(&textures),
        );
        let mut layer = pixel_layer("imagery", "/tiles");
        let dc = draw_context(Arc::clone(&textures));

        let first = layer.assemble_tiles(&dc);
        assert!(first.current.is_empty());
        assert_eq!(layer.send_requests(&service), 4);

        let events = drain_events(&service, 4).await;
        assert_eq!(events.len(), 4);
        assert!(events
            .iter()
            .all(|event| matches!(event, RetrievalEvent::Loaded { bytes: 4, .. })));
        assert_eq!(textures.len(), 4);

        let second = layer.assemble_tiles(&dc);
        assert_eq!(second.current.len(), 4);
        assert_eq!(second.requested, 0);
        assert!(second.current.iter().all(|tile| tile.fallback_tile().is_none()));
        assert_eq!(retriever.calls.load(AtomicOrdering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_tiles_are_held_back() {
        init_logging();
        let textures: Arc<dyn TextureCache> = Arc::new(MemoryTextureCache::new(64));
        let service = RetrievalService::new(
            RetrievalConfig::for_testing(),
            Arc::new(PixelRetriever::new()),
            Arc::clone(&textures),
        );
        let mut layer = pixel_layer("imagery", "/missing");
        let dc = draw_context(Arc::clone(&textures));

        layer.assemble_tiles(&dc);
        assert_eq!(layer.send_requests(&service), 4);
        let events = drain_events(&service, 4).await;
        assert!(events
            .iter()
            .all(|event| matches!(event, RetrievalEvent::Failed { .. })));

        // Every child is now marked absent, so the next frame asks for nothing.
        assert_eq!(layer.assemble_tiles(&dc).requested, 0);
        assert!(textures.is_empty());
    }

    #[tokio::test]
    async fn test_layer_manager_drives_file_backed_layer() {
        init_logging();
        let root = std::env::temp_dir().join(format!("globetile-frames-{}", std::process::id()));
        let textures: Arc<dyn TextureCache> = Arc::new(MemoryTextureCache::new(64));
        let mut layer = pixel_layer("files", root.to_string_lossy().as_ref());

        // Lay out one pixel per level-one tile the way the file source names them.
        let top_key = layer.top_level_tiles()[0].key().clone();
        let levels = Arc::clone(layer.levels());
        for key in top_key.children() {
            let sector = levels.compute_sector_for_key(&key).unwrap();
            let tile = TextureTile::new(sector, levels.last_level(), key.row, key.col);
            let path = root.join(tile.path());
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, [10u8, 20, 30, 255]).unwrap();
        }

        let service = RetrievalService::new(
            RetrievalConfig::for_testing(),
            Arc::new(FileRetriever::new()),
            Arc::clone(&textures),
        );
        let mut manager = LayerManager::new();
        manager.add_layer(Box::new(layer)).unwrap();
        let dc = draw_context(Arc::clone(&textures));

        assert_eq!(manager.pre_render_all(&dc), 1);
        assert_eq!(manager.send_requests(&service), 4);
        let events = drain_events(&service, 4).await;
        assert_eq!(events.len(), 4);

        manager.pre_render_all(&dc);
        let layer = manager
            .get_layer("files")
            .and_then(|layer| layer.as_any().downcast_ref::<TiledImageLayer>())
            .unwrap();
        assert_eq!(layer.current_tiles().len(), 4);
        for tile in layer.current_tiles() {
            let texture = textures.get(tile.key()).unwrap();
            assert_eq!(texture.data, vec![10, 20, 30, 255]);
        }

        manager.dispose_all();
        service.shutdown();
        let _ = std::fs::remove_dir_all(&root);
    }
}
