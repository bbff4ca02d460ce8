use anyhow::Context;
use globetile::prelude::*;
use globetile::core::view::current_time_millis;

/// Frames simulated while the camera descends.
const FRAMES: usize = 120;
const START_ALTITUDE: f64 = 2.0e7;
const END_ALTITUDE: f64 = 5.0e3;
const FRAME_INTERVAL: Duration = Duration::from_millis(50);

/// Headless flight over a tiled dataset
///
/// Usage: `globetile-app [LEVEL_SET_JSON] [TILE_ROOT_OR_URL_TEMPLATE]`
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let level_set = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading level set config {}", path))?;
            LevelSetConfig::from_json(&json).with_context(|| format!("parsing {}", path))?
        }
        None => LevelSetConfig::default(),
    };
    let location = args.next().unwrap_or_else(|| "tiles".to_string());

    let (source, retriever): (Arc<dyn TileSource>, Arc<dyn Retriever>) =
        if location.starts_with("http://") || location.starts_with("https://") {
            (
                Arc::new(UrlTemplateSource::new(location.clone())),
                Arc::new(HttpRetriever::default()),
            )
        } else {
            (
                Arc::new(FileTileSource::new(location.clone())),
                Arc::new(FileRetriever::new()),
            )
        };

    let retrieval = RetrievalConfig::default();
    let textures: Arc<dyn TextureCache> =
        Arc::new(MemoryTextureCache::new(retrieval.texture_cache_capacity));
    let service = RetrievalService::new(retrieval, retriever, Arc::clone(&textures));

    let layer = TiledImageLayer::from_configs(LayerConfig::default(), &level_set, source)?;
    let layer_id = layer.id().to_string();
    let mut manager = LayerManager::new();
    manager.add_layer(Box::new(layer))?;

    log::info!(
        "flying over {} with {} levels from {}",
        layer_id,
        level_set.num_levels,
        location
    );

    let globe = Globe::wgs84();
    let started = current_time_millis();
    let mut loaded = 0usize;
    let mut failed = 0usize;
    let mut sent = 0usize;

    for frame in 0..FRAMES {
        let t = frame as f64 / (FRAMES - 1) as f64;
        let altitude = START_ALTITUDE * (END_ALTITUDE / START_ALTITUDE).powf(t);
        let eye = Position::from_degrees(37.77, -122.42, altitude);
        let view = ViewState::looking_down(&globe, &eye, Angle::from_degrees(45.0), 1280, 800);
        let dc = DrawContext::new(globe, view, Arc::clone(&textures));

        manager.pre_render_all(&dc);
        sent += manager.send_requests(&service);

        for event in service.try_recv_completed() {
            match event {
                RetrievalEvent::Loaded { .. } => loaded += 1,
                RetrievalEvent::Failed { .. } => failed += 1,
                RetrievalEvent::Skipped { .. } => {}
            }
        }

        if let Some((tiles, fallbacks, max_resolution)) = manager
            .get_layer(&layer_id)
            .and_then(|layer| layer.as_any().downcast_ref::<TiledImageLayer>())
            .map(|layer| {
                let tiles = layer.current_tiles();
                let fallbacks = tiles.iter().filter(|t| t.fallback_tile().is_some()).count();
                (tiles.len(), fallbacks, layer.is_at_max_resolution())
            })
        {
            log::info!(
                "frame {:3} alt {:>10.0} m: {} tiles ({} on fallback), {} pending{}",
                frame,
                altitude,
                tiles,
                fallbacks,
                service.pending_count(),
                if max_resolution { ", max resolution" } else { "" }
            );
        }

        tokio::select! {
            _ = tokio::time::sleep(FRAME_INTERVAL) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted at frame {}", frame);
                break;
            }
        }
    }

    manager.dispose_all();
    service.shutdown();

    let summary = serde_json::json!({
        "layer": layer_id,
        "elapsed_ms": current_time_millis().saturating_sub(started),
        "requests_sent": sent,
        "loaded": loaded,
        "failed": failed,
        "textures_resident": textures.len(),
        "texture_cache": {
            "hits": textures.stats().hits,
            "misses": textures.stats().misses,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
