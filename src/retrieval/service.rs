use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};

use super::{queue::RequestTask, retriever::Retriever, RetrievalError};
use crate::core::{config::RetrievalConfig, view::current_time_millis};
use crate::prelude::{Arc, BinaryHeap, HashSet, Mutex};
use crate::runtime::async_utils::{async_delay, with_timeout, Semaphore};
use crate::texture::cache::TextureCache;
use crate::tiles::key::TileKey;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Outcome of one request, reported back to the render thread.
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalEvent {
    /// Texture decoded and published to the texture cache.
    Loaded { key: TileKey, layer: Arc<str>, bytes: usize },
    /// Texture was already resident when the request was dequeued.
    Skipped { key: TileKey, layer: Arc<str> },
    /// Fetch or decode failed; the tile was marked missing on its level.
    Failed {
        key: TileKey,
        layer: Arc<str>,
        error: RetrievalError,
    },
}

impl RetrievalEvent {
    pub fn key(&self) -> &TileKey {
        match self {
            Self::Loaded { key, .. } | Self::Skipped { key, .. } | Self::Failed { key, .. } => key,
        }
    }
}

/// Shared worker pool that turns tile requests into resident textures.
///
/// Requests for the same tile are coalesced while queued and while in flight.
/// In-flight fetches are never cancelled; a texture that arrives after its
/// tile left the view is cached all the same.
pub struct RetrievalService {
    task_tx: Sender<RequestTask>,
    event_rx: Receiver<RetrievalEvent>,
    /// Queued or in-flight tile keys
    pending: Arc<Mutex<HashSet<TileKey>>>,
    shutdown: Arc<AtomicBool>,
    textures: Arc<dyn TextureCache>,
    config: RetrievalConfig,
}

impl RetrievalService {
    /// Start the dispatcher on the global runtime.
    pub fn new(
        config: RetrievalConfig,
        retriever: Arc<dyn Retriever>,
        textures: Arc<dyn TextureCache>,
    ) -> Self {
        let (task_tx, task_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let pending = Arc::new(Mutex::new(HashSet::default()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = RetrievalWorker {
            task_rx,
            event_tx,
            retriever,
            textures: Arc::clone(&textures),
            semaphore: Semaphore::new(config.worker_pool_size.max(1)),
            task_queue: BinaryHeap::new(),
            pending: Arc::clone(&pending),
            shutdown: Arc::clone(&shutdown),
            timeout: config.request_timeout(),
        };
        crate::runtime::spawn(async move {
            worker.run().await;
        });

        Self {
            task_tx,
            event_rx,
            pending,
            shutdown,
            textures,
            config,
        }
    }

    /// Queue a request. Returns `false` when the service is full, shut down,
    /// or already holds a request for the same tile.
    pub fn add_task(&self, task: RequestTask) -> bool {
        if self.is_shutdown() {
            return false;
        }

        let key = task.key().clone();
        {
            let Ok(mut pending) = self.pending.lock() else {
                return false;
            };
            if pending.len() >= self.config.queue_capacity || !pending.insert(key.clone()) {
                return false;
            }
        }

        log::trace!("queue {} at priority {:.1}", key, task.priority);
        if self.task_tx.send(task).is_err() {
            if let Ok(mut pending) = self.pending.lock() {
                pending.remove(&key);
            }
            return false;
        }
        true
    }

    /// True when no further requests are accepted until some complete.
    pub fn is_full(&self) -> bool {
        self.pending_count() >= self.config.queue_capacity
    }

    /// True while a request for `key` is queued or in flight.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.contains(key))
            .unwrap_or(false)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|pending| pending.len()).unwrap_or(0)
    }

    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    /// Drain completion events (non-blocking)
    pub fn try_recv_completed(&self) -> Vec<RetrievalEvent> {
        self.event_rx.try_iter().collect()
    }

    pub fn texture_cache(&self) -> &Arc<dyn TextureCache> {
        &self.textures
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Stop dispatching queued requests. Fetches already running complete.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            log::info!("retrieval service shutting down");
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}

impl Drop for RetrievalService {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// Background dispatcher that feeds requests to the fetch tasks
struct RetrievalWorker {
    task_rx: Receiver<RequestTask>,
    event_tx: Sender<RetrievalEvent>,
    retriever: Arc<dyn Retriever>,
    textures: Arc<dyn TextureCache>,
    /// Bounds concurrent fetches to the pool size
    semaphore: Semaphore,
    /// Nearest request first
    task_queue: BinaryHeap<RequestTask>,
    pending: Arc<Mutex<HashSet<TileKey>>>,
    shutdown: Arc<AtomicBool>,
    timeout: Duration,
}

impl RetrievalWorker {
    async fn run(mut self) {
        log::info!(
            "retrieval service started with {} workers",
            self.semaphore.max_permits()
        );

        loop {
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }

            // Collect any new tasks
            let mut disconnected = false;
            loop {
                match self.task_rx.try_recv() {
                    Ok(task) => self.task_queue.push(task),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }

            // Start as many of the nearest tasks as there are free permits
            while let Some(task) = self.task_queue.pop() {
                if self.textures.contains(task.key()) {
                    self.finish(RetrievalEvent::Skipped {
                        key: task.key().clone(),
                        layer: Arc::clone(&task.layer),
                    });
                    continue;
                }

                if !self.semaphore.try_acquire() {
                    self.task_queue.push(task);
                    break;
                }

                let retriever = Arc::clone(&self.retriever);
                let textures = Arc::clone(&self.textures);
                let pending = Arc::clone(&self.pending);
                let event_tx = self.event_tx.clone();
                let semaphore = self.semaphore.clone();
                let timeout = self.timeout;

                crate::runtime::spawn(async move {
                    let event = Self::process(task, retriever, textures, timeout).await;
                    if let Ok(mut pending) = pending.lock() {
                        pending.remove(event.key());
                    }
                    let _ = event_tx.send(event);
                    semaphore.release();
                });
            }

            if disconnected && self.task_queue.is_empty() {
                break;
            }

            async_delay(Duration::from_millis(10)).await;
        }

        log::info!(
            "retrieval service stopped with {} requests undispatched",
            self.task_queue.len()
        );
    }

    fn finish(&self, event: RetrievalEvent) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(event.key());
        }
        let _ = self.event_tx.send(event);
    }

    async fn process(
        task: RequestTask,
        retriever: Arc<dyn Retriever>,
        textures: Arc<dyn TextureCache>,
        timeout: Duration,
    ) -> RetrievalEvent {
        let key = task.key().clone();
        let layer = Arc::clone(&task.layer);

        let fetched = with_timeout(timeout, retriever.retrieve(&task.locator))
            .await
            .unwrap_or_else(|| {
                Err(RetrievalError::Network(format!(
                    "timed out after {:?}",
                    timeout
                )))
            });

        let texture = fetched.and_then(|bytes| {
            task.decoder
                .decode(&bytes, current_time_millis())
                .map_err(|e| RetrievalError::Decode(e.to_string()))
        });

        match texture {
            Ok(texture) => {
                let bytes = texture.size_in_bytes();
                textures.put(key.clone(), texture);
                task.levels.has(&key);
                log::trace!("loaded {} ({} bytes)", key, bytes);
                RetrievalEvent::Loaded { key, layer, bytes }
            }
            Err(error) => {
                task.levels.miss(&key);
                if error.is_transient() {
                    log::warn!("retrieval of {} from {} failed: {}", key, task.locator, error);
                } else {
                    log::debug!("{} unavailable: {}", key, error);
                }
                RetrievalEvent::Failed { key, layer, error }
            }
        }
    }
}

#[cfg(all(test, feature = "tokio-runtime"))]
mod tests {
    use super::*;
    use crate::core::config::LevelSetConfig;
    use crate::texture::{cache::MemoryTextureCache, decoder::TextureDecoder, Texture};
    use crate::tiles::{level_set::LevelSet, tile::TextureTile};
    use async_trait::async_trait;

    /// Serves locators that start with "ok", fails the rest.
    struct StubRetriever;

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, RetrievalError> {
            if locator.starts_with("ok") {
                Ok(vec![0, 0, 0, 255])
            } else {
                Err(RetrievalError::NotFound(locator.to_string()))
            }
        }
    }

    fn task(levels: &Arc<LevelSet>, col: i32, locator: &str) -> RequestTask {
        let key = TileKey::new(0, 0, col, levels.first_level().cache_name());
        let sector = levels.compute_sector_for_key(&key).unwrap();
        let tile = Arc::new(TextureTile::new(sector, levels.first_level(), 0, col));
        RequestTask::new(
            tile,
            locator.to_string(),
            Arc::clone(levels),
            TextureDecoder::Rgba {
                width: 1,
                height: 1,
            },
            Arc::from("test"),
        )
    }

    async fn wait_for_events(service: &RetrievalService, count: usize) -> Vec<RetrievalEvent> {
        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(service.try_recv_completed());
            if events.len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        events
    }

    #[tokio::test]
    async fn test_loads_and_marks_failures() {
        let levels = Arc::new(LevelSet::new(&LevelSetConfig::default()).unwrap());
        let textures: Arc<dyn TextureCache> = Arc::new(MemoryTextureCache::new(16));
        let service = RetrievalService::new(
            RetrievalConfig::for_testing(),
            Arc::new(StubRetriever),
            Arc::clone(&textures),
        );

        let good = task(&levels, 0, "ok-0");
        let bad = task(&levels, 1, "missing-1");
        let good_key = good.key().clone();
        let bad_key = bad.key().clone();

        assert!(service.add_task(good.clone()));
        assert!(!service.add_task(good), "duplicate must be coalesced");
        assert!(service.add_task(bad));

        let events = wait_for_events(&service, 2).await;
        assert_eq!(events.len(), 2);
        assert!(textures.contains(&good_key));
        assert!(!textures.contains(&bad_key));
        assert!(levels.is_resource_absent(&bad_key));
        assert!(!levels.is_resource_absent(&good_key));
        assert!(!service.has_pending());

        service.shutdown();
        assert!(!service.add_task(task(&levels, 2, "ok-2")));
    }

    #[tokio::test]
    async fn test_skips_resident_textures() {
        let levels = Arc::new(LevelSet::new(&LevelSetConfig::default()).unwrap());
        let textures: Arc<dyn TextureCache> = Arc::new(MemoryTextureCache::new(16));
        let resident = task(&levels, 3, "ok-3");
        textures.put(resident.key().clone(), Texture::new(1, 1, vec![1, 1, 1, 1], 0));

        let service = RetrievalService::new(
            RetrievalConfig::for_testing(),
            Arc::new(StubRetriever),
            Arc::clone(&textures),
        );
        assert!(service.add_task(resident));

        let events = wait_for_events(&service, 1).await;
        assert!(matches!(events.as_slice(), [RetrievalEvent::Skipped { .. }]));
    }

    struct SlowRetriever;

    #[async_trait]
    impl Retriever for SlowRetriever {
        async fn retrieve(&self, _locator: &str) -> Result<Vec<u8>, RetrievalError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(vec![0, 0, 0, 255])
        }
    }

    #[tokio::test]
    async fn test_capacity_makes_service_full() {
        let levels = Arc::new(LevelSet::new(&LevelSetConfig::default()).unwrap());
        let config = RetrievalConfig {
            queue_capacity: 1,
            ..RetrievalConfig::for_testing()
        };
        let service = RetrievalService::new(
            config,
            Arc::new(SlowRetriever),
            Arc::new(MemoryTextureCache::new(4)),
        );

        assert!(service.add_task(task(&levels, 0, "slow-0")));
        assert!(service.is_full());
        assert!(!service.add_task(task(&levels, 1, "slow-1")));

        let events = wait_for_events(&service, 1).await;
        assert!(matches!(events.as_slice(), [RetrievalEvent::Loaded { bytes: 4, .. }]));
        assert!(!service.is_full());
        assert!(service.add_task(task(&levels, 1, "slow-1")));
    }
}
