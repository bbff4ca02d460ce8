//! Runtime abstraction layer for async operations
//!
//! Retrieval workers are spawned through [`AsyncSpawner`] so the library does
//! not hard-wire an executor. Tokio is used when the `tokio-runtime` feature is
//! on; otherwise each task runs to completion on its own thread.

use crate::prelude::{Future, Pin};

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    /// Spawn a future and return a handle to it
    fn spawn_boxed(
        &self,
        future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
    ) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    /// Check if the task is finished
    fn is_finished(&self) -> bool;

    /// Cancel the task, where the executor supports it
    fn cancel(&self);
}

/// Spawn a future on the global runtime
pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    log::trace!("runtime::spawn");
    runtime().spawn_boxed(Box::pin(future))
}

/// Default spawner implementations
pub mod spawners {
    use super::*;

    #[cfg(feature = "tokio-runtime")]
    pub mod tokio_impl {
        use super::*;
        use ::tokio::task::JoinHandle;

        /// Tokio-based async spawner. Must be used from within a tokio runtime.
        pub struct TokioSpawner;

        impl AsyncSpawner for TokioSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                Box::new(TokioHandle(::tokio::spawn(future)))
            }
        }

        struct TokioHandle(JoinHandle<()>);

        impl AsyncHandle for TokioHandle {
            fn is_finished(&self) -> bool {
                self.0.is_finished()
            }

            fn cancel(&self) {
                self.0.abort();
            }
        }
    }

    pub mod thread_impl {
        use super::*;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        /// Runs every task on a dedicated OS thread with a blocking executor.
        pub struct ThreadSpawner;

        impl AsyncSpawner for ThreadSpawner {
            fn spawn_boxed(
                &self,
                future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>,
            ) -> Box<dyn AsyncHandle> {
                let finished = Arc::new(AtomicBool::new(false));
                let flag = Arc::clone(&finished);
                std::thread::spawn(move || {
                    futures::executor::block_on(future);
                    flag.store(true, Ordering::Release);
                });
                Box::new(ThreadHandle { finished })
            }
        }

        struct ThreadHandle {
            finished: Arc<AtomicBool>,
        }

        impl AsyncHandle for ThreadHandle {
            fn is_finished(&self) -> bool {
                self.finished.load(Ordering::Acquire)
            }

            fn cancel(&self) {
                // Threads run to completion.
            }
        }
    }
}

/// Async helpers shared by the retrieval workers
pub mod async_utils {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Counting semaphore polled with `try_acquire`, bounding concurrent fetches
    #[derive(Debug, Clone)]
    pub struct Semaphore {
        permits: Arc<Mutex<usize>>,
        max_permits: usize,
    }

    impl Semaphore {
        pub fn new(permits: usize) -> Self {
            Self {
                permits: Arc::new(Mutex::new(permits)),
                max_permits: permits,
            }
        }

        pub fn try_acquire(&self) -> bool {
            if let Ok(mut permits) = self.permits.lock() {
                if *permits > 0 {
                    *permits -= 1;
                    return true;
                }
            }
            false
        }

        pub fn release(&self) {
            if let Ok(mut permits) = self.permits.lock() {
                if *permits < self.max_permits {
                    *permits += 1;
                }
            }
        }

        pub fn available_permits(&self) -> usize {
            self.permits.lock().map(|permits| *permits).unwrap_or(0)
        }

        pub fn max_permits(&self) -> usize {
            self.max_permits
        }
    }

    /// Sleep without blocking the tokio executor
    pub async fn async_delay(duration: Duration) {
        #[cfg(feature = "tokio-runtime")]
        {
            tokio::time::sleep(duration).await;
        }

        #[cfg(not(feature = "tokio-runtime"))]
        {
            // Only reached on a dedicated spawner thread.
            std::thread::sleep(duration);
        }
    }

    /// Await `future`, giving up after `duration`. `None` on timeout.
    pub async fn with_timeout<F, T>(duration: Duration, future: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        #[cfg(feature = "tokio-runtime")]
        {
            tokio::time::timeout(duration, future).await.ok()
        }

        #[cfg(not(feature = "tokio-runtime"))]
        {
            let _ = duration;
            Some(future.await)
        }
    }
}

/// Global runtime instance
static RUNTIME: std::sync::OnceLock<Box<dyn AsyncSpawner>> = std::sync::OnceLock::new();

/// Initialize the runtime with a specific spawner. Ignored once a spawner is set.
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) {
    let _ = RUNTIME.set(spawner);
}

/// Get the global runtime spawner
pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| {
            #[cfg(feature = "tokio-runtime")]
            {
                Box::new(spawners::tokio_impl::TokioSpawner)
            }

            #[cfg(not(feature = "tokio-runtime"))]
            {
                Box::new(spawners::thread_impl::ThreadSpawner)
            }
        })
        .as_ref()
}
