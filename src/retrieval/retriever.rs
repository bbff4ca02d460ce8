use super::RetrievalError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::time::Duration;

/// Shared async HTTP client for tile fetching
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("globetile/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(16)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
});

/// Fetches the raw payload behind a resource locator.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, RetrievalError>;
}

/// Reads tiles from the local file system.
#[derive(Debug, Clone, Default)]
pub struct FileRetriever {
    root: Option<PathBuf>,
}

impl FileRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative locators against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, locator: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(locator),
            None => PathBuf::from(locator),
        }
    }
}

fn classify_io_error(locator: &str, error: std::io::Error) -> RetrievalError {
    match error.kind() {
        std::io::ErrorKind::NotFound => RetrievalError::NotFound(locator.to_string()),
        _ => RetrievalError::Network(format!("{}: {}", locator, error)),
    }
}

#[async_trait]
impl Retriever for FileRetriever {
    async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, RetrievalError> {
        let path = self.resolve(locator);

        #[cfg(feature = "tokio-runtime")]
        let data = tokio::fs::read(&path).await;

        #[cfg(not(feature = "tokio-runtime"))]
        let data = std::fs::read(&path);

        data.map_err(|e| classify_io_error(locator, e))
    }
}

/// Downloads tiles over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    timeout: Duration,
}

impl HttpRetriever {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for HttpRetriever {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, locator: &str) -> Result<Vec<u8>, RetrievalError> {
        let response = HTTP_CLIENT
            .get(locator)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            return Err(RetrievalError::NotFound(locator.to_string()));
        }
        if !status.is_success() {
            return Err(RetrievalError::Network(format!("HTTP {} for {}", status, locator)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RetrievalError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(all(test, feature = "tokio-runtime"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_retriever_reads_and_classifies() {
        let dir = std::env::temp_dir().join(format!("globetile-retriever-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("earth/0/1")).unwrap();
        std::fs::write(dir.join("earth/0/1/1_2.raw"), [1u8, 2, 3]).unwrap();

        let retriever = FileRetriever::with_root(&dir);
        assert_eq!(retriever.retrieve("earth/0/1/1_2.raw").await.unwrap(), vec![1, 2, 3]);

        let missing = retriever.retrieve("earth/0/1/1_3.raw").await.unwrap_err();
        assert!(matches!(missing, RetrievalError::NotFound(_)));
        assert!(!missing.is_transient());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
