//! Model Cache
//!
//! Process-wide, load-once holder for the [`EmbeddingStore`].
//!
//! The ready store lives in a [`OnceLock`], so readers never take a lock once
//! it is published. The first callers race on a mutex; the winner loads, the
//! rest re-check the slot after acquiring it and reuse the winner's store.
//! A failed load publishes nothing: the error is remembered for status
//! reporting and the next caller tries again.

use crate::error::LoadError;
use crate::vector::EmbeddingStore;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{error, info};

/// Loader function type
pub type LoadFn = Box<dyn Fn() -> Result<EmbeddingStore, LoadError> + Send + Sync>;

/// Observable state of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelStatus {
    /// No load attempted yet
    Unloaded,
    /// Store is published
    Ready,
    /// Most recent load failed
    Failed(String),
}

impl std::fmt::Display for ModelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelStatus::Unloaded => write!(f, "unloaded"),
            ModelStatus::Ready => write!(f, "ready"),
            ModelStatus::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Lazy, at-most-once embedding store initialisation
pub struct ModelCache {
    /// Human-readable origin of the model, for logs
    source: String,
    loader: LoadFn,
    store: OnceLock<Arc<EmbeddingStore>>,
    /// Serialises initialisation; holds the last load error
    init: Mutex<Option<String>>,
    loads: AtomicUsize,
}

impl ModelCache {
    /// Cache backed by a word2vec text file
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path: PathBuf = path.as_ref().to_path_buf();
        let source = path.display().to_string();
        Self::from_loader(source, move || EmbeddingStore::load(&path))
    }

    /// Cache backed by an arbitrary loader
    pub fn from_loader<F>(source: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Result<EmbeddingStore, LoadError> + Send + Sync + 'static,
    {
        Self {
            source: source.into(),
            loader: Box::new(loader),
            store: OnceLock::new(),
            init: Mutex::new(None),
            loads: AtomicUsize::new(0),
        }
    }

    /// Shared handle to the store, loading it on first use.
    ///
    /// Blocks while another caller is loading.
    pub fn get_model(&self) -> Result<Arc<EmbeddingStore>, LoadError> {
        if let Some(store) = self.store.get() {
            return Ok(Arc::clone(store));
        }

        let mut last_error = self.init.lock();

        // Another caller may have finished while we waited
        if let Some(store) = self.store.get() {
            return Ok(Arc::clone(store));
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        info!(source = %self.source, "Loading embedding model");
        let start = Instant::now();

        match (self.loader)() {
            Ok(store) => {
                info!(
                    words = store.len(),
                    dimension = store.dimension(),
                    elapsed = ?start.elapsed(),
                    "Embedding model loaded"
                );
                let store = Arc::new(store);
                let published = Arc::clone(self.store.get_or_init(|| store));
                *last_error = None;
                Ok(published)
            }
            Err(e) => {
                error!(source = %self.source, error = %e, "Failed to load embedding model");
                *last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Store if already loaded, without triggering a load
    pub fn loaded(&self) -> Option<Arc<EmbeddingStore>> {
        self.store.get().cloned()
    }

    /// Current state
    pub fn status(&self) -> ModelStatus {
        if self.store.get().is_some() {
            return ModelStatus::Ready;
        }
        match self.init.lock().as_ref() {
            Some(reason) => ModelStatus::Failed(reason.clone()),
            None => ModelStatus::Unloaded,
        }
    }

    /// Number of load attempts so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Where the model is loaded from
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for ModelCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCache")
            .field("source", &self.source)
            .field("loaded", &self.store.get().is_some())
            .field("loads", &self.load_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn tiny_store() -> Result<EmbeddingStore, LoadError> {
        EmbeddingStore::from_entries(2, [("a", vec![1.0, 0.0]), ("b", vec![0.0, 1.0])])
    }

    #[test]
    fn test_loads_once() {
        let cache = ModelCache::from_loader("memory", tiny_store);
        assert_eq!(cache.status(), ModelStatus::Unloaded);
        assert!(cache.loaded().is_none());

        let first = cache.get_model().unwrap();
        let second = cache.get_model().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.load_count(), 1);
        assert_eq!(cache.status(), ModelStatus::Ready);
    }

    #[test]
    fn test_failed_load_is_retried() {
        let healthy = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&healthy);
        let cache = ModelCache::from_loader("flaky", move || {
            if flag.load(Ordering::SeqCst) {
                tiny_store()
            } else {
                Err(LoadError::MissingHeader)
            }
        });

        assert!(matches!(cache.get_model(), Err(LoadError::MissingHeader)));
        assert!(matches!(cache.status(), ModelStatus::Failed(_)));

        healthy.store(true, Ordering::SeqCst);
        assert!(cache.get_model().is_ok());
        assert_eq!(cache.status(), ModelStatus::Ready);
        assert_eq!(cache.load_count(), 2);
    }

    #[test]
    fn test_missing_file() {
        let cache = ModelCache::new("/nonexistent/vectors.txt");
        assert!(matches!(cache.get_model(), Err(LoadError::Io { .. })));
        assert_eq!(cache.source(), "/nonexistent/vectors.txt");
    }
}
