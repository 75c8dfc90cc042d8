//! Server Configuration

use std::path::PathBuf;

/// Default location of the word2vec text file inside the serving container
pub const DEFAULT_MODEL_PATH: &str = "/opt/ml/model/vectors.txt";

/// Largest accepted invocation body, matching the hosting platform's 6 MB cap
pub const DEFAULT_MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub bind: String,

    /// Port number
    pub port: u16,

    /// word2vec text file, read on first use
    pub model_path: PathBuf,

    /// Number of runtime worker threads (0 = auto-detect)
    pub workers: usize,

    /// Load the model before accepting requests
    pub preload: bool,

    /// Request body limit in bytes
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8080,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            workers: 0,
            preload: false,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Create a new config with custom port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Create a new config with custom bind address
    pub fn with_bind(mut self, bind: impl Into<String>) -> Self {
        self.bind = bind.into();
        self
    }

    /// Set the model file
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    /// Set the worker thread count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Warm the model cache at startup
    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Set the request body limit
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Listen address as `bind:port`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Worker thread count with auto-detection resolved
    pub fn worker_threads(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}
