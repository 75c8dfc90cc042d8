//! w2v-similar - Word Embedding Similarity Server
//!
//! Serves nearest-neighbor lookups over a word2vec text model: a CSV batch of
//! queries goes in, the most similar vocabulary words for each come out.
//! The model is loaded once per process, on first use.

pub mod error;
pub mod metrics;
pub mod model;
pub mod protocol;
pub mod server;
pub mod vector;

pub use error::{AttributeError, BodyError, LoadError};
pub use metrics::Metrics;
pub use model::{ModelCache, ModelStatus, Predictor, QueryOutcome, DEFAULT_TOPN};
pub use protocol::{PredictionResponse, RankedWord};
pub use server::{Config, Server};
pub use vector::EmbeddingStore;
