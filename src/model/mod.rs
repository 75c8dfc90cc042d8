//! Model Module
//!
//! Lazily loaded embedding model and the nearest-word ranking built on it.

mod cache;
mod predictor;

pub use cache::{ModelCache, ModelStatus};
pub use predictor::{clamp_topn, most_similar, Neighbor, Predictor, QueryOutcome, DEFAULT_TOPN};
