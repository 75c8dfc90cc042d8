//! Vector Module
//!
//! Word embedding storage and similarity math.

mod embedding_store;
mod similarity;

pub use embedding_store::EmbeddingStore;
pub use similarity::unit_mean;
