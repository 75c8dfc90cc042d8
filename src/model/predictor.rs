//! Similarity Engine
//!
//! Ranks vocabulary words against whitespace-tokenised queries.

use super::cache::ModelCache;
use crate::error::LoadError;
use crate::vector::{unit_mean, EmbeddingStore};
use std::sync::Arc;
use tracing::debug;

/// Number of neighbors returned when the caller gives no usable value
pub const DEFAULT_TOPN: usize = 5;

/// A ranked vocabulary word
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub word: String,
    /// Cosine similarity in [-1, 1]
    pub similarity: f32,
}

/// Result of ranking one query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Neighbors by descending similarity, at most topn of them
    Found(Vec<Neighbor>),
    /// Query tokens absent from the vocabulary (empty for a blank query)
    NotFound { missing: Vec<String> },
}

impl QueryOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, QueryOutcome::Found(_))
    }
}

/// Turn a requested ranking size into a usable one.
///
/// Anything below 1, and no value at all, becomes [`DEFAULT_TOPN`].
pub fn clamp_topn(requested: Option<i64>) -> usize {
    match requested {
        Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
        _ => DEFAULT_TOPN,
    }
}

/// Rank the words closest to the mean of the query's token vectors.
///
/// Query tokens themselves are never returned. A single unknown token turns
/// the whole query into [`QueryOutcome::NotFound`].
pub fn most_similar(store: &EmbeddingStore, query: &str, topn: usize) -> QueryOutcome {
    let tokens: Vec<&str> = query.split_whitespace().collect();

    let missing: Vec<String> = tokens
        .iter()
        .filter(|t| !store.contains(t))
        .map(|t| t.to_string())
        .collect();
    if tokens.is_empty() || !missing.is_empty() {
        return QueryOutcome::NotFound { missing };
    }

    let Some(reference) = unit_mean(
        tokens.iter().filter_map(|t| store.vector(t)),
        store.dimension(),
    ) else {
        return QueryOutcome::NotFound { missing };
    };

    let mut rows: Vec<usize> = tokens.iter().filter_map(|t| store.index_of(t)).collect();

    rows.sort_unstable();
    rows.dedup();

    let neighbors = store
        .find_nearest(&reference, topn, &rows)
        .into_iter()
        .map(|(word, similarity)| Neighbor {
            word: word.to_string(),
            similarity,
        })
        .collect();

    QueryOutcome::Found(neighbors)
}

/// Batch prediction over the cached model
#[derive(Debug, Clone)]
pub struct Predictor {
    cache: Arc<ModelCache>,
}

impl Predictor {
    pub fn new(cache: Arc<ModelCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ModelCache> {
        &self.cache
    }

    /// One outcome per query, in input order.
    ///
    /// Fails only when the model itself cannot be loaded; vocabulary misses
    /// stay local to their query.
    pub fn predict<S: AsRef<str>>(
        &self,
        queries: &[S],
        topn: usize,
    ) -> Result<Vec<QueryOutcome>, LoadError> {
        let store = self.cache.get_model()?;
        let topn = topn.max(1);

        let outcomes = queries
            .iter()
            .map(|query| {
                let query = query.as_ref();
                let outcome = most_similar(&store, query, topn);
                if let QueryOutcome::NotFound { missing } = &outcome {
                    debug!(query, ?missing, "Query not in vocabulary");
                }
                outcome
            })
            .collect();

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animals() -> EmbeddingStore {
        EmbeddingStore::from_entries(
            2,
            [
                ("cat", vec![1.0, 0.0]),
                ("dog", vec![0.9, 0.1]),
                ("car", vec![0.0, 1.0]),
            ],
        )
        .unwrap()
    }

    fn words(outcome: &QueryOutcome) -> Vec<&str> {
        match outcome {
            QueryOutcome::Found(n) => n.iter().map(|n| n.word.as_str()).collect(),
            QueryOutcome::NotFound { .. } => panic!("expected neighbors"),
        }
    }

    #[test]
    fn test_cat_nearest_is_dog() {
        let store = animals();
        let outcome = most_similar(&store, "cat", 1);

        let QueryOutcome::Found(neighbors) = outcome else {
            panic!("expected neighbors");
        };
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].word, "dog");
        assert!((neighbors[0].similarity - 0.9939).abs() < 1e-3);
    }

    #[test]
    fn test_query_words_are_excluded() {
        let store = animals();
        let outcome = most_similar(&store, "cat dog", 5);
        assert_eq!(words(&outcome), vec!["car"]);
    }

    #[test]
    fn test_repeated_token() {
        let store = animals();
        let outcome = most_similar(&store, "cat cat", 5);
        assert_eq!(words(&outcome), vec!["dog", "car"]);
    }

    #[test]
    fn test_unknown_token() {
        let store = animals();
        let outcome = most_similar(&store, "cat plane", 5);
        assert_eq!(
            outcome,
            QueryOutcome::NotFound {
                missing: vec!["plane".to_string()]
            }
        );
    }

    #[test]
    fn test_blank_query() {
        let store = animals();
        assert_eq!(
            most_similar(&store, "   ", 5),
            QueryOutcome::NotFound { missing: vec![] }
        );
    }

    #[test]
    fn test_scores_non_increasing() {
        let store = EmbeddingStore::from_entries(
            3,
            [
                ("a", vec![1.0, 0.2, 0.0]),
                ("b", vec![0.3, 1.0, 0.1]),
                ("c", vec![0.9, 0.5, 0.2]),
                ("d", vec![-1.0, 0.1, 0.4]),
                ("e", vec![0.2, 0.2, 1.0]),
            ],
        )
        .unwrap();

        let QueryOutcome::Found(neighbors) = most_similar(&store, "a", 3) else {
            panic!("expected neighbors");
        };
        assert_eq!(neighbors.len(), 3);
        assert!(neighbors
            .windows(2)
            .all(|w| w[0].similarity >= w[1].similarity));
        assert!(neighbors.iter().all(|n| n.similarity.abs() <= 1.0));
    }

    #[test]
    fn test_clamp_topn() {
        assert_eq!(clamp_topn(None), DEFAULT_TOPN);
        assert_eq!(clamp_topn(Some(0)), DEFAULT_TOPN);
        assert_eq!(clamp_topn(Some(-3)), DEFAULT_TOPN);
        assert_eq!(clamp_topn(Some(1)), 1);
        assert_eq!(clamp_topn(Some(10)), 10);
    }

    #[test]
    fn test_predict_isolates_misses() {
        let cache = Arc::new(ModelCache::from_loader("memory", || Ok(animals())));
        let predictor = Predictor::new(cache);

        let outcomes = predictor.predict(&["cat", "cat plane", "car"][..], 1).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(words(&outcomes[0]), vec!["dog"]);
        assert!(!outcomes[1].is_found());
        assert_eq!(words(&outcomes[2]), vec!["dog"]);
    }

    #[test]
    fn test_predict_load_failure() {
        let cache = Arc::new(ModelCache::from_loader("broken", || {
            Err(LoadError::EmptyVocabulary)
        }));
        let predictor = Predictor::new(cache);
        assert!(predictor.predict(&["cat"][..], 5).is_err());
    }
}
