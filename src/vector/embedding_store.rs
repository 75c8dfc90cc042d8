//! Embedding Store
//!
//! Read-only word -> vector table loaded from a word2vec text file.
//!
//! File layout:
//!
//! ```text
//! <vocab_size> <dimension>
//! <word> <v1> <v2> ... <v_dimension>
//! ...
//! ```
//!
//! Vectors are unit-normalised on insert, so ranking reduces to dot products.
//! Words keep the order in which they appear in the file; that order is the
//! tie-break for equal scores.

use super::similarity::{dot_product, normalize_vector};
use crate::error::LoadError;
use hashbrown::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Upper bounds on what an unverified header may reserve up front
const MAX_RESERVED_WORDS: usize = 1 << 16;
const MAX_RESERVED_FLOATS: usize = 1 << 24;

/// Immutable embedding table
#[derive(Debug)]
pub struct EmbeddingStore {
    /// Words in file order
    words: Vec<String>,
    /// Word -> row
    index: HashMap<String, usize>,
    /// Row-major unit vectors, `words.len() * dimension` floats
    vectors: Vec<f32>,
    /// Uniform vector dimension
    dimension: usize,
}

impl EmbeddingStore {
    /// Build a store from in-memory entries.
    ///
    /// Every vector must have `dimension` components and every word must be
    /// unique. Rows are numbered from 1 in error messages.
    pub fn from_entries<I, S>(dimension: usize, entries: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut store = Self::with_capacity(dimension, 0)?;
        for (row, (word, vector)) in entries.into_iter().enumerate() {
            store.push(row + 1, word.into(), vector)?;
        }
        if store.is_empty() {
            return Err(LoadError::EmptyVocabulary);
        }
        Ok(store)
    }

    /// Load a store from a word2vec text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a word2vec text stream.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LoadError> {
        let mut lines = reader.lines();

        let header = lines.next().ok_or(LoadError::MissingHeader)??;
        let (vocab_size, dimension) = parse_header(&header)?;
        if vocab_size == 0 {
            return Err(LoadError::EmptyVocabulary);
        }

        let mut store = Self::with_capacity(dimension, vocab_size)?;

        for (offset, line) in lines.enumerate() {
            let line = line?;
            let line_no = offset + 2;
            let mut tokens = line.split_whitespace();
            let Some(word) = tokens.next() else {
                continue;
            };

            let vector = tokens
                .map(|t| {
                    t.parse::<f32>().map_err(|_| LoadError::MalformedValue {
                        line: line_no,
                        value: t.to_string(),
                    })
                })
                .collect::<Result<Vec<f32>, _>>()?;

            store.push(line_no, word.to_string(), vector)?;
        }

        if store.len() != vocab_size {
            return Err(LoadError::VocabSizeMismatch {
                declared: vocab_size,
                actual: store.len(),
            });
        }

        Ok(store)
    }

    fn with_capacity(dimension: usize, vocab_size: usize) -> Result<Self, LoadError> {
        if dimension == 0 {
            return Err(LoadError::EmptyVocabulary);
        }
        // The header is not trusted until the rows are counted
        let reserved = vocab_size.min(MAX_RESERVED_WORDS);
        Ok(Self {
            words: Vec::with_capacity(reserved),
            index: HashMap::with_capacity(reserved),
            vectors: Vec::with_capacity(reserved.saturating_mul(dimension).min(MAX_RESERVED_FLOATS)),
            dimension,
        })
    }

    fn push(&mut self, line: usize, word: String, mut vector: Vec<f32>) -> Result<(), LoadError> {
        if vector.len() != self.dimension {
            return Err(LoadError::DimensionMismatch {
                line,
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if let Some(bad) = vector.iter().find(|x| !x.is_finite()) {
            return Err(LoadError::MalformedValue {
                line,
                value: bad.to_string(),
            });
        }
        if self.index.contains_key(&word) {
            return Err(LoadError::DuplicateWord { line, word });
        }

        normalize_vector(&mut vector);
        self.index.insert(word.clone(), self.words.len());
        self.words.push(word);
        self.vectors.extend_from_slice(&vector);
        Ok(())
    }

    /// Get embedding dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get number of words
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Check if a word is in the vocabulary
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Row of a word in file order
    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.index.get(word).copied()
    }

    /// Unit vector of a word
    pub fn vector(&self, word: &str) -> Option<&[f32]> {
        self.index_of(word).map(|row| self.row(row))
    }

    fn row(&self, row: usize) -> &[f32] {
        let start = row * self.dimension;
        &self.vectors[start..start + self.dimension]
    }

    /// Words with their unit vectors, in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f32])> {
        self.words
            .iter()
            .zip(self.vectors.chunks_exact(self.dimension))
            .map(|(w, v)| (w.as_str(), v))
    }

    /// Find the `k` words closest to a unit-length `query`.
    ///
    /// Rows listed in `exclude` are skipped. Results are sorted by
    /// descending similarity; equal scores keep file order.
    pub fn find_nearest(&self, query: &[f32], k: usize, exclude: &[usize]) -> Vec<(&str, f32)> {
        debug_assert_eq!(query.len(), self.dimension, "Vector dimensions must match");

        let mut results: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .filter(|(row, _)| !exclude.contains(row))
            .map(|(row, v)| (row, dot_product(query, v).clamp(-1.0, 1.0)))
            .collect();

        // Stable sort keeps file order among ties
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results.truncate(k);

        results
            .into_iter()
            .map(|(row, sim)| (self.words[row].as_str(), sim))
            .collect()
    }
}

fn parse_header(line: &str) -> Result<(usize, usize), LoadError> {
    let malformed = || LoadError::MalformedHeader(line.to_string());
    let mut parts = line.split_whitespace();

    let vocab_size: usize = parts.next().and_then(|t| t.parse().ok()).ok_or_else(malformed)?;
    let dimension = parts.next().and_then(|t| t.parse().ok()).ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }

    // Row-major storage must be addressable
    let floats: usize = vocab_size.checked_mul(dimension).ok_or_else(malformed)?;
    if floats > isize::MAX as usize / std::mem::size_of::<f32>() {
        return Err(malformed());
    }

    Ok((vocab_size, dimension))
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

    #[test]
    fn test_from_reader() {
        let data = "3 2\ncat 1 0\ndog 0.9 0.1\ncar 0 1\n";
        let store = EmbeddingStore::from_reader(data.as_bytes()).unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.dimension(), 2);
        assert!(store.contains("dog"));
        assert!(!store.contains("plane"));
        assert_eq!(store.index_of("car"), Some(2));

        let words: Vec<&str> = store.iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["cat", "dog", "car"]);
    }

    #[test]
    fn test_vectors_are_normalized() {
        let store = EmbeddingStore::from_entries(2, [("a", vec![3.0, 4.0])]).unwrap();
        let v = store.vector("a").unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_missing_header() {
        let err = EmbeddingStore::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader));
    }

    #[test]
    fn test_malformed_header() {
        for header in ["three 2", "3", "3 2 1", "3 x"] {
            let data = format!("{header}\ncat 1 0\n");
            let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
            assert!(matches!(err, LoadError::MalformedHeader(_)), "{header}: {err}");
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let data = "2 2\ncat 1 0\ndog 0.9\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::DimensionMismatch {
                line: 3,
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_malformed_value() {
        let data = "1 2\ncat 1 zero\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MalformedValue { line: 2, .. }));
    }

    #[test]
    fn test_non_finite_values_rejected() {
        for value in ["nan", "inf", "-inf", "NaN"] {
            let data = format!("2 2\ncat 1 0\ndog {value} 0.1\n");
            let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
            assert!(
                matches!(err, LoadError::MalformedValue { line: 3, .. }),
                "{value}: {err}"
            );
        }

        let err = EmbeddingStore::from_entries(2, [("cat", vec![f32::NAN, 0.0])]).unwrap_err();
        assert!(matches!(err, LoadError::MalformedValue { line: 1, .. }));
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        // Declared size is far beyond what the file holds
        let data = "100000000000000000 300\ncat 1 0\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MalformedHeader(_)), "{err}");

        let data = "1 10000000000000000\ncat 1 0\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::DimensionMismatch { line: 2, .. }), "{err}");

        let data = "1000000 2\ncat 1 0\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::VocabSizeMismatch {
                declared: 1_000_000,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_vocab_size_mismatch() {
        let data = "3 2\ncat 1 0\ndog 0.9 0.1\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::VocabSizeMismatch {
                declared: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_duplicate_word() {
        let data = "2 2\ncat 1 0\ncat 0 1\n";
        let err = EmbeddingStore::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateWord { line: 3, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = EmbeddingStore::load("/nonexistent/vectors.txt").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_find_nearest() {
        let store = animals();
        let query = store.vector("cat").unwrap().to_vec();

        let results = store.find_nearest(&query, 2, &[0]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "dog");
        assert!((results[0].1 - 0.9939).abs() < 1e-3);
        assert_eq!(results[1].0, "car");
    }

    #[test]
    fn test_find_nearest_ties_keep_file_order() {
        let store = EmbeddingStore::from_entries(
            2,
            [
                ("q", vec![1.0, 0.0]),
                ("b", vec![0.0, 1.0]),
                ("a", vec![0.0, -1.0]),
                ("c", vec![0.0, 2.0]),
            ],
        )
        .unwrap();
        let query = store.vector("q").unwrap().to_vec();

        let words: Vec<&str> = store
            .find_nearest(&query, 3, &[0])
            .into_iter()
            .map(|(w, _)| w)
            .collect();
        assert_eq!(words, vec!["b", "a", "c"]);
    }
}
