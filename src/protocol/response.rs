//! Response Formatting
//!
//! JSON reply of an invocation:
//!
//! ```json
//! {"results": [[{"word": "dog", "similarity": "0.99"}], [{"word": "", "similarity": "0.00"}]]}
//! ```

use crate::model::QueryOutcome;
use serde::{Deserialize, Serialize};

/// One ranked word on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedWord {
    pub word: String,
    /// Similarity with two decimals
    pub similarity: String,
}

impl RankedWord {
    pub fn new(word: impl Into<String>, similarity: f32) -> Self {
        Self {
            word: word.into(),
            similarity: format_similarity(similarity),
        }
    }

    /// Placeholder for a query that could not be resolved
    pub fn sentinel() -> Self {
        Self::new("", 0.0)
    }

    pub fn is_sentinel(&self) -> bool {
        self.word.is_empty()
    }
}

/// Body of a successful invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub results: Vec<Vec<RankedWord>>,
}

impl PredictionResponse {
    /// One result group per outcome, in order. Misses become a lone sentinel.
    pub fn from_outcomes(outcomes: &[QueryOutcome]) -> Self {
        let results = outcomes
            .iter()
            .map(|outcome| match outcome {
                QueryOutcome::Found(neighbors) => neighbors
                    .iter()
                    .map(|n| RankedWord::new(n.word.as_str(), n.similarity))
                    .collect(),
                QueryOutcome::NotFound { .. } => vec![RankedWord::sentinel()],
            })
            .collect();

        Self { results }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Two-decimal rendering, ties to even; negative zero prints as `0.00`.
pub fn format_similarity(similarity: f32) -> String {
    let text = format!("{:.2}", f64::from(similarity));
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}
