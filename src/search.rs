//! Search parameters, matches, and the distance/selection machinery.

pub mod kernel;
pub mod topk;

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::error::{Result, ShrikeError};

/// Parameters controlling a batch search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    /// Number of nearest entries to return per query.
    pub top_k: usize,
    /// Whether to include stored embeddings in the matches.
    pub include_embeddings: bool,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 5,
            include_embeddings: false,
        }
    }
}

impl SearchParams {
    /// Check that these parameters describe a meaningful search.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(ShrikeError::InvalidTopK(self.top_k));
        }
        Ok(())
    }
}

/// A single matched entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// Position id of the matched entry.
    pub id: u64,
    /// Cosine similarity (higher is more similar).
    pub similarity: f32,
    /// Cosine distance (lower is more similar).
    pub distance: f32,
    /// Payload stored with the entry.
    pub payload: Vec<u8>,
    /// Stored embedding, included when the search asks for it.
    pub embedding: Option<Embedding>,
}

/// Ranked matches for a batch of queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    /// One ranked match list per query, in query order.
    pub matches: Vec<Vec<Match>>,
    /// Number of stored entries examined for each query.
    pub candidates_examined: usize,
    /// Search execution time in milliseconds.
    pub search_time_ms: f64,
}

impl SearchResults {
    /// Create new empty search results.
    pub fn new() -> Self {
        Self {
            matches: Vec::new(),
            candidates_examined: 0,
            search_time_ms: 0.0,
        }
    }

    /// Check whether no query produced any match.
    pub fn is_empty(&self) -> bool {
        self.matches.iter().all(|m| m.is_empty())
    }
}

impl Default for SearchResults {
    fn default() -> Self {
        Self::new()
    }
}
