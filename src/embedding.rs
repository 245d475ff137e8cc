//! Core embedding data structure.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShrikeError};
use crate::util::simd;

/// A dense embedding for similarity search.
///
/// Serializes as a bare JSON array so it can be read from and written to
/// JSONL interchange files directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    /// The embedding components as floating point values.
    pub data: Vec<f32>,
}

impl Embedding {
    /// Create a new embedding with the given components.
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimensionality of this embedding.
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Borrow the components as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Calculate the L2 norm (magnitude) of this embedding.
    pub fn norm(&self) -> f32 {
        simd::squared_norm_simd(&self.data).sqrt()
    }

    /// Normalize this embedding to unit length.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.data {
                *value /= norm;
            }
        }
    }

    /// Get a normalized copy of this embedding.
    pub fn normalized(&self) -> Self {
        let mut normalized = self.clone();
        normalized.normalize();
        normalized
    }

    /// Check if this embedding contains only finite values.
    pub fn is_valid(&self) -> bool {
        self.data.iter().all(|x| x.is_finite())
    }

    /// Validate that this embedding has the expected dimension.
    pub fn validate_dimension(&self, expected_dim: usize) -> Result<()> {
        if self.data.len() != expected_dim {
            return Err(ShrikeError::dimension_mismatch(
                expected_dim,
                self.data.len(),
            ));
        }
        Ok(())
    }

    /// Validate that this embedding can participate in cosine search.
    ///
    /// Rejects NaN and infinite components as well as the zero vector,
    /// which has no direction to normalize.
    pub fn validate(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(ShrikeError::invalid_embedding(
                "embedding contains NaN or infinite components",
            ));
        }
        if self.norm() == 0.0 {
            return Err(ShrikeError::invalid_embedding(
                "zero-norm embedding has no direction",
            ));
        }
        Ok(())
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(data: Vec<f32>) -> Self {
        Embedding::new(data)
    }
}
