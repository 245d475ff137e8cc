//! In-memory entry storage.

use crate::embedding::Embedding;
use crate::error::Result;

/// One stored record: position id, embedding, opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The entry's insertion position, assigned by the index.
    pub id: u64,
    /// The stored embedding.
    pub embedding: Embedding,
    /// Opaque bytes carried through to matches, never interpreted.
    pub payload: Vec<u8>,
}

/// An entry awaiting ingestion; the index assigns its id on append.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// The embedding to store.
    pub embedding: Embedding,
    /// Opaque payload to carry alongside it.
    pub payload: Vec<u8>,
}

impl NewEntry {
    /// Create a new entry from an embedding and payload.
    pub fn new(embedding: Embedding, payload: Vec<u8>) -> Self {
        Self { embedding, payload }
    }
}

/// Append-only in-memory store of entries with one shared dimension.
///
/// Embeddings are kept flattened row-major so the whole candidate side of a
/// search is a single contiguous slice. The dimension is pinned by the
/// first appended entry and every later append must match it.
#[derive(Debug, Default)]
pub struct EntryStore {
    /// Flattened row-major embedding data, entry `i` at offset `i * dim`.
    vectors: Vec<f32>,
    /// Payload bytes per entry, indexed by position.
    payloads: Vec<Vec<u8>>,
    /// Embedding dimension, fixed once the first entry arrives.
    dimension: Option<usize>,
}

impl EntryStore {
    /// Create an empty store with no pinned dimension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store pinned to the given dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        EntryStore {
            vectors: Vec::new(),
            payloads: Vec::new(),
            dimension: Some(dimension),
        }
    }

    /// Number of entries stored.
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Check whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// The pinned embedding dimension, if any entry (or configuration) has
    /// established one.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// The flattened row-major embedding data of all entries.
    pub fn vector_data(&self) -> &[f32] {
        &self.vectors
    }

    /// The embedding components of one entry.
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        let dim = self.dimension?;
        if index >= self.len() {
            return None;
        }
        Some(&self.vectors[index * dim..(index + 1) * dim])
    }

    /// The payload of one entry.
    pub fn payload(&self, index: usize) -> Option<&[u8]> {
        self.payloads.get(index).map(|p| p.as_slice())
    }

    /// Append an entry and return its assigned position id.
    ///
    /// The first append on an unpinned store establishes the dimension.
    pub fn push(&mut self, embedding: &Embedding, payload: Vec<u8>) -> Result<u64> {
        match self.dimension {
            Some(dim) => embedding.validate_dimension(dim)?,
            None => self.dimension = Some(embedding.dimension()),
        }

        let id = self.payloads.len() as u64;
        self.vectors.extend_from_slice(embedding.as_slice());
        self.payloads.push(payload);
        Ok(id)
    }

    /// Approximate memory held by the stored entries, in bytes.
    pub fn memory_usage(&self) -> usize {
        let vector_bytes = self.vectors.len() * std::mem::size_of::<f32>();
        let payload_bytes: usize = self.payloads.iter().map(|p| p.len()).sum();
        vector_bytes + payload_bytes
    }
}
