//! Append-only vector index with exact, batched top-k search.
//!
//! A [`VectorIndex`] pairs an in-memory [`EntryStore`] with a workspace on a
//! [`Storage`] backend. Ingestion appends to the workspace entry log before
//! touching memory; search runs the extend-and-dot-product kernel over the
//! whole store under a read lock.

pub mod segment;
pub mod store;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::error::{Result, ShrikeError};
use crate::index::segment::Manifest;
use crate::index::store::{Entry, EntryStore, NewEntry};
use crate::search::topk::Scored;
use crate::search::{Match, SearchParams, SearchResults, kernel, topk};
use crate::storage::Storage;

/// Configuration for a vector index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Expected embedding dimension. When `None`, the first indexed batch
    /// establishes the dimension.
    pub dimension: Option<usize>,
}

impl IndexConfig {
    /// Create a configuration with a fixed embedding dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        IndexConfig {
            dimension: Some(dimension),
        }
    }
}

/// Point-in-time statistics about an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of entries in the index.
    pub entry_count: usize,
    /// Embedding dimension, once established.
    pub dimension: Option<usize>,
    /// Approximate in-memory footprint of the entry store in bytes.
    pub memory_bytes: usize,
    /// Size of the on-disk entry log in bytes.
    pub log_bytes: u64,
}

#[derive(Debug)]
struct Inner {
    store: EntryStore,
    manifest: Manifest,
}

/// An exact, append-only vector index over a storage workspace.
///
/// Entries are identified by their insertion position. The index grows only
/// through [`VectorIndex::index`]; there is no update or delete.
#[derive(Debug)]
pub struct VectorIndex {
    /// The storage backend holding the workspace.
    storage: Arc<dyn Storage>,

    /// Index configuration.
    config: IndexConfig,

    /// Entry store and manifest, guarded by a single lock.
    inner: RwLock<Inner>,
}

impl VectorIndex {
    /// Create a new index in the given storage.
    ///
    /// Fails with `InvalidOperation` if the workspace already holds an index.
    pub fn create(storage: Arc<dyn Storage>, config: IndexConfig) -> Result<Self> {
        if storage.file_exists(segment::MANIFEST_FILE) {
            return Err(ShrikeError::invalid_operation(
                "workspace already contains an index",
            ));
        }

        let manifest = Manifest::new(config.dimension);
        segment::write_manifest(storage.as_ref(), &manifest)?;

        let store = match config.dimension {
            Some(dim) => EntryStore::with_dimension(dim),
            None => EntryStore::new(),
        };

        Ok(VectorIndex {
            storage,
            config,
            inner: RwLock::new(Inner { store, manifest }),
        })
    }

    /// Open an existing index from storage, replaying the entry log.
    pub fn open(storage: Arc<dyn Storage>, config: IndexConfig) -> Result<Self> {
        if !storage.file_exists(segment::MANIFEST_FILE) {
            return Err(ShrikeError::index("index does not exist in this workspace"));
        }

        let mut manifest = segment::read_manifest(storage.as_ref())?;
        let replay = segment::replay_log(storage.as_ref())?;

        // Drop any torn tail before accepting new appends; otherwise fresh
        // records would land behind the garbage and be unreadable.
        if storage.file_exists(segment::ENTRY_LOG_FILE)
            && storage.file_size(segment::ENTRY_LOG_FILE)? > replay.valid_bytes
        {
            segment::rewrite_log(storage.as_ref(), &replay.entries)?;
        }

        let mut store = match manifest.dimension.or(config.dimension) {
            Some(dim) => EntryStore::with_dimension(dim),
            None => EntryStore::new(),
        };
        for entry in replay.entries {
            store.push(&entry.embedding, entry.payload)?;
        }

        if let (Some(expected), Some(actual)) = (config.dimension, store.dimension())
            && expected != actual
        {
            return Err(ShrikeError::dimension_mismatch(expected, actual));
        }

        // The log is authoritative; the manifest may lag it after a crash
        // between the log append and the manifest rewrite.
        manifest.entry_count = store.len() as u64;
        manifest.dimension = store.dimension();

        Ok(VectorIndex {
            storage,
            config,
            inner: RwLock::new(Inner { store, manifest }),
        })
    }

    /// Create an index in a directory.
    pub fn create_in_dir<P: AsRef<Path>>(dir: P, config: IndexConfig) -> Result<Self> {
        use crate::storage::file::{FileStorage, FileStorageConfig};

        let storage = Arc::new(FileStorage::new(dir, FileStorageConfig::default())?);
        Self::create(storage, config)
    }

    /// Open an index from a directory.
    pub fn open_dir<P: AsRef<Path>>(dir: P, config: IndexConfig) -> Result<Self> {
        use crate::storage::file::{FileStorage, FileStorageConfig};

        let storage = Arc::new(FileStorage::new(dir, FileStorageConfig::default())?);
        Self::open(storage, config)
    }

    /// The storage backend this index lives on.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.inner.read().store.len()
    }

    /// True when the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedding dimension, once established.
    pub fn dimension(&self) -> Option<usize> {
        self.inner.read().store.dimension()
    }

    /// Append a batch of entries to the index.
    ///
    /// The whole batch is validated first; on any failure nothing is
    /// ingested. Entries are assigned consecutive position ids in input
    /// order, persisted to the entry log as a single buffered write, and
    /// only then added to the in-memory store.
    pub fn index(&self, batch: Vec<NewEntry>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write();

        let mut dimension = inner.store.dimension();
        for entry in &batch {
            entry.embedding.validate()?;
            match dimension {
                Some(dim) => entry.embedding.validate_dimension(dim)?,
                None => dimension = Some(entry.embedding.dimension()),
            }
        }

        let base = inner.store.len() as u64;
        let mut records = Vec::new();
        let mut staged = Vec::with_capacity(batch.len());
        for (offset, new_entry) in batch.into_iter().enumerate() {
            let entry = Entry {
                id: base + offset as u64,
                embedding: new_entry.embedding,
                payload: new_entry.payload,
            };
            segment::encode_entry(&mut records, &entry)?;
            staged.push(entry);
        }

        segment::append_to_log(self.storage.as_ref(), &records)?;

        for entry in staged {
            inner.store.push(&entry.embedding, entry.payload)?;
        }

        inner.manifest.entry_count = inner.store.len() as u64;
        inner.manifest.dimension = inner.store.dimension();
        inner.manifest.modified_at = Utc::now();
        segment::write_manifest(self.storage.as_ref(), &inner.manifest)?;

        Ok(())
    }

    /// Search the index for the nearest entries to each query.
    ///
    /// Returns one match list per query, sorted by ascending cosine distance
    /// with ties broken by insertion order. Searching an empty index yields
    /// empty match lists, not an error.
    pub fn search(&self, queries: &[Embedding], params: &SearchParams) -> Result<SearchResults> {
        let start = Instant::now();
        params.validate()?;

        let inner = self.inner.read();
        let store = &inner.store;

        let mut results = SearchResults::new();

        if queries.is_empty() {
            results.search_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(results);
        }

        if store.is_empty() {
            results.matches = vec![Vec::new(); queries.len()];
            results.search_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            return Ok(results);
        }

        let dim = store
            .dimension()
            .ok_or_else(|| ShrikeError::index("entry store has entries but no dimension"))?;

        for query in queries {
            query.validate()?;
            query.validate_dimension(dim)?;
        }

        let mut query_matrix = Vec::with_capacity(queries.len() * dim);
        for query in queries {
            query_matrix.extend_from_slice(query.as_slice());
        }

        let extended_queries = kernel::extend_queries(&query_matrix, dim);
        let extended_candidates = kernel::extend_candidates(store.vector_data(), dim);
        let grid = kernel::distance_grid(&extended_queries, &extended_candidates);

        let mut matches = Vec::with_capacity(queries.len());
        for row in &grid {
            let ranked = topk::sorted_top_k(row, params.top_k);
            let mut row_matches = Vec::with_capacity(ranked.len());
            for scored in ranked {
                row_matches.push(build_match(store, scored, params.include_embeddings)?);
            }
            matches.push(row_matches);
        }

        results.matches = matches;
        results.candidates_examined = store.len();
        results.search_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(results)
    }

    /// Current statistics for this index.
    pub fn stats(&self) -> Result<IndexStats> {
        let inner = self.inner.read();

        let log_bytes = if self.storage.file_exists(segment::ENTRY_LOG_FILE) {
            self.storage.file_size(segment::ENTRY_LOG_FILE)?
        } else {
            0
        };

        Ok(IndexStats {
            entry_count: inner.store.len(),
            dimension: inner.store.dimension(),
            memory_bytes: inner.store.memory_usage(),
            log_bytes,
        })
    }
}

fn build_match(store: &EntryStore, scored: Scored, include_embedding: bool) -> Result<Match> {
    let payload = store
        .payload(scored.index)
        .ok_or_else(|| ShrikeError::index(format!("missing payload for entry {}", scored.index)))?
        .to_vec();

    let embedding = if include_embedding {
        let data = store
            .vector(scored.index)
            .ok_or_else(|| {
                ShrikeError::index(format!("missing vector for entry {}", scored.index))
            })?
            .to_vec();
        Some(Embedding::new(data))
    } else {
        None
    };

    Ok(Match {
        id: scored.index as u64,
        similarity: 1.0 - scored.distance,
        distance: scored.distance,
        payload,
        embedding,
    })
}
