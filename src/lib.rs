//! # Shrike
//!
//! An exact batch vector similarity search library for Rust.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Exact top-k cosine search over an append-only index
//! - Whole query batches scored in one distance pass
//! - SIMD distance kernels with parallel candidate scoring
//! - Pluggable storage backends with a durable entry log
//! - Workspace request journaling and retrieval evaluation
//!
//! ## Example
//!
//! ```
//! use shrike::embedding::Embedding;
//! use shrike::index::store::NewEntry;
//! use shrike::index::{IndexConfig, VectorIndex};
//! use shrike::search::SearchParams;
//! use shrike::storage::memory::MemoryStorage;
//! use std::sync::Arc;
//!
//! # fn main() -> shrike::error::Result<()> {
//! let index = VectorIndex::create(Arc::new(MemoryStorage::new()), IndexConfig::default())?;
//!
//! index.index(vec![
//!     NewEntry::new(Embedding::new(vec![1.0, 0.0]), b"x-axis".to_vec()),
//!     NewEntry::new(Embedding::new(vec![0.0, 1.0]), b"y-axis".to_vec()),
//! ])?;
//!
//! let results = index.search(
//!     &[Embedding::new(vec![0.9, 0.1])],
//!     &SearchParams::default(),
//! )?;
//! assert_eq!(results.matches[0][0].payload, b"x-axis");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod embedding;
pub mod error;
pub mod eval;
pub mod index;
pub mod journal;
pub mod search;
pub mod storage;
pub mod util;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
