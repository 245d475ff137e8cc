//! Storage abstraction layer for Shrike.
//!
//! A pluggable facade between the vector index and the bytes it persists.
//! The file backend serves durable workspaces, optionally memory-mapping
//! files for reads; the memory backend serves tests and ephemeral indexes
//! through the same code path.

use std::io::{Read, Seek, Write};

use crate::error::Result;

pub mod file;
pub mod memory;

/// A trait for storage backends that can store and retrieve named files.
///
/// All file names are relative to the storage root; backends decide what a
/// root is (a directory on disk, a map in memory).
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open an existing file for reading.
    ///
    /// # Example
    ///
    /// ```
    /// use shrike::storage::Storage;
    /// use shrike::storage::memory::MemoryStorage;
    /// use std::io::{Read, Write};
    ///
    /// # fn main() -> shrike::error::Result<()> {
    /// let storage = MemoryStorage::new();
    ///
    /// let mut output = storage.create_output("entries.log")?;
    /// output.write_all(b"test data")?;
    /// output.close()?;
    ///
    /// let mut input = storage.open_input("entries.log")?;
    /// let mut buffer = Vec::new();
    /// input.read_to_end(&mut buffer)?;
    /// assert_eq!(buffer, b"test data");
    /// # Ok(())
    /// # }
    /// ```
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create a file for writing, truncating any existing contents.
    ///
    /// # Example
    ///
    /// ```
    /// use shrike::storage::Storage;
    /// use shrike::storage::memory::MemoryStorage;
    /// use std::io::Write;
    ///
    /// # fn main() -> shrike::error::Result<()> {
    /// let storage = MemoryStorage::new();
    ///
    /// let mut output = storage.create_output("manifest.json")?;
    /// output.write_all(b"{}")?;
    /// output.close()?;
    ///
    /// assert!(storage.file_exists("manifest.json"));
    /// # Ok(())
    /// # }
    /// ```
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Open a file for appending, creating it when missing.
    ///
    /// New data lands after the existing contents, which is what the
    /// append-only entry log and the request journal rely on.
    ///
    /// # Example
    ///
    /// ```
    /// use shrike::storage::Storage;
    /// use shrike::storage::memory::MemoryStorage;
    /// use std::io::{Read, Write};
    ///
    /// # fn main() -> shrike::error::Result<()> {
    /// let storage = MemoryStorage::new();
    ///
    /// let mut output = storage.create_output_append("log.txt")?;
    /// output.write_all(b"first\n")?;
    /// output.close()?;
    ///
    /// let mut output = storage.create_output_append("log.txt")?;
    /// output.write_all(b"second\n")?;
    /// output.close()?;
    ///
    /// let mut input = storage.open_input("log.txt")?;
    /// let mut buffer = String::new();
    /// input.read_to_string(&mut buffer)?;
    /// assert_eq!(buffer, "first\nsecond\n");
    /// # Ok(())
    /// # }
    /// ```
    fn create_output_append(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check whether a file exists without opening it.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all file names in the storage, sorted.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Get the size of a file in bytes without opening it.
    fn file_size(&self, name: &str) -> Result<u64>;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Seek + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;

    /// Close the input stream.
    fn close(&mut self) -> Result<()>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffered writes and sync them to the underlying medium.
    ///
    /// After this returns the written data is expected to survive a crash,
    /// as far as the backend can promise that.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Close the output stream, flushing and syncing first.
    fn close(&mut self) -> Result<()>;
}
