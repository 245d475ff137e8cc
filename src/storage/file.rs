//! File-based storage implementation.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::{Mmap, MmapOptions};
use parking_lot::RwLock;

use crate::error::{Result, ShrikeError};
use crate::storage::{Storage, StorageInput, StorageOutput};

/// Configuration for file-based storage.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Whether to serve reads through memory-mapped files.
    pub use_mmap: bool,
    /// Buffer size for I/O operations.
    pub buffer_size: usize,
    /// Whether to flush after every write.
    pub sync_writes: bool,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        FileStorageConfig {
            use_mmap: true,
            buffer_size: 65536,
            sync_writes: false,
        }
    }
}

/// A file-based storage implementation rooted at a directory.
///
/// Reads go through a cache of memory maps when `use_mmap` is enabled;
/// writes always go through buffered file handles. Cached maps are keyed by
/// name and dropped whenever the file is rewritten, appended to, or
/// deleted.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: FileStorageConfig,
    /// Cache of memory-mapped files.
    mmap_cache: Arc<RwLock<HashMap<String, Arc<Mmap>>>>,
}

impl FileStorage {
    /// Create a new file storage in the given directory.
    pub fn new<P: AsRef<Path>>(directory: P, config: FileStorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            std::fs::create_dir_all(&directory)
                .map_err(|e| ShrikeError::storage(format!("failed to create directory: {e}")))?;
        }

        if !directory.is_dir() {
            return Err(ShrikeError::storage(format!(
                "path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage {
            directory,
            config,
            mmap_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// The directory this storage is rooted at.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Get the full path for a file name.
    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    /// Get a memory map for a file, reusing the cached one while the file
    /// size is unchanged. The entry log only ever grows, so a size check is
    /// enough to detect staleness.
    fn get_mmap(&self, name: &str) -> Result<Arc<Mmap>> {
        let path = self.file_path(name);
        let current_size = path
            .metadata()
            .map_err(|e| ShrikeError::storage(format!("failed to stat {name}: {e}")))?
            .len();

        {
            let cache = self.mmap_cache.read();
            if let Some(mmap) = cache.get(name)
                && mmap.len() as u64 == current_size
            {
                return Ok(Arc::clone(mmap));
            }
        }

        let file = File::open(&path)
            .map_err(|e| ShrikeError::storage(format!("failed to open {name}: {e}")))?;

        let mmap = unsafe {
            MmapOptions::new()
                .map(&file)
                .map_err(|e| ShrikeError::storage(format!("failed to mmap {name}: {e}")))?
        };

        let mmap = Arc::new(mmap);
        self.mmap_cache
            .write()
            .insert(name.to_string(), Arc::clone(&mmap));

        Ok(mmap)
    }

    /// Drop any cached map for a file about to change.
    fn invalidate_cache(&self, name: &str) {
        self.mmap_cache.write().remove(name);
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let path = self.file_path(name);

        if !path.exists() {
            return Err(ShrikeError::storage(format!("file not found: {name}")));
        }

        // Zero-length files cannot be mapped.
        if self.config.use_mmap && self.file_size(name)? > 0 {
            let mmap = self.get_mmap(name)?;
            return Ok(Box::new(MmapInput::new(mmap)));
        }

        let file = File::open(&path)
            .map_err(|e| ShrikeError::storage(format!("failed to open {name}: {e}")))?;

        Ok(Box::new(FileInput::new(file, self.config.buffer_size)?))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        self.invalidate_cache(name);

        let path = self.file_path(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| ShrikeError::storage(format!("failed to create {name}: {e}")))?;

        Ok(Box::new(FileOutput::new(
            file,
            self.config.buffer_size,
            self.config.sync_writes,
        )))
    }

    fn create_output_append(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        self.invalidate_cache(name);

        let path = self.file_path(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| ShrikeError::storage(format!("failed to open {name} for append: {e}")))?;

        Ok(Box::new(FileOutput::new(
            file,
            self.config.buffer_size,
            self.config.sync_writes,
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.invalidate_cache(name);

        let path = self.file_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| ShrikeError::storage(format!("failed to delete {name}: {e}")))?;
        }

        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();

        let entries = std::fs::read_dir(&self.directory)
            .map_err(|e| ShrikeError::storage(format!("failed to read directory: {e}")))?;

        for entry in entries {
            let entry = entry
                .map_err(|e| ShrikeError::storage(format!("failed to read directory entry: {e}")))?;
            let path = entry.path();

            if path.is_file()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                files.push(name.to_string());
            }
        }

        files.sort();
        Ok(files)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let path = self.file_path(name);
        let metadata = path
            .metadata()
            .map_err(|e| ShrikeError::storage(format!("failed to stat {name}: {e}")))?;

        Ok(metadata.len())
    }
}

/// A buffered file input.
#[derive(Debug)]
pub struct FileInput {
    reader: BufReader<File>,
    size: u64,
}

impl FileInput {
    fn new(file: File, buffer_size: usize) -> Result<Self> {
        let metadata = file
            .metadata()
            .map_err(|e| ShrikeError::storage(format!("failed to get file metadata: {e}")))?;

        let size = metadata.len();
        let reader = BufReader::with_capacity(buffer_size, file);

        Ok(FileInput { reader, size })
    }
}

impl Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Seek for FileInput {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }
}

impl StorageInput for FileInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn close(&mut self) -> Result<()> {
        // The file closes when the reader is dropped.
        Ok(())
    }
}

/// A memory-mapped input stream.
#[derive(Debug)]
pub struct MmapInput {
    mmap: Arc<Mmap>,
    cursor: Cursor<&'static [u8]>,
}

impl MmapInput {
    fn new(mmap: Arc<Mmap>) -> Self {
        // SAFETY: the Arc keeps the mapping alive for as long as this input.
        let slice: &'static [u8] =
            unsafe { std::slice::from_raw_parts(mmap.as_ptr(), mmap.len()) };

        MmapInput {
            mmap,
            cursor: Cursor::new(slice),
        }
    }
}

impl Read for MmapInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for MmapInput {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

impl StorageInput for MmapInput {
    fn size(&self) -> Result<u64> {
        Ok(self.mmap.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A buffered file output.
#[derive(Debug)]
pub struct FileOutput {
    writer: BufWriter<File>,
    sync_writes: bool,
}

impl FileOutput {
    fn new(file: File, buffer_size: usize, sync_writes: bool) -> Self {
        FileOutput {
            writer: BufWriter::with_capacity(buffer_size, file),
            sync_writes,
        }
    }
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let bytes_written = self.writer.write(buf)?;

        if self.sync_writes {
            self.writer.flush()?;
        }

        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ShrikeError::storage(format!("failed to flush: {e}")))?;

        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| ShrikeError::storage(format!("failed to sync: {e}")))?;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush_and_sync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_storage(use_mmap: bool) -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let config = FileStorageConfig {
            use_mmap,
            ..Default::default()
        };
        let storage = FileStorage::new(temp_dir.path(), config).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_and_read_file() {
        let (_temp_dir, storage) = create_test_storage(false);

        let mut output = storage.create_output("test.bin").unwrap();
        output.write_all(b"Hello, World!").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("test.bin").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();

        assert_eq!(buffer, b"Hello, World!");
        assert_eq!(input.size().unwrap(), 13);
    }

    #[test]
    fn test_mmap_read_path() {
        let (_temp_dir, storage) = create_test_storage(true);

        let mut output = storage.create_output("test.bin").unwrap();
        output.write_all(b"mapped contents").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("test.bin").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();

        assert_eq!(buffer, b"mapped contents");
    }

    #[test]
    fn test_mmap_cache_refreshes_after_append() {
        let (_temp_dir, storage) = create_test_storage(true);

        let mut output = storage.create_output("grow.log").unwrap();
        output.write_all(b"aaaa").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("grow.log").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();
        assert_eq!(buffer, b"aaaa");

        let mut output = storage.create_output_append("grow.log").unwrap();
        output.write_all(b"bbbb").unwrap();
        output.close().unwrap();

        let mut input = storage.open_input("grow.log").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();
        assert_eq!(buffer, b"aaaabbbb");
    }

    #[test]
    fn test_empty_file_read() {
        let (_temp_dir, storage) = create_test_storage(true);

        let mut output = storage.create_output("empty.log").unwrap();
        output.close().unwrap();

        // Falls back to a plain reader since empty files cannot be mapped.
        let mut input = storage.open_input("empty.log").unwrap();
        let mut buffer = Vec::new();
        input.read_to_end(&mut buffer).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_file_operations() {
        let (_temp_dir, storage) = create_test_storage(false);

        assert!(!storage.file_exists("nonexistent.bin"));

        let mut output = storage.create_output("test.bin").unwrap();
        output.write_all(b"Test content").unwrap();
        output.close().unwrap();

        assert!(storage.file_exists("test.bin"));
        assert_eq!(storage.file_size("test.bin").unwrap(), 12);
        assert_eq!(storage.list_files().unwrap(), vec!["test.bin"]);

        storage.delete_file("test.bin").unwrap();
        assert!(!storage.file_exists("test.bin"));
    }

    #[test]
    fn test_append_accumulates() {
        let (_temp_dir, storage) = create_test_storage(false);

        let mut output = storage.create_output_append("log.bin").unwrap();
        output.write_all(b"one").unwrap();
        output.close().unwrap();

        let mut output = storage.create_output_append("log.bin").unwrap();
        output.write_all(b"two").unwrap();
        output.close().unwrap();

        assert_eq!(storage.file_size("log.bin").unwrap(), 6);
    }

    #[test]
    fn test_file_not_found() {
        let (_temp_dir, storage) = create_test_storage(false);

        assert!(storage.open_input("nonexistent.bin").is_err());
        assert!(storage.file_size("nonexistent.bin").is_err());
    }
}
