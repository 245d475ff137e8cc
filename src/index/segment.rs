//! On-disk layout of a workspace: the manifest and the entry log.
//!
//! The entry log is append-only. Each record is framed as
//! `[len: u32][body][crc: u32]` with `len` covering the body plus the
//! checksum, all little-endian. The body carries the entry id, the payload
//! (length-prefixed), and the embedding (dimension-prefixed f32s). Replay
//! stops silently at a truncated trailing record, which is what a crash
//! mid-append leaves behind, but a checksum mismatch on a complete record
//! is corruption and fails the open.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::error::{Result, ShrikeError};
use crate::index::store::Entry;
use crate::storage::Storage;

/// File name of the workspace manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the append-only entry log.
pub const ENTRY_LOG_FILE: &str = "entries.log";

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Workspace metadata, stored as pretty-printed JSON next to the entry log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// On-disk format version.
    pub format_version: u32,
    /// Number of entries the log held at the last successful append.
    pub entry_count: u64,
    /// Embedding dimension, once established.
    pub dimension: Option<usize>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl Manifest {
    /// Create a fresh manifest for a new workspace.
    pub fn new(dimension: Option<usize>) -> Self {
        let now = Utc::now();
        Manifest {
            format_version: FORMAT_VERSION,
            entry_count: 0,
            dimension,
            created_at: now,
            modified_at: now,
        }
    }
}

/// Write the manifest, replacing any previous one.
pub fn write_manifest(storage: &dyn Storage, manifest: &Manifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)?;

    let mut output = storage.create_output(MANIFEST_FILE)?;
    output.write_all(json.as_bytes())?;
    output.close()?;

    Ok(())
}

/// Read the manifest of an existing workspace.
pub fn read_manifest(storage: &dyn Storage) -> Result<Manifest> {
    let input = storage.open_input(MANIFEST_FILE)?;
    let manifest: Manifest = serde_json::from_reader(input)
        .map_err(|e| ShrikeError::index(format!("failed to parse manifest: {e}")))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(ShrikeError::index(format!(
            "unsupported format version {} (supported: {})",
            manifest.format_version, FORMAT_VERSION
        )));
    }

    Ok(manifest)
}

/// Serialize one entry as a framed record appended to `buf`.
pub fn encode_entry(buf: &mut Vec<u8>, entry: &Entry) -> Result<()> {
    let mut body = Vec::with_capacity(16 + entry.payload.len() + entry.embedding.dimension() * 4);

    body.write_u64::<LittleEndian>(entry.id)?;
    body.write_u32::<LittleEndian>(entry.payload.len() as u32)?;
    body.extend_from_slice(&entry.payload);
    body.write_u32::<LittleEndian>(entry.embedding.dimension() as u32)?;
    for &value in entry.embedding.as_slice() {
        body.write_f32::<LittleEndian>(value)?;
    }

    let checksum = crc32fast::hash(&body);

    buf.write_u32::<LittleEndian>((body.len() + 4) as u32)?;
    buf.extend_from_slice(&body);
    buf.write_u32::<LittleEndian>(checksum)?;

    Ok(())
}

/// Append pre-encoded records to the entry log in a single write.
pub fn append_to_log(storage: &dyn Storage, records: &[u8]) -> Result<()> {
    let mut output = storage.create_output_append(ENTRY_LOG_FILE)?;
    output.write_all(records)?;
    output.flush_and_sync()?;
    output.close()?;

    Ok(())
}

/// Result of replaying the entry log.
#[derive(Debug)]
pub struct LogReplay {
    /// Entries recovered in order.
    pub entries: Vec<Entry>,
    /// Byte length of the valid record prefix. Anything past it is a torn
    /// tail left by a crash mid-append.
    pub valid_bytes: u64,
}

/// Replay the entry log, reproducing the stored entry sequence.
///
/// Ids are required to be dense positions in replay order.
pub fn replay_log(storage: &dyn Storage) -> Result<LogReplay> {
    if !storage.file_exists(ENTRY_LOG_FILE) {
        return Ok(LogReplay {
            entries: Vec::new(),
            valid_bytes: 0,
        });
    }

    let mut reader = storage.open_input(ENTRY_LOG_FILE)?;
    let size = reader.size()?;

    let mut entries = Vec::new();
    let mut position: u64 = 0;
    let mut valid_bytes: u64 = 0;

    while position < size {
        if position + 4 > size {
            break; // Incomplete length prefix.
        }
        let len = reader.read_u32::<LittleEndian>()? as u64;
        position += 4;

        if len < 4 || position + len > size {
            break; // Incomplete trailing record.
        }

        let mut frame = vec![0u8; len as usize];
        reader.read_exact(&mut frame)?;
        position += len;

        let entry = decode_entry(&frame, entries.len() as u64)?;
        entries.push(entry);
        valid_bytes = position;
    }

    Ok(LogReplay {
        entries,
        valid_bytes,
    })
}

/// Rewrite the log to exactly the given entries, dropping any torn tail.
///
/// Appending after a torn tail would bury valid records behind garbage, so
/// recovery rewrites the log before the index accepts new entries.
pub fn rewrite_log(storage: &dyn Storage, entries: &[Entry]) -> Result<()> {
    let mut records = Vec::new();
    for entry in entries {
        encode_entry(&mut records, entry)?;
    }

    let mut output = storage.create_output(ENTRY_LOG_FILE)?;
    output.write_all(&records)?;
    output.flush_and_sync()?;
    output.close()?;

    Ok(())
}

fn decode_entry(frame: &[u8], expected_id: u64) -> Result<Entry> {
    let (body, crc_bytes) = frame.split_at(frame.len() - 4);
    let stored = u32::from_le_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(ShrikeError::index(format!(
            "checksum mismatch in entry {expected_id} (stored {stored:#010x}, computed {computed:#010x})"
        )));
    }

    let mut cursor = body;

    let id = cursor.read_u64::<LittleEndian>()?;
    if id != expected_id {
        return Err(ShrikeError::index(format!(
            "entry log out of order: found id {id}, expected {expected_id}"
        )));
    }

    let payload_len = cursor.read_u32::<LittleEndian>()? as usize;
    let mut payload = vec![0u8; payload_len];
    cursor.read_exact(&mut payload)?;

    let dim = cursor.read_u32::<LittleEndian>()? as usize;
    let mut data = Vec::with_capacity(dim);
    for _ in 0..dim {
        data.push(cursor.read_f32::<LittleEndian>()?);
    }

    Ok(Entry {
        id,
        embedding: Embedding::new(data),
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn sample_entry(id: u64) -> Entry {
        Entry {
            id,
            embedding: Embedding::new(vec![id as f32, 1.0, -0.5]),
            payload: format!("payload-{id}").into_bytes(),
        }
    }

    #[test]
    fn test_encode_replay_round_trip() {
        let storage = MemoryStorage::new();

        let mut buf = Vec::new();
        for id in 0..3 {
            encode_entry(&mut buf, &sample_entry(id)).unwrap();
        }
        append_to_log(&storage, &buf).unwrap();

        let replay = replay_log(&storage).unwrap();
        assert_eq!(replay.entries.len(), 3);
        assert_eq!(replay.valid_bytes, buf.len() as u64);
        for (id, entry) in replay.entries.iter().enumerate() {
            assert_eq!(*entry, sample_entry(id as u64));
        }
    }

    #[test]
    fn test_replay_across_appends() {
        let storage = MemoryStorage::new();

        for id in 0..2 {
            let mut buf = Vec::new();
            encode_entry(&mut buf, &sample_entry(id)).unwrap();
            append_to_log(&storage, &buf).unwrap();
        }

        let replay = replay_log(&storage).unwrap();
        assert_eq!(replay.entries.len(), 2);
        assert_eq!(replay.entries[1].id, 1);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let storage = MemoryStorage::new();

        let replay = replay_log(&storage).unwrap();
        assert!(replay.entries.is_empty());
        assert_eq!(replay.valid_bytes, 0);
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let storage = MemoryStorage::new();

        let mut buf = Vec::new();
        encode_entry(&mut buf, &sample_entry(0)).unwrap();
        let complete_len = buf.len();
        encode_entry(&mut buf, &sample_entry(1)).unwrap();

        // Cut the second record short, as a crash mid-append would.
        buf.truncate(complete_len + 7);
        append_to_log(&storage, &buf).unwrap();

        let replay = replay_log(&storage).unwrap();
        assert_eq!(replay.entries.len(), 1);
        assert_eq!(replay.entries[0].id, 0);
        assert_eq!(replay.valid_bytes, complete_len as u64);
    }

    #[test]
    fn test_rewrite_drops_torn_tail() {
        let storage = MemoryStorage::new();

        let mut buf = Vec::new();
        encode_entry(&mut buf, &sample_entry(0)).unwrap();
        encode_entry(&mut buf, &sample_entry(1)).unwrap();
        buf.truncate(buf.len() - 3);
        append_to_log(&storage, &buf).unwrap();

        let replay = replay_log(&storage).unwrap();
        rewrite_log(&storage, &replay.entries).unwrap();
        assert_eq!(
            storage.file_size(ENTRY_LOG_FILE).unwrap(),
            replay.valid_bytes
        );

        // A fresh append after the rewrite replays cleanly.
        let mut next = Vec::new();
        encode_entry(&mut next, &sample_entry(1)).unwrap();
        append_to_log(&storage, &next).unwrap();

        let replay = replay_log(&storage).unwrap();
        assert_eq!(replay.entries.len(), 2);
        assert_eq!(replay.entries[1].id, 1);
    }

    #[test]
    fn test_corrupted_record_fails() {
        let storage = MemoryStorage::new();

        let mut buf = Vec::new();
        encode_entry(&mut buf, &sample_entry(0)).unwrap();

        // Flip a byte inside the body, leaving the framing intact.
        let mid = buf.len() / 2;
        buf[mid] ^= 0xFF;
        append_to_log(&storage, &buf).unwrap();

        let err = replay_log(&storage).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_id_gap_fails() {
        let storage = MemoryStorage::new();

        let mut buf = Vec::new();
        encode_entry(&mut buf, &sample_entry(0)).unwrap();
        encode_entry(&mut buf, &sample_entry(5)).unwrap();
        append_to_log(&storage, &buf).unwrap();

        let err = replay_log(&storage).unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_manifest_round_trip() {
        let storage = MemoryStorage::new();

        let mut manifest = Manifest::new(Some(128));
        manifest.entry_count = 42;
        write_manifest(&storage, &manifest).unwrap();

        let loaded = read_manifest(&storage).unwrap();
        assert_eq!(loaded.format_version, FORMAT_VERSION);
        assert_eq!(loaded.entry_count, 42);
        assert_eq!(loaded.dimension, Some(128));
        assert_eq!(loaded.created_at, manifest.created_at);
    }

    #[test]
    fn test_unsupported_format_version() {
        let storage = MemoryStorage::new();

        let mut manifest = Manifest::new(None);
        manifest.format_version = 99;
        write_manifest(&storage, &manifest).unwrap();

        assert!(read_manifest(&storage).is_err());
    }
}
