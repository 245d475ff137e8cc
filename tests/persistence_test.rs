use std::sync::Arc;

use shrike::embedding::Embedding;
use shrike::error::Result;
use shrike::index::segment;
use shrike::index::store::{Entry, NewEntry};
use shrike::index::{IndexConfig, VectorIndex};
use shrike::search::SearchParams;
use shrike::storage::file::{FileStorage, FileStorageConfig};
use tempfile::TempDir;

fn entry(data: Vec<f32>, payload: &str) -> NewEntry {
    NewEntry::new(Embedding::new(data), payload.as_bytes().to_vec())
}

#[test]
fn test_reopen_preserves_entries_and_order() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    // 1. First session: create and ingest two batches.
    {
        let index = VectorIndex::create_in_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![
            entry(vec![1.0, 0.0, 0.0], "first"),
            entry(vec![0.0, 1.0, 0.0], "second"),
        ])?;
        index.index(vec![entry(vec![0.0, 0.0, 1.0], "third")])?;
    }

    // 2. Second session: replay from disk.
    let index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;
    assert_eq!(index.len(), 3, "all entries should survive a restart");
    assert_eq!(index.dimension(), Some(3));

    let results = index.search(&[Embedding::new(vec![0.0, 1.0, 0.0])], &SearchParams::default())?;
    let top = &results.matches[0][0];
    assert_eq!(top.id, 1, "ids keep their insertion positions");
    assert_eq!(top.payload, b"second");

    Ok(())
}

#[test]
fn test_appends_accumulate_across_sessions() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    {
        let index = VectorIndex::create_in_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![entry(vec![1.0, 0.0], "a")])?;
    }

    {
        let index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![entry(vec![0.0, 1.0], "b")])?;
    }

    let index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;
    assert_eq!(index.len(), 2);

    let results = index.search(
        &[Embedding::new(vec![0.0, 1.0])],
        &SearchParams {
            top_k: 2,
            ..Default::default()
        },
    )?;
    assert_eq!(results.matches[0][0].payload, b"b");
    assert_eq!(results.matches[0][1].payload, b"a");

    Ok(())
}

#[test]
fn test_truncated_tail_is_recovered() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    // 1. Ingest three entries, then cut the log mid-record as a crash would.
    {
        let index = VectorIndex::create_in_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![
            entry(vec![1.0, 0.0], "a"),
            entry(vec![0.0, 1.0], "b"),
            entry(vec![0.5, 0.5], "c"),
        ])?;
    }

    let log_path = temp_dir.path().join("entries.log");
    let full_size = std::fs::metadata(&log_path)?.len();
    let file = std::fs::OpenOptions::new().write(true).open(&log_path)?;
    file.set_len(full_size - 5)?;
    file.sync_all()?;
    drop(file);

    // 2. Reopen: the torn record is dropped, the rest survives.
    {
        let index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;
        assert_eq!(index.len(), 2, "the torn third record should be dropped");

        // 3. New appends after recovery land cleanly after the valid prefix.
        index.index(vec![entry(vec![0.5, 0.5], "c-again")])?;
    }

    // 4. A further restart replays the repaired log without errors.
    let index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;
    assert_eq!(index.len(), 3);

    let results = index.search(
        &[Embedding::new(vec![0.5, 0.5])],
        &SearchParams {
            top_k: 1,
            ..Default::default()
        },
    )?;
    assert_eq!(results.matches[0][0].id, 2);
    assert_eq!(results.matches[0][0].payload, b"c-again");

    Ok(())
}

#[test]
fn test_corrupted_record_fails_open() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    {
        let index = VectorIndex::create_in_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![entry(vec![1.0, 0.0], "a"), entry(vec![0.0, 1.0], "b")])?;
    }

    // Flip one byte inside the first record body, leaving the framing valid.
    let log_path = temp_dir.path().join("entries.log");
    let mut bytes = std::fs::read(&log_path)?;
    bytes[8] ^= 0xFF;
    std::fs::write(&log_path, &bytes)?;

    let err = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default()).unwrap_err();
    assert!(err.to_string().contains("checksum mismatch"));

    Ok(())
}

#[test]
fn test_log_is_authoritative_over_manifest() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    {
        let index = VectorIndex::create_in_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![entry(vec![1.0, 0.0], "a")])?;
    }

    // Simulate a crash after the log append but before the manifest rewrite
    // by appending a record directly.
    {
        let storage = FileStorage::new(temp_dir.path(), FileStorageConfig::default())?;
        let mut records = Vec::new();
        segment::encode_entry(
            &mut records,
            &Entry {
                id: 1,
                embedding: Embedding::new(vec![0.0, 1.0]),
                payload: b"b".to_vec(),
            },
        )?;
        segment::append_to_log(&storage, &records)?;
    }

    let index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;
    assert_eq!(index.len(), 2, "replay counts the log, not the manifest");

    let stats = index.stats()?;
    assert_eq!(stats.entry_count, 2);

    Ok(())
}

#[test]
fn test_buffered_reads_match_mmap() -> Result<()> {
    let temp_dir = TempDir::new().unwrap();

    {
        let index = VectorIndex::create_in_dir(temp_dir.path(), IndexConfig::default())?;
        index.index(vec![
            entry(vec![1.0, 0.0, 0.0], "a"),
            entry(vec![0.0, 1.0, 0.0], "b"),
            entry(vec![0.6, 0.8, 0.0], "c"),
        ])?;
    }

    let mmap_index = VectorIndex::open_dir(temp_dir.path(), IndexConfig::default())?;

    let buffered_config = FileStorageConfig {
        use_mmap: false,
        ..Default::default()
    };
    let buffered_storage = Arc::new(FileStorage::new(temp_dir.path(), buffered_config)?);
    let buffered_index = VectorIndex::open(buffered_storage, IndexConfig::default())?;

    let queries = [Embedding::new(vec![0.7, 0.7, 0.1])];
    let params = SearchParams {
        top_k: 3,
        ..Default::default()
    };

    let via_mmap = mmap_index.search(&queries, &params)?;
    let via_buffered = buffered_index.search(&queries, &params)?;

    let mmap_json = serde_json::to_string(&via_mmap.matches)?;
    let buffered_json = serde_json::to_string(&via_buffered.matches)?;
    assert_eq!(mmap_json, buffered_json);

    Ok(())
}
