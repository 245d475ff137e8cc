//! Command implementations for the Shrike CLI.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::embedding::Embedding;
use crate::error::{Result, ShrikeError};
use crate::eval::{EvalReport, top1_accuracy};
use crate::index::store::NewEntry;
use crate::index::{IndexConfig, VectorIndex, segment};
use crate::journal::{self, RequestJournal};
use crate::search::{Match, SearchParams};
use crate::storage::Storage;
use crate::storage::file::{FileStorage, FileStorageConfig};

/// One JSONL line of an entry file.
#[derive(Debug, Deserialize)]
struct EntryRecord {
    embedding: Vec<f32>,
    payload: String,
}

/// One JSONL line of a query file. The label is only used by `evaluate`.
#[derive(Debug, Deserialize)]
struct QueryRecord {
    embedding: Vec<f32>,
    label: Option<String>,
}

/// Execute a CLI command.
pub fn execute_command(args: ShrikeArgs) -> Result<()> {
    match &args.command {
        Command::Create(create_args) => create_workspace(create_args.clone(), &args),
        Command::Add(add_args) => add_entries(add_args.clone(), &args),
        Command::Search(search_args) => search_workspace(search_args.clone(), &args),
        Command::Stats(stats_args) => show_stats(stats_args.clone(), &args),
        Command::Evaluate(evaluate_args) => evaluate_workspace(evaluate_args.clone(), &args),
    }
}

fn workspace_storage(workspace: &Path) -> Result<Arc<FileStorage>> {
    Ok(Arc::new(FileStorage::new(
        workspace,
        FileStorageConfig::default(),
    )?))
}

/// Create a new workspace.
fn create_workspace(args: CreateArgs, cli_args: &ShrikeArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Creating workspace at: {}", args.workspace.display());
    }

    let storage = workspace_storage(&args.workspace)?;

    if storage.file_exists(segment::MANIFEST_FILE) {
        if !args.force {
            return Err(ShrikeError::invalid_operation(
                "Workspace already contains an index. Use --force to overwrite.",
            ));
        }
        for file in [
            segment::MANIFEST_FILE,
            segment::ENTRY_LOG_FILE,
            journal::JOURNAL_FILE,
        ] {
            storage.delete_file(file)?;
        }
    }

    let config = IndexConfig {
        dimension: args.dimension,
    };
    let index = VectorIndex::create(storage, config)?;

    output_result(
        "Workspace created successfully",
        &CreateReport {
            path: args.workspace.to_string_lossy().to_string(),
            dimension: index.dimension(),
        },
        cli_args,
    )?;

    Ok(())
}

/// Add entries from a JSONL file to a workspace.
fn add_entries(args: AddArgs, cli_args: &ShrikeArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Adding entries from: {}", args.entry_file.display());
        println!("To workspace: {}", args.workspace.display());
    }

    if args.batch_size == 0 {
        return Err(ShrikeError::invalid_operation("batch size must be at least 1"));
    }

    let storage = workspace_storage(&args.workspace)?;
    let index = VectorIndex::open(storage.clone(), IndexConfig::default())?;
    let journal = RequestJournal::new(storage, journal::DEFAULT_LOG_ENTRIES)?;

    let start_time = Instant::now();
    let mut entries_added = 0;

    let file = File::open(&args.entry_file)?;
    let reader = BufReader::new(file);

    let mut batch = Vec::with_capacity(args.batch_size);
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<EntryRecord>(&line) {
            Ok(record) => {
                batch.push(NewEntry::new(
                    Embedding::new(record.embedding),
                    record.payload.into_bytes(),
                ));
            }
            Err(e) => {
                if cli_args.verbosity() > 0 {
                    eprintln!("Error parsing entry on line {}: {}", line_num + 1, e);
                }
                continue;
            }
        }

        if batch.len() == args.batch_size {
            entries_added += flush_batch(&index, &journal, &mut batch, args.log_entries)?;
            if cli_args.verbosity() > 1 {
                println!("Processed {entries_added} entries...");
            }
        }
    }
    entries_added += flush_batch(&index, &journal, &mut batch, args.log_entries)?;

    let duration = start_time.elapsed();

    output_result(
        "Entries added successfully",
        &AddReport {
            entries_added,
            duration_ms: duration.as_millis() as u64,
            entries_per_second: if duration.as_secs_f64() > 0.0 {
                entries_added as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
        },
        cli_args,
    )?;

    Ok(())
}

/// Ingest one buffered batch and journal it.
fn flush_batch(
    index: &VectorIndex,
    journal: &RequestJournal,
    batch: &mut Vec<NewEntry>,
    log_entries: Option<usize>,
) -> Result<usize> {
    if batch.is_empty() {
        return Ok(0);
    }

    let base = index.len() as u64;
    let details: Vec<String> = batch
        .iter()
        .enumerate()
        .map(|(offset, entry)| {
            let payload = String::from_utf8_lossy(&entry.payload);
            format!("adding entry {}. payload = {payload}", base + offset as u64)
        })
        .collect();

    let count = batch.len();
    index.index(std::mem::take(batch))?;
    journal.record("add", &details, log_entries)?;

    Ok(count)
}

/// Search a workspace.
fn search_workspace(args: SearchArgs, cli_args: &ShrikeArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Searching workspace: {}", args.workspace.display());
        println!("Top-k: {}", args.top_k);
    }

    let storage = workspace_storage(&args.workspace)?;
    let index = VectorIndex::open(storage.clone(), IndexConfig::default())?;
    let journal = RequestJournal::new(storage, journal::DEFAULT_LOG_ENTRIES)?;

    let queries = if let Some(vector) = &args.vector {
        vec![Embedding::new(parse_vector(vector)?)]
    } else if let Some(query_file) = &args.query_file {
        read_query_file(query_file)?
            .into_iter()
            .map(|record| Embedding::new(record.embedding))
            .collect()
    } else {
        return Err(ShrikeError::invalid_operation(
            "provide a query with --vector or --query-file",
        ));
    };

    let params = SearchParams {
        top_k: args.top_k,
        include_embeddings: args.include_embeddings,
    };
    let results = index.search(&queries, &params)?;

    let details: Vec<String> = queries
        .iter()
        .enumerate()
        .map(|(i, query)| format!("searching with query {i}. dimension = {}", query.dimension()))
        .collect();
    journal.record("search", &details, args.log_entries)?;

    let report = SearchReport {
        queries: results
            .matches
            .iter()
            .enumerate()
            .map(|(query, matches)| QueryMatches {
                query,
                matches: matches.iter().map(match_line).collect(),
            })
            .collect(),
        candidates_examined: results.candidates_examined,
        duration_ms: results.search_time_ms,
    };

    output_result("Search completed", &report, cli_args)?;

    Ok(())
}

/// Show workspace statistics.
fn show_stats(args: StatsArgs, cli_args: &ShrikeArgs) -> Result<()> {
    if cli_args.verbosity() > 1 {
        println!("Gathering statistics for: {}", args.workspace.display());
    }

    let storage = workspace_storage(&args.workspace)?;
    let index = VectorIndex::open(storage, IndexConfig::default())?;
    let stats = index.stats()?;

    output_result(
        "Workspace statistics",
        &StatsReport {
            path: args.workspace.to_string_lossy().to_string(),
            entry_count: stats.entry_count,
            dimension: stats.dimension,
            memory_bytes: stats.memory_bytes,
            log_bytes: stats.log_bytes,
        },
        cli_args,
    )?;

    Ok(())
}

/// Evaluate top-1 retrieval accuracy against a labeled query file.
fn evaluate_workspace(args: EvaluateArgs, cli_args: &ShrikeArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Evaluating queries from: {}", args.query_file.display());
        println!("Against workspace: {}", args.workspace.display());
    }

    if args.batch_size == 0 {
        return Err(ShrikeError::invalid_operation("batch size must be at least 1"));
    }

    let storage = workspace_storage(&args.workspace)?;
    let index = VectorIndex::open(storage, IndexConfig::default())?;

    let records = read_query_file(&args.query_file)?;
    let start_time = Instant::now();

    let mut expected = Vec::with_capacity(records.len());
    let mut queries = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        let label = record.label.ok_or_else(|| {
            ShrikeError::invalid_operation(format!("query {i} is missing a label"))
        })?;
        expected.push(label);
        queries.push(Embedding::new(record.embedding));
    }

    let params = SearchParams {
        top_k: 1,
        include_embeddings: false,
    };

    let mut all_matches: Vec<Vec<Match>> = Vec::with_capacity(queries.len());
    for chunk in queries.chunks(args.batch_size) {
        let results = index.search(chunk, &params)?;
        all_matches.extend(results.matches);
    }

    let report: EvalReport = top1_accuracy(&all_matches, &expected, |m| {
        String::from_utf8(m.payload.clone()).ok()
    });
    let duration = start_time.elapsed();

    if cli_args.verbosity() > 1 {
        println!("correct: {}, total: {}", report.correct, report.total);
    }

    output_result(
        "Evaluation completed",
        &EvalSummary {
            correct: report.correct,
            total: report.total,
            accuracy: report.accuracy(),
            duration_ms: duration.as_millis() as u64,
        },
        cli_args,
    )?;

    Ok(())
}

/// Parse a comma-separated vector argument.
fn parse_vector(text: &str) -> Result<Vec<f32>> {
    text.split(',')
        .map(|component| {
            let component = component.trim();
            component.parse::<f32>().map_err(|_| {
                ShrikeError::invalid_operation(format!("invalid vector component '{component}'"))
            })
        })
        .collect()
}

/// Read a JSONL query file.
fn read_query_file(path: &Path) -> Result<Vec<QueryRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: QueryRecord = serde_json::from_str(&line).map_err(|e| {
            ShrikeError::invalid_operation(format!(
                "error parsing query on line {}: {}",
                line_num + 1,
                e
            ))
        })?;
        records.push(record);
    }

    Ok(records)
}

fn match_line(m: &Match) -> MatchLine {
    MatchLine {
        id: m.id,
        similarity: m.similarity,
        distance: m.distance,
        payload: String::from_utf8_lossy(&m.payload).to_string(),
        embedding: m.embedding.as_ref().map(|e| e.data.clone()),
    }
}
