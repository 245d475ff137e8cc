//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, ShrikeArgs};
use crate::error::Result;

/// Result structure for workspace creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReport {
    pub path: String,
    pub dimension: Option<usize>,
}

/// Result structure for entry ingestion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddReport {
    pub entries_added: usize,
    pub duration_ms: u64,
    pub entries_per_second: f64,
}

/// One ranked match, payload decoded for display.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchLine {
    pub id: u64,
    pub similarity: f32,
    pub distance: f32,
    pub payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Ranked matches for one query.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryMatches {
    pub query: usize,
    pub matches: Vec<MatchLine>,
}

/// Result structure for search operations.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchReport {
    pub queries: Vec<QueryMatches>,
    pub candidates_examined: usize,
    pub duration_ms: f64,
}

/// Workspace statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsReport {
    pub path: String,
    pub entry_count: usize,
    pub dimension: Option<usize>,
    pub memory_bytes: usize,
    pub log_bytes: u64,
}

/// Result structure for retrieval evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct EvalSummary {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
    pub duration_ms: u64,
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize>(message: &str, result: &T, args: &ShrikeArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in human-readable format.
fn output_human<T: Serialize>(message: &str, result: &T, args: &ShrikeArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }

    // Convert to JSON value for easier manipulation
    let value = serde_json::to_value(result)?;

    match result {
        _ if std::any::type_name::<T>().contains("SearchReport") => {
            output_search_report_human(&value, args)
        }
        _ if std::any::type_name::<T>().contains("StatsReport") => {
            output_stats_report_human(&value, args)
        }
        _ => {
            // Generic output for other types
            output_generic_human(&value, args)
        }
    }
}

/// Output a search report in human format.
fn output_search_report_human(value: &serde_json::Value, _args: &ShrikeArgs) -> Result<()> {
    if let Some(obj) = value.as_object()
        && let Some(queries) = obj.get("queries").and_then(|q| q.as_array())
    {
        println!("Search Results:");
        println!("═══════════════");

        for query in queries {
            let query_index = query.get("query").and_then(|q| q.as_u64()).unwrap_or(0);
            println!();
            println!("Query {query_index}:");
            println!("─────────");

            let matches = query
                .get("matches")
                .and_then(|m| m.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default();

            if matches.is_empty() {
                println!("(no matches)");
            }

            for (rank, m) in matches.iter().enumerate() {
                let id = m.get("id").and_then(|i| i.as_u64()).unwrap_or(0);
                let similarity = m.get("similarity").and_then(|s| s.as_f64()).unwrap_or(0.0);
                let distance = m.get("distance").and_then(|d| d.as_f64()).unwrap_or(0.0);
                let payload = m.get("payload").and_then(|p| p.as_str()).unwrap_or("");
                println!(
                    "{}. id {id} (similarity: {similarity:.3}, distance: {distance:.3}) {payload}",
                    rank + 1
                );
            }
        }

        println!();

        if let Some(examined) = obj.get("candidates_examined").and_then(|c| c.as_u64()) {
            println!("Candidates examined: {examined}");
        }

        if let Some(duration) = obj.get("duration_ms").and_then(|d| d.as_f64()) {
            println!("Search time: {duration:.2}ms");
        }
    }
    Ok(())
}

/// Output workspace statistics in human format.
fn output_stats_report_human(value: &serde_json::Value, _args: &ShrikeArgs) -> Result<()> {
    if let Some(obj) = value.as_object() {
        println!("Workspace Statistics:");
        println!("════════════════════");

        if let Some(path) = obj.get("path").and_then(|p| p.as_str()) {
            println!("Path: {path}");
        }

        if let Some(count) = obj.get("entry_count").and_then(|c| c.as_u64()) {
            println!("Entries: {count}");
        }

        match obj.get("dimension").and_then(|d| d.as_u64()) {
            Some(dim) => println!("Dimension: {dim}"),
            None => println!("Dimension: (not established)"),
        }

        if let Some(bytes) = obj.get("memory_bytes").and_then(|b| b.as_u64()) {
            let formatted_size = format_bytes(bytes);
            println!("In-memory size: {formatted_size}");
        }

        if let Some(bytes) = obj.get("log_bytes").and_then(|b| b.as_u64()) {
            let formatted_size = format_bytes(bytes);
            println!("Entry log size: {formatted_size}");
        }
    }
    Ok(())
}

/// Output generic data in human format.
fn output_generic_human(value: &serde_json::Value, _args: &ShrikeArgs) -> Result<()> {
    match value {
        serde_json::Value::Object(obj) => {
            for (key, val) in obj {
                let formatted_val = format_value(val);
                println!("{key}: {formatted_val}");
            }
        }
        _ => {
            let formatted_value = format_value(value);
            println!("{formatted_value}");
        }
    }
    Ok(())
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &ShrikeArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}

/// Format a JSON value for display.
fn format_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Array(arr) => {
            let formatted_values = arr.iter().map(format_value).collect::<Vec<_>>().join(", ");
            format!("[{formatted_values}]")
        }
        serde_json::Value::Object(_) => "[object]".to_string(),
        serde_json::Value::Null => "null".to_string(),
    }
}

/// Format bytes into human-readable format.
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        let unit = UNITS[unit_index];
        format!("{bytes} {unit}")
    } else {
        let unit = UNITS[unit_index];
        format!("{size:.1} {unit}")
    }
}
