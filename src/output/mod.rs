//! JSON files and terminal summaries
//!
//! Index and result files are pretty-printed with tab indentation. Both
//! structures are ordered maps, so keys always come out sorted and writing
//! a re-read index reproduces the same bytes.

use colored::*;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::builder::BuildStats;
use crate::crawler::CrawlStats;
use crate::index::{Index, SearchResult};
use crate::query::QueryResults;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of the results file
#[derive(Serialize)]
struct QueryRecord<'a> {
    queries: &'a str,
    results: &'a [SearchResult],
}

fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), OutputError> {
    let io_error = |source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);

    value
        .serialize(&mut serializer)
        .map_err(|source| OutputError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)
}

/// Write the index as `{word: {source: [positions]}}`
pub fn write_index(index: &Index, path: &Path) -> Result<(), OutputError> {
    write_json(index, path)?;
    tracing::info!("Wrote {} words to {}", index.len(), path.display());
    Ok(())
}

/// Read an index file produced by [`write_index`]
pub fn read_index(path: &Path) -> Result<Index, OutputError> {
    let content = fs::read_to_string(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| OutputError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write query results as `[{"queries": key, "results": [...]}]`
pub fn write_results(results: &QueryResults, path: &Path) -> Result<(), OutputError> {
    let records: Vec<_> = results
        .iter()
        .map(|(query, found)| QueryRecord {
            queries: query,
            results: found,
        })
        .collect();
    write_json(&records, path)?;
    tracing::info!("Wrote {} queries to {}", records.len(), path.display());
    Ok(())
}

pub fn print_build_stats(stats: &BuildStats) {
    println!("\n✨ {}", "Indexing complete!".green().bold());
    println!("   Files indexed: {}", stats.files_indexed);
    println!("   Words indexed: {}", stats.words_indexed);
    if stats.files_skipped > 0 {
        println!("   Files skipped: {}", stats.files_skipped.to_string().yellow());
    }
    println!("   Time: {:.2}s", stats.duration_secs);
}

pub fn print_crawl_stats(stats: &CrawlStats) {
    println!("\n🕸️  {}", "Crawl complete!".green().bold());
    println!("   Pages indexed: {}", stats.pages_indexed);
    if stats.pages_failed > 0 {
        println!("   Pages failed: {}", stats.pages_failed.to_string().yellow());
    }
    println!("   URLs discovered: {}", stats.frontier_size);
    println!("   Time: {:.2}s", stats.duration_secs);
}

pub fn print_written(what: &str, path: &Path) {
    println!("📝 {} written to {}", what, path.display().to_string().blue().bold());
}

/// Report a failed action without stopping the run
pub fn report_failure(action: &str, error: &anyhow::Error) {
    tracing::error!("{} failed: {:#}", action, error);
    eprintln!("{} {}: {:#}", "error:".red().bold(), action, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::WordIndex;

    fn sample() -> Index {
        let mut index = Index::new();
        index.add_all(&["zeta", "alpha", "zeta"], "b.html", 1);
        index.add_all(&["alpha"], "a.html", 4);
        index
    }

    #[test]
    fn test_index_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        write_index(&sample(), &path).unwrap();

        let expected = "{\n\t\"alpha\": {\n\t\t\"a.html\": [\n\t\t\t4\n\t\t],\n\t\t\"b.html\": [\n\t\t\t2\n\t\t]\n\t},\n\t\"zeta\": {\n\t\t\"b.html\": [\n\t\t\t1,\n\t\t\t3\n\t\t]\n\t}\n}\n";
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn test_index_round_trip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        write_index(&sample(), &first).unwrap();
        let reread = read_index(&first).unwrap();
        write_index(&reread, &second).unwrap();

        assert_eq!(reread, sample());
        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_empty_index_is_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        write_index(&Index::new(), &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}\n");
    }

    #[test]
    fn test_results_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let index = sample();
        let mut results = QueryResults::new();
        results.insert("zeta".to_string(), index.exact_search(&["zeta"]));
        results.insert("nothing".to_string(), Vec::new());
        write_results(&results, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            written,
            serde_json::json!([
                { "queries": "nothing", "results": [] },
                {
                    "queries": "zeta",
                    "results": [ { "where": "b.html", "count": 2, "index": 1 } ]
                }
            ])
        );
    }

    #[test]
    fn test_unwritable_path_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("index.json");
        assert!(matches!(
            write_index(&sample(), &path),
            Err(OutputError::Io { .. })
        ));
    }
}
