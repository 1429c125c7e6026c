//! CLI definitions using clap derive macros
//!
//! Every flag is independent and optional; running without any flag does
//! nothing. Flags are processed in a fixed order (build, crawl, write index,
//! query, write results) regardless of their order on the command line.
//!
//! Long flags are also accepted with a single dash (`-path`, `-threads 8`).
//! A `--limit` or `--threads` value that is not a positive integer falls back
//! to the default with a warning instead of ending the run.

use clap::Parser;
use std::ffi::OsString;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::workqueue::DEFAULT_THREADS;

/// Crawl limit used when none (or an invalid one) is given
pub const DEFAULT_LIMIT: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(n) => n,
    None => unreachable!(),
};

/// wordseek - build a word index over HTML files or crawled pages and query it
#[derive(Parser, Debug)]
#[command(name = "wordseek")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory (or single file) of HTML documents to index
    #[arg(long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Seed URL to crawl and index
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Maximum number of URLs the crawl may discover [default: 50]
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub limit: Option<String>,

    /// Use the concurrent index, builder, crawler and query executor with
    /// this many worker threads [default: 5]
    #[arg(
        long,
        value_name = "N",
        num_args = 0..=1,
        default_missing_value = "5",
        allow_negative_numbers = true
    )]
    pub threads: Option<String>,

    /// Write the index as JSON
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "index.json")]
    pub index: Option<PathBuf>,

    /// File with one query per line
    #[arg(long, value_name = "FILE")]
    pub query: Option<PathBuf>,

    /// Match query words exactly instead of as prefixes
    #[arg(long)]
    pub exact: bool,

    /// Write query results as JSON
    #[arg(long, value_name = "FILE", num_args = 0..=1, default_missing_value = "results.json")]
    pub results: Option<PathBuf>,
}

/// Flags that may be written with a single leading dash
const LONG_FLAGS: [&str; 8] = [
    "path", "url", "limit", "threads", "index", "query", "exact", "results",
];

impl Cli {
    /// Parse process arguments, accepting single-dash long flags
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// True when no action was requested
    pub fn is_empty(&self) -> bool {
        self.path.is_none()
            && self.url.is_none()
            && self.index.is_none()
            && self.query.is_none()
            && self.results.is_none()
    }

    /// Crawl limit, or the default when missing or invalid
    pub fn crawl_limit(&self) -> NonZeroUsize {
        self.limit
            .as_deref()
            .map_or(DEFAULT_LIMIT, |value| positive_or("limit", value, DEFAULT_LIMIT))
    }

    /// Worker count when multithreading was requested
    pub fn worker_threads(&self) -> Option<NonZeroUsize> {
        self.threads
            .as_deref()
            .map(|value| positive_or("threads", value, DEFAULT_THREADS))
    }
}

fn positive_or(flag: &str, value: &str, default: NonZeroUsize) -> NonZeroUsize {
    match value.trim().parse() {
        Ok(n) => n,
        Err(_) => {
            tracing::warn!(
                "Invalid --{} value {:?}, using {} instead",
                flag,
                value,
                default
            );
            default
        }
    }
}

/// Rewrite `-path` style flags to `--path`
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let renamed = arg
                .to_str()
                .and_then(|s| s.strip_prefix('-'))
                .filter(|name| LONG_FLAGS.contains(name))
                .map(|name| OsString::from(format!("--{}", name)));
            renamed.unwrap_or(arg)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let args = std::iter::once("wordseek")
            .chain(args.iter().copied())
            .map(OsString::from);
        Cli::try_parse_from(normalize_args(args)).unwrap()
    }

    #[test]
    fn test_no_flags_is_a_no_op() {
        let cli = parse(&[]);
        assert!(cli.is_empty());
        assert!(cli.worker_threads().is_none());
        assert_eq!(cli.crawl_limit().get(), 50);
    }

    #[test]
    fn test_optional_values_take_defaults() {
        let cli = parse(&["-path", "docs", "-threads", "-index", "-results", "-exact"]);
        assert_eq!(cli.path, Some(PathBuf::from("docs")));
        assert_eq!(cli.worker_threads(), NonZeroUsize::new(5));
        assert_eq!(cli.index, Some(PathBuf::from("index.json")));
        assert_eq!(cli.results, Some(PathBuf::from("results.json")));
        assert!(cli.exact);
    }

    #[test]
    fn test_explicit_values() {
        let cli = parse(&[
            "--url",
            "https://example.com/",
            "--limit",
            "7",
            "--threads",
            "3",
            "--index",
            "out/idx.json",
            "--query",
            "q.txt",
        ]);
        assert_eq!(cli.url.as_deref(), Some("https://example.com/"));
        assert_eq!(cli.crawl_limit().get(), 7);
        assert_eq!(cli.worker_threads(), NonZeroUsize::new(3));
        assert_eq!(cli.index, Some(PathBuf::from("out/idx.json")));
        assert_eq!(cli.query, Some(PathBuf::from("q.txt")));
        assert!(!cli.exact);
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let cli = parse(&["-path", "docs", "-index", "-limit", "0", "-threads", "-2"]);
        assert_eq!(cli.path, Some(PathBuf::from("docs")));
        assert_eq!(cli.index, Some(PathBuf::from("index.json")));
        assert_eq!(cli.crawl_limit(), DEFAULT_LIMIT);
        assert_eq!(cli.worker_threads(), Some(DEFAULT_THREADS));

        let cli = parse(&["-threads", "many", "-limit", "-7"]);
        assert_eq!(cli.crawl_limit(), DEFAULT_LIMIT);
        assert_eq!(cli.worker_threads(), Some(DEFAULT_THREADS));
    }

    #[test]
    fn test_normalize_leaves_other_arguments_alone() {
        let args = ["wordseek", "-path", "-x", "--query", "-limit"].map(OsString::from);
        let normalized: Vec<_> = normalize_args(args)
            .into_iter()
            .map(|arg| arg.into_string().unwrap())
            .collect();
        assert_eq!(normalized, ["wordseek", "--path", "-x", "--query", "--limit"]);
    }
}
