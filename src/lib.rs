//! wordseek - word-position search over HTML trees and crawled web pages
//!
//! The index maps words to the sources they occur in and the positions at
//! which they occur. It can be built from a directory tree or a bounded web
//! crawl, and queried by exact words or prefixes. Every stage has a
//! single-threaded form and a concurrent form driven by one shared
//! [`workqueue::WorkQueue`]; both produce the same index and results.

pub mod builder;
pub mod cli;
pub mod crawler;
pub mod engine;
pub mod index;
pub mod output;
pub mod query;
pub mod sync;
pub mod text;
pub mod workqueue;
