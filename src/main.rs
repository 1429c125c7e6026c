//! wordseek - word-position search over HTML trees and crawled web pages

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wordseek::cli::Cli;
use wordseek::engine;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse_args();
    if cli.is_empty() {
        return Ok(());
    }

    engine::run(&cli)
}
