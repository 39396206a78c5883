//! Cairn CLI binary.

use anyhow::Result;
use cairn::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the cairn CLI.
///
/// Uses tokio's current_thread runtime; every command is a short sequence of
/// file reads and writes.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=cairn=debug,cairn_frontmatter=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cairn=info,cairn_frontmatter=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting cairn CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Cairn CLI completed successfully");
    Ok(())
}
