//! leadpages CLI — per-company landing pages from CSV lead lists.
//!
//! Renders one HTML page per row, back-annotates each list with the page URL,
//! and archives a dated copy for publication.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
