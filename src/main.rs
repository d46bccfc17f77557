//! appshell - A versioned offline asset cache manager
//!
//! appshell provides:
//! - A two-phase install/activate deployment protocol for cached assets
//! - Manifest diffing so unchanged assets survive upgrades without refetching
//! - Cache-first request resolution (online-first for the root document)
//! - Control messages for forced takeover and full offline download

use anyhow::Result;
use clap::Parser;

mod cli;
mod core;
mod error;
mod fetch;
mod manifest;
mod store;
mod worker;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_tracing(cli.verbose);
    cli::run(cli).await
}
