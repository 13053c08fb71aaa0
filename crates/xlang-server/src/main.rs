//! xlang Testing Server CLI
//!
//! Starts the gRPC testing server on the configured port.

use clap::Parser;
use std::process;
use xlang_server::{init_tracing, run, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
