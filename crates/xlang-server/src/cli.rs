//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

/// Cross-language crypto testing server
///
/// Exposes the primitive library over gRPC to test drivers running on the
/// same machine.
#[derive(Debug, Parser)]
#[command(name = "xlang-testing-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on [default: 23456]
    #[arg(short, long, env = "XLANG_PORT")]
    pub port: Option<u16>,

    /// Address to listen on [default: ::, all interfaces]
    #[arg(long, env = "XLANG_HOST")]
    pub host: Option<String>,

    /// TOML configuration file
    #[arg(short, long, env = "XLANG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
