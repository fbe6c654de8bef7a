//! s3sum - change-detecting S3 client
//!
//! Lists, uploads, downloads and prints S3 objects, skipping transfers
//! whose content already matches and reporting the outcome as an exit code.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use s3sum_cli::commands::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // --debug wins over RUST_LOG
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code);
}
