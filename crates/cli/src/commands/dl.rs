//! dl command - Download an object when its content differs
//!
//! Compares the object's stored fingerprint with the local file before
//! fetching, and exits with the configured unchanged/changed/failed code.

use std::path::PathBuf;

use clap::Args;
use s3sum_core::path::resolve_download_target;
use s3sum_core::{Settings, TransferRequest, parse_remote, transfer};
use s3sum_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, report_outcome};

/// Download an object if its content changed
#[derive(Args, Debug)]
pub struct DlArgs {
    /// Object to download (bucket/key)
    pub source: String,

    /// Local destination file or directory
    #[arg(default_value = ".")]
    pub target: PathBuf,

    /// Report the verdict without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Do not create the destination's parent directories
    #[arg(long)]
    pub no_mkdir: bool,

    /// Download without comparing fingerprints first
    #[arg(long)]
    pub no_check: bool,
}

/// Execute the dl command
pub async fn execute(args: DlArgs, settings: &Settings, formatter: &Formatter) -> i32 {
    let request = match build_request(&args) {
        Ok(request) => request,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError.as_i32();
        }
    };

    let client = match S3Client::new(settings).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return settings.exit_codes.failed;
        }
    };

    let outcome = transfer::execute(&client, &request).await;
    report_outcome(formatter, &outcome, args.dry_run, &settings.exit_codes)
}

fn build_request(args: &DlArgs) -> s3sum_core::Result<TransferRequest> {
    let remote = parse_remote(&args.source)?;
    let local = resolve_download_target(&remote, &args.target)?;

    Ok(TransferRequest::Download {
        remote,
        local,
        mkdir_parents: !args.no_mkdir,
        dry_run: args.dry_run,
        force: args.no_check,
    })
}
