//! up command - Upload a local file when its content differs
//!
//! Compares the file's fingerprint with the object's before sending, and
//! exits with the configured unchanged/changed/failed code.

use std::path::{Path, PathBuf};

use clap::Args;
use s3sum_core::config::{AUTO_CONTENT_TYPE, DEFAULT_CONTENT_TYPE};
use s3sum_core::path::resolve_upload_target;
use s3sum_core::{Settings, TransferRequest, parse_remote, transfer};
use s3sum_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, report_outcome};

/// Upload a file if its content changed
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Local file to upload
    pub source: PathBuf,

    /// Destination (bucket/key, or bucket/prefix/ to keep the file name)
    pub target: String,

    /// Canned ACL for the new object
    #[arg(long)]
    pub acl: Option<String>,

    /// Content type, or "auto" to guess from the file extension
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Report the verdict without uploading
    #[arg(long)]
    pub dry_run: bool,

    /// Upload without comparing fingerprints first
    #[arg(long)]
    pub no_check: bool,
}

/// Execute the up command
pub async fn execute(args: UpArgs, settings: &Settings, formatter: &Formatter) -> i32 {
    let request = match build_request(&args, settings) {
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

fn build_request(args: &UpArgs, settings: &Settings) -> s3sum_core::Result<TransferRequest> {
    let destination = parse_remote(&args.target)?;
    let remote = resolve_upload_target(&args.source, &destination)?;

    Ok(TransferRequest::Upload {
        content_type: content_type_for(&args.source, &settings.content_type),
        local: args.source.clone(),
        remote,
        acl: settings.acl.clone(),
        dry_run: args.dry_run,
        force: args.no_check,
    })
}

/// Resolve the configured content type, guessing when it is "auto"
fn content_type_for(path: &Path, configured: &str) -> String {
    if configured != AUTO_CONTENT_TYPE {
        return configured.to_string();
    }

    mime_guess::from_path(path)
        .first()
        .map_or_else(|| DEFAULT_CONTENT_TYPE.to_string(), |mime| mime.to_string())
}
