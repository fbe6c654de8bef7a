//! CLI command definitions and execution
//!
//! Settings are resolved once from the config file and global flags, then
//! passed by reference to the selected command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use s3sum_core::{ConfigManager, Overrides, Settings};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod completions;
mod dl;
mod ls;
mod up;

/// s3sum - change-detecting S3 client
///
/// Lists, uploads, downloads and prints S3 objects. Uploads and downloads
/// are skipped when both sides already hold the same content.
#[derive(Parser, Debug)]
#[command(name = "s3sum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Configuration file path
    #[arg(long, global = true, env = "S3SUM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Region of the bucket
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Named credentials profile
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Endpoint URL of an S3-compatible store
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Exit code when nothing needed transferring
    #[arg(long, global = true)]
    pub rc_ok: Option<i32>,

    /// Exit code when content changed
    #[arg(long, global = true)]
    pub rc_changed: Option<i32>,

    /// Exit code when the check or transfer failed
    #[arg(long, global = true)]
    pub rc_failed: Option<i32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets and objects
    Ls(ls::LsArgs),

    /// Upload a file if its content changed
    Up(up::UpArgs),

    /// Download an object if its content changed
    Dl(dl::DlArgs),

    /// Display object contents
    Cat(cat::CatArgs),

    /// Display gzip-compressed object contents
    Zcat(cat::CatArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return the process exit code
pub async fn execute(cli: Cli) -> i32 {
    let formatter = Formatter::new(OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    });

    if let Commands::Completions(args) = &cli.command {
        return completions::execute(args).as_i32();
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError.as_i32();
        }
    };
    tracing::debug!(
        region = %settings.region,
        profile = ?settings.profile,
        "settings resolved"
    );

    match cli.command {
        Commands::Ls(args) => ls::execute(args, &settings, &formatter).await.as_i32(),
        Commands::Up(args) => up::execute(args, &settings, &formatter).await,
        Commands::Dl(args) => dl::execute(args, &settings, &formatter).await,
        Commands::Cat(args) => cat::execute(args, cat::Decode::Plain, &settings, &formatter)
            .await
            .as_i32(),
        Commands::Zcat(args) => cat::execute(args, cat::Decode::Gzip, &settings, &formatter)
            .await
            .as_i32(),
        Commands::Completions(_) => ExitCode::Success.as_i32(),
    }
}

/// Load the config file and apply command-line overrides
fn load_settings(cli: &Cli) -> s3sum_core::Result<Settings> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new()?,
    };
    let config = manager.load()?;

    let (acl, content_type) = match &cli.command {
        Commands::Up(args) => (args.acl.clone(), args.mime_type.clone()),
        _ => (None, None),
    };

    Settings::resolve(
        config,
        Overrides {
            region: cli.region.clone(),
            profile: cli.profile.clone(),
            endpoint: cli.endpoint.clone(),
            acl,
            content_type,
            rc_ok: cli.rc_ok,
            rc_changed: cli.rc_changed,
            rc_failed: cli.rc_failed,
        },
    )
}
