//! ls command - List buckets and objects
//!
//! Lists buckets when given no path, or one level of keys under a prefix.

use clap::Args;
use s3sum_core::path::display_name;
use s3sum_core::{ListOptions, ObjectInfo, ObjectStore, RemotePath, Settings, parse_remote};
use s3sum_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Keys requested per list call
const PAGE_SIZE: i32 = 1000;

/// List buckets or objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (bucket[/prefix]); lists buckets when omitted
    pub path: Option<String>,

    /// Print whole keys instead of their last segment
    #[arg(long)]
    pub fullpath: bool,

    /// Show size and modification time
    #[arg(short, long)]
    pub long: bool,

    /// List every key under the prefix instead of one level
    #[arg(short, long)]
    pub recursive: bool,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, settings: &Settings, formatter: &Formatter) -> ExitCode {
    let target = match args.path.as_deref().map(parse_remote).transpose() {
        Ok(target) => target,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let client = match S3Client::new(settings).await {
        Ok(c) => c,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let listed = match &target {
        None => client.list_buckets().await,
        Some(path) => list_all(&client, path, args.recursive).await,
    };

    match listed {
        Ok(items) => {
            formatter.listing(&items, |item| render_entry(item, args.fullpath, args.long));
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to list: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Follow continuation tokens until the listing is exhausted
async fn list_all(
    store: &dyn ObjectStore,
    path: &RemotePath,
    recursive: bool,
) -> s3sum_core::Result<Vec<ObjectInfo>> {
    let mut items = Vec::new();
    let mut continuation_token: Option<String> = None;

    loop {
        let options = ListOptions {
            max_keys: Some(PAGE_SIZE),
            continuation_token: continuation_token.take(),
            recursive,
            ..Default::default()
        };

        let page = store.list_objects(path, options).await?;
        items.extend(page.items);

        match page.continuation_token {
            Some(token) if page.truncated => continuation_token = Some(token),
            _ => break,
        }
    }

    tracing::debug!(path = %path, count = items.len(), "listing complete");
    Ok(items)
}

/// One line of human-readable listing
fn render_entry(item: &ObjectInfo, fullpath: bool, long: bool) -> String {
    let name = display_name(&item.key, fullpath);
    if !long {
        return name.to_string();
    }

    let date = item
        .last_modified
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "                   ".to_string());
    let size = if item.is_dir {
        "DIR".to_string()
    } else {
        item.size_human.clone().unwrap_or_else(|| "0 B".to_string())
    };

    format!("[{date}] {size:>10} {name}")
}
