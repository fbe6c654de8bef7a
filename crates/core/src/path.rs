//! Path parsing and resolution
//!
//! Remote paths have the format `bucket[/key]`, optionally prefixed with
//! `s3://`. Local paths are plain filesystem paths.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const S3_SCHEME: &str = "s3://";

/// A parsed remote path pointing to an S3 location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Bucket name
    pub bucket: String,
    /// Object key (empty for bucket root)
    pub key: String,
}

impl RemotePath {
    /// Create a new RemotePath
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Whether the key addresses a prefix rather than a single object
    pub fn is_dir(&self) -> bool {
        self.key.is_empty() || self.key.ends_with('/')
    }

    /// Final key segment, or an empty string for a prefix
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or_default()
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.key)
        }
    }
}

/// Parse `bucket[/key]` into a RemotePath
pub fn parse_remote(path: &str) -> Result<RemotePath> {
    let path = path.strip_prefix(S3_SCHEME).unwrap_or(path);

    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let (bucket, key) = path.split_once('/').unwrap_or((path, ""));

    if bucket.is_empty() {
        return Err(Error::InvalidPath(format!(
            "Bucket name cannot be empty in '{path}'. Use format: bucket[/key]"
        )));
    }

    Ok(RemotePath::new(bucket, key))
}

/// Resolve the object an upload of `src` to `dst` should write
///
/// A destination without a key, or whose key ends with `/`, receives the
/// source file name.
pub fn resolve_upload_target(src: &Path, dst: &RemotePath) -> Result<RemotePath> {
    let src_str = src.to_string_lossy();
    // file_name() drops a trailing `.`, so `dir/.` must be caught on the string
    let names_dir = src_str.ends_with('/')
        || matches!(src_str.rsplit('/').next(), Some("." | ".."));
    let file_name = match src.file_name() {
        Some(name) if !names_dir => name.to_string_lossy(),
        _ => {
            return Err(Error::InvalidPath(format!(
                "Source must name a file: {src_str}"
            )));
        }
    };

    if !dst.is_dir() {
        return Ok(dst.clone());
    }

    Ok(RemotePath::new(
        &dst.bucket,
        format!("{}{}", dst.key, file_name),
    ))
}

/// Resolve the local file a download of `src` to `dst` should write
///
/// A destination that ends with `/`, is `.` or `..`, or is an existing
/// directory receives the final key segment as its file name.
pub fn resolve_download_target(src: &RemotePath, dst: &Path) -> Result<PathBuf> {
    if src.is_dir() {
        return Err(Error::InvalidPath(format!(
            "Source must name an object, not a prefix: {src}"
        )));
    }

    let dst_str = dst.to_string_lossy();
    // file_name() is None for paths ending in `.` or `..`
    let names_dir = dst_str.ends_with('/') || dst.file_name().is_none() || dst.is_dir();

    if names_dir {
        Ok(dst.join(src.file_name()))
    } else {
        Ok(dst.to_path_buf())
    }
}

/// Name shown for a listed key
///
/// With `fullpath` the whole key is shown; otherwise only the last
/// segment, keeping the trailing slash of a prefix.
pub fn display_name(key: &str, fullpath: bool) -> &str {
    if fullpath {
        return key;
    }

    match key.strip_suffix('/') {
        Some(prefix) => {
            let start = prefix.rfind('/').map_or(0, |pos| pos + 1);
            &key[start..]
        }
        None => key.rsplit('/').next().unwrap_or(key),
    }
}
