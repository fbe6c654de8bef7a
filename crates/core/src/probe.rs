//! Remote metadata probe
//!
//! Reads an object's size and integrity token without downloading it, and
//! reduces the token to a bare digest comparable with a local fingerprint.

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::ObjectStore;

/// Size and canonical fingerprint of a remote object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMeta {
    /// Content length in bytes
    pub size: u64,
    /// Bare digest from the integrity token
    pub fingerprint: String,
}

/// Strip the quoting from an integrity token.
///
/// S3 publishes ETags as a quoted string, optionally with a `W/` weak
/// prefix. Anything that is not a non-empty quoted value is rejected as
/// malformed rather than guessed at.
///
/// Multipart uploads publish `"<hex>-<parts>"`; that value is returned as is
/// and will never equal a whole-file MD5.
pub fn canonical_digest(token: &str) -> Result<String> {
    let unweakened = token.strip_prefix("W/").unwrap_or(token);

    let digest = unweakened
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .filter(|inner| !inner.is_empty() && !inner.contains('"'))
        .ok_or_else(|| Error::MalformedMetadata(format!("unusable integrity token: {token:?}")))?;

    Ok(digest.to_string())
}

/// Canonicalise an optional token, treating absence as malformed metadata
pub fn require_digest(token: Option<&str>, path: &RemotePath) -> Result<String> {
    match token {
        Some(token) => canonical_digest(token),
        None => Err(Error::MalformedMetadata(format!(
            "store returned no integrity token for {path}"
        ))),
    }
}

/// Probe a remote object.
///
/// `Error::NotFound` from the store is passed through untouched so callers
/// can treat it as "nothing to compare".
pub async fn probe_remote(store: &dyn ObjectStore, path: &RemotePath) -> Result<RemoteMeta> {
    let info = store.probe_object(path).await?;
    let fingerprint = require_digest(info.etag.as_deref(), path)?;

    tracing::debug!(%path, size = ?info.size_bytes, %fingerprint, "probed remote object");

    Ok(RemoteMeta {
        size: info.size_bytes.unwrap_or(0),
        fingerprint,
    })
}
