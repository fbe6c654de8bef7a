//! Change detection
//!
//! Decides whether a local file and a remote object hold the same bytes by
//! comparing the local MD5 with the digest in the object's ETag. Nothing is
//! cached: every call hashes and probes afresh.

use std::fs::File;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::fingerprint::{Fingerprint, fingerprint_stream};
use crate::path::RemotePath;
use crate::probe::probe_remote;
use crate::traits::ObjectStore;

/// Verdict of a change check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    /// A transfer is needed, or could not be ruled out
    pub changed: bool,

    /// Byte length of the local file if present, else of the remote side
    pub size: u64,

    /// Fingerprint of the local file; None when it does not exist
    #[serde(rename = "local_md5")]
    pub local_fingerprint: Option<Fingerprint>,

    /// Digest reported by the store; None when the object does not exist
    #[serde(rename = "s3_md5")]
    pub remote_fingerprint: Option<String>,
}

impl ChangeRecord {
    /// Record for the "nothing to compare" case
    pub fn absent() -> Self {
        Self {
            changed: true,
            ..Default::default()
        }
    }
}

/// Plain-text report, one `name value` pair per line
impl std::fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "changed {}", self.changed)?;
        writeln!(f, "size {}", self.size)?;
        match &self.local_fingerprint {
            Some(fp) => writeln!(f, "local_md5 {fp}")?,
            None => writeln!(f, "local_md5 ")?,
        }
        write!(f, "s3_md5 {}", self.remote_fingerprint.as_deref().unwrap_or_default())
    }
}

/// Fingerprint a local file, or None if it does not exist
pub fn fingerprint_local(path: &Path) -> Result<Option<(Fingerprint, u64)>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    fingerprint_stream(&mut file).map(Some)
}

/// Compare a local file with a remote object.
///
/// A missing local file is `changed` without consulting the store. A
/// missing remote object is `changed` with only the local side filled in.
/// Any other probe failure is returned as an error with no verdict.
pub async fn detect_change(
    store: &dyn ObjectStore,
    local: &Path,
    remote: &RemotePath,
) -> Result<ChangeRecord> {
    let Some((local_fp, local_size)) = fingerprint_local(local)? else {
        tracing::debug!(local = %local.display(), "local file absent");
        return Ok(ChangeRecord::absent());
    };

    let mut record = ChangeRecord {
        changed: true,
        size: local_size,
        local_fingerprint: Some(local_fp),
        remote_fingerprint: None,
    };

    match probe_remote(store, remote).await {
        Ok(meta) => {
            record.changed = !local_fp.matches(&meta.fingerprint);
            record.remote_fingerprint = Some(meta.fingerprint);
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!(%remote, "remote object absent");
        }
        Err(e) => return Err(e),
    }

    tracing::debug!(
        local = %local.display(),
        %remote,
        changed = record.changed,
        "change check complete"
    );

    Ok(record)
}
