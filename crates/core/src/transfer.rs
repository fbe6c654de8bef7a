//! Transfer executor
//!
//! Runs the change check for an upload or download and, when the content
//! differs, performs the transfer. Uploads are confirmed by comparing the
//! store's ETag with the local fingerprint after the store accepted them.

use std::io;
use std::path::{Path, PathBuf};

use futures::TryStreamExt;
use tokio::io::AsyncWriteExt;

use crate::detect::{ChangeRecord, detect_change};
use crate::error::{Error, Result};
use crate::fingerprint::fingerprint_stream;
use crate::path::RemotePath;
use crate::probe::require_digest;
use crate::traits::{ObjectStore, PutOptions};

/// A single-object transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferRequest {
    /// Local file to object
    Upload {
        local: PathBuf,
        remote: RemotePath,
        content_type: String,
        acl: String,
        dry_run: bool,
        /// Skip the change check and always transfer
        force: bool,
    },
    /// Object to local file
    Download {
        remote: RemotePath,
        local: PathBuf,
        /// Create the destination's parent directory
        mkdir_parents: bool,
        dry_run: bool,
        /// Skip the change check and always transfer
        force: bool,
    },
}

/// A failed check or transfer.
///
/// `record.changed` is always false here, so a failure is never reported
/// as a pending change; it says nothing about the state of either side.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct TransferError {
    /// Whatever was learned before the failure
    pub record: ChangeRecord,
    /// The cause
    pub source: Error,
}

impl TransferError {
    fn new(mut record: ChangeRecord, source: Error) -> Self {
        record.changed = false;
        Self { record, source }
    }
}

/// Execute a transfer request against a store
pub async fn execute(
    store: &dyn ObjectStore,
    request: &TransferRequest,
) -> std::result::Result<ChangeRecord, TransferError> {
    match request {
        TransferRequest::Upload {
            local,
            remote,
            content_type,
            acl,
            dry_run,
            force,
        } => {
            let mut record = check(store, local, remote, *force).await?;
            if !record.changed || *dry_run {
                return Ok(record);
            }

            match upload(store, local, remote, content_type, acl, &mut record).await {
                Ok(()) => Ok(record),
                Err(e) => Err(TransferError::new(record, e)),
            }
        }
        TransferRequest::Download {
            remote,
            local,
            mkdir_parents,
            dry_run,
            force,
        } => {
            let mut record = check(store, local, remote, *force).await?;
            if !record.changed || *dry_run {
                return Ok(record);
            }

            match download(store, remote, local, *mkdir_parents, &mut record).await {
                Ok(()) => Ok(record),
                Err(e) => Err(TransferError::new(record, e)),
            }
        }
    }
}

async fn check(
    store: &dyn ObjectStore,
    local: &Path,
    remote: &RemotePath,
    force: bool,
) -> std::result::Result<ChangeRecord, TransferError> {
    if force {
        return Ok(ChangeRecord::absent());
    }

    detect_change(store, local, remote)
        .await
        .map_err(|e| TransferError::new(ChangeRecord::default(), e))
}

async fn upload(
    store: &dyn ObjectStore,
    local: &Path,
    remote: &RemotePath,
    content_type: &str,
    acl: &str,
    record: &mut ChangeRecord,
) -> Result<()> {
    let mut file = std::fs::File::open(local)?;

    let fingerprint = match record.local_fingerprint {
        Some(fp) => fp,
        None => {
            let (fp, size) = fingerprint_stream(&mut file)?;
            record.local_fingerprint = Some(fp);
            record.size = size;
            fp
        }
    };

    let options = PutOptions {
        content_type: content_type.to_string(),
        acl: acl.to_string(),
        content_md5: Some(fingerprint.to_base64()),
    };

    tracing::info!(local = %local.display(), %remote, size = record.size, "uploading");

    let receipt = store
        .put_object(remote, tokio::fs::File::from_std(file), options)
        .await?;
    let confirmed = require_digest(receipt.etag.as_deref(), remote)?;
    record.remote_fingerprint = Some(confirmed.clone());

    if !fingerprint.matches(&confirmed) {
        return Err(Error::VerificationMismatch {
            expected: fingerprint.to_hex(),
            actual: confirmed,
        });
    }

    Ok(())
}

// The written file is not re-hashed; the recorded digest is the store's.
async fn download(
    store: &dyn ObjectStore,
    remote: &RemotePath,
    local: &Path,
    mkdir_parents: bool,
    record: &mut ChangeRecord,
) -> Result<()> {
    if mkdir_parents {
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent).await?;
        }
    }

    let mut body = store.get_object(remote).await?;
    let fingerprint = require_digest(body.etag.as_deref(), remote)?;

    tracing::info!(%remote, local = %local.display(), size = ?body.size, "downloading");

    let (file, staged) = stage_beside(local)?.into_parts();
    let mut file = tokio::fs::File::from_std(file);
    let mut written = 0u64;
    while let Some(chunk) = body.chunks.try_next().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    // Dropping `staged` on an earlier return removes the partial download
    staged.persist(local).map_err(|e| Error::Io(e.error))?;

    record.size = written;
    record.remote_fingerprint = Some(fingerprint);
    Ok(())
}

/// Temporary file in the destination's directory, so persisting is a rename
fn stage_beside(local: &Path) -> io::Result<tempfile::NamedTempFile> {
    let dir = local
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut builder = tempfile::Builder::new();
    builder.prefix(".s3sum-").suffix(".part");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder.tempfile_in(dir)
}

/// Create a directory tree, tolerating a concurrent creator
async fn ensure_dir(dir: &Path) -> io::Result<()> {
    match tokio::fs::create_dir_all(dir).await {
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::traits::{MockObjectStore, ObjectBody, ObjectInfo, PutReceipt};
    use futures::stream::{self, StreamExt};
    use tempfile::TempDir;

    const HELLO_HEX: &str = "5d41402abc4b2a76b9719d911017c592";
    const HELLO_ETAG: &str = "\"5d41402abc4b2a76b9719d911017c592\"";

    fn upload_request(local: PathBuf, dry_run: bool) -> TransferRequest {
        TransferRequest::Upload {
            local,
            remote: RemotePath::new("bucket", "a.txt"),
            content_type: "text/plain".into(),
            acl: "private".into(),
            dry_run,
            force: false,
        }
    }

    fn download_request(local: PathBuf, dry_run: bool) -> TransferRequest {
        TransferRequest::Download {
            remote: RemotePath::new("bucket", "a.txt"),
            local,
            mkdir_parents: true,
            dry_run,
            force: false,
        }
    }

    fn expect_remote_absent(store: &mut MockObjectStore) {
        store
            .expect_probe_object()
            .times(1)
            .returning(|path| Err(Error::NotFound(path.to_string())));
    }

    fn expect_remote_etag(store: &mut MockObjectStore, etag: &'static str) {
        store.expect_probe_object().times(1).returning(move |path| {
            let mut info = ObjectInfo::file(&path.key, 5);
            info.etag = Some(etag.to_string());
            Ok(info)
        });
    }

    fn write_hello(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"hello").unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_new_object() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_absent(&mut store);
        store
            .expect_put_object()
            .withf(|path, _, options| {
                path.key == "a.txt"
                    && options.acl == "private"
                    && options.content_type == "text/plain"
                    && options.content_md5.as_deref() == Some("XUFAKrxLKna5cZ2REBfFkg==")
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(PutReceipt {
                    etag: Some(HELLO_ETAG.into()),
                })
            });

        let record = execute(&store, &upload_request(local, false)).await.unwrap();
        assert!(record.changed);
        assert_eq!(record.size, 5);
        assert_eq!(record.local_fingerprint.unwrap().to_hex(), HELLO_HEX);
        assert_eq!(record.remote_fingerprint.as_deref(), Some(HELLO_HEX));
    }

    #[tokio::test]
    async fn test_upload_unchanged_skips_put() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_etag(&mut store, HELLO_ETAG);
        store.expect_put_object().times(0);

        let record = execute(&store, &upload_request(local, false)).await.unwrap();
        assert!(!record.changed);
    }

    #[tokio::test]
    async fn test_upload_dry_run_skips_put() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_absent(&mut store);
        store.expect_put_object().times(0);

        let record = execute(&store, &upload_request(local, true)).await.unwrap();
        assert!(record.changed);
        assert!(record.remote_fingerprint.is_none());
    }

    #[tokio::test]
    async fn test_upload_confirmation_mismatch_fails() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_absent(&mut store);
        store.expect_put_object().times(1).returning(|_, _, _| {
            Ok(PutReceipt {
                etag: Some("\"00000000000000000000000000000000\"".into()),
            })
        });

        let err = execute(&store, &upload_request(local, false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::VerificationMismatch { .. }));
        assert!(!err.record.changed);
        assert_eq!(
            err.record.remote_fingerprint.as_deref(),
            Some("00000000000000000000000000000000")
        );
    }

    #[tokio::test]
    async fn test_upload_put_failure_clears_changed() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_absent(&mut store);
        store
            .expect_put_object()
            .returning(|_, _, _| Err(Error::Transport("broken pipe".into())));

        let err = execute(&store, &upload_request(local, false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::Transport(_)));
        assert!(!err.record.changed);
        assert!(err.record.local_fingerprint.is_some());
    }

    #[tokio::test]
    async fn test_upload_missing_local_fails_after_check() {
        let dir = TempDir::new().unwrap();
        let store = MockObjectStore::new();

        let err = execute(&store, &upload_request(dir.path().join("nope"), false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::Io(_)));
        assert!(!err.record.changed);
    }

    #[tokio::test]
    async fn test_upload_malformed_probe_attempts_no_transfer() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_etag(&mut store, "\"");
        store.expect_put_object().times(0);

        let err = execute(&store, &upload_request(local, false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::MalformedMetadata(_)));
        assert!(!err.record.changed);
    }

    #[tokio::test]
    async fn test_upload_force_skips_probe() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        store.expect_probe_object().times(0);
        store.expect_put_object().times(1).returning(|_, _, _| {
            Ok(PutReceipt {
                etag: Some(HELLO_ETAG.into()),
            })
        });

        let request = TransferRequest::Upload {
            local,
            remote: RemotePath::new("bucket", "a.txt"),
            content_type: "application/octet-stream".into(),
            acl: "private".into(),
            dry_run: false,
            force: true,
        };
        let record = execute(&store, &request).await.unwrap();
        assert!(record.changed);
        assert_eq!(record.size, 5);
        assert_eq!(record.local_fingerprint, Some(Fingerprint::of_bytes(b"hello")));
    }

    #[tokio::test]
    async fn test_download_new_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("nested/deeper/a.txt");
        let store = {
            let mut store = MockObjectStore::new();
            store.expect_get_object().times(1).returning(|_| {
                Ok(ObjectBody {
                    chunks: stream::iter(vec![Ok(b"hel".to_vec()), Ok(b"lo".to_vec())]).boxed(),
                    etag: Some(HELLO_ETAG.into()),
                    size: Some(5),
                })
            });
            store
        };

        let record = execute(&store, &download_request(local.clone(), false))
            .await
            .unwrap();
        assert!(record.changed);
        assert_eq!(record.size, 5);
        assert!(record.local_fingerprint.is_none());
        assert_eq!(record.remote_fingerprint.as_deref(), Some(HELLO_HEX));
        assert_eq!(std::fs::read(&local).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_download_unchanged_skips_get() {
        let dir = TempDir::new().unwrap();
        let local = write_hello(&dir);
        let mut store = MockObjectStore::new();
        expect_remote_etag(&mut store, HELLO_ETAG);
        store.expect_get_object().times(0);

        let record = execute(&store, &download_request(local, false))
            .await
            .unwrap();
        assert!(!record.changed);
    }

    #[tokio::test]
    async fn test_download_dry_run_leaves_local_untouched() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("a.txt");
        std::fs::write(&local, b"stale").unwrap();
        let mut store = MockObjectStore::new();
        expect_remote_etag(&mut store, HELLO_ETAG);
        store.expect_get_object().times(0);

        let record = execute(&store, &download_request(local.clone(), true))
            .await
            .unwrap();
        assert!(record.changed);
        assert_eq!(std::fs::read(&local).unwrap(), b"stale");
    }

    #[tokio::test]
    async fn test_download_overwrites_changed_file() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("a.txt");
        std::fs::write(&local, b"a much longer stale body").unwrap();
        let mut store = MockObjectStore::new();
        expect_remote_etag(&mut store, HELLO_ETAG);
        store
            .expect_get_object()
            .times(1)
            .returning(|_| Ok(ObjectBody::from_bytes(b"hello".to_vec(), Some(HELLO_ETAG.into()))));

        let record = execute(&store, &download_request(local.clone(), false))
            .await
            .unwrap();
        assert!(record.changed);
        assert_eq!(std::fs::read(&local).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_download_stream_error_clears_changed() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("a.txt");
        let mut store = MockObjectStore::new();
        store.expect_get_object().returning(|_| {
            Ok(ObjectBody {
                chunks: stream::iter(vec![
                    Ok(b"hel".to_vec()),
                    Err(Error::Transport("reset".into())),
                ])
                .boxed(),
                etag: Some(HELLO_ETAG.into()),
                size: Some(5),
            })
        });

        let err = execute(&store, &download_request(local, false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::Transport(_)));
        assert!(!err.record.changed);
    }

    #[tokio::test]
    async fn test_download_stream_error_keeps_previous_copy() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("a.txt");
        std::fs::write(&local, b"stale").unwrap();

        let mut store = MockObjectStore::new();
        expect_remote_etag(&mut store, HELLO_ETAG);
        store.expect_get_object().returning(|_| {
            Ok(ObjectBody {
                chunks: stream::iter(vec![
                    Ok(b"hel".to_vec()),
                    Err(Error::Transport("reset".into())),
                ])
                .boxed(),
                etag: Some(HELLO_ETAG.into()),
                size: Some(5),
            })
        });

        let err = execute(&store, &download_request(local.clone(), false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::Transport(_)));
        assert_eq!(std::fs::read(&local).unwrap(), b"stale");

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[tokio::test]
    async fn test_download_malformed_token_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let local = dir.path().join("a.txt");
        let mut store = MockObjectStore::new();
        store
            .expect_get_object()
            .returning(|_| Ok(ObjectBody::from_bytes(b"hello".to_vec(), Some("x".into()))));

        let err = execute(&store, &download_request(local.clone(), false))
            .await
            .unwrap_err();
        assert!(matches!(err.source, Error::MalformedMetadata(_)));
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("x/y");
        ensure_dir(&target).await.unwrap();
        ensure_dir(&target).await.unwrap();
        assert!(target.is_dir());
    }
}
