//! ObjectStore trait definition
//!
//! This trait is the small capability set the rest of the crate consumes
//! from an S3-compatible store. It keeps the change detector and transfer
//! executor independent of any SDK, and can be mocked for testing.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use jiff::Timestamp;
use serde::Serialize;

use crate::error::Result;
use crate::path::RemotePath;

/// Metadata for an object, prefix or bucket
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    /// Object key, prefix or bucket name
    pub key: String,

    /// Size in bytes (None for prefixes and buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Integrity token exactly as the store published it (quoted ETag)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a prefix or bucket
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size, humansize::BINARY)),
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a prefix or bucket
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: true,
        }
    }
}

/// One page of a list operation
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    /// Common prefixes first, then objects
    pub items: Vec<ObjectInfo>,

    /// Whether more items are available
    pub truncated: bool,

    /// Continuation token for the next page
    pub continuation_token: Option<String>,
}

/// Options for list operations
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Maximum number of keys to return per request
    pub max_keys: Option<i32>,

    /// Delimiter for grouping (defaults to "/")
    pub delimiter: Option<String>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,

    /// List every key under the prefix (ignore delimiter)
    pub recursive: bool,
}

/// Options for a single-object upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    /// Content-Type header
    pub content_type: String,

    /// Canned ACL, e.g. "private" or "public-read"
    pub acl: String,

    /// Base64 MD5 of the body, sent as Content-MD5
    pub content_md5: Option<String>,
}

/// Store response to a successful upload
#[derive(Debug, Clone, Default)]
pub struct PutReceipt {
    /// Integrity token of the stored object, as published (quoted ETag)
    pub etag: Option<String>,
}

/// Streamed object content
pub struct ObjectBody {
    /// Body chunks in order
    pub chunks: BoxStream<'static, Result<Vec<u8>>>,

    /// Integrity token as published (quoted ETag)
    pub etag: Option<String>,

    /// Content length reported by the store
    pub size: Option<u64>,
}

impl ObjectBody {
    /// Body backed by an in-memory buffer
    pub fn from_bytes(data: Vec<u8>, etag: Option<String>) -> Self {
        let size = data.len() as u64;
        Self {
            chunks: stream::once(async move { Ok(data) }).boxed(),
            etag,
            size: Some(size),
        }
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("etag", &self.etag)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Trait for S3-compatible storage operations
///
/// Implemented by the S3 adapter; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// List one page of objects under a prefix
    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult>;

    /// Fetch object metadata without its content
    ///
    /// Must return `Error::NotFound` when the object does not exist.
    async fn probe_object(&self, path: &RemotePath) -> Result<ObjectInfo>;

    /// Fetch object content
    async fn get_object(&self, path: &RemotePath) -> Result<ObjectBody>;

    /// Upload a local file as a single object
    async fn put_object(
        &self,
        path: &RemotePath,
        body: tokio::fs::File,
        options: PutOptions,
    ) -> Result<PutReceipt>;
}
