//! s3sum-core: Core library for the s3sum S3 client
//!
//! This crate provides the parts of s3sum that do not depend on an S3 SDK:
//! - Content fingerprints and remote integrity token parsing
//! - Change detection between a local file and a remote object
//! - Upload/download execution with post-transfer verification
//! - Status and exit code mapping
//! - Configuration and path parsing
//! - The ObjectStore trait the S3 adapter implements

pub mod config;
pub mod detect;
pub mod error;
pub mod fingerprint;
pub mod path;
pub mod probe;
pub mod status;
pub mod traits;
pub mod transfer;

pub use config::{Config, ConfigManager, EndpointConfig, Overrides, Settings};
pub use detect::{ChangeRecord, detect_change};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, fingerprint_stream};
pub use path::{RemotePath, parse_remote};
pub use probe::{RemoteMeta, canonical_digest, probe_remote};
pub use status::{ExitCodes, Status};
pub use traits::{
    ListOptions, ListResult, ObjectBody, ObjectInfo, ObjectStore, PutOptions, PutReceipt,
};
pub use transfer::{TransferError, TransferRequest};
