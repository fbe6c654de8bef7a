//! Content fingerprints
//!
//! A fingerprint is the MD5 digest of a byte sequence, the same algorithm S3
//! uses for the ETag of a single-part upload. Both text encodings (lowercase
//! hex for comparison, base64 for the `Content-MD5` header) are derived from
//! the one stored digest, so they can never disagree.

use std::io::{self, Read, Seek, SeekFrom};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use md5::{Digest, Md5};
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Digest length in bytes
pub const DIGEST_LEN: usize = 16;

/// MD5 content fingerprint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; DIGEST_LEN]);

impl Fingerprint {
    /// Fingerprint an in-memory buffer
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(Md5::digest(data).into())
    }

    /// Lowercase hexadecimal encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Standard (padded) base64 encoding
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Compare against a canonical remote digest
    pub fn matches(&self, digest: &str) -> bool {
        self.to_hex() == digest
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Fingerprint everything from the current position to end-of-stream.
///
/// Returns the fingerprint and the number of bytes hashed. The stream is
/// seeked back to where it was on entry whether or not hashing succeeded;
/// a read error takes precedence over a failure to restore the position.
pub fn fingerprint_stream<R>(reader: &mut R) -> Result<(Fingerprint, u64)>
where
    R: Read + Seek + ?Sized,
{
    let offset = reader.stream_position()?;
    let hashed = hash_to_end(reader);
    let restored = reader.seek(SeekFrom::Start(offset));

    let hashed = hashed?;
    restored?;
    Ok(hashed)
}

fn hash_to_end<R: Read + ?Sized>(reader: &mut R) -> io::Result<(Fingerprint, u64)> {
    let mut hasher = Md5::new();
    let size = io::copy(reader, &mut hasher)?;
    Ok((Fingerprint(hasher.finalize().into()), size))
}
