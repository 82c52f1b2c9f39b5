//! Blob store abstraction for images and videos, plus the download-URL scheme
//! shared by every backend.
//!
//! A stored object is reachable at `<base>/o/<percent-encoded key>?alt=media`;
//! [`key_for_url`] reverses that mapping so a document that only remembers
//! the URL can still free its object.

use crate::error::BlobError;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use url::Url;

pub mod fs;
pub mod memory;

pub use fs::FsBlobStore;
pub use memory::{BlobOp, InMemoryBlobStore};

/// A file-like payload: original file name, optional MIME type and the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(file_name: impl Into<String>, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    /// Strong entity tag (hex SHA-256 of the content).
    pub fn etag(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `blob` under `key` and returns the retrieval key.
    async fn upload(&self, key: &str, blob: &Blob) -> Result<String, BlobError>;

    /// Resolves a retrieval key to a fetchable URL. Fails with
    /// [`BlobError::NotFound`] if the object no longer exists.
    async fn resolve_url(&self, retrieval_key: &str) -> Result<String, BlobError>;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    async fn download(&self, key: &str) -> Result<Blob, BlobError>;

    /// Storage key behind `url`, if this store issued it.
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// Rejects empty keys, absolute keys and `..` segments.
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Public download URL for `key` under `base_url`.
pub fn download_url(base_url: &str, key: &str) -> Result<String, BlobError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| BlobError::Unavailable(format!("invalid base url '{}': {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| BlobError::Unavailable(format!("'{}' cannot be a base url", base_url)))?
        .pop_if_empty()
        .push("o")
        .push(key);
    url.set_query(Some("alt=media"));
    Ok(url.to_string())
}

/// Recovers the storage key from a download URL that [`download_url`]
/// produced for the same `base_url`. URLs on another origin or outside
/// `<base>/o/` belong to someone else and yield `None`.
pub fn key_for_url(base_url: &str, url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let url = Url::parse(url).ok()?;
    if url.origin() != base.origin() {
        return None;
    }

    let mut segments = url.path_segments()?;
    let prefix = base.path_segments()?.filter(|s| !s.is_empty()).chain(["o"]);
    for expected in prefix {
        if segments.next()? != expected {
            return None;
        }
    }
    let encoded = segments.next().filter(|s| !s.is_empty())?;
    if segments.next().is_some() || !escapes_are_well_formed(encoded) {
        return None;
    }

    let key = percent_decode_str(encoded).decode_utf8().ok()?.into_owned();
    validate_key(&key).ok()?;
    Some(key)
}

/// `percent_decode_str` passes stray `%` through untouched; a URL we issued never has one.
fn escapes_are_well_formed(encoded: &str) -> bool {
    encoded
        .split('%')
        .skip(1)
        .all(|rest| rest.len() >= 2 && rest.as_bytes()[..2].iter().all(u8::is_ascii_hexdigit))
}

/// Guesses a MIME type from the file extension.
pub fn content_type_for(name: &str) -> Option<&'static str> {
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    Some(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => return None,
    })
}
