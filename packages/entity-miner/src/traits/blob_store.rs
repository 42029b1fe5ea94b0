//! Blob storage for uploaded stories.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;

/// Metadata keys written alongside uploaded stories.
pub mod metadata_keys {
    pub const USERNAME: &str = "username";
    pub const LAST_MODIFIED: &str = "last_modified";
    pub const CONTENT_HASH: &str = "story_text_hash";
}

/// A stored object with its user metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub body: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

impl BlobObject {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Body decoded as UTF-8.
    pub fn text(&self) -> std::result::Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// Bucket/key addressed object storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch an object. `Ok(None)` when the key does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<BlobObject>>;

    /// Store an object, replacing any previous one.
    async fn put_object(&self, bucket: &str, key: &str, object: BlobObject) -> Result<()>;
}
