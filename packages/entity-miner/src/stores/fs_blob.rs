//! Filesystem blob store.
//!
//! Layout: `{root}/{bucket}/{key}` holds the body and
//! `{root}/{bucket}/{key}.meta.json` holds the user metadata.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use crate::error::{MinerError, Result};
use crate::traits::blob_store::{BlobObject, BlobStore};

const METADATA_SUFFIX: &str = ".meta.json";

pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve bucket and key under the root. Absolute paths and `..` are
    /// rejected.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let relative = Path::new(part);
            if part.is_empty()
                || relative
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(MinerError::InvalidArgument(format!(
                    "invalid bucket or key: {:?}",
                    part
                )));
            }
            path.push(relative);
        }
        Ok(path)
    }
}

fn metadata_path(object_path: &Path) -> PathBuf {
    let mut name = object_path.as_os_str().to_os_string();
    name.push(METADATA_SUFFIX);
    PathBuf::from(name)
}

fn io_error(e: std::io::Error) -> MinerError {
    MinerError::Storage(Box::new(e))
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<BlobObject>> {
        let path = self.object_path(bucket, key)?;

        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };

        let metadata: HashMap<String, String> =
            match tokio::fs::read_to_string(metadata_path(&path)).await {
                Ok(json) => serde_json::from_str(&json)?,
                Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
                Err(e) => return Err(io_error(e)),
            };

        Ok(Some(BlobObject { body, metadata }))
    }

    async fn put_object(&self, bucket: &str, key: &str, object: BlobObject) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        tokio::fs::write(&path, &object.body).await.map_err(io_error)?;
        let metadata = serde_json::to_vec_pretty(&object.metadata)?;
        tokio::fs::write(metadata_path(&path), metadata)
            .await
            .map_err(io_error)?;

        debug!(path = %path.display(), bytes = object.body.len(), "Stored blob");
        Ok(())
    }
}
