//! Upload bookkeeping and the re-mining guard.
//!
//! An uploaded story carries `username`, `last_modified` (RFC 3339) and
//! `story_text_hash`. The hash is the SHA-256 of the text as it was last
//! mined: uploads keep the previous value, and a successful mining run
//! records the new one.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::traits::blob_store::{metadata_keys, BlobObject};

/// Hex SHA-256 of a story body.
pub fn content_hash(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Whether an uploaded object should be mined.
///
/// Yes when the body differs from the last mined text, when the upload is
/// older than `staleness_window`, or when either record is missing.
pub fn should_mine(object: &BlobObject, now: DateTime<Utc>, staleness_window: Duration) -> bool {
    let Some(recorded) = object.metadata(metadata_keys::CONTENT_HASH) else {
        debug!("No recorded hash, mining");
        return true;
    };
    if recorded != content_hash(&object.body) {
        debug!("Story text changed since last mining");
        return true;
    }

    let last_modified = object
        .metadata(metadata_keys::LAST_MODIFIED)
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|ts| ts.with_timezone(&Utc));
    match last_modified {
        Some(ts) => ts < now - staleness_window,
        None => true,
    }
}

/// The object to store for a new upload.
///
/// The previous object's mined hash is carried over so an unchanged re-upload
/// is not mined again.
pub fn prepare_upload(
    text: &str,
    username: Option<&str>,
    previous: Option<&BlobObject>,
    now: DateTime<Utc>,
) -> BlobObject {
    let mut object =
        BlobObject::new(text).with_metadata(metadata_keys::LAST_MODIFIED, now.to_rfc3339());

    let username = username.or_else(|| previous.and_then(|p| p.metadata(metadata_keys::USERNAME)));
    if let Some(username) = username {
        object = object.with_metadata(metadata_keys::USERNAME, username);
    }
    if let Some(hash) = previous.and_then(|p| p.metadata(metadata_keys::CONTENT_HASH)) {
        object = object.with_metadata(metadata_keys::CONTENT_HASH, hash);
    }
    object
}

/// Record `mined_text` as the last mined text of the object.
///
/// The object's body may already be a newer upload than what was mined; it
/// then still reads as changed.
pub fn mark_mined(object: BlobObject, mined_text: &str) -> BlobObject {
    object.with_metadata(metadata_keys::CONTENT_HASH, content_hash(mined_text.as_bytes()))
}
