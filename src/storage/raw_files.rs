//! Raw upload storage
//!
//! The original file bytes are kept under a generated key. A storage failure
//! never blocks ingestion: the caller continues with a `local-only/` reference.

use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::types::OwnerId;

/// Sink for raw uploaded bytes
pub trait RawFileStore: Send + Sync {
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), RawStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RawStoreError {
    #[error("raw file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid raw file key: {0}")]
    InvalidKey(String),
}

/// Stores raw files as plain files under a root directory
#[derive(Debug, Clone)]
pub struct LocalRawFileStore {
    root: PathBuf,
}

impl LocalRawFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, RawStoreError> {
        let rel = Path::new(key);
        if key.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(RawStoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl RawFileStore for LocalRawFileStore {
    fn store(&self, key: &str, bytes: &[u8]) -> Result<(), RawStoreError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        debug!(key, bytes = bytes.len(), "Stored raw file");
        Ok(())
    }
}

/// Keep only characters safe in a single path segment.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload.las".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `las-files/{owner}/{millis}-{file}`
pub fn raw_file_key(owner: OwnerId, millis: i64, file_name: &str) -> String {
    format!("las-files/{}/{}-{}", owner, millis, sanitize_file_name(file_name))
}

/// `local-only/{millis}-{file}`: reference recorded when storage failed
pub fn fallback_key(millis: i64, file_name: &str) -> String {
    format!("local-only/{}-{}", millis, sanitize_file_name(file_name))
}

/// Store `bytes` and return the reference to record on the well.
///
/// Never fails; a storage error is logged and the fallback reference returned.
pub fn store_with_fallback(
    store: &dyn RawFileStore,
    owner: OwnerId,
    file_name: &str,
    bytes: &[u8],
) -> String {
    let millis = Utc::now().timestamp_millis();
    let key = raw_file_key(owner, millis, file_name);
    match store.store(&key, bytes) {
        Ok(()) => key,
        Err(e) => {
            let fallback = fallback_key(millis, file_name);
            warn!(
                owner,
                key = %key,
                "Raw file storage failed, continuing with {}: {}",
                fallback,
                e
            );
            fallback
        }
    }
}
