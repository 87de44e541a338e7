//! Filesystem-backed object store.
//!
//! # Responsibility
//! - Store uploaded blobs under a root directory using the
//!   `<title>/<folder>/<stored_name>` layout.
//! - Honor the best-effort delete contract.
//!
//! # Invariants
//! - References never escape the root (no traversal segments).
//! - Deleting an absent blob or folder is success.

use crate::store::object::{ObjectStore, StoredObject};
use crate::store::{now_epoch_ms, StoreError, StoreResult};
use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Object store rooted at a local directory.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Opens (and creates if needed) the store root.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> StoreResult<PathBuf> {
        if reference.is_empty()
            || reference.starts_with('/')
            || reference
                .split('/')
                .any(|segment| segment.is_empty() || segment == "..")
        {
            return Err(StoreError::InvalidData(format!(
                "unsafe object reference `{reference}`"
            )));
        }
        Ok(self.root.join(reference))
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, bytes: &[u8], logical_path: &str, mime_type: &str) -> StoreResult<StoredObject> {
        let target = self.resolve(logical_path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;

        let stored_name = logical_path
            .rsplit('/')
            .next()
            .unwrap_or(logical_path)
            .to_string();
        debug!(
            "event=object_put module=store backend=fs status=ok path={logical_path} size={}",
            bytes.len()
        );
        Ok(StoredObject {
            stored_name,
            url: logical_path.to_string(),
            size: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            uploaded_at: now_epoch_ms(),
        })
    }

    fn delete(&self, reference: &str) -> StoreResult<()> {
        let target = self.resolve(reference)?;
        match fs::remove_file(target) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("event=object_delete module=store backend=fs status=ok path={reference} outcome=absent");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn delete_folder(&self, folder: &str) -> StoreResult<()> {
        let target = self.resolve(folder)?;
        match fs::remove_dir_all(target) {
            Ok(()) => {
                debug!("event=folder_delete module=store backend=fs status=ok folder={folder}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
