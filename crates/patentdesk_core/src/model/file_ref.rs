//! Uploaded file references and upload descriptors.
//!
//! # Responsibility
//! - Model the durable reference kept in a patent's file slot or an
//!   author's signature field.
//! - Carry enough metadata (size, MIME type, upload time) for display
//!   without touching the blob itself.
//!
//! # Invariants
//! - A `FileRef` is owned by exactly one slot of exactly one patent (or one
//!   author's signature field); it is never shared.
//! - `stored_name` is timestamp-prefixed and unique within its folder.

use serde::{Deserialize, Serialize};

/// Where the bytes of an uploaded file live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileContent {
    /// Durable object-store reference, as returned by the store's `put`.
    Url(String),
    /// Raw bytes embedded directly in the record. Used by the local
    /// embedded backend, which keeps no separate object store.
    Inline(Vec<u8>),
}

impl FileContent {
    /// Returns the object-store reference, when the content is not inline.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Inline(_) => None,
        }
    }
}

/// Reference to one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRef {
    /// Original display name as chosen by the uploader.
    pub name: String,
    /// Collision-safe stored name (`<epoch_ms>_<name>` or signature scheme).
    pub stored_name: String,
    /// Blob location or inline payload.
    pub content: FileContent,
    /// Payload size in bytes, after any compression.
    pub size: u64,
    /// MIME type, derived from the file name when not supplied.
    pub mime_type: String,
    /// Upload timestamp in epoch milliseconds.
    pub uploaded_at: i64,
}

/// Caller-supplied descriptor for a pending upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Original file name, including extension.
    pub name: String,
    /// File bytes.
    pub bytes: Vec<u8>,
    /// Explicit MIME type; guessed from `name` when `None`.
    pub mime_type: Option<String>,
}

impl FileUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            mime_type: None,
        }
    }

    /// Resolves the effective MIME type for this upload.
    pub fn resolved_mime(&self) -> String {
        match &self.mime_type {
            Some(mime) => mime.clone(),
            None => mime_guess::from_path(&self.name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }
}
