//! Object store contract and logical path conventions.
//!
//! # Responsibility
//! - Define the blob put/delete surface backends implement.
//! - Build the title-rooted logical paths used for documents and
//!   signatures.
//!
//! # Invariants
//! - Stored names are timestamp-prefixed to avoid collisions.
//! - `delete` and `delete_folder` swallow not-found outcomes.

use crate::model::patent::FileSlot;
use crate::model::position::PositionId;
use crate::store::StoreResult;

/// Metadata returned for a stored blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Collision-safe name the blob was stored under.
    pub stored_name: String,
    /// Durable reference accepted by `delete`.
    pub url: String,
    pub size: u64,
    pub mime_type: String,
    pub uploaded_at: i64,
}

/// Blob storage surface keyed by logical path.
pub trait ObjectStore {
    /// Stores `bytes` under `logical_path` and returns its reference.
    fn put(&self, bytes: &[u8], logical_path: &str, mime_type: &str) -> StoreResult<StoredObject>;
    /// Best-effort removal; absent blobs are treated as success.
    fn delete(&self, reference: &str) -> StoreResult<()>;
    /// Removes a whole folder subtree; an absent folder is success.
    fn delete_folder(&self, folder: &str) -> StoreResult<()>;
}

/// Prefixes `original` with a wall-clock timestamp.
pub fn timestamped_name(now_ms: i64, original: &str) -> String {
    format!("{now_ms}_{original}")
}

/// Logical path for a document upload: `<title>/<slot>/<stored_name>`.
pub fn document_path(title: &str, slot: FileSlot, stored_name: &str) -> String {
    format!("{title}/{}/{stored_name}", slot.as_str())
}

/// Collision-safe stored name for a signature upload.
///
/// Keeps the original file extension, defaulting to `png` when absent.
pub fn signature_stored_name(
    position_id: PositionId,
    now_ms: i64,
    original_name: &str,
) -> String {
    let extension = original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("png");
    format!("signature_position_{position_id}_{now_ms}.{extension}")
}

/// Logical path for a signature: `<title>/signatures/<stored_name>`.
pub fn signature_path(title: &str, stored_name: &str) -> String {
    format!("{title}/signatures/{stored_name}")
}

#[cfg(test)]
mod tests {
    use super::{document_path, signature_path, signature_stored_name, timestamped_name};
    use crate::model::patent::FileSlot;

    #[test]
    fn document_paths_are_title_rooted() {
        let stored = timestamped_name(1_700_000_000_000, "form.pdf");
        assert_eq!(stored, "1700000000000_form.pdf");
        assert_eq!(
            document_path("Chair Design", FileSlot::Form21Stamp, &stored),
            "Chair Design/form21Stamp/1700000000000_form.pdf"
        );
    }

    #[test]
    fn signature_names_keep_the_extension() {
        assert_eq!(
            signature_stored_name(3, 99, "sign.jpeg"),
            "signature_position_3_99.jpeg"
        );
        assert_eq!(
            signature_stored_name(1, 99, "noextension"),
            "signature_position_1_99.png"
        );
        assert_eq!(
            signature_path("Chair Design", "signature_position_3_99.jpeg"),
            "Chair Design/signatures/signature_position_3_99.jpeg"
        );
    }
}
