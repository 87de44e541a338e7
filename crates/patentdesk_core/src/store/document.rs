//! Document store contract.
//!
//! # Responsibility
//! - Define the uniform CRUD surface every document backend implements.
//! - Provide the shared per-document capacity guard.
//!
//! # Invariants
//! - `list` orders by `created_at` descending.
//! - `update` performs a shallow merge and sets `updated_at`.
//! - Capacity violations abort before any write.

use crate::model::patent::{NewPatent, Patent, PatentDetails, PatentPatch};
use crate::store::{StoreError, StoreResult};

/// Uniform create/read/update/delete/list surface over a patent collection.
pub trait DocumentStore {
    /// Lists all patents, newest first.
    fn list(&self) -> StoreResult<Vec<Patent>>;
    /// Gets one patent by id.
    fn get(&self, id: &str) -> StoreResult<Option<Patent>>;
    /// Creates a record with a store-assigned id and creation timestamp.
    fn create(&self, new: &NewPatent) -> StoreResult<Patent>;
    /// Shallow-merges `patch` into the stored record and stamps
    /// `updated_at`. Fails with `NotFound` when the id is absent.
    fn update(&self, id: &str, patch: &PatentPatch) -> StoreResult<Patent>;
    /// Removes the record.
    fn delete(&self, id: &str) -> StoreResult<()>;
}

/// Serializes the nested payload and enforces the per-document size limit.
///
/// Returns the serialized form so callers can persist it without
/// re-serializing.
pub fn serialize_details_checked(
    details: &PatentDetails,
    limit: usize,
) -> StoreResult<String> {
    let serialized = serde_json::to_string(details)?;
    if serialized.len() > limit {
        return Err(StoreError::DocumentTooLarge {
            actual: serialized.len(),
            limit,
        });
    }
    Ok(serialized)
}
