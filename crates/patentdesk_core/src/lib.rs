//! Core persistence logic for PatentDesk.
//! This crate is the single source of truth for record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::author::{validate_email, validate_mobile, Author, AuthorValidationError};
pub use model::file_ref::{FileContent, FileRef, FileUpload};
pub use model::patent::{
    validate_title, FileSlot, NewPatent, Patent, PatentDetails, PatentId, PatentPatch,
    PatentStatus, PatentValidationError,
};
pub use model::position::{
    build_positions_view, Position, PositionBoard, PositionError, PositionId, PositionView,
};
pub use repo::{filter_patents, Backend, BackendKind, PatentRepository, PatentWithDetails, Saved};
pub use store::document::DocumentStore;
pub use store::fs_object::FsObjectStore;
pub use store::local::LocalPatentStore;
pub use store::object::{ObjectStore, StoredObject};
pub use store::sqlite::SqlitePatentStore;
pub use store::{CompressionSettings, StoreConfig, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
