//! Repository façade over the persistence backends.

pub mod patent_repo;

pub use patent_repo::{
    filter_patents, Backend, BackendKind, PatentRepository, PatentWithDetails, Saved,
};
