//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `patentdesk_core` wiring: open
//!   an in-memory store and run one create/list round trip.
//! - Keep output deterministic for quick local sanity checks.

use patentdesk_core::db::open_db_in_memory;
use patentdesk_core::{
    core_version, NewPatent, PatentRepository, PatentStatus, SqlitePatentStore, StoreConfig,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("patentdesk_core version={}", core_version());
    match smoke_round_trip() {
        Ok(title) => {
            println!("smoke=ok title={title}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("smoke=failed error={message}");
            ExitCode::FAILURE
        }
    }
}

fn smoke_round_trip() -> Result<String, String> {
    let conn = open_db_in_memory().map_err(|err| err.to_string())?;
    let store =
        SqlitePatentStore::try_new(conn, StoreConfig::default()).map_err(|err| err.to_string())?;
    let repo = PatentRepository::hosted(
        Box::new(store),
        Box::new(NullObjects),
        StoreConfig::default(),
    );

    repo.create_patent(&NewPatent {
        title: "Smoke Test Design".to_string(),
        status: PatentStatus::UnderBooking,
    })
    .map_err(|err| err.to_string())?;

    let patents = repo.list_patents().map_err(|err| err.to_string())?;
    patents
        .first()
        .map(|patent| patent.title.clone())
        .ok_or_else(|| "created patent missing from list".to_string())
}

/// Object store stub for the smoke probe; the round trip uploads nothing.
struct NullObjects;

impl patentdesk_core::ObjectStore for NullObjects {
    fn put(
        &self,
        _bytes: &[u8],
        _logical_path: &str,
        _mime_type: &str,
    ) -> patentdesk_core::StoreResult<patentdesk_core::StoredObject> {
        Err(patentdesk_core::StoreError::Unavailable(
            "smoke probe has no object store".to_string(),
        ))
    }

    fn delete(&self, _reference: &str) -> patentdesk_core::StoreResult<()> {
        Ok(())
    }

    fn delete_folder(&self, _folder: &str) -> patentdesk_core::StoreResult<()> {
        Ok(())
    }
}
