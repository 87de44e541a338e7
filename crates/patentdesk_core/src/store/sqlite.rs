//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist the patent collection in the `patents` table.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Write paths validate and size-check before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::model::patent::{
    validate_title, NewPatent, Patent, PatentDetails, PatentPatch, PatentStatus,
    PatentValidationError,
};
use crate::model::ValidationError;
use crate::store::document::{serialize_details_checked, DocumentStore};
use crate::store::{now_epoch_ms, StoreConfig, StoreError, StoreResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PATENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    status,
    created_at,
    updated_at,
    details
FROM patents";

const REQUIRED_COLUMNS: &[&str] = &["id", "title", "status", "created_at", "updated_at", "details"];

/// Document store over a migrated SQLite connection.
#[derive(Debug)]
pub struct SqlitePatentStore {
    conn: Connection,
    config: StoreConfig,
}

impl SqlitePatentStore {
    /// Constructs a store from a migrated connection, rejecting
    /// connections whose schema is missing or out of date.
    pub fn try_new(conn: Connection, config: StoreConfig) -> StoreResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self { conn, config })
    }

    fn title_taken(&self, title: &str, exclude_id: Option<&str>) -> StoreResult<bool> {
        let taken: i64 = match exclude_id {
            Some(id) => self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM patents WHERE title = ?1 AND id <> ?2);",
                params![title, id],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM patents WHERE title = ?1);",
                [title],
                |row| row.get(0),
            )?,
        };
        Ok(taken == 1)
    }
}

impl DocumentStore for SqlitePatentStore {
    fn list(&self) -> StoreResult<Vec<Patent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATENT_SELECT_SQL} ORDER BY created_at DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut patents = Vec::new();
        while let Some(row) = rows.next()? {
            patents.push(parse_patent_row(row)?);
        }
        Ok(patents)
    }

    fn get(&self, id: &str) -> StoreResult<Option<Patent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PATENT_SELECT_SQL} WHERE id = ?1;"))?;
        let patent = stmt
            .query_row([id], |row| Ok(parse_patent_row(row)))
            .optional()?
            .transpose()?;
        Ok(patent)
    }

    fn create(&self, new: &NewPatent) -> StoreResult<Patent> {
        let title = validate_title(&new.title)?;
        if self.title_taken(&title, None)? {
            return Err(StoreError::Validation(ValidationError::Patent(
                PatentValidationError::DuplicateTitle(title),
            )));
        }

        let patent = Patent {
            id: Uuid::new_v4().to_string(),
            title,
            status: new.status,
            created_at: now_epoch_ms(),
            updated_at: None,
            details: PatentDetails::default(),
        };
        let details = serialize_details_checked(&patent.details, self.config.max_document_bytes)?;

        self.conn.execute(
            "INSERT INTO patents (id, title, status, created_at, updated_at, details)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5);",
            params![
                patent.id,
                patent.title,
                patent.status.as_str(),
                patent.created_at,
                details,
            ],
        )?;

        debug!(
            "event=patent_create module=store backend=sqlite status=ok id={}",
            patent.id
        );
        Ok(patent)
    }

    fn update(&self, id: &str, patch: &PatentPatch) -> StoreResult<Patent> {
        let mut patent = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if let Some(new_title) = &patch.title {
            let normalized = validate_title(new_title)?;
            if normalized != patent.title && self.title_taken(&normalized, Some(id))? {
                return Err(StoreError::Validation(ValidationError::Patent(
                    PatentValidationError::DuplicateTitle(normalized),
                )));
            }
        }

        patch.apply(&mut patent);
        patent.title = validate_title(&patent.title)?;
        patent.updated_at = Some(now_epoch_ms());
        let details = serialize_details_checked(&patent.details, self.config.max_document_bytes)?;

        let changed = self.conn.execute(
            "UPDATE patents
             SET title = ?1, status = ?2, updated_at = ?3, details = ?4
             WHERE id = ?5;",
            params![
                patent.title,
                patent.status.as_str(),
                patent.updated_at,
                details,
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        Ok(patent)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM patents WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        debug!("event=patent_delete module=store backend=sqlite status=ok id={id}");
        Ok(())
    }
}

fn parse_patent_row(row: &Row<'_>) -> StoreResult<Patent> {
    let status_text: String = row.get("status")?;
    let status = PatentStatus::parse(&status_text).ok_or_else(|| {
        StoreError::InvalidData(format!("invalid status `{status_text}` in patents.status"))
    })?;

    let details_text: String = row.get("details")?;
    let details: PatentDetails = serde_json::from_str(&details_text).map_err(|err| {
        StoreError::InvalidData(format!("invalid details payload in patents.details: {err}"))
    })?;

    Ok(Patent {
        id: row.get("id")?,
        title: row.get("title")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        details,
    })
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected = latest_version();
    let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual != expected {
        return Err(StoreError::UninitializedConnection {
            expected_version: expected,
            actual_version: actual,
        });
    }

    if !table_exists(conn, "patents")? {
        return Err(StoreError::MissingRequiredTable("patents"));
    }
    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "patents", column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: "patents",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
