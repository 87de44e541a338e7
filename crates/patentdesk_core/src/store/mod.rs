//! Persistence backends and their shared contracts.
//!
//! # Responsibility
//! - Define the document-store and object-store traits every backend
//!   implements.
//! - Own the store error taxonomy and the size/compression configuration.
//!
//! # Invariants
//! - Capacity checks fire before any partial write.
//! - Backends reject corrupt persisted state instead of masking it.

use crate::db::DbError;
use crate::model::patent::PatentId;
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod document;
pub mod fs_object;
pub mod local;
pub mod object;
pub mod sqlite;
pub mod transcode;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error taxonomy shared by every persistence backend.
#[derive(Debug)]
pub enum StoreError {
    /// Field validation failed; no store call was made.
    Validation(ValidationError),
    NotFound(PatentId),
    /// Serialized document exceeds the per-document store limit.
    DocumentTooLarge { actual: usize, limit: usize },
    /// Upload exceeds the configured file size ceiling.
    FileTooLarge { actual: u64, limit: u64 },
    /// Transport-level failure; eligible for one-shot local fallback.
    Unavailable(String),
    Db(DbError),
    Io(std::io::Error),
    Serde(serde_json::Error),
    /// Corrupt persisted state detected on a read path.
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "patent not found: {id}"),
            Self::DocumentTooLarge { actual, limit } => write!(
                f,
                "too much data: serialized record is {actual} bytes, store limit is {limit}"
            ),
            Self::FileTooLarge { actual, limit } => write!(
                f,
                "file is {actual} bytes, exceeding the {limit} byte ceiling"
            ),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Serde(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Serde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<crate::model::patent::PatentValidationError> for StoreError {
    fn from(value: crate::model::patent::PatentValidationError) -> Self {
        Self::Validation(ValidationError::Patent(value))
    }
}

impl From<crate::model::author::AuthorValidationError> for StoreError {
    fn from(value: crate::model::author::AuthorValidationError) -> Self {
        Self::Validation(ValidationError::Author(value))
    }
}

impl From<crate::model::position::PositionError> for StoreError {
    fn from(value: crate::model::position::PositionError) -> Self {
        Self::Validation(ValidationError::Position(value))
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Image downscale parameters applied by the local embedded backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionSettings {
    /// Image payloads above this size go through the transcoder.
    pub image_threshold_bytes: u64,
    /// Bounding dimension for downscaled images.
    pub max_dimension: u32,
    /// Lossy re-encode quality in `0.0..=1.0`.
    pub quality: f32,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            image_threshold_bytes: 512 * 1024,
            max_dimension: 800,
            quality: 0.7,
        }
    }
}

/// Size limits and compression parameters, injected at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Per-document serialized size limit of the backing document store.
    pub max_document_bytes: usize,
    /// Hard upload ceiling; larger files fail with `FileTooLarge`.
    pub max_file_bytes: u64,
    pub compression: CompressionSettings,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_document_bytes: 1024 * 1024,
            max_file_bytes: 50 * 1024 * 1024,
            compression: CompressionSettings::default(),
        }
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{now_epoch_ms, StoreConfig, StoreError};
    use crate::model::patent::PatentValidationError;

    #[test]
    fn default_config_matches_store_limits() {
        let config = StoreConfig::default();
        assert_eq!(config.max_document_bytes, 1024 * 1024);
        assert_eq!(config.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.compression.max_dimension, 800);
    }

    #[test]
    fn validation_errors_convert_into_store_errors() {
        let err: StoreError = PatentValidationError::EmptyTitle.into();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[test]
    fn now_epoch_ms_is_monotonic_enough() {
        let first = now_epoch_ms();
        let second = now_epoch_ms();
        assert!(second >= first);
        assert!(first > 1_500_000_000_000);
    }
}
