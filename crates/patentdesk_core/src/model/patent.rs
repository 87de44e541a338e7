//! Patent record model.
//!
//! # Responsibility
//! - Define the canonical patent document, its fixed file slots, and the
//!   partial-update patch applied by every backend.
//! - Validate titles, which double as the object-store folder root.
//!
//! # Invariants
//! - `title` is unique, trimmed and path-safe.
//! - Nested state (`positions`, `authors`, file slots) is replaced wholesale
//!   by a patch; callers wanting field-level merges must read-merge-write.
//! - Status transitions are unconstrained; any value may follow any value.

use crate::model::author::Author;
use crate::model::file_ref::FileRef;
use crate::model::position::{Position, PositionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned record identifier.
///
/// The SQLite backend assigns UUIDs; the local embedded backend assigns
/// stringified counter values. Kept as a string alias to cover both.
pub type PatentId = String;

const TITLE_MAX_CHARS: usize = 120;

/// Filing status of a patent. Free-form transitions, no workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatentStatus {
    #[serde(rename = "under-booking")]
    UnderBooking,
    #[serde(rename = "booking")]
    Booking,
    #[serde(rename = "under-file")]
    UnderFile,
    #[serde(rename = "filed")]
    Filed,
    #[serde(rename = "FER")]
    Fer,
    #[serde(rename = "SER")]
    Ser,
    #[serde(rename = "grant")]
    Grant,
    #[serde(rename = "cancel")]
    Cancel,
}

impl PatentStatus {
    /// Canonical wire value for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnderBooking => "under-booking",
            Self::Booking => "booking",
            Self::UnderFile => "under-file",
            Self::Filed => "filed",
            Self::Fer => "FER",
            Self::Ser => "SER",
            Self::Grant => "grant",
            Self::Cancel => "cancel",
        }
    }

    /// Parses a status value leniently: case-insensitive, spaces accepted
    /// in place of hyphens.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace(' ', "-");
        match normalized.as_str() {
            "under-booking" => Some(Self::UnderBooking),
            "booking" => Some(Self::Booking),
            "under-file" => Some(Self::UnderFile),
            "filed" => Some(Self::Filed),
            "fer" => Some(Self::Fer),
            "ser" => Some(Self::Ser),
            "grant" => Some(Self::Grant),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Fixed logical file categories a patent may hold one upload for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileSlot {
    Form1,
    Form21,
    Form21Stamp,
    RepresentationSheet,
    Doc1,
    Doc2,
    Doc3,
}

impl FileSlot {
    pub const ALL: [FileSlot; 7] = [
        FileSlot::Form1,
        FileSlot::Form21,
        FileSlot::Form21Stamp,
        FileSlot::RepresentationSheet,
        FileSlot::Doc1,
        FileSlot::Doc2,
        FileSlot::Doc3,
    ];

    /// Wire/storage-folder name of this slot.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Form1 => "form1",
            Self::Form21 => "form21",
            Self::Form21Stamp => "form21Stamp",
            Self::RepresentationSheet => "representationSheet",
            Self::Doc1 => "doc1",
            Self::Doc2 => "doc2",
            Self::Doc3 => "doc3",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "form1" => Some(Self::Form1),
            "form21" => Some(Self::Form21),
            "form21Stamp" => Some(Self::Form21Stamp),
            "representationSheet" => Some(Self::RepresentationSheet),
            "doc1" => Some(Self::Doc1),
            "doc2" => Some(Self::Doc2),
            "doc3" => Some(Self::Doc3),
            _ => None,
        }
    }
}

/// Nested document payload: file slots, positions and the author map.
///
/// Serialized as one blob by the SQLite backend (`details` column) and as
/// per-patent key files by the local backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatentDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form1: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form21: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form21_stamp: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation_sheet: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc1: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc2: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc3: Option<FileRef>,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub authors: BTreeMap<PositionId, Author>,
}

impl PatentDetails {
    pub fn slot(&self, slot: FileSlot) -> Option<&FileRef> {
        match slot {
            FileSlot::Form1 => self.form1.as_ref(),
            FileSlot::Form21 => self.form21.as_ref(),
            FileSlot::Form21Stamp => self.form21_stamp.as_ref(),
            FileSlot::RepresentationSheet => self.representation_sheet.as_ref(),
            FileSlot::Doc1 => self.doc1.as_ref(),
            FileSlot::Doc2 => self.doc2.as_ref(),
            FileSlot::Doc3 => self.doc3.as_ref(),
        }
    }

    /// Replaces a slot's file, returning the previous reference.
    pub fn set_slot(&mut self, slot: FileSlot, file: Option<FileRef>) -> Option<FileRef> {
        let target = match slot {
            FileSlot::Form1 => &mut self.form1,
            FileSlot::Form21 => &mut self.form21,
            FileSlot::Form21Stamp => &mut self.form21_stamp,
            FileSlot::RepresentationSheet => &mut self.representation_sheet,
            FileSlot::Doc1 => &mut self.doc1,
            FileSlot::Doc2 => &mut self.doc2,
            FileSlot::Doc3 => &mut self.doc3,
        };
        std::mem::replace(target, file)
    }
}

/// Canonical patent document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patent {
    pub id: PatentId,
    pub title: String,
    pub status: PatentStatus,
    /// Creation timestamp in epoch milliseconds; list ordering key.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub details: PatentDetails,
}

/// Fields required to create a patent record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPatent {
    pub title: String,
    pub status: PatentStatus,
}

/// Shallow-merge partial update.
///
/// Absent fields are left untouched. Present nested collections replace the
/// stored value wholesale. Slot entries mapped to `None` clear the slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatentPatch {
    pub title: Option<String>,
    pub status: Option<PatentStatus>,
    pub slots: BTreeMap<FileSlot, Option<FileRef>>,
    pub positions: Option<Vec<Position>>,
    pub authors: Option<BTreeMap<PositionId, Author>>,
}

impl PatentPatch {
    pub fn status(status: PatentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn slot(slot: FileSlot, file: Option<FileRef>) -> Self {
        let mut patch = Self::default();
        patch.slots.insert(slot, file);
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.slots.is_empty()
            && self.positions.is_none()
            && self.authors.is_none()
    }

    /// Merges this patch into `patent`. Does not touch timestamps; the
    /// store owns `updated_at`.
    pub fn apply(&self, patent: &mut Patent) {
        if let Some(title) = &self.title {
            patent.title = title.clone();
        }
        if let Some(status) = self.status {
            patent.status = status;
        }
        for (slot, file) in &self.slots {
            patent.details.set_slot(*slot, file.clone());
        }
        if let Some(positions) = &self.positions {
            patent.details.positions = positions.clone();
        }
        if let Some(authors) = &self.authors {
            patent.details.authors = authors.clone();
        }
    }
}

/// Validates and normalizes a patent title.
///
/// The title doubles as the object-store folder root, so it must be safe to
/// use as a single path segment.
pub fn validate_title(title: &str) -> Result<String, PatentValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(PatentValidationError::EmptyTitle);
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(PatentValidationError::UnsafeTitle("title is too long"));
    }
    if trimmed.contains('\0') {
        return Err(PatentValidationError::UnsafeTitle(
            "title must not contain null bytes",
        ));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(PatentValidationError::UnsafeTitle(
            "title must not contain control characters",
        ));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(PatentValidationError::UnsafeTitle(
            "title must not contain path separators",
        ));
    }
    if trimmed.starts_with('.') || trimmed.contains("..") {
        return Err(PatentValidationError::UnsafeTitle(
            "title must not contain dot path patterns",
        ));
    }
    Ok(trimmed.to_string())
}

/// Validation failure for patent-level fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatentValidationError {
    EmptyTitle,
    UnsafeTitle(&'static str),
    DuplicateTitle(String),
}

impl Display for PatentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "patent title is required"),
            Self::UnsafeTitle(reason) => write!(f, "{reason}"),
            Self::DuplicateTitle(title) => {
                write!(f, "a patent titled `{title}` already exists")
            }
        }
    }
}

impl Error for PatentValidationError {}
