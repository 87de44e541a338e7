//! Patent repository: one façade over the hosted and embedded backends.
//!
//! # Responsibility
//! - Route document and blob operations to the backend selected at
//!   construction.
//! - Perform the one-shot fallback to the embedded store when the primary
//!   backend reports itself unavailable.
//! - Keep the author map, the position list and the object store consistent
//!   across the multi-step operations (uploads, author saves, deletes).
//!
//! # Invariants
//! - Fallback happens at most once per operation and only on
//!   `StoreError::Unavailable`; every result carries the backend that
//!   actually persisted it.
//! - Blob cleanup failures degrade to warnings; record state wins.
//! - Author saves replace the position's entry wholesale and keep the
//!   denormalized `author_name` on the position list in sync.

use crate::model::author::Author;
use crate::model::file_ref::{FileContent, FileRef, FileUpload};
use crate::model::patent::{FileSlot, NewPatent, Patent, PatentPatch, PatentStatus};
use crate::model::position::{build_positions_view, PositionBoard, PositionId, PositionView};
use crate::store::document::DocumentStore;
use crate::store::local::LocalPatentStore;
use crate::store::object::{
    document_path, signature_path, signature_stored_name, timestamped_name, ObjectStore,
};
use crate::store::{now_epoch_ms, StoreConfig, StoreError, StoreResult};
use log::{info, warn};
use std::collections::BTreeMap;

/// Persistence backend selected once, at startup.
pub enum Backend {
    /// Remote-style pairing of a document store and an object store.
    Hosted {
        documents: Box<dyn DocumentStore>,
        objects: Box<dyn ObjectStore>,
    },
    /// Self-contained store embedding file payloads inline.
    Embedded(LocalPatentStore),
}

/// Which backend persisted the result of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hosted,
    Embedded,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Embedded => "embedded",
        }
    }
}

/// Operation result annotated with the persisting backend, so callers can
/// tell a normal save from a degraded save into the embedded fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct Saved<T> {
    pub value: T,
    pub backend: BackendKind,
}

impl<T> Saved<T> {
    pub fn fell_back(&self) -> bool {
        self.backend == BackendKind::Embedded
    }
}

/// A patent paired with its merged positions view.
#[derive(Debug, Clone, PartialEq)]
pub struct PatentWithDetails {
    pub patent: Patent,
    pub positions: Vec<PositionView>,
}

/// Façade every caller goes through for patent persistence.
pub struct PatentRepository {
    primary: Backend,
    fallback: Option<LocalPatentStore>,
    config: StoreConfig,
}

impl PatentRepository {
    /// Builds a repository over a hosted document/object store pair.
    pub fn hosted(
        documents: Box<dyn DocumentStore>,
        objects: Box<dyn ObjectStore>,
        config: StoreConfig,
    ) -> Self {
        Self {
            primary: Backend::Hosted { documents, objects },
            fallback: None,
            config,
        }
    }

    /// Builds a repository over the embedded store alone.
    pub fn embedded(store: LocalPatentStore, config: StoreConfig) -> Self {
        Self {
            primary: Backend::Embedded(store),
            fallback: None,
            config,
        }
    }

    /// Attaches an embedded store used when the primary is unavailable.
    pub fn with_fallback(mut self, fallback: LocalPatentStore) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn primary_documents(&self) -> (&dyn DocumentStore, BackendKind) {
        match &self.primary {
            Backend::Hosted { documents, .. } => (documents.as_ref(), BackendKind::Hosted),
            Backend::Embedded(store) => (store, BackendKind::Embedded),
        }
    }

    /// Runs a document operation against the primary backend, retrying once
    /// against the embedded fallback when the primary is unavailable.
    fn with_documents<T>(
        &self,
        op: &str,
        run: impl Fn(&dyn DocumentStore) -> StoreResult<T>,
    ) -> StoreResult<Saved<T>> {
        let (documents, kind) = self.primary_documents();
        match run(documents) {
            Ok(value) => Ok(Saved {
                value,
                backend: kind,
            }),
            Err(StoreError::Unavailable(reason)) => {
                let Some(local) = &self.fallback else {
                    return Err(StoreError::Unavailable(reason));
                };
                warn!(
                    "event={op} module=repo status=fallback backend=embedded reason={reason}"
                );
                let value = run(local)?;
                Ok(Saved {
                    value,
                    backend: BackendKind::Embedded,
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Lists all patents, newest first.
    pub fn list_patents(&self) -> StoreResult<Vec<Patent>> {
        Ok(self
            .with_documents("patent_list", |docs| docs.list())?
            .value)
    }

    /// Gets one patent by id.
    pub fn get_patent(&self, id: &str) -> StoreResult<Option<Patent>> {
        Ok(self
            .with_documents("patent_get", |docs| docs.get(id))?
            .value)
    }

    /// Gets one patent together with its merged positions view.
    pub fn get_patent_with_details(&self, id: &str) -> StoreResult<Option<PatentWithDetails>> {
        let Some(patent) = self.get_patent(id)? else {
            return Ok(None);
        };
        let positions = build_positions_view(&patent.details.positions, &patent.details.authors);
        Ok(Some(PatentWithDetails { patent, positions }))
    }

    /// Creates a patent record.
    pub fn create_patent(&self, new: &NewPatent) -> StoreResult<Saved<Patent>> {
        let saved = self.with_documents("patent_create", |docs| docs.create(new))?;
        info!(
            "event=patent_create module=repo status=ok id={} backend={}",
            saved.value.id,
            saved.backend.as_str()
        );
        Ok(saved)
    }

    /// Applies a shallow-merge patch to a patent record.
    pub fn update_patent(&self, id: &str, patch: &PatentPatch) -> StoreResult<Saved<Patent>> {
        self.with_documents("patent_update", |docs| docs.update(id, patch))
    }

    /// Deletes a patent record and, on the hosted backend, its blobs: every
    /// reference recorded on the record plus the title-keyed folder. The
    /// recorded references cover blobs stored under an earlier title.
    ///
    /// Blob cleanup is best-effort: a failing delete is logged and the
    /// record delete proceeds.
    pub fn delete_patent(&self, id: &str) -> StoreResult<Saved<()>> {
        if let Backend::Hosted { documents, objects } = &self.primary {
            match documents.get(id) {
                Ok(Some(patent)) => {
                    let slot_refs = FileSlot::ALL
                        .iter()
                        .filter_map(|&slot| patent.details.slot(slot));
                    let signature_refs = patent
                        .details
                        .authors
                        .values()
                        .filter_map(|author| author.signature.as_ref());
                    for reference in
                        slot_refs.chain(signature_refs).filter_map(|f| f.content.url())
                    {
                        if let Err(err) = objects.delete(reference) {
                            warn!(
                                "event=patent_delete module=repo status=degraded id={id} \
                                 reference={reference} error={err}"
                            );
                        }
                    }
                    if let Err(err) = objects.delete_folder(&patent.title) {
                        warn!(
                            "event=patent_delete module=repo status=degraded id={id} error={err}"
                        );
                    }
                }
                Ok(None) => {}
                // The record delete below hits the same backend and reports
                // the authoritative error.
                Err(StoreError::Unavailable(_)) => {}
                Err(err) => return Err(err),
            }
        }

        let saved = self.with_documents("patent_delete", |docs| docs.delete(id))?;
        info!(
            "event=patent_delete module=repo status=ok id={id} backend={}",
            saved.backend.as_str()
        );
        Ok(saved)
    }

    /// Creates or replaces the author entry for one position.
    ///
    /// The entry is replaced wholesale and the position list's denormalized
    /// `author_name` is kept in sync, creating the position when its id is
    /// not present yet.
    pub fn save_author(
        &self,
        patent_id: &str,
        position_id: PositionId,
        author: &Author,
    ) -> StoreResult<Saved<Patent>> {
        author.validate()?;
        self.with_documents("author_save", |docs| {
            let patent = docs
                .get(patent_id)?
                .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;

            let mut authors = patent.details.authors.clone();
            authors.insert(position_id, author.clone());
            let mut board = PositionBoard::from_positions(patent.details.positions.clone());
            board.assign_author(position_id, author);

            let patch = PatentPatch {
                positions: Some(board.into_positions()),
                authors: Some(authors),
                ..PatentPatch::default()
            };
            docs.update(patent_id, &patch)
        })
    }

    /// Returns the author map of a patent; an absent patent yields an empty
    /// map rather than an error.
    pub fn get_authors(&self, patent_id: &str) -> StoreResult<BTreeMap<PositionId, Author>> {
        Ok(self
            .get_patent(patent_id)?
            .map(|patent| patent.details.authors)
            .unwrap_or_default())
    }

    /// Adds a position slot to a patent.
    pub fn add_position(&self, patent_id: &str) -> StoreResult<Saved<Patent>> {
        self.with_documents("position_add", |docs| {
            let patent = docs
                .get(patent_id)?
                .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;
            let mut board = PositionBoard::from_positions(patent.details.positions.clone());
            board.add_position();
            let patch = PatentPatch {
                positions: Some(board.into_positions()),
                ..PatentPatch::default()
            };
            docs.update(patent_id, &patch)
        })
    }

    /// Removes a position slot; the last remaining position is kept.
    pub fn remove_position(
        &self,
        patent_id: &str,
        position_id: PositionId,
    ) -> StoreResult<Saved<Patent>> {
        self.with_documents("position_remove", |docs| {
            let patent = docs
                .get(patent_id)?
                .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;
            let mut board = PositionBoard::from_positions(patent.details.positions.clone());
            board.remove_position(position_id)?;
            let mut authors = patent.details.authors.clone();
            authors.remove(&position_id);
            let patch = PatentPatch {
                positions: Some(board.into_positions()),
                authors: Some(authors),
                ..PatentPatch::default()
            };
            docs.update(patent_id, &patch)
        })
    }

    /// Updates a position's amount fields.
    ///
    /// When the position has an assigned author, the author's amount fields
    /// are synced in a second, best-effort write: a failure there is logged
    /// and the position update still stands.
    pub fn set_position_amounts(
        &self,
        patent_id: &str,
        position_id: PositionId,
        amount: &str,
        pending_amount: &str,
    ) -> StoreResult<Saved<Patent>> {
        self.with_documents("position_amounts", |docs| {
            let patent = docs
                .get(patent_id)?
                .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;
            let mut board = PositionBoard::from_positions(patent.details.positions.clone());
            let has_author = board.set_amounts(position_id, amount, pending_amount)?;
            let patch = PatentPatch {
                positions: Some(board.into_positions()),
                ..PatentPatch::default()
            };
            let updated = docs.update(patent_id, &patch)?;

            if has_author && updated.details.authors.contains_key(&position_id) {
                let mut authors = updated.details.authors.clone();
                if let Some(entry) = authors.get_mut(&position_id) {
                    entry.amount = amount.to_string();
                    entry.pending_amount = pending_amount.to_string();
                }
                let author_patch = PatentPatch {
                    authors: Some(authors),
                    ..PatentPatch::default()
                };
                match docs.update(patent_id, &author_patch) {
                    Ok(synced) => return Ok(synced),
                    Err(err) => warn!(
                        "event=position_amounts module=repo status=degraded \
                         id={patent_id} position={position_id} error={err}"
                    ),
                }
            }
            Ok(updated)
        })
    }

    /// Uploads a file into one of the patent's fixed slots, replacing any
    /// previous upload.
    ///
    /// On the hosted backend the previous blob is released first
    /// (best-effort) and the new blob is stored under
    /// `<title>/<slot>/<stored_name>`. On the embedded backend the payload
    /// is compressed when eligible and embedded inline. An upload above the
    /// hard ceiling fails before anything is stored.
    pub fn upload_file(
        &self,
        patent_id: &str,
        slot: FileSlot,
        upload: &FileUpload,
    ) -> StoreResult<Saved<Patent>> {
        self.check_ceiling(upload)?;
        let result = match &self.primary {
            Backend::Hosted { documents, objects } => {
                self.upload_hosted(documents.as_ref(), objects.as_ref(), patent_id, slot, upload)
            }
            Backend::Embedded(store) => upload_into_local(store, patent_id, slot, upload)
                .map(|patent| Saved {
                    value: patent,
                    backend: BackendKind::Embedded,
                }),
        };

        match result {
            Err(StoreError::Unavailable(reason)) => {
                let Some(local) = &self.fallback else {
                    return Err(StoreError::Unavailable(reason));
                };
                warn!(
                    "event=file_upload module=repo status=fallback backend=embedded \
                     slot={} reason={reason}",
                    slot.as_str()
                );
                let patent = upload_into_local(local, patent_id, slot, upload)?;
                Ok(Saved {
                    value: patent,
                    backend: BackendKind::Embedded,
                })
            }
            other => other,
        }
    }

    fn upload_hosted(
        &self,
        documents: &dyn DocumentStore,
        objects: &dyn ObjectStore,
        patent_id: &str,
        slot: FileSlot,
        upload: &FileUpload,
    ) -> StoreResult<Saved<Patent>> {
        let patent = documents
            .get(patent_id)?
            .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;

        // Release the replaced blob before storing the new one; a failing
        // release is logged, not fatal.
        if let Some(previous) = patent.details.slot(slot) {
            if let Some(reference) = previous.content.url() {
                if let Err(err) = objects.delete(reference) {
                    warn!(
                        "event=file_upload module=repo status=degraded id={patent_id} \
                         slot={} error={err}",
                        slot.as_str()
                    );
                }
            }
        }

        let stored_name = timestamped_name(now_epoch_ms(), &upload.name);
        let path = document_path(&patent.title, slot, &stored_name);
        let stored = objects.put(&upload.bytes, &path, &upload.resolved_mime())?;
        let file = FileRef {
            name: upload.name.clone(),
            stored_name: stored.stored_name,
            content: FileContent::Url(stored.url),
            size: stored.size,
            mime_type: stored.mime_type,
            uploaded_at: stored.uploaded_at,
        };

        let updated = documents.update(patent_id, &PatentPatch::slot(slot, Some(file)))?;
        info!(
            "event=file_upload module=repo status=ok id={patent_id} slot={} size={}",
            slot.as_str(),
            upload.bytes.len()
        );
        Ok(Saved {
            value: updated,
            backend: BackendKind::Hosted,
        })
    }

    /// Clears a slot, releasing the hosted blob when one exists.
    pub fn clear_slot(&self, patent_id: &str, slot: FileSlot) -> StoreResult<Saved<Patent>> {
        if let Backend::Hosted { documents, objects } = &self.primary {
            if let Ok(Some(patent)) = documents.get(patent_id) {
                if let Some(reference) = patent.details.slot(slot).and_then(|f| f.content.url()) {
                    if let Err(err) = objects.delete(reference) {
                        warn!(
                            "event=slot_clear module=repo status=degraded id={patent_id} \
                             slot={} error={err}",
                            slot.as_str()
                        );
                    }
                }
            }
        }
        self.with_documents("slot_clear", |docs| {
            docs.update(patent_id, &PatentPatch::slot(slot, None))
        })
    }

    /// Stores a signature blob for one position and returns its reference.
    ///
    /// The patent record is not modified; callers attach the reference to an
    /// author via `save_author`.
    pub fn upload_signature(
        &self,
        patent_id: &str,
        position_id: PositionId,
        upload: &FileUpload,
    ) -> StoreResult<Saved<FileRef>> {
        self.check_ceiling(upload)?;
        let result = match &self.primary {
            Backend::Hosted { documents, objects } => {
                signature_hosted(documents.as_ref(), objects.as_ref(), patent_id, position_id, upload)
                    .map(|file| Saved {
                        value: file,
                        backend: BackendKind::Hosted,
                    })
            }
            Backend::Embedded(store) => store.embed_signature(position_id, upload).map(|file| {
                Saved {
                    value: file,
                    backend: BackendKind::Embedded,
                }
            }),
        };

        match result {
            Err(StoreError::Unavailable(reason)) => {
                let Some(local) = &self.fallback else {
                    return Err(StoreError::Unavailable(reason));
                };
                warn!(
                    "event=signature_upload module=repo status=fallback backend=embedded \
                     position={position_id} reason={reason}"
                );
                let file = local.embed_signature(position_id, upload)?;
                Ok(Saved {
                    value: file,
                    backend: BackendKind::Embedded,
                })
            }
            other => other,
        }
    }

    fn check_ceiling(&self, upload: &FileUpload) -> StoreResult<()> {
        let actual = upload.bytes.len() as u64;
        if actual > self.config.max_file_bytes {
            return Err(StoreError::FileTooLarge {
                actual,
                limit: self.config.max_file_bytes,
            });
        }
        Ok(())
    }
}

fn upload_into_local(
    store: &LocalPatentStore,
    patent_id: &str,
    slot: FileSlot,
    upload: &FileUpload,
) -> StoreResult<Patent> {
    store
        .get(patent_id)?
        .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;
    let file = store.embed_file(upload)?;
    store.update(patent_id, &PatentPatch::slot(slot, Some(file)))
}

fn signature_hosted(
    documents: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    patent_id: &str,
    position_id: PositionId,
    upload: &FileUpload,
) -> StoreResult<FileRef> {
    let patent = documents
        .get(patent_id)?
        .ok_or_else(|| StoreError::NotFound(patent_id.to_string()))?;

    let stored_name = signature_stored_name(position_id, now_epoch_ms(), &upload.name);
    let path = signature_path(&patent.title, &stored_name);
    let stored = objects.put(&upload.bytes, &path, &upload.resolved_mime())?;
    Ok(FileRef {
        name: upload.name.clone(),
        stored_name: stored.stored_name,
        content: FileContent::Url(stored.url),
        size: stored.size,
        mime_type: stored.mime_type,
        uploaded_at: stored.uploaded_at,
    })
}

/// Filters a patent list by status and a case-insensitive substring match
/// against the title or the status wire value.
pub fn filter_patents<'a>(
    patents: &'a [Patent],
    status: Option<PatentStatus>,
    query: &str,
) -> Vec<&'a Patent> {
    let needle = query.trim().to_lowercase();
    patents
        .iter()
        .filter(|patent| status.map_or(true, |wanted| patent.status == wanted))
        .filter(|patent| {
            needle.is_empty()
                || patent.title.to_lowercase().contains(&needle)
                || patent.status.as_str().to_lowercase().contains(&needle)
        })
        .collect()
}
