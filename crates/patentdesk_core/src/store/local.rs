//! Local embedded fallback store.
//!
//! # Responsibility
//! - Mirror the document store contract on top of per-key JSON files.
//! - Embed uploaded file bytes inline instead of using an object store.
//!
//! # Invariants
//! - Key layout: `patents`, `patent_<id>_details`, `patent_<id>_authors`,
//!   `patentCounter`.
//! - Ids are stringified values of a strictly increasing counter.
//! - Uploads above the hard ceiling fail with `FileTooLarge` and leave no
//!   stored reference.
//! - The per-document limit is the hosted store's constraint and does not
//!   apply here; inline payloads are bounded by the file ceiling alone.

use crate::model::author::Author;
use crate::model::file_ref::{FileContent, FileRef, FileUpload};
use crate::model::patent::{
    validate_title, NewPatent, Patent, PatentDetails, PatentPatch, PatentStatus,
    PatentValidationError,
};
use crate::model::position::PositionId;
use crate::model::ValidationError;
use crate::store::document::DocumentStore;
use crate::store::object::{signature_stored_name, timestamped_name};
use crate::store::transcode::{should_compress, ImageTranscoder, PassthroughTranscoder};
use crate::store::{now_epoch_ms, StoreConfig, StoreError, StoreResult};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// List entry holding the scalar patent fields; nested state lives in the
/// per-patent key files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredHead {
    id: String,
    title: String,
    status: PatentStatus,
    created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<i64>,
}

/// Document store over a directory of JSON key files, with inline file
/// embedding in place of an object store.
pub struct LocalPatentStore {
    root: PathBuf,
    config: StoreConfig,
    transcoder: Box<dyn ImageTranscoder>,
}

impl LocalPatentStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(root: impl Into<PathBuf>, config: StoreConfig) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            config,
            transcoder: Box::new(PassthroughTranscoder),
        })
    }

    /// Replaces the image transcoder used for oversized embedded images.
    pub fn with_transcoder(mut self, transcoder: Box<dyn ImageTranscoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Embeds an uploaded document as an inline file reference.
    pub fn embed_file(&self, upload: &FileUpload) -> StoreResult<FileRef> {
        let now = now_epoch_ms();
        let stored_name = timestamped_name(now, &upload.name);
        self.embed_payload(upload, stored_name, now)
    }

    /// Embeds a signature upload using the signature naming scheme.
    pub fn embed_signature(
        &self,
        position_id: PositionId,
        upload: &FileUpload,
    ) -> StoreResult<FileRef> {
        let now = now_epoch_ms();
        let stored_name = signature_stored_name(position_id, now, &upload.name);
        self.embed_payload(upload, stored_name, now)
    }

    fn embed_payload(
        &self,
        upload: &FileUpload,
        stored_name: String,
        now: i64,
    ) -> StoreResult<FileRef> {
        let raw_size = upload.bytes.len() as u64;
        if raw_size > self.config.max_file_bytes {
            return Err(StoreError::FileTooLarge {
                actual: raw_size,
                limit: self.config.max_file_bytes,
            });
        }

        let mime_type = upload.resolved_mime();
        let bytes = if should_compress(&mime_type, raw_size, &self.config.compression) {
            self.transcoder
                .transcode(&upload.bytes, &mime_type, &self.config.compression)?
        } else {
            upload.bytes.clone()
        };

        debug!(
            "event=file_embed module=store backend=local status=ok name={} size={}",
            upload.name,
            bytes.len()
        );
        Ok(FileRef {
            name: upload.name.clone(),
            stored_name,
            size: bytes.len() as u64,
            content: FileContent::Inline(bytes),
            mime_type,
            uploaded_at: now,
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let path = self.key_path(key);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = serde_json::from_str(&text).map_err(|err| {
            StoreError::InvalidData(format!("invalid JSON under key `{key}`: {err}"))
        })?;
        Ok(Some(value))
    }

    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let text = serde_json::to_string(value)?;
        fs::write(self.key_path(key), text)?;
        Ok(())
    }

    fn remove_key(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn load_heads(&self) -> StoreResult<Vec<StoredHead>> {
        Ok(self.read_key("patents")?.unwrap_or_default())
    }

    fn next_id(&self) -> StoreResult<String> {
        let counter: u64 = self.read_key("patentCounter")?.unwrap_or(0) + 1;
        self.write_key("patentCounter", &counter)?;
        Ok(counter.to_string())
    }

    fn compose(&self, head: StoredHead) -> StoreResult<Patent> {
        let mut details: PatentDetails = self
            .read_key(&format!("patent_{}_details", head.id))?
            .unwrap_or_default();
        details.authors = self
            .read_key::<BTreeMap<PositionId, Author>>(&format!("patent_{}_authors", head.id))?
            .unwrap_or_default();
        Ok(Patent {
            id: head.id,
            title: head.title,
            status: head.status,
            created_at: head.created_at,
            updated_at: head.updated_at,
            details,
        })
    }
}

impl DocumentStore for LocalPatentStore {
    fn list(&self) -> StoreResult<Vec<Patent>> {
        let mut heads = self.load_heads()?;
        heads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        heads
            .into_iter()
            .map(|head| self.compose(head))
            .collect()
    }

    fn get(&self, id: &str) -> StoreResult<Option<Patent>> {
        let head = self.load_heads()?.into_iter().find(|head| head.id == id);
        match head {
            Some(head) => Ok(Some(self.compose(head)?)),
            None => Ok(None),
        }
    }

    fn create(&self, new: &NewPatent) -> StoreResult<Patent> {
        let title = validate_title(&new.title)?;
        let mut heads = self.load_heads()?;
        if heads.iter().any(|head| head.title == title) {
            return Err(StoreError::Validation(ValidationError::Patent(
                PatentValidationError::DuplicateTitle(title),
            )));
        }

        let head = StoredHead {
            id: self.next_id()?,
            title,
            status: new.status,
            created_at: now_epoch_ms(),
            updated_at: None,
        };
        heads.push(head.clone());
        self.write_key("patents", &heads)?;

        debug!(
            "event=patent_create module=store backend=local status=ok id={}",
            head.id
        );
        self.compose(head)
    }

    fn update(&self, id: &str, patch: &PatentPatch) -> StoreResult<Patent> {
        let mut heads = self.load_heads()?;
        let index = heads
            .iter()
            .position(|head| head.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut patent = self.compose(heads[index].clone())?;
        if let Some(new_title) = &patch.title {
            let normalized = validate_title(new_title)?;
            if normalized != patent.title
                && heads.iter().any(|head| head.title == normalized)
            {
                return Err(StoreError::Validation(ValidationError::Patent(
                    PatentValidationError::DuplicateTitle(normalized),
                )));
            }
        }

        patch.apply(&mut patent);
        patent.title = validate_title(&patent.title)?;
        patent.updated_at = Some(now_epoch_ms());

        heads[index] = StoredHead {
            id: patent.id.clone(),
            title: patent.title.clone(),
            status: patent.status,
            created_at: patent.created_at,
            updated_at: patent.updated_at,
        };
        self.write_key("patents", &heads)?;
        self.write_key(
            &format!("patent_{id}_authors"),
            &patent.details.authors,
        )?;
        let mut stored_details = patent.details.clone();
        stored_details.authors = BTreeMap::new();
        self.write_key(&format!("patent_{id}_details"), &stored_details)?;

        Ok(patent)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        let mut heads = self.load_heads()?;
        let before = heads.len();
        heads.retain(|head| head.id != id);
        if heads.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.write_key("patents", &heads)?;
        self.remove_key(&format!("patent_{id}_details"))?;
        self.remove_key(&format!("patent_{id}_authors"))?;
        debug!("event=patent_delete module=store backend=local status=ok id={id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::LocalPatentStore;
    use crate::model::file_ref::{FileContent, FileUpload};
    use crate::model::patent::{NewPatent, PatentPatch, PatentStatus};
    use crate::store::document::DocumentStore;
    use crate::store::transcode::ImageTranscoder;
    use crate::store::{CompressionSettings, StoreConfig, StoreError, StoreResult};

    struct HalvingTranscoder;

    impl ImageTranscoder for HalvingTranscoder {
        fn transcode(
            &self,
            bytes: &[u8],
            _mime_type: &str,
            _settings: &CompressionSettings,
        ) -> StoreResult<Vec<u8>> {
            Ok(bytes[..bytes.len() / 2].to_vec())
        }
    }

    fn store_in(dir: &std::path::Path) -> LocalPatentStore {
        LocalPatentStore::open(dir, StoreConfig::default()).unwrap()
    }

    #[test]
    fn counter_ids_increase_and_key_files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let first = store
            .create(&NewPatent {
                title: "Chair Design".to_string(),
                status: PatentStatus::UnderBooking,
            })
            .unwrap();
        let second = store
            .create(&NewPatent {
                title: "Lamp Design".to_string(),
                status: PatentStatus::Booking,
            })
            .unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert!(dir.path().join("patents.json").exists());
        assert!(dir.path().join("patentCounter.json").exists());

        store
            .update(&first.id, &PatentPatch::status(PatentStatus::Filed))
            .unwrap();
        assert!(dir.path().join("patent_1_details.json").exists());
        assert!(dir.path().join("patent_1_authors.json").exists());

        let reloaded = store.get(&first.id).unwrap().unwrap();
        assert_eq!(reloaded.status, PatentStatus::Filed);
        assert_eq!(reloaded.title, "Chair Design");
    }

    #[test]
    fn delete_removes_per_patent_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let patent = store
            .create(&NewPatent {
                title: "Chair Design".to_string(),
                status: PatentStatus::UnderBooking,
            })
            .unwrap();
        store
            .update(&patent.id, &PatentPatch::status(PatentStatus::Filed))
            .unwrap();

        store.delete(&patent.id).unwrap();
        assert!(store.get(&patent.id).unwrap().is_none());
        assert!(!dir.path().join("patent_1_details.json").exists());
        assert!(!dir.path().join("patent_1_authors.json").exists());
        assert!(matches!(
            store.delete(&patent.id).unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[test]
    fn embed_applies_ceiling_and_compression_gate() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            max_file_bytes: 1000,
            compression: CompressionSettings {
                image_threshold_bytes: 100,
                ..CompressionSettings::default()
            },
            ..StoreConfig::default()
        };
        let store = LocalPatentStore::open(dir.path(), config)
            .unwrap()
            .with_transcoder(Box::new(HalvingTranscoder));

        let oversized = FileUpload::new("big.pdf", vec![0u8; 1001]);
        assert!(matches!(
            store.embed_file(&oversized).unwrap_err(),
            StoreError::FileTooLarge { actual: 1001, limit: 1000 }
        ));

        let large_image = FileUpload::new("photo.jpg", vec![0u8; 400]);
        let embedded = store.embed_file(&large_image).unwrap();
        assert_eq!(embedded.size, 200);
        assert!(matches!(embedded.content, FileContent::Inline(ref b) if b.len() == 200));

        let small_image = FileUpload::new("icon.png", vec![0u8; 50]);
        assert_eq!(store.embed_file(&small_image).unwrap().size, 50);

        let document = FileUpload::new("spec.pdf", vec![0u8; 400]);
        assert_eq!(store.embed_file(&document).unwrap().size, 400);
    }

    #[test]
    fn pass_through_documents_embed_past_the_hosted_document_limit() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            max_document_bytes: 1024,
            ..StoreConfig::default()
        };
        let store = LocalPatentStore::open(dir.path(), config).unwrap();
        let patent = store
            .create(&NewPatent {
                title: "Chair Design".to_string(),
                status: PatentStatus::UnderBooking,
            })
            .unwrap();

        // Inline payloads answer to the file ceiling, not the hosted
        // store's per-document limit.
        let upload = FileUpload::new("dossier.pdf", vec![7u8; 64 * 1024]);
        let embedded = store.embed_file(&upload).unwrap();
        assert_eq!(embedded.size, 64 * 1024);

        let mut patch = PatentPatch::default();
        patch
            .slots
            .insert(crate::model::patent::FileSlot::Doc1, Some(embedded));
        let updated = store.update(&patent.id, &patch).unwrap();

        let stored = updated.details.doc1.as_ref().unwrap();
        assert!(matches!(stored.content, FileContent::Inline(ref b) if b.len() == 64 * 1024));
        let reloaded = store.get(&patent.id).unwrap().unwrap();
        assert_eq!(reloaded.details.doc1, updated.details.doc1);
    }
}
