use patentdesk_core::db::open_db_in_memory;
use patentdesk_core::{
    Author, FileSlot, FileUpload, FsObjectStore, NewPatent, PatentRepository, PatentStatus,
    SqlitePatentStore, StoreConfig, StoreError,
};
use std::path::Path;

fn hosted_repo(objects_dir: &Path) -> PatentRepository {
    let conn = open_db_in_memory().unwrap();
    let documents = SqlitePatentStore::try_new(conn, StoreConfig::default()).unwrap();
    let objects = FsObjectStore::open(objects_dir).unwrap();
    PatentRepository::hosted(
        Box::new(documents),
        Box::new(objects),
        StoreConfig::default(),
    )
}

fn author(name: &str, amount: &str) -> Author {
    Author {
        full_name: name.to_string(),
        department: "Design".to_string(),
        designation: "Professor".to_string(),
        college: "NID".to_string(),
        email: "author@example.com".to_string(),
        mobile: "9876543210".to_string(),
        signature: None,
        amount: amount.to_string(),
        pending_amount: String::new(),
    }
}

#[test]
fn save_and_get_authors_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    repo.save_author(&patent.id, 1, &author("A. Kumar", "1500"))
        .unwrap();

    let authors = repo.get_authors(&patent.id).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[&1].full_name, "A. Kumar");
    assert_eq!(authors[&1].amount, "1500");
}

#[test]
fn get_authors_for_absent_patent_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    assert!(repo.get_authors("no-such-id").unwrap().is_empty());
}

#[test]
fn invalid_contact_fields_are_rejected_before_any_write() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    let mut bad_email = author("A. Kumar", "0");
    bad_email.email = "foo@bar".to_string();
    assert!(matches!(
        repo.save_author(&patent.id, 1, &bad_email).unwrap_err(),
        StoreError::Validation(_)
    ));

    let mut bad_mobile = author("A. Kumar", "0");
    bad_mobile.mobile = "12345".to_string();
    assert!(repo.save_author(&patent.id, 1, &bad_mobile).is_err());

    assert!(repo.get_authors(&patent.id).unwrap().is_empty());
}

#[test]
fn saving_the_same_position_replaces_the_entry_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    repo.save_author(&patent.id, 1, &author("A. Kumar", "1500"))
        .unwrap();
    let mut replacement = author("B. Singh", "900");
    replacement.department = String::new();
    repo.save_author(&patent.id, 1, &replacement).unwrap();

    let authors = repo.get_authors(&patent.id).unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[&1].full_name, "B. Singh");
    // The whole entry is replaced; fields absent from the second save do
    // not survive from the first.
    assert_eq!(authors[&1].department, "");

    // The last writer wins on the record as a whole; there is no
    // compare-and-swap on the author map.
    let positions = repo
        .get_patent_with_details(&patent.id)
        .unwrap()
        .unwrap()
        .positions;
    assert_eq!(
        positions[0].author.as_ref().unwrap().full_name,
        "B. Singh"
    );
}

#[test]
fn save_author_creates_the_position_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    repo.save_author(&patent.id, 3, &author("A. Kumar", "1500"))
        .unwrap();

    let details = repo.get_patent_with_details(&patent.id).unwrap().unwrap();
    let created = details.positions.iter().find(|p| p.id == 3).unwrap();
    assert_eq!(created.amount, "1500");
    assert_eq!(created.author.as_ref().unwrap().full_name, "A. Kumar");
}

#[test]
fn positions_grow_past_the_maximum_id_and_keep_the_last_one() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    let saved = repo.add_position(&patent.id).unwrap();
    let ids: Vec<u32> = saved
        .value
        .details
        .positions
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![1, 2]);

    repo.remove_position(&patent.id, 1).unwrap();
    let remaining = repo.get_patent(&patent.id).unwrap().unwrap();
    assert_eq!(remaining.details.positions.len(), 1);
    assert_eq!(remaining.details.positions[0].id, 2);

    let err = repo.remove_position(&patent.id, 2).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn removing_a_position_drops_its_author_entry() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    repo.add_position(&patent.id).unwrap();
    repo.save_author(&patent.id, 2, &author("A. Kumar", "1500"))
        .unwrap();
    repo.remove_position(&patent.id, 2).unwrap();

    assert!(repo.get_authors(&patent.id).unwrap().is_empty());
}

#[test]
fn amount_updates_sync_the_assigned_author() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    repo.save_author(&patent.id, 1, &author("A. Kumar", "1500"))
        .unwrap();
    let saved = repo
        .set_position_amounts(&patent.id, 1, "2000", "250")
        .unwrap();

    assert_eq!(saved.value.details.positions[0].amount, "2000");
    let authors = repo.get_authors(&patent.id).unwrap();
    assert_eq!(authors[&1].amount, "2000");
    assert_eq!(authors[&1].pending_amount, "250");
}

#[test]
fn amount_updates_without_an_author_touch_only_the_position() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());
    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;
    repo.add_position(&patent.id).unwrap();

    let saved = repo
        .set_position_amounts(&patent.id, 2, "500", "0")
        .unwrap();
    let position = saved
        .value
        .details
        .positions
        .iter()
        .find(|p| p.id == 2)
        .unwrap();
    assert_eq!(position.amount, "500");
    assert!(repo.get_authors(&patent.id).unwrap().is_empty());
}

#[test]
fn full_filing_lifecycle_ends_with_a_clean_cascade() {
    let dir = tempfile::tempdir().unwrap();
    let repo = hosted_repo(dir.path());

    let patent = repo
        .create_patent(&NewPatent {
            title: "Chair Design".to_string(),
            status: PatentStatus::UnderBooking,
        })
        .unwrap()
        .value;

    repo.add_position(&patent.id).unwrap();
    repo.save_author(&patent.id, 1, &author("A. Kumar", "1500"))
        .unwrap();
    repo.upload_file(
        &patent.id,
        FileSlot::Form1,
        &FileUpload::new("form1.pdf", b"form one".to_vec()),
    )
    .unwrap();
    repo.update_patent(
        &patent.id,
        &patentdesk_core::PatentPatch::status(PatentStatus::Filed),
    )
    .unwrap();

    let details = repo.get_patent_with_details(&patent.id).unwrap().unwrap();
    assert_eq!(details.patent.status, PatentStatus::Filed);
    assert_eq!(details.positions.len(), 2);
    assert!(details.patent.details.form1.is_some());
    assert!(dir.path().join("Chair Design").is_dir());

    repo.delete_patent(&patent.id).unwrap();
    assert!(repo.get_patent(&patent.id).unwrap().is_none());
    assert!(repo.get_authors(&patent.id).unwrap().is_empty());
    assert!(!dir.path().join("Chair Design").exists());
}
