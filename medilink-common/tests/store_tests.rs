//! Record store behaviour over the SQLite slot backend

use medilink_common::codec;
use medilink_common::models::{Collection, Consultation, DoctorProfile, Profile};
use medilink_common::resolver;
use medilink_common::store::SlotStore;
use medilink_common::{Error, ProfileMutator, RecordStore, SqliteSlots};
use chrono::NaiveDate;
use std::sync::Arc;

fn rajesh() -> Profile {
    Profile {
        id: "MED-123456".to_string(),
        name: "Rajesh Kumar".to_string(),
        age: 32,
        native_state: "Bihar".to_string(),
        native_city: "Patna".to_string(),
        residing_city: "Chennai".to_string(),
        national_id: "1234-5678-9012".to_string(),
        dob: NaiveDate::from_ymd_opt(1992, 5, 15),
        contact_number: "9876543210".to_string(),
        mobile_number: "9876543210".to_string(),
        emergency_mobile_number: "9123456789".to_string(),
        blood_group: "O+".to_string(),
        medical_reports: Vec::new(),
        username: "rajesh".to_string(),
        password: "password123".to_string(),
        voice_note: None,
        revision: 0,
    }
}

async fn file_store(dir: &tempfile::TempDir) -> (Arc<SqliteSlots>, RecordStore) {
    let slots = Arc::new(SqliteSlots::open(&dir.path().join("nested/medilink.db")).await.unwrap());
    let store = RecordStore::new(slots.clone());
    (slots, store)
}

#[tokio::test]
async fn test_database_created_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested/medilink.db");
    assert!(!db_path.exists());

    let _ = file_store(&dir).await;
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_collections_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (_, store) = file_store(&dir).await;
        store.insert(rajesh()).await.unwrap();
    }

    let (_, store) = file_store(&dir).await;
    let profiles: Vec<Profile> = store.load().await.unwrap();
    assert_eq!(profiles, vec![rajesh()]);
}

#[tokio::test]
async fn test_round_trip_keeps_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = file_store(&dir).await;

    let consultations: Vec<Consultation> = (0..5)
        .map(|i| Consultation {
            id: format!("CNS-1000{}", i),
            doctor_id: "DOC-999".to_string(),
            doctor_name: "Dr. Sarah Wilson".to_string(),
            patient_id: "MED-123456".to_string(),
            patient_name: "Rajesh Kumar".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1 + i).unwrap(),
            patient_age: 32,
            diagnosis: format!("visit {}", i),
            cause_of_illness: String::new(),
            prescription: String::new(),
        })
        .collect();

    store.save(&consultations).await.unwrap();
    let loaded: Vec<Consultation> = store.load().await.unwrap();
    assert_eq!(loaded, consultations);
}

#[tokio::test]
async fn test_corrupt_slot_does_not_fail_caller() {
    let dir = tempfile::tempdir().unwrap();
    let (slots, store) = file_store(&dir).await;
    slots.put(Collection::Doctors.slot_key(), "not json at all").await.unwrap();

    let doctors: Vec<DoctorProfile> = store.load().await.unwrap();
    assert!(doctors.is_empty());
}

#[tokio::test]
async fn test_find_by_id_and_stripped_national_id() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = file_store(&dir).await;
    store.insert(rajesh()).await.unwrap();

    let profiles: Vec<Profile> = store.load().await.unwrap();
    let by_id = resolver::resolve(&profiles, "MED-123456").unwrap().unwrap();
    let by_national_id = resolver::resolve(&profiles, "123456789012").unwrap().unwrap();

    assert_eq!(by_id.name, "Rajesh Kumar");
    assert_eq!(by_id, by_national_id);
}

#[tokio::test]
async fn test_oversize_upload_leaves_serialized_form_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = file_store(&dir).await;
    let stored = store.insert(rajesh()).await.unwrap();
    let mutator = ProfileMutator::new(store.clone());

    let before = store.snapshot(Collection::Profiles).await.unwrap();
    let payload = vec![0u8; 2 * 1024 * 1024];
    let result = mutator.attach_upload(&stored, &payload, "application/pdf").await;

    assert!(matches!(result, Err(Error::OversizeInput { .. })));
    assert_eq!(store.snapshot(Collection::Profiles).await.unwrap(), before);
}

#[tokio::test]
async fn test_attachment_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = file_store(&dir).await;
    let mut current = store.insert(rajesh()).await.unwrap();
    let mutator = ProfileMutator::new(store.clone());

    let files: [&[u8]; 3] = [b"%PDF-1.4 first", b"second report", b"third report"];
    for bytes in files {
        current = mutator
            .attach_upload(&current, bytes, codec::detect_mime(bytes))
            .await
            .unwrap();
    }
    assert_eq!(current.medical_reports.len(), 3);

    let current = mutator.remove_attachment(&current, 1).await.unwrap();
    let profiles: Vec<Profile> = store.load().await.unwrap();
    let reports = &profiles[0].medical_reports;
    assert_eq!(reports.len(), 2);

    let first = codec::decode(&reports[0]).unwrap();
    let last = codec::decode(&reports[1]).unwrap();
    assert_eq!(first.mime_type, "application/pdf");
    assert_eq!(first.bytes, files[0]);
    assert_eq!(last.bytes, files[2]);
    assert_eq!(current.revision, 4);
}
