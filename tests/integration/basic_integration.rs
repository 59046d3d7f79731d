/// Server construction and persistence across restarts
use dhikr_tracker_mcp::storage::{DhikrRepository, SettingsRepository};
use dhikr_tracker_mcp::*;
use tempfile::{NamedTempFile, TempDir};

#[tokio::test]
async fn test_new_database_is_seeded_once() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_file.path().to_path_buf();

    let server = DhikrTrackerServer::new(db_path.clone(), true)
        .await
        .expect("Failed to create server");
    let seeded = server.storage().list_dhikr(None, None).unwrap();
    assert_eq!(seeded.len(), 6);
    let settings_id = server.storage().get_or_create_settings().unwrap().id;
    drop(server);

    // Reopening keeps the data and does not seed again
    let server = DhikrTrackerServer::new(db_path, true)
        .await
        .expect("Failed to reopen server");
    assert_eq!(server.storage().list_dhikr(None, None).unwrap().len(), 6);
    assert_eq!(server.storage().get_or_create_settings().unwrap().id, settings_id);
}

#[tokio::test]
async fn test_seeding_can_be_disabled() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let server = DhikrTrackerServer::new(dir.path().join("dhikr.db"), false)
        .await
        .expect("Failed to create server");

    assert!(server.storage().list_dhikr(None, None).unwrap().is_empty());
}

#[test]
fn test_records_survive_reopening_the_store() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path().to_path_buf();

    let created = {
        let storage = SqliteStorage::new(path.clone()).expect("Failed to create storage");
        storage
            .create_dhikr(&NewDhikr::new("لَا حَوْلَ وَلَا قُوَّةَ إِلَّا بِاللَّهِ", DhikrCategory::General, 10))
            .unwrap()
    };

    let storage = SqliteStorage::new(path).expect("Failed to reopen storage");
    assert_eq!(storage.get_dhikr(created.id).unwrap(), Some(created));
}
