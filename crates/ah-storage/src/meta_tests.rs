use super::*;
use ah_core::AppId;
use chrono::Utc;
use tempfile::tempdir;

fn sample_record() -> AppRecord {
    AppRecord::new(
        AppId::new(),
        "demo".to_string(),
        "req-digest".to_string(),
        "entry-digest".to_string(),
        Utc::now(),
    )
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().expect("tempdir");
    let store = MetaStore::new(dir.path());
    let record = sample_record();
    store.save(&record).expect("save");
    let loaded = store.load(record.app_id.as_str()).expect("load");
    assert_eq!(loaded.app_id, record.app_id);
    assert_eq!(loaded.name, record.name);
}

#[test]
fn save_leaves_no_temp_file_behind() {
    let dir = tempdir().expect("tempdir");
    let store = MetaStore::new(dir.path());
    let record = sample_record();
    store.save(&record).expect("save");
    let app_dir = store.app_dir(record.app_id.as_str());
    let entries: Vec<_> = fs::read_dir(&app_dir).expect("read_dir").collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn list_skips_malformed_records() {
    let dir = tempdir().expect("tempdir");
    let store = MetaStore::new(dir.path());
    let good = sample_record();
    store.save(&good).expect("save");

    let bad_dir = store.app_dir("app-garbage0000000000");
    fs::create_dir_all(&bad_dir).expect("mkdir");
    fs::write(bad_dir.join(META_FILE_NAME), b"not json").expect("write");

    let records = store.list().expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].app_id, good.app_id);
}

#[test]
fn list_on_missing_apps_dir_returns_empty() {
    let dir = tempdir().expect("tempdir");
    let store = MetaStore::new(dir.path());
    assert!(store.list().expect("list").is_empty());
}

#[test]
fn create_app_dir_fails_on_collision() {
    let dir = tempdir().expect("tempdir");
    let store = MetaStore::new(dir.path());
    store.create_app_dir("app-abc").expect("first create");
    assert!(store.create_app_dir("app-abc").is_err());
}

#[test]
fn remove_app_dir_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let store = MetaStore::new(dir.path());
    let record = sample_record();
    store.save(&record).expect("save");
    store.remove_app_dir(record.app_id.as_str()).expect("first remove");
    store.remove_app_dir(record.app_id.as_str()).expect("second remove is a no-op");
    assert!(!store.app_dir(record.app_id.as_str()).exists());
}
