use super::*;

fn temp_path() -> PathBuf {
    std::env::temp_dir().join(format!("classhub-storage-{}", uuid::Uuid::new_v4())).join("storage.json")
}

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_storage_starts_empty() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item(TOKEN_KEY), None);
}

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    storage.set_item(TOKEN_KEY, "T").unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("T"));
    storage.remove_item(TOKEN_KEY).unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY), None);
}

#[test]
fn memory_storage_with_token_is_seeded() {
    let storage = MemoryStorage::with_token("seed");
    assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("seed"));
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_storage_missing_file_reads_empty() {
    let storage = FileStorage::new(temp_path());
    assert_eq!(storage.get_item(TOKEN_KEY), None);
}

#[test]
fn file_storage_persists_across_handles() {
    let path = temp_path();
    FileStorage::new(&path).set_item(TOKEN_KEY, "T").unwrap();

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get_item(TOKEN_KEY).as_deref(), Some("T"));

    reopened.remove_item(TOKEN_KEY).unwrap();
    assert_eq!(FileStorage::new(&path).get_item(TOKEN_KEY), None);

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_storage_keeps_other_keys() {
    let path = temp_path();
    let storage = FileStorage::new(&path);
    storage.set_item("theme", "dark").unwrap();
    storage.set_item(TOKEN_KEY, "T").unwrap();
    storage.remove_item(TOKEN_KEY).unwrap();
    assert_eq!(storage.get_item("theme").as_deref(), Some("dark"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_storage_corrupt_file_reads_empty() {
    let path = temp_path();
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();

    let storage = FileStorage::new(&path);
    assert_eq!(storage.get_item(TOKEN_KEY), None);
    storage.set_item(TOKEN_KEY, "fresh").unwrap();
    assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("fresh"));

    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn file_storage_remove_missing_key_is_noop() {
    let path = temp_path();
    let storage = FileStorage::new(&path);
    storage.remove_item(TOKEN_KEY).unwrap();
    assert!(!path.exists());
}
