use serde_json::json;

use super::*;
use crate::storage::MemoryStorage;

fn user(id: i64) -> User {
    serde_json::from_value(json!({ "id": id, "username": "lin" })).unwrap()
}

// =============================================================
// Initial state
// =============================================================

#[test]
fn new_session_without_stored_token_is_empty() {
    let session = SessionContext::new(Arc::new(MemoryStorage::new()));
    assert_eq!(session.snapshot(), Session::default());
    assert!(!session.is_authenticated());
}

#[test]
fn new_session_seeds_token_from_storage() {
    let session = SessionContext::new(Arc::new(MemoryStorage::with_token("T")));
    let snapshot = session.snapshot();
    assert_eq!(snapshot.token.as_deref(), Some("T"));
    assert!(snapshot.user.is_none());
    assert!(!snapshot.loading);
    assert!(!session.is_authenticated());
}

#[test]
fn new_session_ignores_empty_stored_token() {
    let session = SessionContext::new(Arc::new(MemoryStorage::with_token("")));
    assert_eq!(session.token(), None);
}

// =============================================================
// Transitions
// =============================================================

#[test]
fn establish_sets_token_user_and_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let session = SessionContext::new(storage.clone());
    session.establish("T".to_owned(), user(1));
    assert!(session.is_authenticated());
    assert_eq!(session.token().as_deref(), Some("T"));
    assert_eq!(storage.get_item(TOKEN_KEY).as_deref(), Some("T"));
}

#[test]
fn clear_removes_everything() {
    let storage = Arc::new(MemoryStorage::new());
    let session = SessionContext::new(storage.clone());
    session.establish("T".to_owned(), user(1));
    session.clear();
    assert!(!session.is_authenticated());
    assert_eq!(session.token(), None);
    assert_eq!(session.user(), None);
    assert_eq!(storage.get_item(TOKEN_KEY), None);
}

#[test]
fn invalidate_clears_token_and_storage() {
    let storage = Arc::new(MemoryStorage::with_token("stale"));
    let session = SessionContext::new(storage.clone());
    session.invalidate();
    assert_eq!(session.token(), None);
    assert_eq!(storage.get_item(TOKEN_KEY), None);
}

#[test]
fn replace_user_swaps_whole_record() {
    let session = SessionContext::new(Arc::new(MemoryStorage::new()));
    session.establish("T".to_owned(), user(1));
    session.replace_user(user(2));
    assert_eq!(session.user().map(|u| u.id), Some(2));
}

// =============================================================
// Loading guard
// =============================================================

#[test]
fn loading_guard_resets_on_drop() {
    let session = SessionContext::new(Arc::new(MemoryStorage::new()));
    {
        let _guard = session.begin_loading();
        assert!(session.is_loading());
    }
    assert!(!session.is_loading());
}

#[test]
fn loading_guard_resets_on_early_return() {
    fn bail(session: &SessionContext) -> Option<()> {
        let _guard = session.begin_loading();
        None::<()>?;
        Some(())
    }
    let session = SessionContext::new(Arc::new(MemoryStorage::new()));
    assert!(bail(&session).is_none());
    assert!(!session.is_loading());
}
