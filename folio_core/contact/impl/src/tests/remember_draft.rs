use std::time::Duration;

use folio_core_contact_contracts::ContactFormService;
use folio_extern_contracts::relay::MockRelayApiService;
use folio_models::contact::{ContactField, FormDraft};
use folio_storage_contracts::MockKeyValueStore;
use pretty_assertions::assert_eq;

use super::{config, draft, draft_json, fill, load, RecordingStore, StoreOp};
use crate::DRAFT_KEY;

#[tokio::test]
async fn enable_persists_immediately() {
    // Arrange
    let store = MockKeyValueStore::new()
        .with_get(DRAFT_KEY.into(), None)
        .with_set(DRAFT_KEY.into(), draft_json(&draft()));
    let sut = load(store, MockRelayApiService::new(), None, config()).await;
    fill(&sut, &draft()).await;

    // Act
    sut.set_remember_draft(true).await;

    // Assert
    assert!(sut.snapshot().await.remember_draft);
}

#[tokio::test]
async fn disable_removes_draft() {
    // Arrange
    let store = MockKeyValueStore::new()
        .with_get(DRAFT_KEY.into(), Some(draft_json(&draft())))
        .with_remove(DRAFT_KEY.into());
    let sut = load(store, MockRelayApiService::new(), None, config()).await;

    // Act
    sut.set_remember_draft(false).await;

    // Assert
    let snapshot = sut.snapshot().await;
    assert!(!snapshot.remember_draft);
    assert_eq!(snapshot.draft, draft());
}

#[tokio::test]
async fn disable_then_reload_is_empty() {
    // Arrange
    let store = RecordingStore::with_value(draft_json(&draft()));
    let sut = load(store.clone(), MockRelayApiService::new(), None, config()).await;

    // Act
    sut.set_remember_draft(false).await;
    drop(sut);
    let reloaded = load(store.clone(), MockRelayApiService::new(), None, config()).await;

    // Assert
    assert_eq!(store.ops(), [StoreOp::Remove]);
    let snapshot = reloaded.snapshot().await;
    assert_eq!(snapshot.draft, FormDraft::default());
    assert!(!snapshot.remember_draft);
}

#[tokio::test]
async fn enable_then_reload_restores() {
    // Arrange
    let store = RecordingStore::default();
    let sut = load(store.clone(), MockRelayApiService::new(), None, config()).await;
    fill(&sut, &draft()).await;

    // Act
    sut.set_remember_draft(true).await;
    drop(sut);
    let reloaded = load(store.clone(), MockRelayApiService::new(), None, config()).await;

    // Assert
    let snapshot = reloaded.snapshot().await;
    assert_eq!(snapshot.draft, draft());
    assert!(snapshot.remember_draft);
}

#[tokio::test(start_paused = true)]
async fn disable_cancels_pending_write() {
    // Arrange
    let store = RecordingStore::with_value(draft_json(&draft()));
    let sut = load(store.clone(), MockRelayApiService::new(), None, config()).await;
    sut.update_field(ContactField::Name, "Erika".into()).await;

    // Act
    sut.set_remember_draft(false).await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Assert
    assert_eq!(store.ops(), [StoreOp::Remove]);
    assert_eq!(store.value(), None);
}

#[tokio::test]
async fn storage_errors_are_ignored() {
    // Arrange
    let store = MockKeyValueStore::new()
        .with_get(DRAFT_KEY.into(), Some(draft_json(&draft())))
        .with_remove_error(DRAFT_KEY.into());
    let sut = load(store, MockRelayApiService::new(), None, config()).await;

    // Act
    sut.set_remember_draft(false).await;

    // Assert
    assert!(!sut.snapshot().await.remember_draft);
}
