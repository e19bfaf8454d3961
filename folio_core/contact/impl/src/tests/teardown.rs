use std::time::Duration;

use folio_core_contact_contracts::{
    ContactFormService, ContactSubmitIgnoredReason, ContactSubmitOutcome,
};
use folio_extern_contracts::relay::{MockRelayApiService, RelayResponse};
use folio_models::contact::{ContactField, SubmissionState};
use pretty_assertions::assert_eq;

use super::{
    config, draft, draft_json, empty_store, endpoint, fill, load, submission, RecordingStore,
};

#[tokio::test(start_paused = true)]
async fn in_flight_result_is_discarded() {
    // Arrange
    let store = RecordingStore::with_value(draft_json(&draft()));
    let mut relay_api = MockRelayApiService::new();
    relay_api.expect_submit().once().return_once(|_, _| {
        Box::pin(async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(RelayResponse::Accepted)
        })
    });
    let sut = load(store.clone(), relay_api, None, config()).await;

    // Act
    let (result, ()) = tokio::join!(sut.submit(), sut.teardown());

    // Assert
    assert_eq!(
        result,
        Ok(ContactSubmitOutcome::Ignored(
            ContactSubmitIgnoredReason::TornDown
        ))
    );
    let snapshot = sut.snapshot().await;
    assert_eq!(snapshot.draft, draft());
    assert_eq!(snapshot.state, SubmissionState::Submitting);
    assert_eq!(snapshot.cooldown, 0);
    assert!(!snapshot.can_submit);
    assert!(store.ops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn pending_write_is_cancelled() {
    // Arrange
    let store = RecordingStore::with_value(draft_json(&draft()));
    let sut = load(store.clone(), MockRelayApiService::new(), None, config()).await;
    sut.update_field(ContactField::Name, "Erika".into()).await;

    // Act
    sut.teardown().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Assert
    assert!(store.ops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn timers_are_cancelled() {
    // Arrange
    let relay_api = MockRelayApiService::new().with_submit(
        endpoint(),
        submission(),
        Ok(RelayResponse::Accepted),
    );
    let sut = load(empty_store(), relay_api, None, config()).await;
    fill(&sut, &draft()).await;
    assert_eq!(sut.submit().await, Ok(ContactSubmitOutcome::Sent));

    // Act
    sut.teardown().await;
    tokio::time::sleep(Duration::from_secs(20)).await;

    // Assert
    let snapshot = sut.snapshot().await;
    assert_eq!(snapshot.cooldown, 10);
    assert!(snapshot.success_visible);
}

#[tokio::test(start_paused = true)]
async fn later_calls_are_ignored() {
    // Arrange
    let store = RecordingStore::with_value(draft_json(&draft()));
    let sut = load(store.clone(), MockRelayApiService::new(), None, config()).await;
    sut.teardown().await;

    // Act
    sut.update_field(ContactField::Name, "Erika".into()).await;
    sut.set_remember_draft(false).await;
    let result = sut.submit().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Assert
    assert_eq!(
        result,
        Ok(ContactSubmitOutcome::Ignored(
            ContactSubmitIgnoredReason::TornDown
        ))
    );
    let snapshot = sut.snapshot().await;
    assert_eq!(snapshot.draft, draft());
    assert!(snapshot.remember_draft);
    assert!(!snapshot.can_submit);
    assert!(store.ops().is_empty());
}

#[tokio::test(start_paused = true)]
async fn drop_cancels_pending_write() {
    // Arrange
    let store = RecordingStore::with_value(draft_json(&draft()));
    let sut = load(store.clone(), MockRelayApiService::new(), None, config()).await;
    sut.update_field(ContactField::Name, "Erika".into()).await;

    // Act
    drop(sut);
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Assert
    assert!(store.ops().is_empty());
}
