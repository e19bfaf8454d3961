use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use folio_core_contact_contracts::ContactFormService;
use folio_extern_contracts::{
    challenge::MockChallengeApiService,
    relay::{MockRelayApiService, RelaySubmission},
};
use folio_models::{
    contact::{ContactField, FormDraft, MessageLengthPolicy},
    relay::RelayEndpoint,
};
use folio_storage_contracts::{KeyValueStore, MockKeyValueStore};

use crate::{Challenge, ContactFormConfig, ContactFormServiceImpl, DRAFT_KEY};

mod remember_draft;
mod teardown;

type Sut<Store = MockKeyValueStore> =
    ContactFormServiceImpl<Store, MockRelayApiService, MockChallengeApiService>;

const ENDPOINT: &str = "https://formspree.io/f/xyzabcd";

fn config() -> ContactFormConfig {
    ContactFormConfig {
        endpoint: RelayEndpoint::parse(Some(ENDPOINT)),
        fallback_email: "hello@example.com".into(),
        subject_tag: "New portfolio contact".into(),
        policy: MessageLengthPolicy::default(),
        cooldown: 10,
        success_notice: Duration::from_secs(5),
        draft_debounce: Duration::from_millis(400),
    }
}

fn endpoint() -> RelayEndpoint {
    RelayEndpoint::parse(Some(ENDPOINT)).unwrap()
}

fn draft() -> FormDraft {
    FormDraft {
        name: "Max Mustermann".into(),
        email: "max.mustermann@example.de".into(),
        subject: "Hello".into(),
        message: "Hello World! How are you?".into(),
    }
}

fn draft_json(draft: &FormDraft) -> String {
    serde_json::to_string(draft).unwrap()
}

fn submission() -> RelaySubmission {
    RelaySubmission {
        name: "Max Mustermann".into(),
        email: "max.mustermann@example.de".into(),
        subject: Some("Hello".into()),
        message: "Hello World! How are you?".into(),
        subject_tag: "New portfolio contact".into(),
        challenge_token: None,
    }
}

fn empty_store() -> MockKeyValueStore {
    MockKeyValueStore::new().with_get(DRAFT_KEY.into(), None)
}

async fn load<Store: KeyValueStore>(
    store: Store,
    relay_api: MockRelayApiService,
    challenge: Option<Challenge<MockChallengeApiService>>,
    config: ContactFormConfig,
) -> Sut<Store> {
    ContactFormServiceImpl::load(store, relay_api, challenge, config).await
}

async fn fill(sut: &impl ContactFormService, draft: &FormDraft) {
    for field in ContactField::ALL {
        sut.update_field(field, draft.get(field).into()).await;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreOp {
    Set(String),
    Remove,
}

/// In-memory store recording every write, used where writes happen inside
/// spawned tasks and mock expectations would not fail the test.
#[derive(Clone, Default)]
struct RecordingStore {
    value: Arc<Mutex<Option<String>>>,
    ops: Arc<Mutex<Vec<StoreOp>>>,
}

impl RecordingStore {
    fn with_value(value: String) -> Self {
        let store = Self::default();
        *store.value.lock().unwrap() = Some(value);
        store
    }

    fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap().clone()
    }

    fn value(&self) -> Option<String> {
        self.value.lock().unwrap().clone()
    }
}

impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        assert_eq!(key, DRAFT_KEY);
        Ok(self.value())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        assert_eq!(key, DRAFT_KEY);
        self.ops.lock().unwrap().push(StoreOp::Set(value.into()));
        *self.value.lock().unwrap() = Some(value.into());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        assert_eq!(key, DRAFT_KEY);
        self.ops.lock().unwrap().push(StoreOp::Remove);
        *self.value.lock().unwrap() = None;
        Ok(())
    }
}
