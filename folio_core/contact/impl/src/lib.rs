use std::{sync::Arc, time::Duration};

use folio_core_contact_contracts::{
    ContactFormService, ContactFormSnapshot, ContactSubmitError, ContactSubmitIgnoredReason,
    ContactSubmitOutcome,
};
use folio_extern_contracts::{
    challenge::ChallengeApiService,
    relay::{RelayApiService, RelayRejection, RelayResponse, RelaySubmission},
};
use folio_models::{
    challenge::{ChallengeSiteKey, ChallengeToken},
    contact::{ContactField, FormDraft, MessageLengthPolicy, SubmissionState, EMAIL_REGEX},
    relay::{RelayEndpoint, RelayEndpointIssue},
};
use folio_storage_contracts::KeyValueStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::task::ScheduledTask;

mod task;
#[cfg(test)]
mod tests;

/// Storage key of the persisted draft.
pub const DRAFT_KEY: &str = "contactDraft_v1";

const MIN_NAME_LEN: usize = 2;
const MIN_MESSAGE_LEN: usize = 10;
const COOLDOWN_TICK: Duration = Duration::from_secs(1);
const GENERIC_REJECTION: &str = "Failed to send message.";
const UNNAMED_REJECTION: &str = "Error";

pub struct ContactFormServiceImpl<Store, RelayApi, ChallengeApi> {
    inner: Arc<Inner<Store, RelayApi, ChallengeApi>>,
}

#[derive(Debug, Clone)]
pub struct ContactFormConfig {
    pub endpoint: Result<RelayEndpoint, RelayEndpointIssue>,
    pub fallback_email: String,
    pub subject_tag: String,
    pub policy: MessageLengthPolicy,
    /// Seconds to wait after a successful submission.
    pub cooldown: u32,
    pub success_notice: Duration,
    pub draft_debounce: Duration,
}

/// Anti-spam challenge provider, only present if a site key is configured.
pub struct Challenge<Api> {
    pub api: Api,
    pub sitekey: ChallengeSiteKey,
    pub action: String,
}

struct Inner<Store, RelayApi, ChallengeApi> {
    store: Store,
    relay_api: RelayApi,
    challenge: Option<Challenge<ChallengeApi>>,
    config: ContactFormConfig,
    state: Mutex<State>,
    shutdown: CancellationToken,
}

#[derive(Default)]
struct State {
    draft: FormDraft,
    status: SubmissionState,
    error: Option<String>,
    cooldown: u32,
    success_visible: bool,
    remember: bool,
    draft_write: Option<ScheduledTask>,
    cooldown_timer: Option<ScheduledTask>,
    success_timer: Option<ScheduledTask>,
}

impl<Store, RelayApi, ChallengeApi> ContactFormServiceImpl<Store, RelayApi, ChallengeApi>
where
    Store: KeyValueStore,
    RelayApi: RelayApiService,
    ChallengeApi: ChallengeApiService,
{
    /// Creates the contact form and restores a previously persisted draft.
    ///
    /// Drafts are remembered iff a valid draft was found.
    pub async fn load(
        store: Store,
        relay_api: RelayApi,
        challenge: Option<Challenge<ChallengeApi>>,
        config: ContactFormConfig,
    ) -> Self {
        if let Err(issue) = &config.endpoint {
            warn!("Contact form cannot be submitted: {issue}");
        }

        let stored = load_draft(&store).await;
        let remember = stored.is_some();
        let mut draft = stored.unwrap_or_default();
        draft.message = config.policy.clamp(std::mem::take(&mut draft.message));

        Self {
            inner: Arc::new(Inner {
                store,
                relay_api,
                challenge,
                config,
                state: Mutex::new(State {
                    draft,
                    remember,
                    ..Default::default()
                }),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    fn schedule_draft_write(&self) -> ScheduledTask {
        let inner = Arc::downgrade(&self.inner);
        let delay = self.inner.config.draft_debounce;
        ScheduledTask::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = inner.upgrade() else { return };
            let state = inner.state.lock().await;
            if state.remember {
                inner.persist_draft(&state.draft).await;
            }
        })
    }

    fn schedule_cooldown(&self) -> ScheduledTask {
        let inner = Arc::downgrade(&self.inner);
        ScheduledTask::spawn(async move {
            let start = tokio::time::Instant::now() + COOLDOWN_TICK;
            let mut ticks = tokio::time::interval_at(start, COOLDOWN_TICK);
            loop {
                ticks.tick().await;
                let Some(inner) = inner.upgrade() else { break };
                let mut state = inner.state.lock().await;
                state.cooldown = state.cooldown.saturating_sub(1);
                if state.cooldown == 0 {
                    debug!("cooldown elapsed");
                    break;
                }
            }
        })
    }

    fn schedule_success_hide(&self) -> ScheduledTask {
        let inner = Arc::downgrade(&self.inner);
        let delay = self.inner.config.success_notice;
        ScheduledTask::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = inner.upgrade() {
                inner.state.lock().await.success_visible = false;
            }
        })
    }

    async fn challenge_token(&self) -> Option<ChallengeToken> {
        let Challenge {
            api,
            sitekey,
            action,
        } = self.inner.challenge.as_ref()?;

        api.execute(sitekey, action)
            .await
            .inspect_err(|err| warn!("Failed to obtain a challenge token: {err:#}"))
            .ok()
    }
}

impl<Store, RelayApi, ChallengeApi> ContactFormService
    for ContactFormServiceImpl<Store, RelayApi, ChallengeApi>
where
    Store: KeyValueStore,
    RelayApi: RelayApiService,
    ChallengeApi: ChallengeApiService,
{
    #[instrument(skip(self, value))]
    async fn update_field(&self, field: ContactField, value: String) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }

        let value = match field {
            ContactField::Message => self.inner.config.policy.clamp(value),
            _ => value,
        };

        let mut state = self.inner.state.lock().await;
        state.draft.set(field, value);
        state.error = None;
        if matches!(
            state.status,
            SubmissionState::Success | SubmissionState::Error
        ) {
            state.status = SubmissionState::Idle;
            state.success_visible = false;
            state.success_timer = None;
        }

        if state.remember {
            state.draft_write = Some(self.schedule_draft_write());
        }
    }

    #[instrument(skip(self))]
    async fn set_remember_draft(&self, enabled: bool) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }

        let mut state = self.inner.state.lock().await;
        state.remember = enabled;
        state.draft_write = None;

        if enabled {
            self.inner.persist_draft(&state.draft).await;
        } else {
            self.inner.clear_draft().await;
        }
    }

    #[instrument(skip(self))]
    async fn submit(&self) -> Result<ContactSubmitOutcome, ContactSubmitError> {
        let inner = &*self.inner;
        if inner.shutdown.is_cancelled() {
            return Ok(ContactSubmitOutcome::Ignored(
                ContactSubmitIgnoredReason::TornDown,
            ));
        }

        let (endpoint, submission) = {
            let mut state = inner.state.lock().await;
            if state.cooldown > 0 {
                debug!(remaining = state.cooldown, "cooldown active");
                return Ok(ContactSubmitOutcome::Ignored(
                    ContactSubmitIgnoredReason::Cooldown {
                        remaining: state.cooldown,
                    },
                ));
            }
            if state.status == SubmissionState::Submitting {
                debug!("submission already in flight");
                return Ok(ContactSubmitOutcome::Ignored(
                    ContactSubmitIgnoredReason::InFlight,
                ));
            }

            let endpoint = validate(&state.draft, &inner.config.policy)
                .and_then(|()| inner.config.endpoint.clone().map_err(Into::into));
            let endpoint = match endpoint {
                Ok(endpoint) => endpoint,
                Err(err) => {
                    debug!("contact form not submitted: {err}");
                    state.error = Some(err.to_string());
                    return Err(err);
                }
            };

            state.status = SubmissionState::Submitting;
            state.error = None;
            (
                endpoint,
                relay_submission(&state.draft, &inner.config.subject_tag),
            )
        };

        let submission = RelaySubmission {
            challenge_token: self.challenge_token().await,
            ..submission
        };
        let response = inner.relay_api.submit(&endpoint, submission).await;

        if inner.shutdown.is_cancelled() {
            debug!("discarding submission result after teardown");
            return Ok(ContactSubmitOutcome::Ignored(
                ContactSubmitIgnoredReason::TornDown,
            ));
        }

        let mut state = inner.state.lock().await;
        let err = match response {
            Ok(RelayResponse::Accepted) => {
                info!("contact message sent");
                state.status = SubmissionState::Success;
                state.draft = FormDraft::default();
                if state.remember {
                    state.draft_write = None;
                    inner.clear_draft().await;
                }
                state.success_visible = true;
                state.success_timer = Some(self.schedule_success_hide());
                state.cooldown = inner.config.cooldown;
                state.cooldown_timer = (state.cooldown > 0).then(|| self.schedule_cooldown());
                return Ok(ContactSubmitOutcome::Sent);
            }
            Ok(RelayResponse::Rejected(rejection)) => {
                let message = rejection_message(rejection);
                warn!("relay rejected the contact message: {message}");
                ContactSubmitError::Rejected(message)
            }
            Err(err) => {
                warn!("Failed to reach the relay: {err:#}");
                ContactSubmitError::Network
            }
        };

        state.status = SubmissionState::Error;
        state.error = Some(err.to_string());
        Err(err)
    }

    async fn snapshot(&self) -> ContactFormSnapshot {
        let config = &self.inner.config;
        let state = self.inner.state.lock().await;

        let message_len = state.draft.message.chars().count();
        let endpoint_issue = config.endpoint.as_ref().err().copied();

        ContactFormSnapshot {
            draft: state.draft.clone(),
            state: state.status,
            error: state.error.clone(),
            cooldown: state.cooldown,
            success_visible: state.success_visible && state.status == SubmissionState::Success,
            remember_draft: state.remember,
            message_len,
            message_severity: config.policy.severity(message_len),
            message_fill_ratio: config.policy.fill_ratio(message_len),
            hard_limit: config.policy.hard_limit(),
            endpoint_issue,
            fallback_email: config.fallback_email.clone(),
            can_submit: state.status != SubmissionState::Submitting
                && state.cooldown == 0
                && endpoint_issue.is_none()
                && !self.inner.shutdown.is_cancelled(),
        }
    }

    #[instrument(skip(self))]
    async fn teardown(&self) {
        self.inner.shutdown.cancel();

        let mut state = self.inner.state.lock().await;
        state.draft_write = None;
        state.cooldown_timer = None;
        state.success_timer = None;
    }
}

impl<Store, RelayApi, ChallengeApi> Inner<Store, RelayApi, ChallengeApi>
where
    Store: KeyValueStore,
{
    async fn persist_draft(&self, draft: &FormDraft) {
        let raw = match serde_json::to_string(draft) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Failed to serialize the contact draft: {err}");
                return;
            }
        };

        self.store
            .set(DRAFT_KEY, &raw)
            .await
            .inspect_err(|err| warn!("Failed to store the contact draft: {err:#}"))
            .ok();
    }

    async fn clear_draft(&self) {
        self.store
            .remove(DRAFT_KEY)
            .await
            .inspect_err(|err| warn!("Failed to remove the contact draft: {err:#}"))
            .ok();
    }
}

async fn load_draft(store: &impl KeyValueStore) -> Option<FormDraft> {
    let raw = store
        .get(DRAFT_KEY)
        .await
        .inspect_err(|err| warn!("Failed to read the contact draft: {err:#}"))
        .ok()??;

    let value = serde_json::from_str::<serde_json::Value>(&raw)
        .inspect_err(|err| warn!("Ignoring malformed contact draft: {err}"))
        .ok()?;
    let Some(object) = value.as_object() else {
        warn!("Ignoring contact draft that is not an object");
        return None;
    };

    // members that are missing or not strings load as empty
    let mut draft = FormDraft::default();
    for field in ContactField::ALL {
        if let Some(value) = object.get(field.key()).and_then(serde_json::Value::as_str) {
            draft.set(field, value.into());
        }
    }
    Some(draft)
}

fn validate(draft: &FormDraft, policy: &MessageLengthPolicy) -> Result<(), ContactSubmitError> {
    let message_len = draft.message.trim().chars().count();

    if draft.name.trim().chars().count() < MIN_NAME_LEN {
        Err(ContactSubmitError::NameTooShort)
    } else if !EMAIL_REGEX.is_match(draft.email.trim()) {
        Err(ContactSubmitError::InvalidEmail)
    } else if message_len < MIN_MESSAGE_LEN {
        Err(ContactSubmitError::MessageTooShort)
    } else if message_len > policy.hard_limit() {
        Err(ContactSubmitError::MessageTooLong(policy.hard_limit()))
    } else {
        Ok(())
    }
}

fn relay_submission(draft: &FormDraft, subject_tag: &str) -> RelaySubmission {
    let subject = draft.subject.trim();
    RelaySubmission {
        name: draft.name.trim().into(),
        email: draft.email.trim().into(),
        subject: (!subject.is_empty()).then(|| subject.into()),
        message: draft.message.trim().into(),
        subject_tag: subject_tag.into(),
        challenge_token: None,
    }
}

fn rejection_message(rejection: RelayRejection) -> String {
    match rejection {
        RelayRejection::Errors(errors) if !errors.is_empty() => errors
            .into_iter()
            .map(|message| message.unwrap_or_else(|| UNNAMED_REJECTION.into()))
            .collect::<Vec<_>>()
            .join("\n"),
        RelayRejection::Error(error) => error,
        RelayRejection::Errors(_) | RelayRejection::Unknown => GENERIC_REJECTION.into(),
    }
}
