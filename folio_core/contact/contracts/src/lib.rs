use std::future::Future;

use folio_models::{
    contact::{ContactField, FormDraft, MessageSeverity, SubmissionState},
    relay::RelayEndpointIssue,
};
use thiserror::Error;

/// The contact form: field state, draft persistence, validation and the
/// submission lifecycle.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFormService: Send + Sync + 'static {
    /// Updates a single field. The message is truncated to the hard length
    /// limit. Schedules a debounced draft write if drafts are remembered.
    fn update_field(
        &self,
        field: ContactField,
        value: String,
    ) -> impl Future<Output = ()> + Send;

    /// Enables or disables draft persistence. Disabling removes the stored
    /// draft, enabling stores the current values immediately.
    fn set_remember_draft(&self, enabled: bool) -> impl Future<Output = ()> + Send;

    /// Validates the form and sends it to the relay.
    ///
    /// Calls made while a submission is in flight, while the cooldown is
    /// active or after teardown do nothing and return
    /// [`ContactSubmitOutcome::Ignored`].
    fn submit(
        &self,
    ) -> impl Future<Output = Result<ContactSubmitOutcome, ContactSubmitError>> + Send;

    /// Returns the current state of the form.
    fn snapshot(&self) -> impl Future<Output = ContactFormSnapshot> + Send;

    /// Cancels all pending timers. Results of a submission still in flight
    /// are discarded and all further calls are ignored.
    fn teardown(&self) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactFormSnapshot {
    pub draft: FormDraft,
    pub state: SubmissionState,
    /// Text of the last validation, configuration or relay error.
    pub error: Option<String>,
    /// Seconds until the next submission is allowed.
    pub cooldown: u32,
    pub success_visible: bool,
    pub remember_draft: bool,
    pub message_len: usize,
    pub message_severity: MessageSeverity,
    pub message_fill_ratio: f64,
    pub hard_limit: usize,
    /// Set while the relay endpoint is missing or malformed. This is a
    /// standing condition, submitting stays impossible until it is fixed.
    pub endpoint_issue: Option<RelayEndpointIssue>,
    /// Address to contact directly when the form cannot be used.
    pub fallback_email: String,
    pub can_submit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSubmitOutcome {
    Sent,
    Ignored(ContactSubmitIgnoredReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactSubmitIgnoredReason {
    Cooldown { remaining: u32 },
    InFlight,
    TornDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactSubmitError {
    #[error("Name must be at least 2 characters.")]
    NameTooShort,
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Message must be at least 10 characters.")]
    MessageTooShort,
    #[error("Message cannot exceed {0} characters.")]
    MessageTooLong(usize),
    #[error("Contact form endpoint missing. Set FOLIO__CONTACT__RELAY_ENDPOINT in your environment.")]
    EndpointMissing,
    #[error("Invalid Formspree endpoint format. Expected https://formspree.io/f/<id>.")]
    EndpointInvalid,
    #[error("{0}")]
    Rejected(String),
    #[error("Network error. Please try again later.")]
    Network,
}

impl ContactSubmitError {
    /// Whether the error is caused by the form's content and can be fixed by
    /// editing it.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NameTooShort | Self::InvalidEmail | Self::MessageTooShort | Self::MessageTooLong(_)
        )
    }
}

impl From<RelayEndpointIssue> for ContactSubmitError {
    fn from(value: RelayEndpointIssue) -> Self {
        match value {
            RelayEndpointIssue::Missing => Self::EndpointMissing,
            RelayEndpointIssue::InvalidFormat => Self::EndpointInvalid,
        }
    }
}

#[cfg(feature = "mock")]
impl MockContactFormService {
    pub fn with_update_field(mut self, field: ContactField, value: String) -> Self {
        self.expect_update_field()
            .once()
            .with(
                mockall::predicate::eq(field),
                mockall::predicate::eq(value),
            )
            .return_once(|_, _| Box::pin(std::future::ready(())));
        self
    }

    pub fn with_set_remember_draft(mut self, enabled: bool) -> Self {
        self.expect_set_remember_draft()
            .once()
            .with(mockall::predicate::eq(enabled))
            .return_once(|_| Box::pin(std::future::ready(())));
        self
    }

    pub fn with_submit(
        mut self,
        result: Result<ContactSubmitOutcome, ContactSubmitError>,
    ) -> Self {
        self.expect_submit()
            .once()
            .return_once(|| Box::pin(std::future::ready(result)));
        self
    }

    pub fn with_snapshot(mut self, snapshot: ContactFormSnapshot) -> Self {
        self.expect_snapshot()
            .once()
            .return_once(|| Box::pin(std::future::ready(snapshot)));
        self
    }

    pub fn with_teardown(mut self) -> Self {
        self.expect_teardown()
            .once()
            .return_once(|| Box::pin(std::future::ready(())));
        self
    }
}
