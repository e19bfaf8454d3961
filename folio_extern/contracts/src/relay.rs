use std::future::Future;

use folio_models::{challenge::ChallengeToken, relay::RelayEndpoint};

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait RelayApiService: Send + Sync + 'static {
    /// Forwards a contact message to the relay endpoint.
    ///
    /// Returns an error only if no response could be obtained at all.
    fn submit(
        &self,
        endpoint: &RelayEndpoint,
        submission: RelaySubmission,
    ) -> impl Future<Output = anyhow::Result<RelayResponse>> + Send;
}

/// The fields of a single relay request. Text values are sent as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySubmission {
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    /// Subject line of the email the relay delivers.
    pub subject_tag: String,
    pub challenge_token: Option<ChallengeToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayResponse {
    Accepted,
    Rejected(RelayRejection),
}

/// What could be extracted from the body of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRejection {
    /// `{"errors": [{"message": ...}, ...]}`; entries without a usable
    /// message are `None`.
    Errors(Vec<Option<String>>),
    /// `{"error": ...}`
    Error(String),
    Unknown,
}

#[cfg(feature = "mock")]
impl MockRelayApiService {
    pub fn with_submit(
        mut self,
        endpoint: RelayEndpoint,
        submission: RelaySubmission,
        result: anyhow::Result<RelayResponse>,
    ) -> Self {
        self.expect_submit()
            .once()
            .with(
                mockall::predicate::eq(endpoint),
                mockall::predicate::eq(submission),
            )
            .return_once(|_, _| Box::pin(std::future::ready(result)));
        self
    }
}
