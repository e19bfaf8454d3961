use std::future::Future;

use folio_models::challenge::{ChallengeSiteKey, ChallengeToken};

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ChallengeApiService: Send + Sync + 'static {
    /// Obtains a challenge token for `action` on behalf of the site
    /// identified by `sitekey`.
    fn execute(
        &self,
        sitekey: &ChallengeSiteKey,
        action: &str,
    ) -> impl Future<Output = anyhow::Result<ChallengeToken>> + Send;
}

#[cfg(feature = "mock")]
impl MockChallengeApiService {
    pub fn with_execute(
        mut self,
        sitekey: ChallengeSiteKey,
        action: String,
        result: anyhow::Result<ChallengeToken>,
    ) -> Self {
        self.expect_execute()
            .once()
            .with(
                mockall::predicate::eq(sitekey),
                mockall::predicate::eq(action),
            )
            .return_once(|_, _| Box::pin(std::future::ready(result)));
        self
    }
}
