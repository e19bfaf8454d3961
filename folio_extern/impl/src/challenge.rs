use std::sync::Arc;

use anyhow::Context;
use folio_extern_contracts::challenge::ChallengeApiService;
use folio_models::challenge::{ChallengeSiteKey, ChallengeToken};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::http::HttpClient;

/// Obtains reCAPTCHA tokens from a token endpoint.
#[derive(Debug, Clone)]
pub struct RecaptchaChallengeApiServiceImpl {
    config: RecaptchaChallengeApiServiceConfig,
    http: HttpClient,
}

#[derive(Debug, Clone)]
pub struct RecaptchaChallengeApiServiceConfig {
    pub token_endpoint: Arc<Url>,
}

impl RecaptchaChallengeApiServiceImpl {
    pub fn new(config: RecaptchaChallengeApiServiceConfig, http: HttpClient) -> Self {
        Self { config, http }
    }
}

impl ChallengeApiService for RecaptchaChallengeApiServiceImpl {
    #[instrument(skip(self))]
    async fn execute(
        &self,
        sitekey: &ChallengeSiteKey,
        action: &str,
    ) -> anyhow::Result<ChallengeToken> {
        let TokenResponse { token } = self
            .http
            .post((*self.config.token_endpoint).clone())
            .form(&TokenRequest {
                sitekey: sitekey.as_str(),
                action,
            })
            .send()
            .await
            .context("Failed to send challenge token request")?
            .error_for_status()
            .context("Challenge token request returned an error")?
            .json::<TokenResponse>()
            .await
            .context("Failed to deserialize challenge token response")?;

        ChallengeToken::try_new(token).context("Challenge provider returned an invalid token")
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    sitekey: &'a str,
    action: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}
