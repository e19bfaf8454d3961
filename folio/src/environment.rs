use anyhow::Context;
use folio_config::{Config, ContactConfig, RecaptchaConfig};
use folio_core_contact_impl::{Challenge, ContactFormConfig, ContactFormServiceImpl};
use folio_extern_impl::{
    challenge::{RecaptchaChallengeApiServiceConfig, RecaptchaChallengeApiServiceImpl},
    http::HttpClient,
    relay::{RelayApiServiceConfig, RelayApiServiceImpl},
};
use folio_models::{
    challenge::ChallengeSiteKey, contact::MessageLengthPolicy, relay::RelayEndpoint,
};
use folio_storage_fs::FsKeyValueStore;

pub type Store = FsKeyValueStore;
pub type RelayApi = RelayApiServiceImpl;
pub type ChallengeApi = RecaptchaChallengeApiServiceImpl;
pub type ContactForm = ContactFormServiceImpl<Store, RelayApi, ChallengeApi>;

/// Builds the contact form with all its dependencies and restores the
/// persisted draft.
pub async fn contact_form(config: &Config) -> anyhow::Result<ContactForm> {
    let form_config = contact_form_config(&config.contact)?;

    let store = FsKeyValueStore::open(&config.storage.directory).await?;
    let http = HttpClient::new(config.http.timeout.into())?;

    let relay_api = RelayApiServiceImpl::new(
        RelayApiServiceConfig::new(config.contact.relay_base_url_override.clone()),
        http.clone(),
    );

    let challenge = config
        .recaptcha
        .as_ref()
        .map(|recaptcha| challenge(recaptcha, http))
        .transpose()?;

    Ok(ContactFormServiceImpl::load(store, relay_api, challenge, form_config).await)
}

pub fn contact_form_config(config: &ContactConfig) -> anyhow::Result<ContactFormConfig> {
    Ok(ContactFormConfig {
        endpoint: RelayEndpoint::parse(config.relay_endpoint.as_deref()),
        fallback_email: config.fallback_email.clone(),
        subject_tag: config.subject_tag.clone(),
        policy: MessageLengthPolicy::new(config.soft_limit, config.hard_limit)
            .context("Invalid message length limits")?,
        cooldown: config
            .cooldown
            .as_secs()
            .try_into()
            .context("Cooldown is too long")?,
        success_notice: config.success_notice.into(),
        draft_debounce: config.draft_debounce.into(),
    })
}

fn challenge(
    config: &RecaptchaConfig,
    http: HttpClient,
) -> anyhow::Result<Challenge<ChallengeApi>> {
    let api = RecaptchaChallengeApiServiceImpl::new(
        RecaptchaChallengeApiServiceConfig {
            token_endpoint: config.token_endpoint.clone().into(),
        },
        http,
    );

    Ok(Challenge {
        api,
        sitekey: ChallengeSiteKey::try_new(config.sitekey.clone())
            .context("Invalid recaptcha sitekey")?,
        action: config.action.clone(),
    })
}
