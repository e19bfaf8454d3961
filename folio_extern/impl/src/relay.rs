use std::sync::Arc;

use anyhow::Context;
use folio_extern_contracts::relay::{
    RelayApiService, RelayRejection, RelayResponse, RelaySubmission,
};
use folio_models::relay::RelayEndpoint;
use folio_utils::Apply;
use reqwest::{header::ACCEPT, multipart::Form};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::http::HttpClient;

/// Name of the form field carrying the anti-spam token.
pub const CHALLENGE_TOKEN_FIELD: &str = "g-recaptcha-response";

#[derive(Debug, Clone)]
pub struct RelayApiServiceImpl {
    config: RelayApiServiceConfig,
    http: HttpClient,
}

#[derive(Debug, Clone, Default)]
pub struct RelayApiServiceConfig {
    base_url_override: Option<Arc<Url>>,
}

impl RelayApiServiceConfig {
    /// If `base_url_override` is set, requests are sent to the endpoint's
    /// path below this url instead of the endpoint itself.
    pub fn new(base_url_override: Option<Url>) -> Self {
        Self {
            base_url_override: base_url_override.map(Into::into),
        }
    }
}

impl RelayApiServiceImpl {
    pub fn new(config: RelayApiServiceConfig, http: HttpClient) -> Self {
        Self { config, http }
    }

    fn target(&self, endpoint: &RelayEndpoint) -> anyhow::Result<Url> {
        match &self.config.base_url_override {
            Some(base_url) => base_url
                .join(endpoint.path().trim_start_matches('/'))
                .context("Failed to build relay URL"),
            None => Ok((**endpoint).clone()),
        }
    }
}

impl RelayApiService for RelayApiServiceImpl {
    #[instrument(skip_all, fields(endpoint = %endpoint))]
    async fn submit(
        &self,
        endpoint: &RelayEndpoint,
        submission: RelaySubmission,
    ) -> anyhow::Result<RelayResponse> {
        let RelaySubmission {
            name,
            email,
            subject,
            message,
            subject_tag,
            challenge_token,
        } = submission;

        let form = Form::new()
            .text("name", name)
            .text("email", email)
            .apply_map(subject, |form, subject| form.text("subject", subject))
            .text("message", message)
            .text("_subject", subject_tag)
            .apply_map(challenge_token, |form, token| {
                form.text(CHALLENGE_TOKEN_FIELD, token.into_inner())
            });

        let response = self
            .http
            .post(self.target(endpoint)?)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .context("Failed to send relay request")?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "relay accepted the submission");
            return Ok(RelayResponse::Accepted);
        }

        let body = response
            .bytes()
            .await
            .inspect_err(|err| debug!("Failed to read relay response body: {err}"))
            .unwrap_or_default();
        let rejection = parse_rejection(&body);
        debug!(%status, ?rejection, "relay rejected the submission");

        Ok(RelayResponse::Rejected(rejection))
    }
}

fn parse_rejection(body: &[u8]) -> RelayRejection {
    let Ok(body) = serde_json::from_slice::<Value>(body) else {
        return RelayRejection::Unknown;
    };

    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        return RelayRejection::Errors(
            errors
                .iter()
                .map(|error| {
                    error
                        .get("message")
                        .and_then(Value::as_str)
                        .filter(|message| !message.is_empty())
                        .map(Into::into)
                })
                .collect(),
        );
    }

    body.get("error")
        .and_then(Value::as_str)
        .filter(|error| !error.is_empty())
        .map(|error| RelayRejection::Error(error.into()))
        .unwrap_or(RelayRejection::Unknown)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rejection_bodies() {
        for (body, expected) in [
            (
                r#"{"errors":[{"message":"Invalid email"}]}"#,
                RelayRejection::Errors(vec![Some("Invalid email".into())]),
            ),
            (
                r#"{"errors":[{"field":"email","message":"should be an email"},{"code":"X"},"oops",{"message":""}]}"#,
                RelayRejection::Errors(vec![Some("should be an email".into()), None, None, None]),
            ),
            (
                r#"{"error":"Form not found"}"#,
                RelayRejection::Error("Form not found".into()),
            ),
            (r#"{"error":""}"#, RelayRejection::Unknown),
            (r#"{"error":42}"#, RelayRejection::Unknown),
            (r#"{"ok":false}"#, RelayRejection::Unknown),
            ("Internal Server Error", RelayRejection::Unknown),
            ("", RelayRejection::Unknown),
        ] {
            assert_eq!(parse_rejection(body.as_bytes()), expected, "{body}");
        }
    }

    #[test]
    fn target() {
        let endpoint = RelayEndpoint::parse(Some("https://formspree.io/f/abc")).unwrap();
        let http = HttpClient::new(std::time::Duration::from_secs(1)).unwrap();

        let sut = RelayApiServiceImpl::new(RelayApiServiceConfig::default(), http.clone());
        assert_eq!(sut.target(&endpoint).unwrap().as_str(), "https://formspree.io/f/abc");

        let config = RelayApiServiceConfig::new(Some("http://127.0.0.1:8003/".parse().unwrap()));
        let sut = RelayApiServiceImpl::new(config, http);
        assert_eq!(sut.target(&endpoint).unwrap().as_str(), "http://127.0.0.1:8003/f/abc");
    }
}
