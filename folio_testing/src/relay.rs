use std::{
    collections::{BTreeMap, HashMap},
    net::IpAddr,
    sync::Arc,
};

use anyhow::Context;
use axum::{
    extract::{Multipart, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

const FORM_ROUTE: &str = "/f/:form_id";
const SUBMISSIONS_ROUTE: &str = "/f/:form_id/submissions";

/// Requests to this form are answered with `404 {"error": "Form not found"}`.
pub const MISSING_FORM_ID: &str = "missing";
/// Requests to this form are answered with a plain text `500`.
pub const BROKEN_FORM_ID: &str = "broken";

const REQUIRED_FIELDS: [&str; 3] = ["name", "email", "message"];

pub async fn start_server(host: IpAddr, port: u16) -> anyhow::Result<()> {
    info!("Starting form relay testing server on {host}:{port}");
    info!("Form endpoint: http://{host}:{port}{FORM_ROUTE}");
    info!(
        "Form {MISSING_FORM_ID:?} does not exist and form {BROKEN_FORM_ID:?} always fails, all \
         other forms accept submissions with a name, a message and an email containing an @"
    );

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router())
        .await
        .context("Failed to start HTTP server")
}

pub fn router() -> Router {
    Router::new()
        .route(FORM_ROUTE, routing::post(submit))
        .route(SUBMISSIONS_ROUTE, routing::get(submissions))
        .with_state(Default::default())
}

type Submission = BTreeMap<String, String>;

type State = axum::extract::State<Arc<StateInner>>;
#[derive(Default)]
struct StateInner {
    submissions: RwLock<HashMap<String, Vec<Submission>>>,
}

async fn submit(state: State, Path(form_id): Path<String>, mut multipart: Multipart) -> Response {
    match form_id.as_str() {
        MISSING_FORM_ID => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Form not found" })),
            )
                .into_response()
        }
        BROKEN_FORM_ID => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        _ => {}
    }

    let mut fields = Submission::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return (err.status(), err.body_text()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_owned();
        match field.text().await {
            Ok(value) => {
                fields.insert(name, value);
            }
            Err(err) => return (err.status(), err.body_text()).into_response(),
        }
    }

    let mut errors = REQUIRED_FIELDS
        .into_iter()
        .filter(|&field| !fields.get(field).is_some_and(|x| !x.trim().is_empty()))
        .map(|field| {
            json!({
                "field": field,
                "code": "REQUIRED_FIELD_MISSING",
                "message": format!("{field} is required"),
            })
        })
        .collect::<Vec<_>>();

    if fields
        .get("email")
        .is_some_and(|email| !email.trim().is_empty() && !email.contains('@'))
    {
        errors.push(json!({
            "field": "email",
            "code": "TYPE_EMAIL",
            "message": "should be an email",
        }));
    }

    if !errors.is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response();
    }

    state
        .submissions
        .write()
        .await
        .entry(form_id)
        .or_default()
        .push(fields);

    Json(json!({ "next": "/thanks", "ok": true })).into_response()
}

async fn submissions(state: State, Path(form_id): Path<String>) -> Json<Vec<Submission>> {
    let submissions = state.submissions.read().await;
    Json(submissions.get(&form_id).cloned().unwrap_or_default())
}
