use std::{net::IpAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

const TOKEN_ROUTE: &str = "/recaptcha/api/token";

pub async fn start_server(host: IpAddr, port: u16, sitekey: String) -> anyhow::Result<()> {
    info!("Starting recaptcha testing server on {host}:{port}");
    info!("Recaptcha token endpoint: http://{host}:{port}{TOKEN_ROUTE}");
    info!("Sitekey: {sitekey:?}");
    info!("Issued tokens have the form \"token-ACTION\"");

    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind to {host}:{port}"))?;
    axum::serve(listener, router(sitekey))
        .await
        .context("Failed to start HTTP server")
}

pub fn router(sitekey: String) -> Router {
    Router::new()
        .route(TOKEN_ROUTE, routing::post(token))
        .with_state(sitekey.into())
}

#[derive(Deserialize)]
struct TokenRequest {
    sitekey: String,
    action: String,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

async fn token(
    state: State<Arc<str>>,
    Form(TokenRequest { sitekey, action }): Form<TokenRequest>,
) -> Response {
    if *sitekey != **state {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid-input-sitekey" })),
        )
            .into_response();
    }

    Json(TokenResponse {
        token: format!("token-{action}"),
    })
    .into_response()
}
