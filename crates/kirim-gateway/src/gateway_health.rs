//! Backend health probing for automatic selection.
//!
//! A probe is a single bounded GET against the backend's base URL whose
//! JSON response is interpreted per backend. Every failure mode
//! (missing config, unknown id, transport error, non-JSON body, wrong
//! shape) is indistinguishable from "unhealthy"; probes never error.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::gateway_config::GatewayConfig;
use crate::gateway_contract::BackendKind;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns true when `backend_id` looks ready to accept a send.
pub async fn probe_backend(
    client: &reqwest::Client,
    backend_id: u32,
    config: &GatewayConfig,
) -> bool {
    let Some(kind) = BackendKind::from_id(backend_id) else {
        return false;
    };
    let Some(server) = config.server(backend_id) else {
        return false;
    };

    let mut request = client
        .get(&server.base_url)
        .header(ACCEPT, "application/json")
        .timeout(PROBE_TIMEOUT);
    request = match kind {
        BackendKind::TextSession => request,
        BackendKind::TokenRelay => request.header("Token", &server.token),
        BackendKind::WebSession => request.header("X-Api-Key", &server.token),
        BackendKind::OtpPremium => {
            request.header("Authorization", format!("Bearer {}", server.token))
        }
    };

    let response = match request.send().await {
        Ok(response) => response,
        Err(error) => {
            debug!(backend_id, %error, "health probe transport failure");
            return false;
        }
    };

    // Error statuses still carry interpretable bodies; only the shape
    // decides the verdict.
    let body = match response.json::<Value>().await {
        Ok(body) => body,
        Err(error) => {
            debug!(backend_id, %error, "health probe returned non-json body");
            return false;
        }
    };

    match kind {
        BackendKind::TextSession => body
            .as_object()
            .is_some_and(|map| map.contains_key("success")),
        BackendKind::TokenRelay => body.get("code").and_then(Value::as_i64) == Some(200),
        BackendKind::WebSession => body
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        BackendKind::OtpPremium => {
            body.get("status").and_then(Value::as_str) == Some("success")
        }
    }
}
