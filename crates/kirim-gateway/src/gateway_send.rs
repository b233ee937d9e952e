//! The send dispatcher: validation, normalization, backend resolution,
//! audit, transport, and uniform outcome reporting.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::gateway_config::GatewayConfig;
use crate::gateway_contract::{
    AuditRecord, AuditSink, BackendKind, GatewayError, SendOutcome, SendRequest,
    AUTO_SELECT_MAX_BACKEND_ID, AUTO_SELECT_MIN_BACKEND_ID,
};
use crate::gateway_health::probe_backend;
use crate::gateway_payload::{build_payload, PayloadEncoding};
use crate::gateway_select::{draw_candidate_backend, random_alnum_token};

const GENERATED_CORRELATION_ID_LEN: usize = 4;

/// Message-dispatch facade over the interchangeable backends.
///
/// One instance owns its HTTP client and configuration; sends are
/// self-contained and may run concurrently. Reconfiguration is not
/// atomic with respect to in-flight sends; hosts that need that must
/// synchronize around [`Gateway::set_config`].
pub struct Gateway {
    client: reqwest::Client,
    config: GatewayConfig,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Gateway {
    /// Builds a gateway from caller overrides merged over the built-in
    /// defaults, without an audit sink.
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_audit_sink(config, None)
    }

    pub fn with_audit_sink(config: GatewayConfig, audit: Option<Arc<dyn AuditSink>>) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: GatewayConfig::merged(config),
            audit,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Replaces the configuration, re-applying the default merge.
    pub fn set_config(&mut self, config: GatewayConfig) {
        self.config = GatewayConfig::merged(config);
    }

    pub fn set_audit_sink(&mut self, audit: Arc<dyn AuditSink>) {
        self.audit = Some(audit);
    }

    /// Dispatches one outbound message.
    ///
    /// Returns `Err` only for caller-input violations; every
    /// backend-side condition (including 4xx/5xx and transport
    /// failures) is reported through the returned [`SendOutcome`].
    pub async fn send(&self, request: &SendRequest) -> Result<SendOutcome, GatewayError> {
        if BackendKind::from_id(request.backend_id).is_none() && !request.auto_select {
            return Err(GatewayError::InvalidBackend(request.backend_id));
        }
        if request.to.is_empty() {
            return Err(GatewayError::MissingField("to"));
        }
        if request.message.is_empty() {
            return Err(GatewayError::MissingField("message"));
        }

        let number = normalize_msisdn(&request.to);
        let mut backend_id = request.backend_id;
        if request.auto_select {
            let candidate = draw_candidate_backend(
                AUTO_SELECT_MIN_BACKEND_ID,
                AUTO_SELECT_MAX_BACKEND_ID,
                &[],
            );
            if probe_backend(&self.client, candidate, &self.config).await {
                backend_id = candidate;
            } else {
                debug!(
                    candidate,
                    explicit = request.backend_id,
                    "candidate probe unhealthy, keeping explicit backend"
                );
            }
        }

        let payload = build_payload(
            backend_id,
            &number,
            &request.message,
            request.is_group,
            &self.config,
        )
        .ok_or(GatewayError::UnsupportedBackend(backend_id))?;
        debug!(backend_id, endpoint = %payload.endpoint, "payload built");

        let correlation_id = request
            .correlation_id
            .clone()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| random_alnum_token(GENERATED_CORRELATION_ID_LEN));

        if let Some(sink) = &self.audit {
            let entry = AuditRecord {
                number: number.clone(),
                message: request.message.clone(),
                payload: payload.body.clone().unwrap_or(Value::Null),
                correlation_id: correlation_id.clone(),
                timestamp: Utc::now(),
            };
            if let Err(error) = sink.record(&entry) {
                warn!(%error, correlation_id, "audit sink rejected send record");
            }
        }

        let mut http_request = self.client.post(&payload.endpoint);
        for (name, value) in &payload.headers {
            http_request = http_request.header(name, value);
        }
        if let Some(body) = &payload.body {
            http_request = match payload.encoding {
                PayloadEncoding::Json => http_request.json(body),
                PayloadEncoding::Form => http_request.form(body),
            };
        }

        let outcome = match http_request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                SendOutcome { status, message }
            }
            Err(error) => SendOutcome {
                status: 500,
                message: json!({ "error": error.to_string() }).to_string(),
            },
        };
        info!(
            backend_id,
            status = outcome.status,
            correlation_id,
            "gateway send dispatched"
        );
        Ok(outcome)
    }
}

/// Strips every non-digit character and replaces a leading `0` run with
/// the `62` country prefix. Total and idempotent on its own output.
pub fn normalize_msisdn(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.starts_with('0') {
        format!("62{}", digits.trim_start_matches('0'))
    } else {
        digits
    }
}
