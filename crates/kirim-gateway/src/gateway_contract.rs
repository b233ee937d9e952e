//! Gateway contract types shared by the dispatcher, adapter, and stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Backend identifiers callers may name explicitly in a send request.
pub const KNOWN_BACKEND_IDS: [u32; 4] = [3, 4, 8, 99];

/// Lower bound of the automatic-selection candidate range.
pub const AUTO_SELECT_MIN_BACKEND_ID: u32 = 3;

/// Upper bound of the automatic-selection candidate range. The OTP
/// backend (99) sits outside it on purpose: it is paid and opt-in, so
/// automatic selection can never promote it.
pub const AUTO_SELECT_MAX_BACKEND_ID: u32 = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Enumerates the known messaging backends, one variant per wire contract.
pub enum BackendKind {
    /// Backend 3: session-keyed text API, bearer-token auth.
    TextSession,
    /// Backend 4: token-header relay, group suffix handled in the body.
    TokenRelay,
    /// Backend 8: web-session API, api-key header auth.
    WebSession,
    /// Backend 99: paid OTP delivery, credentials in the form body.
    OtpPremium,
}

impl BackendKind {
    /// Maps a raw backend identifier to a known kind. Unknown ids are
    /// absent, not an error.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            3 => Some(Self::TextSession),
            4 => Some(Self::TokenRelay),
            8 => Some(Self::WebSession),
            99 => Some(Self::OtpPremium),
            _ => None,
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Self::TextSession => 3,
            Self::TokenRelay => 4,
            Self::WebSession => 8,
            Self::OtpPremium => 99,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextSession => "text_session",
            Self::TokenRelay => "token_relay",
            Self::WebSession => "web_session",
            Self::OtpPremium => "otp_premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One logical outbound send, as the caller describes it.
pub struct SendRequest {
    pub to: String,
    pub message: String,
    pub backend_id: u32,
    pub is_group: bool,
    pub auto_select: bool,
    pub correlation_id: Option<String>,
}

impl SendRequest {
    /// Builds a direct (non-group, non-automatic) send request.
    pub fn new(to: impl Into<String>, message: impl Into<String>, backend_id: u32) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
            backend_id,
            is_group: false,
            auto_select: false,
            correlation_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Uniform outcome of a dispatched send: the backend's real status code
/// and raw response body, or a synthesized 500 on transport failure.
pub struct SendOutcome {
    pub status: u16,
    pub message: String,
}

/// Caller-input violations. Backend-side failures never surface here;
/// they are normalized into [`SendOutcome`] instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("backend id {0} is not one of the sendable backends [3, 4, 8, 99]")]
    InvalidBackend(u32),
    #[error("send request field '{0}' cannot be empty")]
    MissingField(&'static str),
    #[error("backend id {0} cannot carry this request (unconfigured, unknown, or group-unsupported)")]
    UnsupportedBackend(u32),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Audit trail entry written once per send attempt, before transport.
pub struct AuditRecord {
    pub number: String,
    pub message: String,
    pub payload: Value,
    pub correlation_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Durable sink for [`AuditRecord`]s. Implementations own their write
/// safety; the dispatcher logs and swallows sink failures so audit
/// trouble never blocks a send.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: &AuditRecord) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_backend_kind_round_trips_known_ids() {
        for id in KNOWN_BACKEND_IDS {
            let kind = BackendKind::from_id(id).expect("known id");
            assert_eq!(kind.id(), id);
        }
    }

    #[test]
    fn unit_backend_kind_rejects_unknown_ids() {
        for id in [0, 1, 2, 5, 6, 7, 9, 42, 100] {
            assert!(BackendKind::from_id(id).is_none());
        }
    }

    #[test]
    fn unit_auto_select_range_excludes_otp_backend() {
        assert!(BackendKind::OtpPremium.id() > AUTO_SELECT_MAX_BACKEND_ID);
    }
}
