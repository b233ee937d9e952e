//! Pure payload adaptation: one logical send mapped onto the wire
//! contract of a concrete backend.
//!
//! Each backend has its own endpoint path, header set, body shape, and
//! encoding; there is no generic auth abstraction because the split
//! between headers and body credentials IS the wire contract.

use serde_json::{json, Value};

use crate::gateway_config::GatewayConfig;
use crate::gateway_contract::BackendKind;
use crate::gateway_select::random_alnum_token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `PayloadEncoding` values.
pub enum PayloadEncoding {
    Json,
    Form,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Backend-specific HTTP request descriptor produced by [`build_payload`].
pub struct GatewayPayload {
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub encoding: PayloadEncoding,
}

/// Maps (backend, recipient, message, group flag) to a request
/// descriptor. Returns `None` when the backend id is unknown, the
/// backend has no server slot, or the OTP backend is asked to deliver
/// to a group.
pub fn build_payload(
    backend_id: u32,
    number: &str,
    message_raw: &str,
    is_group: bool,
    config: &GatewayConfig,
) -> Option<GatewayPayload> {
    let kind = BackendKind::from_id(backend_id)?;
    let server = config.server(backend_id)?;
    let message_full = format!("{message_raw}{}", config.footer);

    match kind {
        BackendKind::TextSession => Some(GatewayPayload {
            endpoint: format!("{}/message/send-text", server.base_url),
            headers: bearer_header(&server.token),
            body: Some(json!({
                "session": server.session_id,
                "to": number,
                "is_group": is_group,
                "delay": 5000,
                "text": normalize_newlines(&message_full),
            })),
            encoding: PayloadEncoding::Json,
        }),
        BackendKind::TokenRelay => {
            let phone = if number.contains("g.us") {
                number.to_string()
            } else if is_group {
                format!("{number}@g.us")
            } else {
                number.to_string()
            };
            Some(GatewayPayload {
                // This backend's configured base URL carries its own
                // trailing slash; no separator is inserted.
                endpoint: format!("{}chat/send/text", server.base_url),
                headers: named_token_header("Token", &server.token),
                body: Some(json!({
                    "Phone": phone,
                    "Body": normalize_newlines(&message_full),
                    "Id": random_alnum_token(20),
                })),
                encoding: PayloadEncoding::Json,
            })
        }
        BackendKind::WebSession => Some(GatewayPayload {
            endpoint: format!("{}/chats/send-text", server.base_url),
            headers: named_token_header("X-Api-Key", &server.token),
            body: Some(json!({
                "sessionId": server.session_id,
                "chatId": number,
                "message": normalize_newlines(&message_full),
                "typingTime": 5000,
                "replyTo": null,
            })),
            encoding: PayloadEncoding::Json,
        }),
        BackendKind::OtpPremium => {
            if is_group {
                return None;
            }
            // OTP bodies go out untouched: no footer, no newline
            // rewriting. Altered codes are worthless.
            Some(GatewayPayload {
                endpoint: format!("{}/wareguler/api/sendWA", server.base_url),
                headers: Vec::new(),
                body: Some(json!({
                    "userkey": server.user_key,
                    "passkey": server.pass_key,
                    "to": number,
                    "message": message_raw,
                })),
                encoding: PayloadEncoding::Form,
            })
        }
    }
}

/// Collapses literal escaped newline sequences and real CR/CRLF
/// characters to a single `\n` form.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\\r\\n", "\n")
        .replace("\\n", "\n")
        .replace("\\r", "\n")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

fn bearer_header(token: &str) -> Vec<(String, String)> {
    if token.is_empty() {
        Vec::new()
    } else {
        vec![("Authorization".to_string(), format!("Bearer {token}"))]
    }
}

fn named_token_header(name: &str, token: &str) -> Vec<(String, String)> {
    if token.is_empty() {
        Vec::new()
    } else {
        vec![(name.to_string(), token.to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway_config::BackendServerConfig;

    fn config_with(backend_id: u32, server: BackendServerConfig, footer: &str) -> GatewayConfig {
        let mut overrides = GatewayConfig::default();
        overrides.footer = footer.to_string();
        overrides.servers.insert(backend_id, server);
        GatewayConfig::merged(overrides)
    }

    #[test]
    fn unit_build_payload_returns_none_for_unknown_backend() {
        let config = GatewayConfig::merged(GatewayConfig::default());
        assert!(build_payload(5, "628123", "hi", false, &config).is_none());
    }

    #[test]
    fn unit_build_payload_returns_none_for_missing_server_slot() {
        // A snapshot-built config may omit slots entirely.
        let config = GatewayConfig::default();
        assert!(build_payload(3, "628123", "hi", false, &config).is_none());
    }

    #[test]
    fn unit_text_session_payload_carries_session_footer_and_bearer() {
        let config = config_with(
            3,
            BackendServerConfig {
                base_url: "https://v3.example.net".to_string(),
                session_id: "primary".to_string(),
                token: "secret".to_string(),
                ..BackendServerConfig::default()
            },
            "\n--sig",
        );

        let payload = build_payload(3, "6281234", "halo", false, &config).expect("payload");
        assert_eq!(payload.endpoint, "https://v3.example.net/message/send-text");
        assert_eq!(payload.encoding, PayloadEncoding::Json);
        assert_eq!(
            payload.headers,
            vec![(
                "Authorization".to_string(),
                "Bearer secret".to_string()
            )]
        );
        let body = payload.body.expect("body");
        assert_eq!(body["session"], "primary");
        assert_eq!(body["to"], "6281234");
        assert_eq!(body["is_group"], false);
        assert_eq!(body["delay"], 5000);
        assert_eq!(body["text"], "halo\n--sig");
    }

    #[test]
    fn unit_text_session_payload_omits_auth_header_without_token() {
        let config = config_with(
            3,
            BackendServerConfig {
                base_url: "https://v3.example.net".to_string(),
                ..BackendServerConfig::default()
            },
            "",
        );

        let payload = build_payload(3, "6281234", "halo", false, &config).expect("payload");
        assert!(payload.headers.is_empty());
    }

    #[test]
    fn unit_token_relay_payload_appends_group_suffix_once() {
        let config = config_with(
            4,
            BackendServerConfig {
                base_url: "https://v4.example.net/".to_string(),
                token: "relay".to_string(),
                ..BackendServerConfig::default()
            },
            "",
        );

        let group = build_payload(4, "12036399", "halo", true, &config).expect("payload");
        let body = group.body.expect("body");
        assert_eq!(body["Phone"], "12036399@g.us");
        assert_eq!(
            body["Id"].as_str().map(str::len),
            Some(20),
            "relay message id is a 20-char token"
        );
        assert_eq!(group.endpoint, "https://v4.example.net/chat/send/text");
        assert_eq!(
            group.headers,
            vec![("Token".to_string(), "relay".to_string())]
        );

        let already_suffixed =
            build_payload(4, "12036399@g.us", "halo", true, &config).expect("payload");
        assert_eq!(
            already_suffixed.body.expect("body")["Phone"],
            "12036399@g.us"
        );
    }

    #[test]
    fn unit_web_session_payload_uses_api_key_header() {
        let config = config_with(
            8,
            BackendServerConfig {
                base_url: "https://v8.example.net".to_string(),
                session_id: "web-a".to_string(),
                token: "api-key".to_string(),
                ..BackendServerConfig::default()
            },
            "",
        );

        let payload = build_payload(8, "6281234", "halo", false, &config).expect("payload");
        assert_eq!(payload.endpoint, "https://v8.example.net/chats/send-text");
        assert_eq!(
            payload.headers,
            vec![("X-Api-Key".to_string(), "api-key".to_string())]
        );
        let body = payload.body.expect("body");
        assert_eq!(body["sessionId"], "web-a");
        assert_eq!(body["chatId"], "6281234");
        assert_eq!(body["typingTime"], 5000);
        assert!(body["replyTo"].is_null());
    }

    #[test]
    fn unit_otp_payload_rejects_group_sends() {
        let config = config_with(
            99,
            BackendServerConfig {
                base_url: "https://otp.example.net".to_string(),
                user_key: "uk".to_string(),
                pass_key: "pk".to_string(),
                ..BackendServerConfig::default()
            },
            "",
        );
        assert!(build_payload(99, "6281234", "OTP 123", true, &config).is_none());
    }

    #[test]
    fn unit_otp_payload_never_appends_footer() {
        let config = config_with(
            99,
            BackendServerConfig {
                base_url: "https://otp.example.net".to_string(),
                user_key: "uk".to_string(),
                pass_key: "pk".to_string(),
                ..BackendServerConfig::default()
            },
            "--sig",
        );

        let payload = build_payload(99, "6281234", "OTP 123", false, &config).expect("payload");
        assert_eq!(payload.encoding, PayloadEncoding::Form);
        assert!(payload.headers.is_empty());
        assert_eq!(payload.endpoint, "https://otp.example.net/wareguler/api/sendWA");
        let body = payload.body.expect("body");
        assert_eq!(body["message"], "OTP 123");
        assert_eq!(body["userkey"], "uk");
        assert_eq!(body["passkey"], "pk");
    }

    #[test]
    fn unit_normalize_newlines_collapses_escaped_and_real_sequences() {
        assert_eq!(normalize_newlines("a\\r\\nb"), "a\nb");
        assert_eq!(normalize_newlines("a\\nb\\rc"), "a\nb\nc");
        assert_eq!(normalize_newlines("a\r\nb\rc"), "a\nb\nc");
        assert_eq!(normalize_newlines("plain"), "plain");
    }
}
