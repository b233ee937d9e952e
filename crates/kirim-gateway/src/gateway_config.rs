//! Typed gateway configuration with field-by-field default merging.
//!
//! Replaces the loosely-typed recursive config merge of older gateways:
//! every known backend slot always exists after [`GatewayConfig::merged`],
//! so the payload adapter never has to distinguish "slot missing" from
//! "slot empty" for the built-in backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::gateway_contract::KNOWN_BACKEND_IDS;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Connection parameters for a single backend. Which fields matter is
/// backend-specific; unused fields stay empty.
pub struct BackendServerConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_key: String,
    #[serde(default)]
    pub pass_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
/// Gateway-wide configuration: the message footer plus one server slot
/// per backend identifier.
pub struct GatewayConfig {
    #[serde(default)]
    pub footer: String,
    #[serde(default)]
    pub servers: BTreeMap<u32, BackendServerConfig>,
}

impl GatewayConfig {
    /// Built-in default: every known backend present with empty values.
    pub fn known_defaults() -> Self {
        let mut servers = BTreeMap::new();
        for id in KNOWN_BACKEND_IDS {
            servers.insert(id, BackendServerConfig::default());
        }
        Self {
            footer: String::new(),
            servers,
        }
    }

    /// Applies caller overrides on top of [`GatewayConfig::known_defaults`].
    /// Override slots replace defaults wholesale; slots the caller does
    /// not mention keep their empty defaults, and extra (unknown-id)
    /// slots are kept as-is. Re-merging a merged config is a no-op.
    pub fn merged(overrides: GatewayConfig) -> Self {
        let mut config = Self::known_defaults();
        config.footer = overrides.footer;
        for (backend_id, server) in overrides.servers {
            config.servers.insert(backend_id, server);
        }
        config
    }

    /// Server slot lookup; absent for ids never configured or merged in.
    pub fn server(&self, backend_id: u32) -> Option<&BackendServerConfig> {
        self.servers.get(&backend_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_known_defaults_cover_every_known_backend() {
        let config = GatewayConfig::known_defaults();
        for id in KNOWN_BACKEND_IDS {
            assert_eq!(config.server(id), Some(&BackendServerConfig::default()));
        }
        assert!(config.footer.is_empty());
    }

    #[test]
    fn unit_merged_keeps_overrides_and_fills_missing_slots() {
        let mut overrides = GatewayConfig::default();
        overrides.footer = "\n--footer".to_string();
        overrides.servers.insert(
            4,
            BackendServerConfig {
                base_url: "https://relay.example.net/".to_string(),
                token: "relay-token".to_string(),
                ..BackendServerConfig::default()
            },
        );
        overrides
            .servers
            .insert(7, BackendServerConfig::default());

        let config = GatewayConfig::merged(overrides);
        assert_eq!(config.footer, "\n--footer");
        assert_eq!(
            config.server(4).map(|server| server.token.as_str()),
            Some("relay-token")
        );
        assert!(config.server(3).is_some());
        assert!(config.server(99).is_some());
        assert!(config.server(7).is_some());
    }

    #[test]
    fn unit_merged_is_idempotent() {
        let mut overrides = GatewayConfig::default();
        overrides.servers.insert(
            8,
            BackendServerConfig {
                base_url: "https://web.example.net".to_string(),
                session_id: "session-a".to_string(),
                token: "api-key".to_string(),
                ..BackendServerConfig::default()
            },
        );

        let once = GatewayConfig::merged(overrides);
        let twice = GatewayConfig::merged(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn unit_config_round_trips_through_json() {
        let config = GatewayConfig::merged(GatewayConfig::default());
        let raw = serde_json::to_string(&config).expect("serialize config");
        let parsed: GatewayConfig = serde_json::from_str(&raw).expect("parse config");
        assert_eq!(parsed, config);
    }
}
