//! Persistent store for gateway server credentials and message audit
//! logs, plus the projection that turns active server records into a
//! runnable [`kirim_gateway::GatewayConfig`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod sqlite;

pub use sqlite::ServerStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn default_backend_id() -> u32 {
    3
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One configured backend server row.
pub struct ServerRecord {
    pub id: i64,
    pub backend_id: u32,
    pub name: String,
    pub base_url: String,
    pub token: String,
    pub session_id: String,
    pub phone: String,
    pub user_key: String,
    pub pass_key: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Input fields for creating or updating a server row. Every field is
/// defaulted so partial admin payloads deserialize cleanly.
pub struct ServerDraft {
    #[serde(default = "default_backend_id")]
    pub backend_id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub user_key: String,
    #[serde(default)]
    pub pass_key: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Default for ServerDraft {
    fn default() -> Self {
        Self {
            backend_id: default_backend_id(),
            name: String::new(),
            base_url: String::new(),
            token: String::new(),
            session_id: String::new(),
            phone: String::new(),
            user_key: String::new(),
            pass_key: String::new(),
            is_active: default_active(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// One persisted send-attempt audit row.
pub struct MessageLogRecord {
    pub id: i64,
    pub number: String,
    pub message: String,
    pub payload: String,
    pub correlation_id: String,
    pub status: String,
    pub created_at: String,
}
