//! SQLite-backed `ServerStore` with durable persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kirim_gateway::{AuditRecord, AuditSink, BackendKind, BackendServerConfig, GatewayConfig};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::{MessageLogRecord, ServerDraft, ServerRecord, StoreResult};

/// Persistent SQLite store for server configurations and message logs.
#[derive(Debug)]
pub struct ServerStore {
    db_path: PathBuf,
}

impl ServerStore {
    /// Creates a store at `path`, creating the schema if needed.
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        let connection = store.open_connection()?;
        store.initialize_schema(&connection)?;
        Ok(store)
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        let connection = Connection::open(&self.db_path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> StoreResult<()> {
        connection.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS backend_servers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                backend_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                base_url TEXT NOT NULL,
                token TEXT NOT NULL DEFAULT '',
                session_id TEXT NOT NULL DEFAULT '',
                phone TEXT NOT NULL DEFAULT '',
                user_key TEXT NOT NULL DEFAULT '',
                pass_key TEXT NOT NULL DEFAULT '',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_backend_servers_backend_id
                ON backend_servers (backend_id);
            CREATE INDEX IF NOT EXISTS idx_backend_servers_is_active
                ON backend_servers (is_active);

            CREATE TABLE IF NOT EXISTS message_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                number TEXT NOT NULL,
                message TEXT NOT NULL,
                payload TEXT NOT NULL DEFAULT '',
                correlation_id TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'sent',
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_message_logs_number
                ON message_logs (number);
            CREATE INDEX IF NOT EXISTS idx_message_logs_correlation_id
                ON message_logs (correlation_id);
            CREATE INDEX IF NOT EXISTS idx_message_logs_created_at
                ON message_logs (created_at);
            "#,
        )?;
        Ok(())
    }

    /// All servers, newest row first within each backend id.
    pub fn list(&self) -> StoreResult<Vec<ServerRecord>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT id, backend_id, name, base_url, token, session_id, phone,
                    user_key, pass_key, is_active, created_at, updated_at
             FROM backend_servers ORDER BY backend_id ASC, id DESC",
        )?;
        let rows = statement
            .query_map([], server_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_by_id(&self, id: i64) -> StoreResult<Option<ServerRecord>> {
        let connection = self.open_connection()?;
        let record = connection
            .query_row(
                "SELECT id, backend_id, name, base_url, token, session_id, phone,
                        user_key, pass_key, is_active, created_at, updated_at
                 FROM backend_servers WHERE id = ?1",
                params![id],
                server_record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// Newest server row for a backend, optionally restricted to active
    /// rows.
    pub fn get_by_backend(
        &self,
        backend_id: u32,
        active_only: bool,
    ) -> StoreResult<Option<ServerRecord>> {
        let connection = self.open_connection()?;
        let sql = if active_only {
            "SELECT id, backend_id, name, base_url, token, session_id, phone,
                    user_key, pass_key, is_active, created_at, updated_at
             FROM backend_servers WHERE backend_id = ?1 AND is_active = 1
             ORDER BY id DESC LIMIT 1"
        } else {
            "SELECT id, backend_id, name, base_url, token, session_id, phone,
                    user_key, pass_key, is_active, created_at, updated_at
             FROM backend_servers WHERE backend_id = ?1
             ORDER BY id DESC LIMIT 1"
        };
        let record = connection
            .query_row(sql, params![backend_id], server_record_from_row)
            .optional()?;
        Ok(record)
    }

    pub fn active_servers(&self) -> StoreResult<Vec<ServerRecord>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT id, backend_id, name, base_url, token, session_id, phone,
                    user_key, pass_key, is_active, created_at, updated_at
             FROM backend_servers WHERE is_active = 1
             ORDER BY backend_id ASC, id ASC",
        )?;
        let rows = statement
            .query_map([], server_record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Projects active server rows into a gateway configuration,
    /// keeping only the fields each backend's wire contract uses. For
    /// duplicate backend ids the newest active row wins.
    pub fn config_snapshot(&self) -> StoreResult<GatewayConfig> {
        let mut config = GatewayConfig::default();
        for record in self.active_servers()? {
            let mut server = BackendServerConfig {
                base_url: record.base_url,
                ..BackendServerConfig::default()
            };
            match BackendKind::from_id(record.backend_id) {
                Some(BackendKind::TextSession) => {
                    server.session_id = record.session_id;
                    server.token = record.token;
                }
                Some(BackendKind::TokenRelay) => {
                    server.token = record.token;
                }
                Some(BackendKind::WebSession) => {
                    server.session_id = record.session_id;
                    server.token = record.token;
                }
                Some(BackendKind::OtpPremium) => {
                    server.user_key = record.user_key;
                    server.pass_key = record.pass_key;
                }
                None => {}
            }
            config.servers.insert(record.backend_id, server);
        }
        Ok(config)
    }

    /// Inserts a server row and returns its id.
    pub fn create(&self, draft: &ServerDraft) -> StoreResult<i64> {
        let connection = self.open_connection()?;
        connection.execute(
            "INSERT INTO backend_servers (
                backend_id, name, base_url, token, session_id,
                phone, user_key, pass_key, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                draft.backend_id,
                draft.name,
                draft.base_url,
                draft.token,
                draft.session_id,
                draft.phone,
                draft.user_key,
                draft.pass_key,
                draft.is_active,
            ],
        )?;
        Ok(connection.last_insert_rowid())
    }

    /// Replaces a server row; false when no row matched.
    pub fn update(&self, id: i64, draft: &ServerDraft) -> StoreResult<bool> {
        let connection = self.open_connection()?;
        let affected = connection.execute(
            "UPDATE backend_servers SET
                backend_id = ?1, name = ?2, base_url = ?3, token = ?4,
                session_id = ?5, phone = ?6, user_key = ?7, pass_key = ?8,
                is_active = ?9, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?10",
            params![
                draft.backend_id,
                draft.name,
                draft.base_url,
                draft.token,
                draft.session_id,
                draft.phone,
                draft.user_key,
                draft.pass_key,
                draft.is_active,
                id,
            ],
        )?;
        Ok(affected > 0)
    }

    pub fn delete(&self, id: i64) -> StoreResult<bool> {
        let connection = self.open_connection()?;
        let affected = connection.execute("DELETE FROM backend_servers WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }

    /// Flips a server's active flag; false when no row matched.
    pub fn toggle_active(&self, id: i64) -> StoreResult<bool> {
        let connection = self.open_connection()?;
        let affected = connection.execute(
            "UPDATE backend_servers SET
                is_active = CASE WHEN is_active = 1 THEN 0 ELSE 1 END,
                updated_at = CURRENT_TIMESTAMP
             WHERE id = ?1",
            params![id],
        )?;
        Ok(affected > 0)
    }

    /// Inserts one message-log row and returns its id.
    pub fn log_message(
        &self,
        number: &str,
        message: &str,
        payload: &str,
        correlation_id: &str,
        status: &str,
    ) -> StoreResult<i64> {
        let connection = self.open_connection()?;
        connection.execute(
            "INSERT INTO message_logs (number, message, payload, correlation_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![number, message, payload, correlation_id, status],
        )?;
        Ok(connection.last_insert_rowid())
    }

    pub fn message_logs(&self, limit: u32, offset: u32) -> StoreResult<Vec<MessageLogRecord>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT id, number, message, payload, correlation_id, status, created_at
             FROM message_logs ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = statement
            .query_map(params![limit, offset], message_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn message_logs_by_number(
        &self,
        number: &str,
        limit: u32,
    ) -> StoreResult<Vec<MessageLogRecord>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(
            "SELECT id, number, message, payload, correlation_id, status, created_at
             FROM message_logs WHERE number = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = statement
            .query_map(params![number, limit], message_log_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Newest log row carrying `correlation_id`, if any.
    pub fn message_log_by_correlation(
        &self,
        correlation_id: &str,
    ) -> StoreResult<Option<MessageLogRecord>> {
        let connection = self.open_connection()?;
        let record = connection
            .query_row(
                "SELECT id, number, message, payload, correlation_id, status, created_at
                 FROM message_logs WHERE correlation_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![correlation_id],
                message_log_from_row,
            )
            .optional()?;
        Ok(record)
    }
}

impl AuditSink for ServerStore {
    fn record(&self, entry: &AuditRecord) -> anyhow::Result<()> {
        let payload = serde_json::to_string(&entry.payload)?;
        let id = self.log_message(
            &entry.number,
            &entry.message,
            &payload,
            &entry.correlation_id,
            "sent",
        )?;
        debug!(id, correlation_id = %entry.correlation_id, "audit record persisted");
        Ok(())
    }
}

fn server_record_from_row(row: &Row<'_>) -> rusqlite::Result<ServerRecord> {
    Ok(ServerRecord {
        id: row.get(0)?,
        backend_id: row.get(1)?,
        name: row.get(2)?,
        base_url: row.get(3)?,
        token: row.get(4)?,
        session_id: row.get(5)?,
        phone: row.get(6)?,
        user_key: row.get(7)?,
        pass_key: row.get(8)?,
        is_active: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn message_log_from_row(row: &Row<'_>) -> rusqlite::Result<MessageLogRecord> {
    Ok(MessageLogRecord {
        id: row.get(0)?,
        number: row.get(1)?,
        message: row.get(2)?,
        payload: row.get(3)?,
        correlation_id: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}
