//! Outbound messaging gateway core for kirim.
//!
//! Provides the backend contract types, gateway configuration model,
//! per-backend payload adaptation, health probing, random backend
//! selection, and the send dispatcher that ties them together.
//!
//! ```rust
//! use kirim_gateway::{BackendServerConfig, GatewayConfig};
//!
//! let mut overrides = GatewayConfig::default();
//! overrides.footer = "\n--\nsent by kirim".to_string();
//! overrides.servers.insert(
//!     3,
//!     BackendServerConfig {
//!         base_url: "https://wa.example.net".to_string(),
//!         session_id: "primary".to_string(),
//!         ..BackendServerConfig::default()
//!     },
//! );
//!
//! let config = GatewayConfig::merged(overrides);
//! assert!(config.servers.contains_key(&99));
//! ```

pub mod gateway_config;
pub mod gateway_contract;
pub mod gateway_health;
pub mod gateway_payload;
pub mod gateway_select;
pub mod gateway_send;

pub use gateway_config::*;
pub use gateway_contract::*;
pub use gateway_health::*;
pub use gateway_payload::*;
pub use gateway_select::*;
pub use gateway_send::*;
