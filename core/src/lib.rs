//! Shared types for the server cache: the record that is fetched, persisted and diffed.

use serde::{Deserialize, Serialize};

pub const fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// One cached VPN server descriptor.
///
/// Everything except `is_old` and `is_starred` is taken verbatim from the fetched
/// directory listing. `is_starred` is user state and is never derived from fetched data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerRecord {
    pub host_name: String,
    pub ip_address: String,
    pub score: i32,
    /// Ping as reported by the directory, e.g. "12" or "-".
    pub ping: String,
    /// Line speed in bits per second.
    pub speed: i64,
    pub country_long: String,
    pub country_short: String,
    pub vpn_sessions: i64,
    /// Uptime in seconds.
    pub uptime: i64,
    pub total_users: i64,
    pub total_traffic: String,
    pub log_type: String,
    pub operator: String,
    pub message: String,
    /// Opaque tunnel configuration payload.
    pub config_data: String,
    pub port: i32,
    /// "UDP" or "TCP".
    pub protocol: String,
    pub is_old: bool,
    pub is_starred: bool,
}

impl ServerRecord {
    pub fn new(host_name: impl Into<String>, ip_address: impl Into<String>) -> Self {
        ServerRecord {
            host_name: host_name.into(),
            ip_address: ip_address.into(),
            ..Default::default()
        }
    }
}
