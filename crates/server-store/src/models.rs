use rusqlite::Row;
use servercache_core::ServerRecord;

/// Decodes a `server` row by column name, so column order in the query does not matter.
pub(crate) fn server_from_row(row: &Row<'_>) -> rusqlite::Result<ServerRecord> {
    Ok(ServerRecord {
        host_name: row.get("host_name")?,
        ip_address: row.get("ip_address")?,
        score: row.get("score")?,
        ping: row.get("ping")?,
        speed: row.get("speed")?,
        country_long: row.get("country_long")?,
        country_short: row.get("country_short")?,
        vpn_sessions: row.get("vpn_sessions")?,
        uptime: row.get("uptime")?,
        total_users: row.get("total_users")?,
        total_traffic: row.get("total_traffic")?,
        log_type: row.get("log_type")?,
        operator: row.get("operator")?,
        message: row.get("message")?,
        config_data: row.get("config_data")?,
        port: row.get("port")?,
        protocol: row.get("protocol")?,
        is_old: row.get("is_old")?,
        is_starred: row.get("is_starred")?,
    })
}
