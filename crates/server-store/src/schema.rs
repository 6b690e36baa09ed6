pub const SCHEMA_VERSION: i64 = 1;

pub const SERVER_TABLE: &str = "server";

pub const CREATE_SERVER: &str = r#"
CREATE TABLE server (
  _id             INTEGER PRIMARY KEY AUTOINCREMENT,
  host_name       TEXT NOT NULL,
  ip_address      TEXT NOT NULL,
  score           INTEGER NOT NULL DEFAULT 0,
  ping            TEXT NOT NULL DEFAULT '',
  speed           INTEGER NOT NULL DEFAULT 0,
  country_long    TEXT NOT NULL DEFAULT '',
  country_short   TEXT NOT NULL DEFAULT '',
  vpn_sessions    INTEGER NOT NULL DEFAULT 0,
  uptime          INTEGER NOT NULL DEFAULT 0,
  total_users     INTEGER NOT NULL DEFAULT 0,
  total_traffic   TEXT NOT NULL DEFAULT '',
  log_type        TEXT NOT NULL DEFAULT '',
  operator        TEXT NOT NULL DEFAULT '',
  message         TEXT NOT NULL DEFAULT '',
  config_data     TEXT NOT NULL DEFAULT '',
  port            INTEGER NOT NULL DEFAULT 0,
  protocol        TEXT NOT NULL DEFAULT '',
  is_old          INTEGER NOT NULL CHECK (is_old IN (0,1)) DEFAULT 0,
  is_starred      INTEGER NOT NULL CHECK (is_starred IN (0,1)) DEFAULT 0
);

CREATE INDEX idx_server_ip ON server(ip_address);
CREATE INDEX idx_server_starred ON server(is_starred);
"#;

pub const DROP_SERVER: &str = "DROP TABLE IF EXISTS server;";

/// Columns read back by `load_all`, decoded by name.
pub const SERVER_COLUMNS: &str = "host_name, ip_address, score, ping, speed, country_long, country_short, \
vpn_sessions, uptime, total_users, total_traffic, log_type, operator, message, config_data, port, protocol, \
is_old, is_starred";
