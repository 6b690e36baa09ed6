use crate::error::{During, StoreError, StoreResult};
use crate::schema::{CREATE_SERVER, DROP_SERVER, SCHEMA_VERSION, SERVER_TABLE};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const DB_FILE_NAME: &str = "servercache.db";
const BUSY_TIMEOUT_DEFAULT: Duration = Duration::from_millis(2000);
const SYNCHRONOUS_DEFAULT: &str = "NORMAL";

/// Where and how the server table is stored.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    pub busy_timeout: Duration,
    pub synchronous: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from(DB_FILE_NAME),
            busy_timeout: BUSY_TIMEOUT_DEFAULT,
            synchronous: SYNCHRONOUS_DEFAULT.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig { path: path.into(), ..Default::default() }
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.busy_timeout = timeout;
        }
        self
    }

    /// Accepts OFF, NORMAL, FULL or EXTRA (any case); anything else keeps the current value.
    pub fn synchronous(mut self, mode: &str) -> Self {
        if let Some(mode) = parse_synchronous(mode) {
            self.synchronous = mode;
        }
        self
    }
}

fn parse_synchronous(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_ascii_uppercase();
    match normalized.as_str() {
        "OFF" | "NORMAL" | "FULL" | "EXTRA" => Some(normalized),
        _ => None,
    }
}

/// Durable store of the known-server set.
///
/// No connection is held between calls: every operation opens its own and drops it
/// when the operation returns, on success and on error alike.
#[derive(Debug)]
pub struct ServerStore {
    config: StoreConfig,
}

impl ServerStore {
    /// Creates the database file and parent directory if needed and brings the schema up to date.
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io { op: "open", source: Box::new(e) })?;
        }
        let store = ServerStore { config };
        let mut conn = store.connect()?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get::<_, String>(0))
            .during("open")?;
        migrate(&mut conn)?;
        debug!(path = %store.config.path.display(), "server store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub(crate) fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.config.path).during("connect")?;
        conn.busy_timeout(self.config.busy_timeout).during("connect")?;
        conn.pragma_update(None, "synchronous", &self.config.synchronous)
            .during("connect")?;
        Ok(conn)
    }
}

pub(crate) fn table_exists(conn: &Connection, name: &str) -> StoreResult<bool> {
    let cnt: i64 = conn
        .query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
            [name],
            |r| r.get(0),
        )
        .during("table_exists")?;
    Ok(cnt > 0)
}

/// The cache is disposable: any version mismatch, up or down, rebuilds the table.
fn migrate(conn: &mut Connection) -> StoreResult<()> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |r| r.get(0))
        .during("migrate")?;
    let exists = table_exists(conn, SERVER_TABLE)?;
    if exists && version == SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction().during("migrate")?;
    if exists {
        info!(from = version, to = SCHEMA_VERSION, "server schema version changed, rebuilding table");
        tx.execute_batch(DROP_SERVER).during("migrate")?;
    } else {
        info!(version = SCHEMA_VERSION, "creating server table");
    }
    tx.execute_batch(CREATE_SERVER).during("migrate")?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION).during("migrate")?;
    tx.commit().during("migrate")?;
    Ok(())
}
