use crate::error::{During, StoreResult};
use crate::models::server_from_row;
use crate::schema::SERVER_COLUMNS;
use crate::ServerStore;
use servercache_core::ServerRecord;
use tracing::debug;

impl ServerStore {
    /// Every stored row, in storage order.
    pub fn load_all(&self) -> StoreResult<Vec<ServerRecord>> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SERVER_COLUMNS} FROM server"))
            .during("load_all")?;
        let servers = stmt
            .query_map([], server_from_row)
            .during("load_all")?
            .collect::<Result<Vec<_>, _>>()
            .during("load_all")?;
        debug!(count = servers.len(), "loaded servers");
        Ok(servers)
    }

    pub fn count(&self) -> StoreResult<usize> {
        let conn = self.connect()?;
        let n: i64 = conn
            .query_row("SELECT COUNT(1) FROM server", [], |r| r.get(0))
            .during("count")?;
        Ok(n as usize)
    }
}
