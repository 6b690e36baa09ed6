use crate::error::{During, StoreResult};
use crate::ServerStore;
use rusqlite::named_params;
use servercache_core::ServerRecord;
use tracing::debug;

const INSERT_SERVER: &str = "INSERT INTO server(host_name,ip_address,score,ping,speed,country_long,country_short,vpn_sessions,uptime,total_users,total_traffic,log_type,operator,message,config_data,port,protocol,is_old,is_starred)
 VALUES (:host_name,:ip_address,:score,:ping,:speed,:country_long,:country_short,:vpn_sessions,:uptime,:total_users,:total_traffic,:log_type,:operator,:message,:config_data,:port,:protocol,0,0)";

impl ServerStore {
    /// Swaps the non-starred rows for `servers` in one transaction.
    ///
    /// Starred rows are left exactly as they are, even when `servers` lists the same
    /// server again; the fresh copy is inserted next to the starred one. Every inserted
    /// row starts unstarred and not old, whatever the incoming flags say.
    pub fn replace(&self, servers: &[ServerRecord]) -> StoreResult<()> {
        self.replace_with(servers, |_, _| Ok(()))
    }

    /// `replace` with a hook run before each insert; an error from the hook aborts
    /// and rolls back the whole replacement.
    pub(crate) fn replace_with<F>(&self, servers: &[ServerRecord], mut before_insert: F) -> StoreResult<()>
    where
        F: FnMut(usize, &ServerRecord) -> StoreResult<()>,
    {
        let mut conn = self.connect()?;
        let tx = conn.transaction().during("replace")?;
        let purged = tx
            .execute("DELETE FROM server WHERE is_starred = 0", [])
            .during("replace")?;
        {
            let mut stmt = tx.prepare(INSERT_SERVER).during("replace")?;
            for (idx, s) in servers.iter().enumerate() {
                before_insert(idx, s)?;
                stmt.execute(named_params! {
                    ":host_name": s.host_name,
                    ":ip_address": s.ip_address,
                    ":score": s.score,
                    ":ping": s.ping,
                    ":speed": s.speed,
                    ":country_long": s.country_long,
                    ":country_short": s.country_short,
                    ":vpn_sessions": s.vpn_sessions,
                    ":uptime": s.uptime,
                    ":total_users": s.total_users,
                    ":total_traffic": s.total_traffic,
                    ":log_type": s.log_type,
                    ":operator": s.operator,
                    ":message": s.message,
                    ":config_data": s.config_data,
                    ":port": s.port,
                    ":protocol": s.protocol,
                })
                .during("replace")?;
            }
        }
        tx.commit().during("replace")?;
        debug!(purged, inserted = servers.len(), "replaced server set");
        Ok(())
    }

    /// Sets the starred flag on every row with this ip. Matching nothing is not an error.
    pub fn set_starred(&self, ip_address: &str, starred: bool) -> StoreResult<()> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE server SET is_starred = :starred WHERE ip_address = :ip",
                named_params! { ":starred": starred, ":ip": ip_address },
            )
            .during("set_starred")?;
        debug!(ip_address, starred, updated, "updated starred flag");
        Ok(())
    }
}
