//! SQLite-backed cache of VPN server records with starred-row preservation.

mod error;
mod open;
mod models;
mod insert;
mod query;
mod schema;
mod shared;

pub use error::{StoreError, StoreResult};
pub use open::{ServerStore, StoreConfig};
pub use schema::SCHEMA_VERSION;
pub use shared::SharedStore;
