// SQLite revert ledger
// One row per reverted change; rows are upserted, never deleted

mod db;
mod error;
mod queries;
mod schema;

// Public API
pub use db::RevertLedger;
pub use error::{Error, Result};
pub use schema::SCHEMA_VERSION;
