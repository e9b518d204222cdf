//! # vehiclehub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` session history using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`StateMirror`](vehiclehub_app::ports::mirror::StateMirror)
//!   port by appending every published session change to a history table
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (sqlx embedded migrations)
//! - Answer simple history queries (latest rows for a key)
//!
//! ## Dependency rule
//! Depends on `vehiclehub-app` (for port traits) and `vehiclehub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod history;
mod pool;

pub use error::StorageError;
pub use history::{HistoryRecord, SqliteHistory};
pub use pool::{Config, Database};
