//! Campus DB: SurrealDB connection management, schema migrations and
//! repository implementations for the `campus-core` traits.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Argon2id credential hashing ([`hash_secret`], [`verify_secret`])
//! - Error types ([`DbError`])

mod connection;
mod credential;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use credential::{hash_secret, verify_secret};
pub use error::{Abort, DbError};
pub use schema::{run_migrations, schema_v1};
