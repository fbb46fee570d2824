//! Campus Core: domain models, storage and collaborator traits, and the
//! error type shared by every crate in the workspace.

pub mod error;
pub mod models;
pub mod notify;
pub mod repository;
