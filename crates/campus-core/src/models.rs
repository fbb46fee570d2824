//! Domain models for the campus events workflow.
//!
//! These are the core types shared across all crates.

pub mod account;
pub mod event;
pub mod registration;
pub mod resource;
pub mod role;
