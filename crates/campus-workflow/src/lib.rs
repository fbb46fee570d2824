//! Campus workflow: the authorization and state-transition layer for
//! accounts, events, registrations and resources.
//!
//! Every service is generic over the repository traits in
//! `campus-core`, so this crate has no dependency on the database.

pub mod approval;
pub mod authority;
pub mod config;
pub mod credential;
pub mod directory;
pub mod error;
pub mod events;
pub mod notify;
pub mod registration;
pub mod resources;

pub use approval::{AccountApproval, ApprovalOutcome, NoticeDelivery};
pub use authority::Authority;
pub use config::WorkflowConfig;
pub use directory::{AccountDirectory, SignUp};
pub use error::AuthError;
pub use events::EventLifecycle;
pub use notify::{ResendConfig, ResendNotifier};
pub use registration::RegistrationManager;
pub use resources::ResourceDirectory;
