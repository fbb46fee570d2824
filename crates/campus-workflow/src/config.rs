//! Workflow configuration.

use std::time::Duration;

use serde::Deserialize;

/// Shortest temporary credential ever issued, whatever the configuration says.
pub const MIN_TEMPORARY_CREDENTIAL_LENGTH: usize = 12;

/// Configuration for the workflow services.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Length of the one-time credential issued on approval (min 12).
    pub temporary_credential_length: usize,
    /// Upper bound on a single approval notice delivery, in seconds.
    pub notification_timeout_secs: u64,
    /// How many times a registration that lost a storage race is retried.
    pub register_retry_attempts: u32,
    /// When set, content edits send an approved or rejected event back
    /// to `pending` for another review.
    pub resubmit_on_edit: bool,
    /// Minimum password length accepted at sign-up.
    pub min_password_length: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            temporary_credential_length: MIN_TEMPORARY_CREDENTIAL_LENGTH,
            notification_timeout_secs: 10,
            register_retry_attempts: 5,
            resubmit_on_edit: false,
            min_password_length: 6,
        }
    }
}

impl WorkflowConfig {
    pub fn credential_length(&self) -> usize {
        self.temporary_credential_length
            .max(MIN_TEMPORARY_CREDENTIAL_LENGTH)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_secs(self.notification_timeout_secs)
    }
}
