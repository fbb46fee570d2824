//! Error types for the campus events workflow.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum CampusError {
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Invalid schedule: start time must be before end time")]
    InvalidSchedule,

    #[error("Unknown venue: {venue_id}")]
    UnknownVenue { venue_id: Uuid },

    #[error("Event {event_id} is not open for registration")]
    EventNotOpen { event_id: Uuid },

    #[error("Event {event_id} has reached its capacity")]
    EventFull { event_id: Uuid },

    #[error("Student is already registered for event {event_id}")]
    AlreadyRegistered { event_id: Uuid },

    #[error("Account is pending admin approval")]
    AccountPendingApproval,

    #[error("Account {account_id} has already been approved")]
    AccountAlreadyApproved { account_id: Uuid },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    /// The credential was replaced but the approval flag did not commit.
    #[error("Partial approval of account {account_id}: {reason}")]
    PartialApprovalFailure { account_id: Uuid, reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CampusError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether repeating the same call may succeed.
    ///
    /// Only storage-layer failures qualify; business-rule failures are
    /// final for the current state.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Conflict(_))
    }
}

pub type CampusResult<T> = Result<T, CampusError>;
