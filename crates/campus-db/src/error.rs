//! Database-specific error types and conversions.

use campus_core::error::CampusError;

/// Prefix of the codes raised with `THROW` inside transactional scripts.
pub(crate) const ABORT_PREFIX: &str = "campus:";

/// Business-rule aborts raised from inside a SurrealQL transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    NotFound,
    AlreadyApproved,
    EventNotOpen,
    AlreadyRegistered,
    EventFull,
}

impl Abort {
    const ALL: [Abort; 5] = [
        Abort::NotFound,
        Abort::AlreadyApproved,
        Abort::EventNotOpen,
        Abort::AlreadyRegistered,
        Abort::EventFull,
    ];

    pub(crate) fn code(&self) -> &'static str {
        match self {
            Abort::NotFound => "campus:not_found",
            Abort::AlreadyApproved => "campus:already_approved",
            Abort::EventNotOpen => "campus:event_not_open",
            Abort::AlreadyRegistered => "campus:already_registered",
            Abort::EventFull => "campus:event_full",
        }
    }

    /// Finds an abort code embedded in an engine error message.
    pub(crate) fn find(message: &str) -> Option<Self> {
        if !message.contains(ABORT_PREFIX) {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|abort| message.contains(abort.code()))
    }
}

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Transaction aborted: {0:?}")]
    Aborted(Abort),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for CampusError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CampusError::NotFound { entity, id },
            DbError::Surreal(e) => classify(e.to_string()),
            DbError::Query(message) => classify(message),
            DbError::Aborted(abort) => {
                CampusError::Conflict(format!("transaction aborted: {}", abort.code()))
            }
            DbError::Migration(message) | DbError::Corrupt(message) => {
                CampusError::Internal(message)
            }
        }
    }
}

/// Sorts an engine failure into retryable conflict, uniqueness
/// violation, or general unavailability.
fn classify(message: String) -> CampusError {
    let lower = message.to_lowercase();
    if lower.contains("conflict") || lower.contains("can be retried") {
        CampusError::Conflict(message)
    } else if lower.contains("already contains") {
        CampusError::AlreadyExists {
            entity: index_entity(&message).unwrap_or("record").to_string(),
        }
    } else {
        CampusError::StorageUnavailable(message)
    }
}

/// Extracts the table from a unique-index message such as
/// ``Database index `idx_account_email` already contains ...``.
fn index_entity(message: &str) -> Option<&str> {
    let start = message.find("`idx_")? + "`idx_".len();
    let rest = &message[start..];
    let end = rest.find(['_', '`'])?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_codes_are_found_in_engine_messages() {
        let msg = "An error occurred: campus:event_full";
        assert_eq!(Abort::find(msg), Some(Abort::EventFull));
        assert_eq!(Abort::find("The query was not executed due to a failed transaction"), None);
    }

    #[test]
    fn retryable_conflicts_map_to_conflict() {
        let err: CampusError = DbError::Query(
            "Failed to commit transaction due to a read or write conflict. \
             This transaction can be retried"
                .into(),
        )
        .into();
        assert!(matches!(err, CampusError::Conflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn unique_index_violation_maps_to_already_exists() {
        let err: CampusError = DbError::Query(
            "Database index `idx_account_email` already contains 'a@x.edu', \
             with record `account:abc`"
                .into(),
        )
        .into();
        match err {
            CampusError::AlreadyExists { entity } => assert_eq!(entity, "account"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn other_failures_are_storage_unavailable() {
        let err: CampusError = DbError::Query("connection reset".into()).into();
        assert!(matches!(err, CampusError::StorageUnavailable(_)));
    }
}
