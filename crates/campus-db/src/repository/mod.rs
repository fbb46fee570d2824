//! SurrealDB repository implementations.
//!
//! Records are keyed by the string form of their UUID. Datetimes are
//! written through `<datetime>` casts of RFC 3339 strings and read back
//! through `<string>` casts, so rows deserialize into plain serde structs.

mod account;
mod credential;
mod event;
mod registration;
mod resource;
mod role;

pub use account::SurrealAccountRepository;
pub use credential::SurrealCredentialStore;
pub use event::SurrealEventRepository;
pub use registration::SurrealRegistrationRepository;
pub use resource::SurrealResourceRepository;
pub use role::SurrealRoleRepository;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use surrealdb::Response;
use uuid::Uuid;

use crate::error::{Abort, DbError};

/// Row struct for `count()` queries.
#[derive(Debug, Deserialize)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// Surface the first statement error in a multi-statement response.
///
/// A `THROW` raised inside a transaction becomes [`DbError::Aborted`];
/// the companion "not executed due to a failed transaction" errors on
/// the remaining statements are skipped in favor of the real cause.
pub(crate) fn check(mut response: Response) -> Result<Response, DbError> {
    let errors = response.take_errors();
    if errors.is_empty() {
        return Ok(response);
    }

    let mut messages: Vec<(usize, String)> = errors
        .into_iter()
        .map(|(index, err)| (index, err.to_string()))
        .collect();
    messages.sort_by_key(|(index, _)| *index);

    if let Some(abort) = messages.iter().find_map(|(_, m)| Abort::find(m)) {
        return Err(DbError::Aborted(abort));
    }

    let cause = messages
        .iter()
        .find(|(_, m)| !m.contains("failed transaction"))
        .or_else(|| messages.first())
        .map(|(_, m)| m.clone())
        .unwrap_or_default();
    Err(DbError::Query(cause))
}

pub(crate) fn parse_uuid(entity: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {entity} UUID {raw}: {e}")))
}

pub(crate) fn parse_time(field: &str, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| DbError::Corrupt(format!("invalid {field} timestamp {raw}: {e}")))
}

pub(crate) fn rfc3339(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn id_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_survive_string_casts() {
        let now = Utc::now();
        assert_eq!(parse_time("created_at", &rfc3339(&now)).unwrap(), now);
    }

    #[test]
    fn malformed_ids_are_corrupt_records() {
        assert!(matches!(
            parse_uuid("event", "not-a-uuid"),
            Err(DbError::Corrupt(_))
        ));
    }
}
