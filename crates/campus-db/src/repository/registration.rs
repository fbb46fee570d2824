//! SurrealDB implementation of [`RegistrationRepository`].
//!
//! Every registration increments `registration_count` on its event
//! inside the same transaction that checks capacity. Concurrent
//! registrations for one event therefore write the same record and
//! either serialize or fail with a retryable conflict; the capacity
//! check can never act on a stale count.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::registration::Registration;
use campus_core::repository::RegistrationRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::{CountRow, check, id_strings, parse_time, parse_uuid};
use crate::error::{Abort, DbError};

const REGISTRATION_FIELDS: &str = "meta::id(id) AS record_id, event_id, student_id, \
     <string> registered_at AS registered_at";

const REGISTER: &str = "\
BEGIN TRANSACTION;
LET $event = (SELECT status, max_participants, registration_count
    FROM type::thing('event', $event_id))[0];
IF !$event { THROW 'campus:not_found'; };
IF $event.status != 'approved' { THROW 'campus:event_not_open'; };
LET $existing = (SELECT VALUE id FROM registration
    WHERE event_id = $event_id AND student_id = $student_id);
IF array::len($existing) > 0 { THROW 'campus:already_registered'; };
IF $event.max_participants != NONE
    AND $event.registration_count >= $event.max_participants {
    THROW 'campus:event_full';
};
UPDATE type::thing('event', $event_id) SET registration_count += 1;
CREATE type::thing('registration', $id) SET
    event_id = $event_id, student_id = $student_id,
    registered_at = time::now();
COMMIT TRANSACTION;
";

const UNREGISTER: &str = "\
BEGIN TRANSACTION;
LET $removed = (DELETE registration
    WHERE event_id = $event_id AND student_id = $student_id RETURN BEFORE);
IF array::len($removed) > 0 {
    UPDATE type::thing('event', $event_id) SET registration_count -= 1;
};
COMMIT TRANSACTION;
";

#[derive(Debug, Deserialize)]
struct RegistrationRow {
    record_id: String,
    event_id: String,
    student_id: String,
    registered_at: String,
}

impl RegistrationRow {
    fn try_into_registration(self) -> Result<Registration, DbError> {
        Ok(Registration {
            id: parse_uuid("registration", &self.record_id)?,
            event_id: parse_uuid("event", &self.event_id)?,
            student_id: parse_uuid("student", &self.student_id)?,
            registered_at: parse_time("registered_at", &self.registered_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EventCountRow {
    event_id: String,
    total: u64,
}

/// SurrealDB implementation of the registration repository.
#[derive(Clone)]
pub struct SurrealRegistrationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRegistrationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select(&self, condition: &str, id: Uuid) -> CampusResult<Vec<Registration>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {REGISTRATION_FIELDS} FROM registration WHERE {condition}"
            ))
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RegistrationRow> = result.take(0).map_err(DbError::from)?;
        let mut registrations = rows
            .into_iter()
            .map(RegistrationRow::try_into_registration)
            .collect::<Result<Vec<_>, _>>()?;
        registrations.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(registrations)
    }
}

impl<C: Connection> RegistrationRepository for SurrealRegistrationRepository<C> {
    async fn register(&self, event_id: Uuid, student_id: Uuid) -> CampusResult<Registration> {
        let id = Uuid::new_v4();

        let response = self
            .db
            .query(REGISTER)
            .bind(("id", id.to_string()))
            .bind(("event_id", event_id.to_string()))
            .bind(("student_id", student_id.to_string()))
            .await
            .map_err(DbError::from)?;

        check(response).map_err(|err| match err {
            DbError::Aborted(Abort::NotFound) => CampusError::not_found("event", event_id),
            DbError::Aborted(Abort::EventNotOpen) => CampusError::EventNotOpen { event_id },
            DbError::Aborted(Abort::AlreadyRegistered) => {
                CampusError::AlreadyRegistered { event_id }
            }
            DbError::Aborted(Abort::EventFull) => CampusError::EventFull { event_id },
            other => match CampusError::from(other) {
                // The unique pair index backs up the in-transaction check.
                CampusError::AlreadyExists { .. } => CampusError::AlreadyRegistered { event_id },
                mapped => mapped,
            },
        })?;

        let mut registrations = self
            .select("meta::id(id) = $id", id)
            .await?
            .into_iter();
        registrations.next().ok_or_else(|| {
            DbError::NotFound {
                entity: "registration".into(),
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn unregister(&self, event_id: Uuid, student_id: Uuid) -> CampusResult<()> {
        check(
            self.db
                .query(UNREGISTER)
                .bind(("event_id", event_id.to_string()))
                .bind(("student_id", student_id.to_string()))
                .await
                .map_err(DbError::from)?,
        )?;
        Ok(())
    }

    async fn is_registered(&self, event_id: Uuid, student_id: Uuid) -> CampusResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM registration \
                 WHERE event_id = $event_id AND student_id = $student_id GROUP ALL",
            )
            .bind(("event_id", event_id.to_string()))
            .bind(("student_id", student_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().is_some_and(|r| r.total > 0))
    }

    async fn count_for(&self, event_id: Uuid) -> CampusResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM registration \
                 WHERE event_id = $event_id GROUP ALL",
            )
            .bind(("event_id", event_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn counts_for(&self, event_ids: &[Uuid]) -> CampusResult<Vec<(Uuid, u64)>> {
        if event_ids.is_empty() {
            return Ok(Vec::new());
        }

        // `$ids CONTAINS` keeps the planner off the compound pair index,
        // which returns no rows for a set membership filter.
        let mut result = self
            .db
            .query(
                "SELECT event_id, count() AS total FROM registration \
                 WHERE $ids CONTAINS event_id GROUP BY event_id",
            )
            .bind(("ids", id_strings(event_ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventCountRow> = result.take(0).map_err(DbError::from)?;
        let counts = rows
            .into_iter()
            .map(|row| -> Result<(Uuid, u64), DbError> {
                Ok((parse_uuid("event", &row.event_id)?, row.total))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }

    async fn list_for_student(&self, student_id: Uuid) -> CampusResult<Vec<Registration>> {
        self.select("student_id = $id", student_id).await
    }

    async fn list_for_event(&self, event_id: Uuid) -> CampusResult<Vec<Registration>> {
        self.select("event_id = $id", event_id).await
    }
}
