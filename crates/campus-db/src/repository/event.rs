//! SurrealDB implementation of [`EventRepository`].

use campus_core::error::CampusResult;
use campus_core::models::event::{
    Event, EventFields, EventFilter, EventStatus, EventStatusCounts,
};
use campus_core::repository::EventRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::{check, parse_time, parse_uuid, rfc3339};
use crate::error::DbError;

const EVENT_FIELDS: &str = "meta::id(id) AS record_id, title, description, category, \
     venue_id, resources_needed, organizer_id, \
     <string> start_time AS start_time, <string> end_time AS end_time, \
     max_participants, status, \
     <string> created_at AS created_at, <string> updated_at AS updated_at";

const CONTENT_SETS: &str = "title = $title, description = $description, \
     category = $category, venue_id = $venue_id, \
     resources_needed = $resources_needed, \
     start_time = <datetime> $start_time, end_time = <datetime> $end_time, \
     max_participants = $max_participants";

const DELETE_EVENT: &str = "\
BEGIN TRANSACTION;
DELETE registration WHERE event_id = $id;
DELETE type::thing('event', $id);
COMMIT TRANSACTION;
";

#[derive(Debug, Deserialize)]
struct EventRow {
    record_id: String,
    title: String,
    description: String,
    category: Option<String>,
    venue_id: Option<String>,
    resources_needed: Option<String>,
    organizer_id: String,
    start_time: String,
    end_time: String,
    max_participants: Option<u32>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl EventRow {
    fn try_into_event(self) -> Result<Event, DbError> {
        Ok(Event {
            id: parse_uuid("event", &self.record_id)?,
            title: self.title,
            description: self.description,
            category: self.category,
            venue_id: self
                .venue_id
                .as_deref()
                .map(|v| parse_uuid("venue", v))
                .transpose()?,
            resources_needed: self.resources_needed,
            organizer_id: parse_uuid("organizer", &self.organizer_id)?,
            start_time: parse_time("start_time", &self.start_time)?,
            end_time: parse_time("end_time", &self.end_time)?,
            max_participants: self.max_participants,
            status: self
                .status
                .parse::<EventStatus>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            created_at: parse_time("created_at", &self.created_at)?,
            updated_at: parse_time("updated_at", &self.updated_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct StatusCountRow {
    status: String,
    total: u64,
}

/// SurrealDB implementation of the event repository.
#[derive(Clone)]
pub struct SurrealEventRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealEventRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn write_content(
        &self,
        statement: String,
        id: Uuid,
        organizer_id: Option<Uuid>,
        fields: EventFields,
    ) -> Result<(), DbError> {
        check(
            self.db
                .query(statement)
                .bind(("id", id.to_string()))
                .bind(("organizer_id", organizer_id.map(|o| o.to_string())))
                .bind(("title", fields.title))
                .bind(("description", fields.description))
                .bind(("category", fields.category))
                .bind(("venue_id", fields.venue_id.map(|v| v.to_string())))
                .bind(("resources_needed", fields.resources_needed))
                .bind(("start_time", rfc3339(&fields.start_time)))
                .bind(("end_time", rfc3339(&fields.end_time)))
                .bind(("max_participants", fields.max_participants))
                .await?,
        )?;
        Ok(())
    }
}

impl<C: Connection> EventRepository for SurrealEventRepository<C> {
    async fn create(&self, organizer_id: Uuid, fields: EventFields) -> CampusResult<Event> {
        let id = Uuid::new_v4();
        let statement = format!(
            "CREATE type::thing('event', $id) SET {CONTENT_SETS}, \
             organizer_id = $organizer_id, status = 'pending', \
             registration_count = 0, \
             created_at = time::now(), updated_at = time::now()"
        );
        self.write_content(statement, id, Some(organizer_id), fields)
            .await?;
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CampusResult<Event> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {EVENT_FIELDS} FROM type::thing('event', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "event".into(),
            id: id_str,
        })?;

        Ok(row.try_into_event()?)
    }

    async fn update_content(
        &self,
        id: Uuid,
        fields: EventFields,
        reset_status: bool,
    ) -> CampusResult<Event> {
        let mut sets = vec![CONTENT_SETS];
        if reset_status {
            sets.push("status = 'pending'");
        }
        sets.push("updated_at = time::now()");

        // UPDATE leaves missing records alone, so get_by_id reports NotFound.
        let statement = format!(
            "UPDATE type::thing('event', $id) SET {}",
            sets.join(", ")
        );
        self.write_content(statement, id, None, fields).await?;
        self.get_by_id(id).await
    }

    async fn set_status(&self, id: Uuid, status: EventStatus) -> CampusResult<Event> {
        check(
            self.db
                .query(
                    "UPDATE type::thing('event', $id) SET \
                     status = $status, updated_at = time::now()",
                )
                .bind(("id", id.to_string()))
                .bind(("status", status.as_str()))
                .await
                .map_err(DbError::from)?,
        )?;
        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> CampusResult<()> {
        check(
            self.db
                .query(DELETE_EVENT)
                .bind(("id", id.to_string()))
                .await
                .map_err(DbError::from)?,
        )?;
        Ok(())
    }

    async fn list(&self, filter: EventFilter) -> CampusResult<Vec<Event>> {
        let mut conditions = Vec::new();
        if filter.status.is_some() {
            conditions.push("status = $status");
        }
        if filter.organizer_id.is_some() {
            conditions.push("organizer_id = $organizer_id");
        }
        if filter.starts_after.is_some() {
            conditions.push("start_time >= <datetime> $starts_after");
        }
        if filter.starts_before.is_some() {
            conditions.push("start_time < <datetime> $starts_before");
        }

        let mut query = format!("SELECT {EVENT_FIELDS} FROM event");
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        let mut result = self
            .db
            .query(query)
            .bind(("status", filter.status.map(|s| s.as_str())))
            .bind(("organizer_id", filter.organizer_id.map(|o| o.to_string())))
            .bind(("starts_after", filter.starts_after.as_ref().map(rfc3339)))
            .bind(("starts_before", filter.starts_before.as_ref().map(rfc3339)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EventRow> = result.take(0).map_err(DbError::from)?;
        let mut events = rows
            .into_iter()
            .map(EventRow::try_into_event)
            .collect::<Result<Vec<_>, _>>()?;
        events.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(events)
    }

    async fn count_by_status(&self) -> CampusResult<EventStatusCounts> {
        let mut result = self
            .db
            .query("SELECT status, count() AS total FROM event GROUP BY status")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;
        let mut counts = EventStatusCounts::default();
        for row in rows {
            let status = row
                .status
                .parse::<EventStatus>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?;
            counts.add(status, row.total);
        }
        Ok(counts)
    }
}
