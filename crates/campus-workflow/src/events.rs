//! Event lifecycle manager.
//!
//! ```text
//! (none) --create--> PENDING --approve--> APPROVED
//!                    PENDING --reject---> REJECTED
//!                    REJECTED --approve-> APPROVED
//!                    APPROVED --reject--> REJECTED
//! ```
//!
//! Only admins move an event between states. Content edits belong to
//! the organizer or an admin.

use std::collections::HashMap;

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::account::Principal;
use campus_core::models::event::{
    Event, EventFields, EventFilter, EventStatus, EventStatusCounts, EventSummary,
};
use campus_core::models::role::Role;
use campus_core::repository::{
    AccountRepository, EventRepository, RegistrationRepository, ResourceRepository,
    RoleRepository,
};
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::authority::Authority;
use crate::config::WorkflowConfig;

pub struct EventLifecycle<A, R, E, V, G>
where
    A: AccountRepository,
    R: RoleRepository,
    E: EventRepository,
    V: ResourceRepository,
    G: RegistrationRepository,
{
    authority: Authority<A, R>,
    events: E,
    resources: V,
    registrations: G,
    config: WorkflowConfig,
}

impl<A, R, E, V, G> EventLifecycle<A, R, E, V, G>
where
    A: AccountRepository,
    R: RoleRepository,
    E: EventRepository,
    V: ResourceRepository,
    G: RegistrationRepository,
{
    pub fn new(
        authority: Authority<A, R>,
        events: E,
        resources: V,
        registrations: G,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            authority,
            events,
            resources,
            registrations,
            config,
        }
    }

    /// Propose a new event. It always starts `pending` and is owned by
    /// the actor.
    pub async fn create(&self, actor: Principal, fields: EventFields) -> CampusResult<Event> {
        self.authority.authorize(actor).await?;
        fields.validate()?;
        self.check_venue(fields.venue_id).await?;

        let event = self.events.create(actor.account_id(), fields).await?;
        info!(
            event_id = %event.id,
            organizer_id = %event.organizer_id,
            "Event created, pending review"
        );
        Ok(event)
    }

    pub async fn approve(&self, actor: Principal, event_id: Uuid) -> CampusResult<Event> {
        self.transition(actor, event_id, EventStatus::Approved).await
    }

    pub async fn reject(&self, actor: Principal, event_id: Uuid) -> CampusResult<Event> {
        self.transition(actor, event_id, EventStatus::Rejected).await
    }

    /// Replace an event's content. Organizer or admin only.
    ///
    /// Status is kept unless `resubmit_on_edit` is configured, in which
    /// case a reviewed event returns to `pending`.
    pub async fn update(
        &self,
        actor: Principal,
        event_id: Uuid,
        fields: EventFields,
    ) -> CampusResult<Event> {
        let event = self.owned_event(actor, event_id).await?;
        fields.validate()?;
        self.check_venue(fields.venue_id).await?;

        let reset_status = self.config.resubmit_on_edit && event.status != EventStatus::Pending;
        let updated = self
            .events
            .update_content(event_id, fields, reset_status)
            .await?;
        info!(
            event_id = %event_id,
            actor_id = %actor.account_id(),
            status = %updated.status,
            "Event updated"
        );
        Ok(updated)
    }

    /// Delete an event with its registrations. Organizer or admin only.
    pub async fn delete(&self, actor: Principal, event_id: Uuid) -> CampusResult<()> {
        self.owned_event(actor, event_id).await?;
        self.events.delete(event_id).await?;
        info!(event_id = %event_id, actor_id = %actor.account_id(), "Event deleted");
        Ok(())
    }

    pub async fn get(&self, event_id: Uuid) -> CampusResult<Event> {
        self.events.get_by_id(event_id).await
    }

    pub async fn list(&self, filter: EventFilter) -> CampusResult<Vec<Event>> {
        self.events.list(filter).await
    }

    /// Approved events starting at or after `now`, soonest first.
    pub async fn upcoming(&self, now: DateTime<Utc>) -> CampusResult<Vec<Event>> {
        self.events
            .list(
                EventFilter::default()
                    .with_status(EventStatus::Approved)
                    .starting_from(now),
            )
            .await
    }

    /// Event totals per review state, for the admin overview.
    pub async fn status_counts(&self, actor: Principal) -> CampusResult<EventStatusCounts> {
        self.authority.require(actor, Role::Admin).await?;
        self.events.count_by_status().await
    }

    /// Events joined with organizer name, venue name and registrant count.
    pub async fn list_detailed(&self, filter: EventFilter) -> CampusResult<Vec<EventSummary>> {
        let events = self.events.list(filter).await?;
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let mut organizer_ids: Vec<Uuid> = events.iter().map(|e| e.organizer_id).collect();
        organizer_ids.sort_unstable();
        organizer_ids.dedup();
        let mut venue_ids: Vec<Uuid> = events.iter().filter_map(|e| e.venue_id).collect();
        venue_ids.sort_unstable();
        venue_ids.dedup();
        let event_ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();

        let organizers: HashMap<Uuid, String> = self
            .authority
            .accounts()
            .get_many(&organizer_ids)
            .await?
            .into_iter()
            .map(|a| (a.id, a.full_name))
            .collect();
        let venues: HashMap<Uuid, String> = self
            .resources
            .get_many(&venue_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();
        let counts: HashMap<Uuid, u64> = self
            .registrations
            .counts_for(&event_ids)
            .await?
            .into_iter()
            .collect();

        Ok(events
            .into_iter()
            .map(|event| EventSummary {
                organizer_name: organizers.get(&event.organizer_id).cloned(),
                venue_name: event.venue_id.and_then(|v| venues.get(&v).cloned()),
                registered: counts.get(&event.id).copied().unwrap_or(0),
                event,
            })
            .collect())
    }

    async fn transition(
        &self,
        actor: Principal,
        event_id: Uuid,
        status: EventStatus,
    ) -> CampusResult<Event> {
        self.authority.require(actor, Role::Admin).await?;

        let event = self.events.get_by_id(event_id).await?;
        if event.status == status {
            return Ok(event);
        }

        let updated = self.events.set_status(event_id, status).await?;
        info!(
            event_id = %event_id,
            admin_id = %actor.account_id(),
            from = %event.status,
            to = %status,
            "Event status changed"
        );
        Ok(updated)
    }

    /// Load an event the actor may edit or delete.
    async fn owned_event(&self, actor: Principal, event_id: Uuid) -> CampusResult<Event> {
        let role = self.authority.authorize(actor).await?;
        let event = self.events.get_by_id(event_id).await?;
        if role != Role::Admin && !event.is_organized_by(actor.account_id()) {
            return Err(CampusError::forbidden(
                "only the organizer or an admin may change this event",
            ));
        }
        Ok(event)
    }

    async fn check_venue(&self, venue_id: Option<Uuid>) -> CampusResult<()> {
        let Some(venue_id) = venue_id else {
            return Ok(());
        };
        match self.resources.get_by_id(venue_id).await {
            Ok(_) => Ok(()),
            Err(CampusError::NotFound { .. }) => Err(CampusError::UnknownVenue { venue_id }),
            Err(e) => Err(e),
        }
    }
}
