//! Registration manager: capacity-limited membership of students in
//! approved events.

use std::time::Duration;

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::account::{Account, Principal};
use campus_core::models::registration::Registration;
use campus_core::models::role::Role;
use campus_core::repository::{
    AccountRepository, EventRepository, RegistrationRepository, RoleRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::authority::Authority;
use crate::config::WorkflowConfig;

pub struct RegistrationManager<A, R, E, G>
where
    A: AccountRepository,
    R: RoleRepository,
    E: EventRepository,
    G: RegistrationRepository,
{
    authority: Authority<A, R>,
    events: E,
    registrations: G,
    config: WorkflowConfig,
}

impl<A, R, E, G> RegistrationManager<A, R, E, G>
where
    A: AccountRepository,
    R: RoleRepository,
    E: EventRepository,
    G: RegistrationRepository,
{
    pub fn new(
        authority: Authority<A, R>,
        events: E,
        registrations: G,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            authority,
            events,
            registrations,
            config,
        }
    }

    /// Register the student for an approved event.
    ///
    /// A missing event reports `EventNotOpen`, like an unapproved one.
    /// Storage conflicts from concurrent registrations are retried; each
    /// attempt re-checks status, duplicates and capacity.
    pub async fn register(&self, student: Principal, event_id: Uuid) -> CampusResult<Registration> {
        self.authority.require(student, Role::Student).await?;
        let student_id = student.account_id();

        let mut attempt = 0;
        let registration = loop {
            match self.registrations.register(event_id, student_id).await {
                Ok(registration) => break registration,
                Err(CampusError::Conflict(reason))
                    if attempt < self.config.register_retry_attempts =>
                {
                    attempt += 1;
                    debug!(
                        event_id = %event_id,
                        attempt,
                        reason = %reason,
                        "Registration conflicted, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(5 * u64::from(attempt))).await;
                }
                Err(CampusError::NotFound { .. }) => {
                    return Err(CampusError::EventNotOpen { event_id });
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            event_id = %event_id,
            student_id = %student_id,
            "Student registered"
        );
        Ok(registration)
    }

    /// Leave an event. Leaving an event one is not registered for succeeds.
    pub async fn unregister(&self, student: Principal, event_id: Uuid) -> CampusResult<()> {
        self.authority.authorize(student).await?;
        self.registrations
            .unregister(event_id, student.account_id())
            .await?;
        info!(
            event_id = %event_id,
            student_id = %student.account_id(),
            "Student unregistered"
        );
        Ok(())
    }

    pub async fn is_registered(&self, student_id: Uuid, event_id: Uuid) -> CampusResult<bool> {
        self.registrations.is_registered(event_id, student_id).await
    }

    pub async fn count_for(&self, event_id: Uuid) -> CampusResult<u64> {
        self.registrations.count_for(event_id).await
    }

    pub async fn registrations_for(&self, student: Principal) -> CampusResult<Vec<Registration>> {
        self.authority.authorize(student).await?;
        self.registrations
            .list_for_student(student.account_id())
            .await
    }

    /// Accounts registered for an event. Organizer or admin only.
    pub async fn attendees(&self, actor: Principal, event_id: Uuid) -> CampusResult<Vec<Account>> {
        let role = self.authority.authorize(actor).await?;
        let event = self.events.get_by_id(event_id).await?;
        if role != Role::Admin && !event.is_organized_by(actor.account_id()) {
            return Err(CampusError::forbidden(
                "only the organizer or an admin may view attendees",
            ));
        }

        let student_ids: Vec<Uuid> = self
            .registrations
            .list_for_event(event_id)
            .await?
            .into_iter()
            .map(|r| r.student_id)
            .collect();
        self.authority.accounts().get_many(&student_ids).await
    }
}
