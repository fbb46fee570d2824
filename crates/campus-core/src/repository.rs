//! Storage and credential collaborator traits.
//!
//! All operations are async and must be safe under concurrent use from
//! independent request handlers. Operations documented as atomic must be
//! carried out by the store in a single transaction (or an equivalent
//! constrained write); the workflow layer holds no locks of its own.

use uuid::Uuid;

use crate::error::CampusResult;
use crate::models::{
    account::{Account, AccountWithRole, CreateAccount, PendingAccount},
    event::{Event, EventFields, EventFilter, EventStatus, EventStatusCounts},
    registration::Registration,
    resource::{Resource, ResourceFields},
    role::{Role, RoleAssignment},
};

// ---------------------------------------------------------------------------
// Accounts & roles
// ---------------------------------------------------------------------------

pub trait AccountRepository: Send + Sync {
    /// Create the account, its credential and its role row together.
    ///
    /// The email is stored trimmed and lowercased. Fails with
    /// `AlreadyExists` when that address is taken.
    fn create(&self, input: CreateAccount) -> impl Future<Output = CampusResult<Account>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CampusResult<Account>> + Send;
    /// Case-insensitive: the address is normalized before lookup.
    fn get_by_email(&self, email: &str) -> impl Future<Output = CampusResult<Account>> + Send;
    /// Batch lookup; ids with no account are skipped.
    fn get_many(&self, ids: &[Uuid]) -> impl Future<Output = CampusResult<Vec<Account>>> + Send;
    /// All accounts with their roles, newest first.
    fn list(&self) -> impl Future<Output = CampusResult<Vec<AccountWithRole>>> + Send;
    /// Unapproved accounts with the role requested at sign-up, newest first.
    fn list_pending(&self) -> impl Future<Output = CampusResult<Vec<PendingAccount>>> + Send;

    /// Atomically replace the account's credential with `secret` and set
    /// `is_approved`.
    ///
    /// Fails with `AccountAlreadyApproved` (and changes nothing) if the
    /// account was approved before this call committed. Stores that
    /// cannot write both in one transaction must write the credential
    /// first and report `PartialApprovalFailure` if the flag did not land.
    fn approve_with_credential(
        &self,
        id: Uuid,
        secret: &str,
    ) -> impl Future<Output = CampusResult<Account>> + Send;

    /// Atomically delete an unapproved account with its role and
    /// credential.
    ///
    /// Fails with `AccountAlreadyApproved` if the account is approved.
    fn delete_pending(&self, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;

    /// Whether any approved account currently holds the admin role.
    fn admin_exists(&self) -> impl Future<Output = CampusResult<bool>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn get_for_account(
        &self,
        account_id: Uuid,
    ) -> impl Future<Output = CampusResult<Option<RoleAssignment>>> + Send;

    /// Replace the account's role in a single write. The account never
    /// has zero or two roles visible to a concurrent reader.
    fn replace(
        &self,
        account_id: Uuid,
        role: Role,
    ) -> impl Future<Output = CampusResult<RoleAssignment>> + Send;

    fn get_for_accounts(
        &self,
        account_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<RoleAssignment>>> + Send;
}

/// Credential collaborator. Secrets are stored only in hashed form.
pub trait CredentialStore: Send + Sync {
    fn set_credential(
        &self,
        account_id: Uuid,
        secret: &str,
    ) -> impl Future<Output = CampusResult<()>> + Send;

    /// `Ok(false)` for a wrong secret or a missing credential.
    fn verify_credential(
        &self,
        account_id: Uuid,
        candidate: &str,
    ) -> impl Future<Output = CampusResult<bool>> + Send;
}

// ---------------------------------------------------------------------------
// Events, resources & registrations
// ---------------------------------------------------------------------------

pub trait EventRepository: Send + Sync {
    /// Insert a new event in `pending` status owned by `organizer_id`.
    fn create(
        &self,
        organizer_id: Uuid,
        fields: EventFields,
    ) -> impl Future<Output = CampusResult<Event>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CampusResult<Event>> + Send;

    /// Replace the content fields. Status is only touched when
    /// `reset_status` is set, in which case it returns to `pending`.
    fn update_content(
        &self,
        id: Uuid,
        fields: EventFields,
        reset_status: bool,
    ) -> impl Future<Output = CampusResult<Event>> + Send;

    fn set_status(
        &self,
        id: Uuid,
        status: EventStatus,
    ) -> impl Future<Output = CampusResult<Event>> + Send;

    /// Delete the event and every registration referencing it.
    fn delete(&self, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;

    /// Events matching `filter`, ordered by start time.
    fn list(&self, filter: EventFilter) -> impl Future<Output = CampusResult<Vec<Event>>> + Send;

    /// Number of events in each status, counted in storage.
    fn count_by_status(&self) -> impl Future<Output = CampusResult<EventStatusCounts>> + Send;
}

pub trait ResourceRepository: Send + Sync {
    fn create(&self, fields: ResourceFields)
    -> impl Future<Output = CampusResult<Resource>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CampusResult<Resource>> + Send;
    /// Batch lookup; ids with no resource are skipped.
    fn get_many(&self, ids: &[Uuid])
    -> impl Future<Output = CampusResult<Vec<Resource>>> + Send;
    fn update(
        &self,
        id: Uuid,
        fields: ResourceFields,
    ) -> impl Future<Output = CampusResult<Resource>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CampusResult<()>> + Send;
    fn list(&self, available_only: bool)
    -> impl Future<Output = CampusResult<Vec<Resource>>> + Send;
}

pub trait RegistrationRepository: Send + Sync {
    /// Constrained insert, atomic per event.
    ///
    /// Fails with `NotFound` if the event is gone, `EventNotOpen` unless
    /// it is approved, `AlreadyRegistered` for a duplicate pair and
    /// `EventFull` when the registrant count has reached
    /// `max_participants`. Concurrent callers that lose a race may get
    /// `Conflict`; repeating the call re-evaluates every rule.
    fn register(
        &self,
        event_id: Uuid,
        student_id: Uuid,
    ) -> impl Future<Output = CampusResult<Registration>> + Send;

    /// Remove the pair if present. A missing pair is not an error.
    fn unregister(
        &self,
        event_id: Uuid,
        student_id: Uuid,
    ) -> impl Future<Output = CampusResult<()>> + Send;

    fn is_registered(
        &self,
        event_id: Uuid,
        student_id: Uuid,
    ) -> impl Future<Output = CampusResult<bool>> + Send;
    fn count_for(&self, event_id: Uuid) -> impl Future<Output = CampusResult<u64>> + Send;
    /// Registrant counts for a set of events; events with none are omitted.
    fn counts_for(
        &self,
        event_ids: &[Uuid],
    ) -> impl Future<Output = CampusResult<Vec<(Uuid, u64)>>> + Send;
    fn list_for_student(
        &self,
        student_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Registration>>> + Send;
    fn list_for_event(
        &self,
        event_id: Uuid,
    ) -> impl Future<Output = CampusResult<Vec<Registration>>> + Send;
}
