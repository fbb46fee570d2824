//! Shared fixtures for workflow integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use campus_core::models::account::{CreateAccount, Principal};
use campus_core::models::event::EventFields;
use campus_core::models::role::Role;
use campus_core::notify::{ApprovalNotice, NotifyError, Notifier};
use campus_core::repository::AccountRepository;
use campus_db::repository::{
    SurrealAccountRepository, SurrealCredentialStore, SurrealEventRepository,
    SurrealRegistrationRepository, SurrealResourceRepository, SurrealRoleRepository,
};
use campus_workflow::{
    AccountApproval, AccountDirectory, Authority, EventLifecycle, RegistrationManager,
    ResourceDirectory, WorkflowConfig,
};
use chrono::{Duration as ChronoDuration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

pub const PASSWORD: &str = "correct-horse";

pub type Accounts = SurrealAccountRepository<Db>;
pub type Roles = SurrealRoleRepository<Db>;

/// Records every notice it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<ApprovalNotice>>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<ApprovalNotice> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn send_approval_notice(&self, notice: &ApprovalNotice) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Fails every delivery with a provider rejection.
#[derive(Clone, Default)]
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    async fn send_approval_notice(&self, _notice: &ApprovalNotice) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected {
            status: 503,
            body: "mail provider unavailable".into(),
        })
    }
}

/// Never answers within any reasonable timeout.
#[derive(Clone, Default)]
pub struct StalledNotifier;

impl Notifier for StalledNotifier {
    async fn send_approval_notice(&self, _notice: &ApprovalNotice) -> Result<(), NotifyError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

pub struct Campus<N: Notifier> {
    pub db: Surreal<Db>,
    pub directory: AccountDirectory<Accounts, Roles, SurrealCredentialStore<Db>>,
    pub events: EventLifecycle<
        Accounts,
        Roles,
        SurrealEventRepository<Db>,
        SurrealResourceRepository<Db>,
        SurrealRegistrationRepository<Db>,
    >,
    pub registrations: RegistrationManager<
        Accounts,
        Roles,
        SurrealEventRepository<Db>,
        SurrealRegistrationRepository<Db>,
    >,
    pub resources: ResourceDirectory<Accounts, Roles, SurrealResourceRepository<Db>>,
    pub approval: AccountApproval<Accounts, Roles, N>,
}

fn authority(db: &Surreal<Db>) -> Authority<Accounts, Roles> {
    Authority::new(
        SurrealAccountRepository::new(db.clone()),
        SurrealRoleRepository::new(db.clone()),
    )
}

pub async fn setup_with<N: Notifier>(notifier: N, config: WorkflowConfig) -> Campus<N> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    campus_db::run_migrations(&db).await.unwrap();

    Campus {
        directory: AccountDirectory::new(
            authority(&db),
            SurrealCredentialStore::new(db.clone()),
            config.clone(),
        ),
        events: EventLifecycle::new(
            authority(&db),
            SurrealEventRepository::new(db.clone()),
            SurrealResourceRepository::new(db.clone()),
            SurrealRegistrationRepository::new(db.clone()),
            config.clone(),
        ),
        registrations: RegistrationManager::new(
            authority(&db),
            SurrealEventRepository::new(db.clone()),
            SurrealRegistrationRepository::new(db.clone()),
            config.clone(),
        ),
        resources: ResourceDirectory::new(
            authority(&db),
            SurrealResourceRepository::new(db.clone()),
        ),
        approval: AccountApproval::new(authority(&db), notifier, config),
        db,
    }
}

pub async fn setup() -> (Campus<RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let campus = setup_with(notifier.clone(), WorkflowConfig::default()).await;
    (campus, notifier)
}

impl<N: Notifier> Campus<N> {
    /// Insert an account directly, bypassing sign-up validation.
    pub async fn account(&self, email: &str, role: Role, approved: bool) -> Principal {
        SurrealAccountRepository::new(self.db.clone())
            .create(CreateAccount {
                full_name: format!("User {email}"),
                email: email.into(),
                department: None,
                password: PASSWORD.into(),
                role,
                approved,
            })
            .await
            .unwrap()
            .principal()
    }

    pub async fn admin(&self) -> Principal {
        self.account("admin@campus.edu", Role::Admin, true).await
    }
}

pub fn event_fields(title: &str, days_ahead: i64, max: Option<u32>) -> EventFields {
    let start = Utc::now() + ChronoDuration::days(days_ahead);
    EventFields {
        title: title.into(),
        description: "An event".into(),
        category: None,
        venue_id: None,
        resources_needed: None,
        start_time: start,
        end_time: start + ChronoDuration::hours(2),
        max_participants: max,
    }
}
