//! Integration tests for account, role and credential repositories
//! using in-memory SurrealDB.

use campus_core::error::CampusError;
use campus_core::models::account::CreateAccount;
use campus_core::models::role::Role;
use campus_core::repository::{AccountRepository, CredentialStore, RoleRepository};
use campus_db::repository::{
    SurrealAccountRepository, SurrealCredentialStore, SurrealRoleRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    campus_db::run_migrations(&db).await.unwrap();
    db
}

fn new_account(email: &str, role: Role, approved: bool) -> CreateAccount {
    CreateAccount {
        full_name: "Ada Lovelace".into(),
        email: email.into(),
        department: Some("Mathematics".into()),
        password: "initial-secret".into(),
        role,
        approved,
    }
}

#[tokio::test]
async fn create_writes_account_role_and_credential() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let credentials = SurrealCredentialStore::new(db);

    let account = accounts
        .create(new_account("ada@campus.edu", Role::Staff, false))
        .await
        .unwrap();

    assert_eq!(account.email, "ada@campus.edu");
    assert_eq!(account.department.as_deref(), Some("Mathematics"));
    assert!(!account.is_approved);

    let role = roles.get_for_account(account.id).await.unwrap().unwrap();
    assert_eq!(role.role, Role::Staff);

    assert!(
        credentials
            .verify_credential(account.id, "initial-secret")
            .await
            .unwrap()
    );
    assert!(!credentials.verify_credential(account.id, "wrong").await.unwrap());

    let by_email = accounts.get_by_email("ada@campus.edu").await.unwrap();
    assert_eq!(by_email.id, account.id);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db);

    accounts
        .create(new_account("dup@campus.edu", Role::Student, false))
        .await
        .unwrap();
    let err = accounts
        .create(new_account("dup@campus.edu", Role::Student, false))
        .await
        .unwrap_err();

    assert!(matches!(err, CampusError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn approval_replaces_credential_and_sets_flag() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let credentials = SurrealCredentialStore::new(db);

    let account = accounts
        .create(new_account("bob@campus.edu", Role::Student, false))
        .await
        .unwrap();

    let approved = accounts
        .approve_with_credential(account.id, "Temp#Secret42")
        .await
        .unwrap();
    assert!(approved.is_approved);

    assert!(
        credentials
            .verify_credential(account.id, "Temp#Secret42")
            .await
            .unwrap()
    );
    assert!(
        !credentials
            .verify_credential(account.id, "initial-secret")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn second_approval_changes_nothing() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let credentials = SurrealCredentialStore::new(db);

    let account = accounts
        .create(new_account("carol@campus.edu", Role::Student, false))
        .await
        .unwrap();
    accounts
        .approve_with_credential(account.id, "first-temp")
        .await
        .unwrap();

    let err = accounts
        .approve_with_credential(account.id, "second-temp")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CampusError::AccountAlreadyApproved { account_id } if account_id == account.id
    ));

    assert!(
        credentials
            .verify_credential(account.id, "first-temp")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn approving_unknown_account_is_not_found() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db);

    let err = accounts
        .approve_with_credential(uuid::Uuid::new_v4(), "temp")
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::NotFound { .. }));
}

#[tokio::test]
async fn delete_pending_removes_everything() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let credentials = SurrealCredentialStore::new(db);

    let account = accounts
        .create(new_account("dave@campus.edu", Role::Staff, false))
        .await
        .unwrap();
    accounts.delete_pending(account.id).await.unwrap();

    assert!(matches!(
        accounts.get_by_id(account.id).await,
        Err(CampusError::NotFound { .. })
    ));
    assert!(roles.get_for_account(account.id).await.unwrap().is_none());
    assert!(
        !credentials
            .verify_credential(account.id, "initial-secret")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn delete_pending_refuses_approved_accounts() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db);

    let account = accounts
        .create(new_account("erin@campus.edu", Role::Student, true))
        .await
        .unwrap();

    let err = accounts.delete_pending(account.id).await.unwrap_err();
    assert!(matches!(err, CampusError::AccountAlreadyApproved { .. }));
    assert!(accounts.get_by_id(account.id).await.is_ok());
}

#[tokio::test]
async fn emails_differing_only_in_case_are_one_address() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db);

    let account = accounts
        .create(new_account(" Ivy@Campus.EDU ", Role::Student, false))
        .await
        .unwrap();
    assert_eq!(account.email, "ivy@campus.edu");

    let err = accounts
        .create(new_account("IVY@campus.edu", Role::Staff, false))
        .await
        .unwrap_err();
    assert!(matches!(err, CampusError::AlreadyExists { .. }), "{err:?}");

    let found = accounts.get_by_email("iVy@CAMPUS.edu").await.unwrap();
    assert_eq!(found.id, account.id);
}

#[tokio::test]
async fn roles_are_batch_loaded_for_many_accounts() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let student = accounts
        .create(new_account("jo@campus.edu", Role::Student, true))
        .await
        .unwrap();
    let staff = accounts
        .create(new_account("kim@campus.edu", Role::Staff, true))
        .await
        .unwrap();
    let outsider = accounts
        .create(new_account("lee@campus.edu", Role::Admin, true))
        .await
        .unwrap();

    let mut found: Vec<_> = roles
        .get_for_accounts(&[student.id, staff.id])
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.account_id, a.role))
        .collect();
    found.sort_by_key(|(id, _)| *id);

    let mut expected = vec![(student.id, Role::Student), (staff.id, Role::Staff)];
    expected.sort_by_key(|(id, _)| *id);
    assert_eq!(found, expected);
    assert!(found.iter().all(|(id, _)| *id != outsider.id));
}

#[tokio::test]
async fn role_replace_keeps_exactly_one_role() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db);

    let account = accounts
        .create(new_account("fay@campus.edu", Role::Student, true))
        .await
        .unwrap();

    let assignment = roles.replace(account.id, Role::Staff).await.unwrap();
    assert_eq!(assignment.role, Role::Staff);

    let all = roles.get_for_accounts(&[account.id]).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].role, Role::Staff);
}

#[tokio::test]
async fn pending_listing_includes_requested_role() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db);

    accounts
        .create(new_account("gus@campus.edu", Role::Staff, false))
        .await
        .unwrap();
    accounts
        .create(new_account("hal@campus.edu", Role::Student, true))
        .await
        .unwrap();

    let pending = accounts.list_pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].account.email, "gus@campus.edu");
    assert_eq!(pending[0].requested_role, Some(Role::Staff));

    let all = accounts.list().await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn admin_exists_requires_an_approved_admin() {
    let db = setup().await;
    let accounts = SurrealAccountRepository::new(db);

    assert!(!accounts.admin_exists().await.unwrap());

    accounts
        .create(new_account("pending-admin@campus.edu", Role::Admin, false))
        .await
        .unwrap();
    assert!(!accounts.admin_exists().await.unwrap());

    accounts
        .create(new_account("admin@campus.edu", Role::Admin, true))
        .await
        .unwrap();
    assert!(accounts.admin_exists().await.unwrap());
}
