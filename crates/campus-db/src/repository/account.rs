//! SurrealDB implementation of [`AccountRepository`].
//!
//! Account creation, approval and rejection each run as one SurrealQL
//! transaction spanning the `account`, `account_role` and `credential`
//! tables, so no reader observes a half-applied change.

use std::collections::HashMap;

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::account::{
    Account, AccountWithRole, CreateAccount, PendingAccount, normalize_email,
};
use campus_core::models::role::Role;
use campus_core::repository::AccountRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::role::{ROLE_FIELDS, RoleRow};
use super::{check, id_strings, parse_time, parse_uuid};
use crate::credential::hash_secret;
use crate::error::{Abort, DbError};

const ACCOUNT_FIELDS: &str = "meta::id(id) AS record_id, full_name, email, department, \
     is_approved, <string> created_at AS created_at";

const CREATE_ACCOUNT: &str = "\
BEGIN TRANSACTION;
CREATE type::thing('account', $id) SET
    full_name = $full_name, email = $email, department = $department,
    is_approved = $approved, created_at = time::now();
CREATE type::thing('account_role', $id) SET
    account_id = $id, role = $role, assigned_at = time::now();
CREATE type::thing('credential', $id) SET
    account_id = $id, secret_hash = $secret_hash, updated_at = time::now();
COMMIT TRANSACTION;
";

const APPROVE_ACCOUNT: &str = "\
BEGIN TRANSACTION;
LET $account = (SELECT is_approved FROM type::thing('account', $id))[0];
IF !$account { THROW 'campus:not_found'; };
IF $account.is_approved { THROW 'campus:already_approved'; };
UPSERT type::thing('credential', $id) SET
    account_id = $id, secret_hash = $secret_hash, updated_at = time::now();
UPDATE type::thing('account', $id) SET is_approved = true;
COMMIT TRANSACTION;
";

const DELETE_PENDING: &str = "\
BEGIN TRANSACTION;
LET $account = (SELECT is_approved FROM type::thing('account', $id))[0];
IF !$account { THROW 'campus:not_found'; };
IF $account.is_approved { THROW 'campus:already_approved'; };
DELETE type::thing('account_role', $id);
DELETE type::thing('credential', $id);
DELETE type::thing('account', $id);
COMMIT TRANSACTION;
";

#[derive(Debug, Deserialize)]
struct AccountRow {
    record_id: String,
    full_name: String,
    email: String,
    department: Option<String>,
    is_approved: bool,
    created_at: String,
}

impl AccountRow {
    fn try_into_account(self) -> Result<Account, DbError> {
        Ok(Account {
            id: parse_uuid("account", &self.record_id)?,
            full_name: self.full_name,
            email: self.email,
            department: self.department,
            is_approved: self.is_approved,
            created_at: parse_time("created_at", &self.created_at)?,
        })
    }
}

fn into_accounts(rows: Vec<AccountRow>) -> Result<Vec<Account>, DbError> {
    let mut accounts = rows
        .into_iter()
        .map(AccountRow::try_into_account)
        .collect::<Result<Vec<_>, _>>()?;
    accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(accounts)
}

/// Maps a transaction abort on account `id` to the domain error.
fn abort_to_error(id: Uuid, err: DbError) -> CampusError {
    match err {
        DbError::Aborted(Abort::NotFound) => CampusError::not_found("account", id),
        DbError::Aborted(Abort::AlreadyApproved) => {
            CampusError::AccountAlreadyApproved { account_id: id }
        }
        other => other.into(),
    }
}

/// SurrealDB implementation of the account repository.
#[derive(Clone)]
pub struct SurrealAccountRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for credential hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealAccountRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    async fn select_accounts(&self, condition: &str) -> Result<Vec<Account>, DbError> {
        let mut result = self
            .db
            .query(format!("SELECT {ACCOUNT_FIELDS} FROM account {condition}"))
            .await?;
        let rows: Vec<AccountRow> = result.take(0)?;
        into_accounts(rows)
    }

    async fn roles_by_account(&self, condition: &str) -> Result<HashMap<Uuid, Role>, DbError> {
        let mut result = self
            .db
            .query(format!("SELECT {ROLE_FIELDS} FROM account_role {condition}"))
            .await?;
        let rows: Vec<RoleRow> = result.take(0)?;
        rows.into_iter()
            .map(|row| -> Result<(Uuid, Role), DbError> {
                let assignment = row.try_into_assignment()?;
                Ok((assignment.account_id, assignment.role))
            })
            .collect()
    }
}

impl<C: Connection> AccountRepository for SurrealAccountRepository<C> {
    async fn create(&self, input: CreateAccount) -> CampusResult<Account> {
        let id = Uuid::new_v4();
        let secret_hash = hash_secret(&input.password, self.pepper.as_deref())?;

        check(
            self.db
                .query(CREATE_ACCOUNT)
                .bind(("id", id.to_string()))
                .bind(("full_name", input.full_name))
                .bind(("email", normalize_email(&input.email)))
                .bind(("department", input.department))
                .bind(("approved", input.approved))
                .bind(("role", input.role.as_str()))
                .bind(("secret_hash", secret_hash))
                .await
                .map_err(DbError::from)?,
        )?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CampusResult<Account> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {ACCOUNT_FIELDS} FROM type::thing('account', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: id_str,
        })?;

        Ok(row.try_into_account()?)
    }

    async fn get_by_email(&self, email: &str) -> CampusResult<Account> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {ACCOUNT_FIELDS} FROM account WHERE email = $email"
            ))
            .bind(("email", normalize_email(email)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "account".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_account()?)
    }

    async fn get_many(&self, ids: &[Uuid]) -> CampusResult<Vec<Account>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(format!(
                "SELECT {ACCOUNT_FIELDS} FROM account WHERE meta::id(id) INSIDE $ids"
            ))
            .bind(("ids", id_strings(ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccountRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_accounts(rows)?)
    }

    async fn list(&self) -> CampusResult<Vec<AccountWithRole>> {
        let accounts = self.select_accounts("").await?;
        let mut roles = self.roles_by_account("").await?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                let role = roles.remove(&account.id);
                AccountWithRole { account, role }
            })
            .collect())
    }

    async fn list_pending(&self) -> CampusResult<Vec<PendingAccount>> {
        let accounts = self.select_accounts("WHERE is_approved = false").await?;
        let mut roles = self.roles_by_account("").await?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                let requested_role = roles.remove(&account.id);
                PendingAccount {
                    account,
                    requested_role,
                }
            })
            .collect())
    }

    async fn approve_with_credential(&self, id: Uuid, secret: &str) -> CampusResult<Account> {
        let secret_hash = hash_secret(secret, self.pepper.as_deref())?;

        let response = self
            .db
            .query(APPROVE_ACCOUNT)
            .bind(("id", id.to_string()))
            .bind(("secret_hash", secret_hash))
            .await
            .map_err(DbError::from)?;
        check(response).map_err(|e| abort_to_error(id, e))?;

        self.get_by_id(id).await
    }

    async fn delete_pending(&self, id: Uuid) -> CampusResult<()> {
        let response = self
            .db
            .query(DELETE_PENDING)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        check(response).map_err(|e| abort_to_error(id, e))?;
        Ok(())
    }

    async fn admin_exists(&self) -> CampusResult<bool> {
        let admins = self.roles_by_account("WHERE role = 'admin'").await?;
        if admins.is_empty() {
            return Ok(false);
        }
        let ids: Vec<Uuid> = admins.into_keys().collect();
        let accounts = self.get_many(&ids).await?;
        Ok(accounts.iter().any(|a| a.is_approved))
    }
}
