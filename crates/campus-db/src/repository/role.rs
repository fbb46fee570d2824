//! SurrealDB implementation of [`RoleRepository`].
//!
//! Each account has at most one `account_role` record, keyed by the
//! account id, so a reassignment is a single `UPSERT`.

use campus_core::error::CampusResult;
use campus_core::models::role::{Role, RoleAssignment};
use campus_core::repository::RoleRepository;
use serde::Deserialize;
use surrealdb::{Connection, Surreal};
use uuid::Uuid;

use super::{check, id_strings, parse_time, parse_uuid};
use crate::error::DbError;

pub(crate) const ROLE_FIELDS: &str =
    "account_id, role, <string> assigned_at AS assigned_at";

#[derive(Debug, Deserialize)]
pub(crate) struct RoleRow {
    account_id: String,
    role: String,
    assigned_at: String,
}

impl RoleRow {
    pub(crate) fn try_into_assignment(self) -> Result<RoleAssignment, DbError> {
        Ok(RoleAssignment {
            account_id: parse_uuid("account", &self.account_id)?,
            role: self
                .role
                .parse::<Role>()
                .map_err(|e| DbError::Corrupt(e.to_string()))?,
            assigned_at: parse_time("assigned_at", &self.assigned_at)?,
        })
    }
}

/// SurrealDB implementation of the role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn get_for_account(&self, account_id: Uuid) -> CampusResult<Option<RoleAssignment>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {ROLE_FIELDS} FROM type::thing('account_role', $id)"
            ))
            .bind(("id", account_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_assignment()?)),
            None => Ok(None),
        }
    }

    async fn replace(&self, account_id: Uuid, role: Role) -> CampusResult<RoleAssignment> {
        let id_str = account_id.to_string();

        check(
            self.db
                .query(
                    "UPSERT type::thing('account_role', $id) SET \
                     account_id = $id, role = $role, assigned_at = time::now()",
                )
                .bind(("id", id_str.clone()))
                .bind(("role", role.as_str()))
                .await
                .map_err(DbError::from)?,
        )?;

        self.get_for_account(account_id).await?.ok_or_else(|| {
            DbError::NotFound {
                entity: "account_role".into(),
                id: id_str,
            }
            .into()
        })
    }

    async fn get_for_accounts(&self, account_ids: &[Uuid]) -> CampusResult<Vec<RoleAssignment>> {
        if account_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut result = self
            .db
            .query(format!(
                "SELECT {ROLE_FIELDS} FROM account_role WHERE $ids CONTAINS account_id"
            ))
            .bind(("ids", id_strings(account_ids)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let assignments = rows
            .into_iter()
            .map(RoleRow::try_into_assignment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assignments)
    }
}
