//! Principal resolution shared by every workflow service.
//!
//! The authority fails closed: an unknown account, an unapproved
//! account and an account without a role row all carry no permissions.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::account::Principal;
use campus_core::models::role::Role;
use campus_core::repository::{AccountRepository, RoleRepository};
use uuid::Uuid;

pub struct Authority<A: AccountRepository, R: RoleRepository> {
    accounts: A,
    roles: R,
}

impl<A: AccountRepository, R: RoleRepository> Authority<A, R> {
    pub fn new(accounts: A, roles: R) -> Self {
        Self { accounts, roles }
    }

    pub fn accounts(&self) -> &A {
        &self.accounts
    }

    pub fn roles(&self) -> &R {
        &self.roles
    }

    /// The account's role, or `None` when no role row exists.
    pub async fn resolve_role(&self, account_id: Uuid) -> CampusResult<Option<Role>> {
        Ok(self
            .roles
            .get_for_account(account_id)
            .await?
            .map(|assignment| assignment.role))
    }

    /// Whether the account exists and has been approved.
    pub async fn is_approved(&self, account_id: Uuid) -> CampusResult<bool> {
        match self.accounts.get_by_id(account_id).await {
            Ok(account) => Ok(account.is_approved),
            Err(CampusError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Resolve the role a principal may act with.
    ///
    /// Fails with `Forbidden` unless the account exists, is approved and
    /// holds a role.
    pub async fn authorize(&self, principal: Principal) -> CampusResult<Role> {
        let account_id = principal.account_id();
        if !self.is_approved(account_id).await? {
            return Err(CampusError::forbidden(
                "account is unknown or not yet approved",
            ));
        }
        self.resolve_role(account_id)
            .await?
            .ok_or_else(|| CampusError::forbidden("account has no role"))
    }

    /// Like [`authorize`](Self::authorize) but also requires `role`.
    pub async fn require(&self, principal: Principal, role: Role) -> CampusResult<()> {
        let actual = self.authorize(principal).await?;
        if actual != role {
            return Err(CampusError::forbidden(format!(
                "{role} role required, caller is {actual}"
            )));
        }
        Ok(())
    }
}
