//! Role & account directory: sign-up, sign-in and role administration.

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::account::{
    Account, AccountWithRole, CreateAccount, Principal, normalize_email,
};
use campus_core::models::role::Role;
use campus_core::repository::{AccountRepository, CredentialStore, RoleRepository};
use tracing::info;
use uuid::Uuid;

use crate::authority::Authority;
use crate::config::WorkflowConfig;
use crate::error::AuthError;

/// Input for the sign-up flow.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub requested_role: Role,
    pub department: Option<String>,
}

impl SignUp {
    fn validate(&self, min_password_length: usize) -> CampusResult<()> {
        validate_identity(
            &self.full_name,
            &self.email,
            &self.password,
            min_password_length,
        )?;
        if self.requested_role == Role::Admin {
            return Err(CampusError::validation(
                "the admin role cannot be requested at sign-up",
            ));
        }
        Ok(())
    }
}

fn validate_identity(
    full_name: &str,
    email: &str,
    password: &str,
    min_password_length: usize,
) -> CampusResult<()> {
    if full_name.trim().is_empty() {
        return Err(CampusError::validation("full name must not be empty"));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(CampusError::validation("a valid email address is required"));
    }
    if password.chars().count() < min_password_length {
        return Err(CampusError::validation(format!(
            "password must be at least {min_password_length} characters"
        )));
    }
    Ok(())
}

/// Maps each principal to one role and an approval flag.
pub struct AccountDirectory<A: AccountRepository, R: RoleRepository, C: CredentialStore> {
    authority: Authority<A, R>,
    credentials: C,
    config: WorkflowConfig,
}

impl<A, R, C> AccountDirectory<A, R, C>
where
    A: AccountRepository,
    R: RoleRepository,
    C: CredentialStore,
{
    pub fn new(authority: Authority<A, R>, credentials: C, config: WorkflowConfig) -> Self {
        Self {
            authority,
            credentials,
            config,
        }
    }

    pub async fn resolve_role(&self, account_id: Uuid) -> CampusResult<Option<Role>> {
        self.authority.resolve_role(account_id).await
    }

    pub async fn is_approved(&self, account_id: Uuid) -> CampusResult<bool> {
        self.authority.is_approved(account_id).await
    }

    /// Register a new, unapproved account with the role it asks for.
    pub async fn sign_up(&self, input: SignUp) -> CampusResult<Account> {
        input.validate(self.config.min_password_length)?;

        let account = self
            .authority
            .accounts()
            .create(CreateAccount {
                full_name: input.full_name.trim().to_string(),
                email: normalize_email(&input.email),
                department: input.department,
                password: input.password,
                role: input.requested_role,
                approved: false,
            })
            .await?;

        info!(
            account_id = %account.id,
            requested_role = %input.requested_role,
            "Account signed up, awaiting approval"
        );
        Ok(account)
    }

    /// Sign in with email and password.
    ///
    /// The approval flag is checked before the password, so an
    /// unapproved account is refused even with a correct password.
    pub async fn authenticate(&self, email: &str, password: &str) -> CampusResult<Account> {
        let account = match self.authority.accounts().get_by_email(email).await {
            Ok(account) => account,
            Err(CampusError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        if !account.is_approved {
            return Err(AuthError::AccountPendingApproval.into());
        }

        if !self
            .credentials
            .verify_credential(account.id, password)
            .await?
        {
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(account)
    }

    /// Replace the target's role. Admin only.
    pub async fn reassign_role(
        &self,
        actor: Principal,
        target: Uuid,
        role: Role,
    ) -> CampusResult<()> {
        self.authority.require(actor, Role::Admin).await?;
        self.authority.accounts().get_by_id(target).await?;

        self.authority.roles().replace(target, role).await?;

        info!(
            admin_id = %actor.account_id(),
            account_id = %target,
            role = %role,
            "Role reassigned"
        );
        Ok(())
    }

    /// Every account with its role, newest first. Admin only.
    pub async fn list_accounts(&self, actor: Principal) -> CampusResult<Vec<AccountWithRole>> {
        self.authority.require(actor, Role::Admin).await?;
        self.authority.accounts().list().await
    }

    /// Seed the first administrator. Fails with `Conflict` once an
    /// approved admin exists.
    pub async fn bootstrap_admin(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
    ) -> CampusResult<Account> {
        if self.authority.accounts().admin_exists().await? {
            return Err(CampusError::Conflict("an admin account already exists".into()));
        }

        validate_identity(full_name, email, password, self.config.min_password_length)?;

        let account = self
            .authority
            .accounts()
            .create(CreateAccount {
                full_name: full_name.trim().to_string(),
                email: normalize_email(email),
                department: None,
                password: password.to_string(),
                role: Role::Admin,
                approved: true,
            })
            .await?;

        info!(account_id = %account.id, "Bootstrap admin created");
        Ok(account)
    }
}
