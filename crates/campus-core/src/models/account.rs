//! Account domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// The authenticated account making a request.
///
/// Every core operation takes the principal explicitly; nothing reads
/// ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(Uuid);

impl Principal {
    pub fn new(account_id: Uuid) -> Self {
        Self(account_id)
    }

    pub fn account_id(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for Principal {
    fn from(account_id: Uuid) -> Self {
        Self(account_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn principal(&self) -> Principal {
        Principal(self.id)
    }
}

#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub full_name: String,
    pub email: String,
    pub department: Option<String>,
    /// Raw password (hashed by the credential store before storage).
    pub password: String,
    /// Role requested at sign-up; recorded but grants nothing until approval.
    pub role: Role,
    pub approved: bool,
}

/// Canonical form of an email address: trimmed and lowercased.
///
/// Emails are stored and looked up in this form, so addresses that
/// differ only in case name the same account.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// An account awaiting review together with the role it asked for.
#[derive(Debug, Clone, Serialize)]
pub struct PendingAccount {
    pub account: Account,
    pub requested_role: Option<Role>,
}

/// An account joined with its current role, for administrative listings.
#[derive(Debug, Clone, Serialize)]
pub struct AccountWithRole {
    pub account: Account,
    pub role: Option<Role>,
}
