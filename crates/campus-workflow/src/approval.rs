//! Account approval workflow.
//!
//! ```text
//! PENDING_REVIEW --approve--> APPROVED   (credential issued, notice sent)
//! PENDING_REVIEW --reject---> (deleted)
//! ```
//!
//! The credential write and the approval flag commit together. The
//! notice goes out only after that commit; its failure is reported in
//! the outcome and never undoes the approval.

use std::fmt;

use campus_core::error::{CampusError, CampusResult};
use campus_core::models::account::{Account, PendingAccount, Principal};
use campus_core::models::role::Role;
use campus_core::notify::{ApprovalNotice, NotifyError, Notifier};
use campus_core::repository::{AccountRepository, RoleRepository};
use tracing::{info, warn};
use uuid::Uuid;

use crate::authority::Authority;
use crate::config::WorkflowConfig;
use crate::credential::generate_temporary_credential;

/// What happened to the approval notice.
#[derive(Clone, PartialEq, Eq)]
pub enum NoticeDelivery {
    Sent,
    /// The notice did not go out. The admin must pass the credential on.
    Failed {
        temporary_credential: String,
        reason: String,
    },
}

impl fmt::Debug for NoticeDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoticeDelivery::Sent => f.write_str("Sent"),
            NoticeDelivery::Failed { reason, .. } => f
                .debug_struct("Failed")
                .field("temporary_credential", &"<redacted>")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub account: Account,
    pub notice: NoticeDelivery,
}

pub struct AccountApproval<A: AccountRepository, R: RoleRepository, N: Notifier> {
    authority: Authority<A, R>,
    notifier: N,
    config: WorkflowConfig,
}

impl<A, R, N> AccountApproval<A, R, N>
where
    A: AccountRepository,
    R: RoleRepository,
    N: Notifier,
{
    pub fn new(authority: Authority<A, R>, notifier: N, config: WorkflowConfig) -> Self {
        Self {
            authority,
            notifier,
            config,
        }
    }

    /// Accounts awaiting review with the role each asked for. Admin only.
    pub async fn list_pending(&self, admin: Principal) -> CampusResult<Vec<PendingAccount>> {
        self.authority.require(admin, Role::Admin).await?;
        self.authority.accounts().list_pending().await
    }

    /// Approve an account and issue its one-time credential.
    pub async fn approve(&self, admin: Principal, target: Uuid) -> CampusResult<ApprovalOutcome> {
        self.authority.require(admin, Role::Admin).await?;

        let accounts = self.authority.accounts();
        if accounts.get_by_id(target).await?.is_approved {
            return Err(CampusError::AccountAlreadyApproved { account_id: target });
        }

        let temporary_credential = generate_temporary_credential(self.config.credential_length());
        let account = match accounts
            .approve_with_credential(target, &temporary_credential)
            .await
        {
            Ok(account) => account,
            Err(CampusError::Conflict(reason)) => {
                // A concurrent approval may have won the race.
                if self.authority.is_approved(target).await? {
                    return Err(CampusError::AccountAlreadyApproved { account_id: target });
                }
                return Err(CampusError::Conflict(reason));
            }
            Err(e) => return Err(e),
        };

        info!(
            admin_id = %admin.account_id(),
            account_id = %target,
            "Account approved"
        );

        let notice = ApprovalNotice {
            email: account.email.clone(),
            full_name: account.full_name.clone(),
            temporary_credential,
        };
        let notice = match self.deliver(&notice).await {
            Ok(()) => NoticeDelivery::Sent,
            Err(e) => {
                warn!(
                    account_id = %target,
                    error = %e,
                    "Approval notice not delivered; credential returned to admin"
                );
                NoticeDelivery::Failed {
                    temporary_credential: notice.temporary_credential,
                    reason: e.to_string(),
                }
            }
        };

        Ok(ApprovalOutcome { account, notice })
    }

    /// Delete an unapproved account with its role and credential.
    pub async fn reject(&self, admin: Principal, target: Uuid) -> CampusResult<()> {
        self.authority.require(admin, Role::Admin).await?;
        self.authority.accounts().delete_pending(target).await?;
        info!(
            admin_id = %admin.account_id(),
            account_id = %target,
            "Account rejected and deleted"
        );
        Ok(())
    }

    async fn deliver(&self, notice: &ApprovalNotice) -> Result<(), NotifyError> {
        tokio::time::timeout(
            self.config.notification_timeout(),
            self.notifier.send_approval_notice(notice),
        )
        .await
        .map_err(|_| NotifyError::Timeout)?
    }
}
