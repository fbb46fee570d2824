//! Notification collaborator interface.
//!
//! Delivery is best-effort. A failed notice never undoes the state
//! change that triggered it.

use std::fmt;

use thiserror::Error;

/// The one-time credential mail sent when an account is approved.
#[derive(Clone)]
pub struct ApprovalNotice {
    pub email: String,
    pub full_name: String,
    pub temporary_credential: String,
}

impl fmt::Debug for ApprovalNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApprovalNotice")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("temporary_credential", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected by provider ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("notification timed out")]
    Timeout,

    #[error("notifications are not configured")]
    Disabled,
}

pub trait Notifier: Send + Sync {
    fn send_approval_notice(
        &self,
        notice: &ApprovalNotice,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_the_credential() {
        let notice = ApprovalNotice {
            email: "a@x.edu".into(),
            full_name: "A".into(),
            temporary_credential: "Secr3t!Value".into(),
        };
        let rendered = format!("{notice:?}");
        assert!(rendered.contains("a@x.edu"));
        assert!(!rendered.contains("Secr3t!Value"));
    }
}
