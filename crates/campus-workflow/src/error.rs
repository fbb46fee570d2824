//! Sign-in error types.

use campus_core::error::CampusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is pending admin approval")]
    AccountPendingApproval,
}

impl From<AuthError> for CampusError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AccountPendingApproval => CampusError::AccountPendingApproval,
            AuthError::InvalidCredentials => CampusError::AuthenticationFailed {
                reason: err.to_string(),
            },
        }
    }
}
