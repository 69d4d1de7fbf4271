use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{info, warn};

use crate::access::{
    AccessPolicy, AuthorizationError, Operation, Principal, SubjectId, UserAccount, UserDirectory,
};

pub struct UserAdminService<D> {
    directory: Arc<D>,
    policy: AccessPolicy,
}

impl<D> UserAdminService<D>
where
    D: UserDirectory + 'static,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            directory,
            policy: AccessPolicy,
        }
    }

    pub fn list_users(&self, principal: &Principal) -> Result<Vec<UserAccount>, UserAdminError> {
        self.authorize(principal)?;
        Ok(self.directory.accounts())
    }

    /// Revokes every token of `subject`. Callers cannot revoke themselves.
    pub fn revoke_user(
        &self,
        principal: &Principal,
        subject: &SubjectId,
    ) -> Result<UserAccount, UserAdminError> {
        self.authorize(principal)?;
        if principal.subject == *subject {
            return Err(UserAdminError::SelfRevocation);
        }
        let account = self
            .directory
            .revoke(subject)
            .ok_or_else(|| UserAdminError::UnknownUser(subject.0.clone()))?;
        info!(
            subject = %account.subject.0,
            revoked_by = %principal.subject.0,
            tokens = account.tokens,
            "user revoked"
        );
        Ok(account)
    }

    fn authorize(&self, principal: &Principal) -> Result<(), UserAdminError> {
        self.policy
            .require(principal, Operation::ManageUsers, None)
            .map_err(|err| {
                warn!(
                    subject = %principal.subject.0,
                    role = principal.role.label(),
                    operation = %Operation::ManageUsers,
                    "operation denied"
                );
                UserAdminError::Authorization(err)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserAdminError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error("administrators cannot revoke their own access")]
    SelfRevocation,
    #[error("user '{0}' not found")]
    UnknownUser(String),
}

impl UserAdminError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserAdminError::Authorization(_) => StatusCode::FORBIDDEN,
            UserAdminError::SelfRevocation => StatusCode::UNPROCESSABLE_ENTITY,
            UserAdminError::UnknownUser(_) => StatusCode::NOT_FOUND,
        }
    }
}
