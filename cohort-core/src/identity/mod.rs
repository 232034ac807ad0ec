//! The identity workflow: Register, Login, Get, and Update.
//!
//! [`IdentityService`] is the only place component failures (storage, policy,
//! token, credential) are translated into an [`IdentityError`], and through
//! [`IdentityError::status`] into the envelope the transport serializes.

mod error;
mod requests;


pub use error::{Code, IdentityError, Status};
pub use requests::{LoginRequest, RegisterRequest, UpdateRequest};

use std::{any::type_name_of_val, fmt, sync::Arc};

use chrono::Utc;
use cohort_model::{NewUser, User, UserChanges, UserId, UserProfile};
use tracing::{error, info, warn};

use crate::{
    crypto::CredentialCodec,
    policy::GroupPolicyGate,
    ports::{GroupDirectory, UsersRepository},
    token::{CallMetadata, SessionToken, TokenError, TokenService},
    validation::{validate_login, validate_register, validate_update},
};

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Orchestrates the four identity operations.
///
/// Holds no per-call state; cloning shares the collaborators.
#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UsersRepository>,
    gate: GroupPolicyGate<dyn GroupDirectory>,
    credentials: Arc<CredentialCodec>,
    tokens: Arc<TokenService>,
}

impl fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityService")
            .field("users", &type_name_of_val(self.users.as_ref()))
            .field("gate", &self.gate)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        groups: Arc<dyn GroupDirectory>,
        credentials: Arc<CredentialCodec>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            gate: GroupPolicyGate::new(groups),
            credentials,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create an account in a group, subject to the group's enrollment policy.
    pub async fn register(&self, request: RegisterRequest) -> IdentityResult<UserProfile> {
        let valid = validate_register(&request)?;

        if let Err(rejection) = self
            .gate
            .check_registration(valid.group_id, &valid.email)
            .await
        {
            warn!(group_id = %valid.group_id, "registration rejected: {rejection}");
            return Err(self.internal_logged(rejection.into()));
        }

        let password_hash = self.credentials.hash(&valid.password).map_err(|err| {
            error!("failed to hash password: {err}");
            IdentityError::Internal(err.to_string())
        })?;

        let created = self
            .users
            .insert(NewUser {
                group_id: valid.group_id,
                email: valid.email.clone(),
                first_name: valid.first_name,
                last_name: valid.last_name,
                password_hash,
            })
            .await
            .map_err(|err| {
                self.internal_logged(IdentityError::from_write(err, &valid.email, valid.group_id))
            })?;

        let user = self.reload(created.id).await?;
        info!(user_id = %user.id, group_id = %user.group_id, "user registered");
        Ok(user.profile())
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, request: LoginRequest) -> IdentityResult<SessionToken> {
        let valid = validate_login(&request)?;

        let user = self
            .users
            .find_by_group_and_email(valid.group_id, &valid.email)
            .await
            .map_err(|err| self.internal_logged(err.into()))?
            .ok_or_else(|| IdentityError::user_not_found(&valid.email, valid.group_id))?;

        if !self.credentials.verify(&valid.password, &user.password_hash) {
            warn!(user_id = %user.id, "login rejected: password mismatch");
            return Err(IdentityError::wrong_password());
        }

        let token = self.tokens.issue(user.id).map_err(|err| {
            error!("failed to issue token: {err}");
            IdentityError::Internal(err.to_string())
        })?;

        info!(user_id = %user.id, "session issued");
        Ok(token)
    }

    /// Profile of the caller identified by the bearer token.
    pub async fn get(&self, metadata: &CallMetadata) -> IdentityResult<UserProfile> {
        let user = self.authorize(metadata).await?;
        Ok(user.profile())
    }

    /// Apply the supplied profile changes to the caller's account.
    ///
    /// This is a read-modify-write over the repository: the stored record is
    /// loaded, patched, then written back whole. Two concurrent updates for
    /// the same user are last-writer-wins, so a field changed only by the
    /// earlier request can be reverted by the later one.
    pub async fn update(
        &self,
        metadata: &CallMetadata,
        request: UpdateRequest,
    ) -> IdentityResult<UserProfile> {
        let mut user = self.authorize(metadata).await?;
        let valid = validate_update(&request)?;

        let password_hash = match valid.password {
            Some(password) => Some(self.credentials.hash(&password).map_err(|err| {
                error!("failed to hash password: {err}");
                IdentityError::Internal(err.to_string())
            })?),
            None => None,
        };

        user.apply(
            UserChanges {
                email: valid.email,
                first_name: valid.first_name,
                last_name: valid.last_name,
                password_hash,
            },
            Utc::now(),
        );

        self.users.update(&user).await.map_err(|err| {
            self.internal_logged(IdentityError::from_write(err, &user.email, user.group_id))
        })?;

        let updated = self.reload(user.id).await?;
        info!(user_id = %updated.id, "user updated");
        Ok(updated.profile())
    }

    /// Resolve the caller from call metadata. Token failures never reach the
    /// repository.
    async fn authorize(&self, metadata: &CallMetadata) -> IdentityResult<User> {
        let verified = self.tokens.verify_metadata(metadata).map_err(|err| {
            warn!("request rejected: {err}");
            IdentityError::from(err)
        })?;

        let user = self
            .users
            .find_by_id(verified.user_id)
            .await
            .map_err(|err| self.internal_logged(err.into()))?;

        user.ok_or_else(|| {
            warn!(user_id = %verified.user_id, "token subject no longer exists");
            IdentityError::from(TokenError::Invalid)
        })
    }

    async fn reload(&self, id: UserId) -> IdentityResult<User> {
        self.users
            .find_by_id(id)
            .await
            .map_err(|err| self.internal_logged(err.into()))?
            .ok_or_else(|| {
                let err = IdentityError::Internal(format!("user {id} vanished after write"));
                self.internal_logged(err)
            })
    }

    fn internal_logged(&self, err: IdentityError) -> IdentityError {
        if let IdentityError::Internal(cause) = &err {
            error!("identity storage failure: {cause}");
        }
        err
    }
}
