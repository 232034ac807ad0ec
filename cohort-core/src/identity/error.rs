use std::fmt;

use cohort_model::{ErrorField, codes, fields};
use serde::Serialize;
use thiserror::Error;

use crate::{
    error::StoreError, policy::PolicyRejection, ports::USERS_GROUP_EMAIL_KEY,
    token::TokenError, validation::ValidationErrors,
};

/// Client-visible failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    Unauthenticated,
    PermissionDenied,
    Internal,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::Unauthenticated => "UNAUTHENTICATED",
            Code::PermissionDenied => "PERMISSION_DENIED",
            Code::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical failure envelope handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub code: Code,
    pub message: String,
    pub details: Vec<ErrorField>,
}

impl Status {
    pub fn has_detail(&self, field_name: &str, failure_code: &str) -> bool {
        self.details.iter().any(|d| d.is(field_name, failure_code))
    }
}

const INTERNAL_MESSAGE: &str = "internal server error";

/// Every way an identity call can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("request has invalid fields")]
    Validation(Vec<ErrorField>),

    #[error("{message}")]
    NotFound { message: String, field: ErrorField },

    #[error("{message}")]
    Conflict { message: String, field: ErrorField },

    #[error("{message}")]
    Authentication { message: String, field: ErrorField },

    #[error("{message}")]
    Authorization { message: String, field: ErrorField },

    /// Details stay in the log; the client only sees a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn code(&self) -> Code {
        match self {
            IdentityError::Validation(_) => Code::InvalidArgument,
            IdentityError::NotFound { .. } => Code::NotFound,
            IdentityError::Conflict { .. } => Code::AlreadyExists,
            IdentityError::Authentication { .. } => Code::Unauthenticated,
            IdentityError::Authorization { .. } => Code::PermissionDenied,
            IdentityError::Internal(_) => Code::Internal,
        }
    }

    pub fn details(&self) -> Vec<ErrorField> {
        match self {
            IdentityError::Validation(fields) => fields.clone(),
            IdentityError::NotFound { field, .. }
            | IdentityError::Conflict { field, .. }
            | IdentityError::Authentication { field, .. }
            | IdentityError::Authorization { field, .. } => vec![field.clone()],
            IdentityError::Internal(_) => Vec::new(),
        }
    }

    pub fn status(&self) -> Status {
        let message = match self {
            IdentityError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        };
        Status {
            code: self.code(),
            message,
            details: self.details(),
        }
    }

    pub(crate) fn email_taken(email: &str, group_id: impl fmt::Display) -> Self {
        IdentityError::Conflict {
            message: format!("email {email} already exists in group {group_id}"),
            field: ErrorField::new(fields::EMAIL, codes::ALREADY_EXISTS),
        }
    }

    pub(crate) fn user_not_found(email: &str, group_id: impl fmt::Display) -> Self {
        IdentityError::NotFound {
            message: format!("email {email} in group {group_id} is not found"),
            field: ErrorField::new(fields::EMAIL, codes::NOT_FOUND),
        }
    }

    pub(crate) fn wrong_password() -> Self {
        IdentityError::Authentication {
            message: "password is invalid or not correct".to_string(),
            field: ErrorField::new(fields::PASSWORD, codes::INVALID),
        }
    }

    /// Translate a storage failure from a write keyed on `(group_id, email)`.
    pub(crate) fn from_write(err: StoreError, email: &str, group_id: impl fmt::Display) -> Self {
        if err.is_unique_violation_of(USERS_GROUP_EMAIL_KEY) {
            IdentityError::email_taken(email, group_id)
        } else {
            IdentityError::from(err)
        }
    }
}

impl From<ValidationErrors> for IdentityError {
    fn from(errors: ValidationErrors) -> Self {
        IdentityError::Validation(errors.into_fields())
    }
}

impl From<StoreError> for IdentityError {
    fn from(err: StoreError) -> Self {
        IdentityError::Internal(err.to_string())
    }
}

impl From<TokenError> for IdentityError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Missing => IdentityError::Authentication {
                message: err.to_string(),
                field: ErrorField::new(fields::TOKEN, codes::REQUIRED),
            },
            TokenError::Invalid => IdentityError::Authorization {
                message: err.to_string(),
                field: ErrorField::new(fields::AUTHORIZATION, codes::INVALID),
            },
        }
    }
}

impl From<PolicyRejection> for IdentityError {
    fn from(rejection: PolicyRejection) -> Self {
        match rejection {
            PolicyRejection::GroupNotFound(_) => IdentityError::NotFound {
                message: rejection.to_string(),
                field: ErrorField::new(fields::GROUP_ID, codes::NOT_FOUND),
            },
            PolicyRejection::InvitationRequired => IdentityError::Authorization {
                message: rejection.to_string(),
                field: ErrorField::new(fields::GROUP_ID, codes::FORBIDDEN),
            },
            PolicyRejection::InvitationConsumed { ref email } => IdentityError::Conflict {
                message: format!("email {email} has already registered with its invitation"),
                field: ErrorField::new(fields::EMAIL, codes::ALREADY_EXISTS),
            },
            PolicyRejection::Directory(err) => IdentityError::from(err),
        }
    }
}
