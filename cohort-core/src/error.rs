use thiserror::Error;

/// Failures reported by the persistence ports.
///
/// Adapters translate driver errors into this type so the identity workflow
/// never sees a raw storage error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_unique_violation_of(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
