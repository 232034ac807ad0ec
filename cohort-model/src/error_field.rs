use std::fmt;

/// One structured failure detail: which field failed and why.
///
/// Callers branch on the `(field_name, failure_code)` pair rather than on the
/// human-readable message, e.g. `("email", "already_exists")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorField {
    pub field_name: String,
    pub failure_code: String,
}

impl ErrorField {
    pub fn new(field_name: impl Into<String>, failure_code: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            failure_code: failure_code.into(),
        }
    }

    pub fn is(&self, field_name: &str, failure_code: &str) -> bool {
        self.field_name == field_name && self.failure_code == failure_code
    }
}

impl fmt::Display for ErrorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_name, self.failure_code)
    }
}

/// Field names that appear in failure details.
pub mod fields {
    pub const GROUP_ID: &str = "group_id";
    pub const EMAIL: &str = "email";
    pub const PASSWORD: &str = "password";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const TOKEN: &str = "token";
    pub const AUTHORIZATION: &str = "authorization";
}

/// Failure codes that appear in failure details.
pub mod codes {
    pub const REQUIRED: &str = "required";
    pub const INVALID: &str = "invalid";
    pub const TOO_LONG: &str = "too_long";
    pub const NOT_FOUND: &str = "not_found";
    pub const ALREADY_EXISTS: &str = "already_exists";
    pub const FORBIDDEN: &str = "forbidden";
}
