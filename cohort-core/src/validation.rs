//! Batch field validation for inbound identity requests.
//!
//! Every check runs and every violation is collected, so a caller fixing a
//! form sees all of its problems in one round trip.

use std::{fmt, sync::LazyLock};

use cohort_model::{ErrorField, GroupId, codes, fields};
use regex::Regex;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::identity::{LoginRequest, RegisterRequest, UpdateRequest};

pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PASSWORD_BYTES: usize = 1024;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Every field violation found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ErrorField>);

impl ValidationErrors {
    pub fn fields(&self) -> &[ErrorField] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<ErrorField> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, field_name: &str, failure_code: &str) {
        self.0.push(ErrorField::new(field_name, failure_code));
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() { Ok(value) } else { Err(self) }
    }
}

pub struct ValidRegistration {
    pub group_id: GroupId,
    pub email: String,
    pub password: Zeroizing<String>,
    pub first_name: String,
    pub last_name: String,
}

pub struct ValidLogin {
    pub group_id: GroupId,
    pub email: String,
    pub password: Zeroizing<String>,
}

/// Supplied, well-formed update fields. `None` means "leave unchanged".
#[derive(Default)]
pub struct ValidUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<Zeroizing<String>>,
}

impl fmt::Debug for ValidRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidRegistration")
            .field("group_id", &self.group_id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ValidLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidLogin")
            .field("group_id", &self.group_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for ValidUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidUpdate")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_changed", &self.password.is_some())
            .finish()
    }
}

pub fn validate_register(request: &RegisterRequest) -> Result<ValidRegistration, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let mistyped = &request.mistyped;
    let group_id = check_group_id(&mut errors, mistyped, &request.group_id);
    let email = check_email(&mut errors, mistyped, &request.email);
    check_password(&mut errors, mistyped, &request.password);
    let first_name = check_name(&mut errors, mistyped, fields::FIRST_NAME, &request.first_name);
    let last_name = check_name(&mut errors, mistyped, fields::LAST_NAME, &request.last_name);

    match group_id {
        Some(group_id) if errors.is_empty() => Ok(ValidRegistration {
            group_id,
            email,
            password: Zeroizing::new(request.password.clone()),
            first_name,
            last_name,
        }),
        _ => Err(errors),
    }
}

pub fn validate_login(request: &LoginRequest) -> Result<ValidLogin, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let mistyped = &request.mistyped;
    let group_id = check_group_id(&mut errors, mistyped, &request.group_id);
    let email = check_email(&mut errors, mistyped, &request.email);
    check_password(&mut errors, mistyped, &request.password);

    match group_id {
        Some(group_id) if errors.is_empty() => Ok(ValidLogin {
            group_id,
            email,
            password: Zeroizing::new(request.password.clone()),
        }),
        _ => Err(errors),
    }
}

pub fn validate_update(request: &UpdateRequest) -> Result<ValidUpdate, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let mistyped = &request.mistyped;

    flag_mistyped(&mut errors, mistyped, fields::EMAIL);
    let email = supplied(&request.email).map(|email| check_email(&mut errors, &[], email));
    flag_mistyped(&mut errors, mistyped, fields::FIRST_NAME);
    let first_name = supplied(&request.first_name)
        .map(|name| check_name(&mut errors, &[], fields::FIRST_NAME, name));
    flag_mistyped(&mut errors, mistyped, fields::LAST_NAME);
    let last_name = supplied(&request.last_name)
        .map(|name| check_name(&mut errors, &[], fields::LAST_NAME, name));
    flag_mistyped(&mut errors, mistyped, fields::PASSWORD);
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| {
            check_password(&mut errors, &[], p);
            Zeroizing::new(p.to_string())
        });

    errors.finish(ValidUpdate {
        email,
        first_name,
        last_name,
        password,
    })
}

// Blank optional fields count as not supplied.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

// A field that arrived with the wrong JSON type is reported once, as invalid.
fn flag_mistyped(errors: &mut ValidationErrors, mistyped: &[&str], field: &str) -> bool {
    let flagged = mistyped.contains(&field);
    if flagged {
        errors.push(field, codes::INVALID);
    }
    flagged
}

fn check_group_id(errors: &mut ValidationErrors, mistyped: &[&str], raw: &str) -> Option<GroupId> {
    if flag_mistyped(errors, mistyped, fields::GROUP_ID) {
        return None;
    }
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(fields::GROUP_ID, codes::REQUIRED);
        return None;
    }
    match Uuid::parse_str(raw) {
        Ok(id) => Some(GroupId(id)),
        Err(_) => {
            errors.push(fields::GROUP_ID, codes::INVALID);
            None
        }
    }
}

fn check_email(errors: &mut ValidationErrors, mistyped: &[&str], raw: &str) -> String {
    let email = raw.trim();
    if flag_mistyped(errors, mistyped, fields::EMAIL) {
        return email.to_string();
    }
    if email.is_empty() {
        errors.push(fields::EMAIL, codes::REQUIRED);
    } else if email.chars().count() > MAX_EMAIL_LEN {
        errors.push(fields::EMAIL, codes::TOO_LONG);
    } else if !EMAIL_RE.is_match(email) {
        errors.push(fields::EMAIL, codes::INVALID);
    }
    email.to_string()
}

fn check_name(errors: &mut ValidationErrors, mistyped: &[&str], field: &str, raw: &str) -> String {
    let name = raw.trim();
    if flag_mistyped(errors, mistyped, field) {
        return name.to_string();
    }
    if name.is_empty() {
        errors.push(field, codes::REQUIRED);
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.push(field, codes::TOO_LONG);
    }
    name.to_string()
}

// Passwords are taken verbatim; surrounding whitespace is significant.
fn check_password(errors: &mut ValidationErrors, mistyped: &[&str], raw: &str) {
    if flag_mistyped(errors, mistyped, fields::PASSWORD) {
        return;
    }
    if raw.is_empty() {
        errors.push(fields::PASSWORD, codes::REQUIRED);
    } else if raw.len() > MAX_PASSWORD_BYTES {
        errors.push(fields::PASSWORD, codes::TOO_LONG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register() -> RegisterRequest {
        RegisterRequest {
            group_id: Uuid::new_v4().to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn well_formed_registration_passes() {
        let request = register();
        let valid = validate_register(&request).expect("valid");
        assert_eq!(valid.group_id.to_string(), request.group_id);
        assert_eq!(valid.email, "ada@example.com");
        assert_eq!(valid.password.as_str(), "correct horse");
    }

    #[test]
    fn empty_registration_reports_every_required_field() {
        let errors = validate_register(&RegisterRequest::default()).unwrap_err();
        let fields: Vec<_> = errors
            .fields()
            .iter()
            .map(|f| (f.field_name.as_str(), f.failure_code.as_str()))
            .collect();

        assert_eq!(
            fields,
            vec![
                ("group_id", "required"),
                ("email", "required"),
                ("password", "required"),
                ("first_name", "required"),
                ("last_name", "required"),
            ]
        );
    }

    #[test]
    fn malformed_values_are_invalid() {
        let mut request = register();
        request.group_id = "not-a-uuid".to_string();
        request.email = "ada at example".to_string();

        let errors = validate_register(&request).unwrap_err();
        assert_eq!(errors.fields().len(), 2);
        assert!(errors.fields()[0].is("group_id", "invalid"));
        assert!(errors.fields()[1].is("email", "invalid"));
    }

    #[test]
    fn overlong_values_are_too_long() {
        let mut request = register();
        request.first_name = "x".repeat(MAX_NAME_LEN + 1);
        request.password = "p".repeat(MAX_PASSWORD_BYTES + 1);
        request.email = format!("{}@example.com", "a".repeat(MAX_EMAIL_LEN));

        let errors = validate_register(&request).unwrap_err();
        assert!(errors.fields().iter().any(|f| f.is("email", "too_long")));
        assert!(errors.fields().iter().any(|f| f.is("password", "too_long")));
        assert!(errors.fields().iter().any(|f| f.is("first_name", "too_long")));
    }

    #[test]
    fn names_and_email_are_trimmed() {
        let mut request = register();
        request.email = "  ada@example.com ".to_string();
        request.first_name = " Ada ".to_string();

        let valid = validate_register(&request).expect("valid");
        assert_eq!(valid.email, "ada@example.com");
        assert_eq!(valid.first_name, "Ada");
    }

    #[test]
    fn login_requires_credentials_only() {
        let request = LoginRequest {
            group_id: Uuid::new_v4().to_string(),
            email: "ada@example.com".to_string(),
            password: String::new(),
            ..Default::default()
        };
        let errors = validate_login(&request).unwrap_err();
        assert_eq!(errors.fields(), &[ErrorField::new("password", "required")]);
    }

    #[test]
    fn update_ignores_missing_and_empty_fields() {
        let request = UpdateRequest {
            email: Some(String::new()),
            first_name: None,
            last_name: Some("  ".to_string()),
            password: Some(String::new()),
            ..Default::default()
        };
        let valid = validate_update(&request).expect("valid");
        assert!(valid.email.is_none());
        assert!(valid.first_name.is_none());
        assert!(valid.last_name.is_none());
        assert!(valid.password.is_none());
    }

    #[test]
    fn update_checks_supplied_fields() {
        let request = UpdateRequest {
            email: Some("nope".to_string()),
            first_name: Some("y".repeat(MAX_NAME_LEN + 1)),
            ..Default::default()
        };
        let errors = validate_update(&request).unwrap_err();
        assert!(errors.fields()[0].is("email", "invalid"));
        assert!(errors.fields()[1].is("first_name", "too_long"));
    }

    #[test]
    fn mistyped_fields_are_invalid_and_reported_once() {
        let mut request = register();
        request.email = String::new();
        request.mistyped = vec![fields::EMAIL, fields::LAST_NAME];

        let errors = validate_register(&request).unwrap_err();
        assert_eq!(
            errors.fields(),
            &[
                ErrorField::new("email", "invalid"),
                ErrorField::new("last_name", "invalid"),
            ]
        );
    }

    #[test]
    fn mistyped_update_field_is_invalid() {
        let request = UpdateRequest {
            first_name: Some("Augusta".to_string()),
            mistyped: vec![fields::PASSWORD],
            ..Default::default()
        };
        let errors = validate_update(&request).unwrap_err();
        assert_eq!(errors.fields(), &[ErrorField::new("password", "invalid")]);
    }
}
