use std::fmt;

use cohort_model::fields;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Register payload. Missing and `null` fields decode as empty strings and
/// are reported by validation rather than by the decoder.
#[derive(Clone, Default, Deserialize)]
#[serde(from = "RawFields")]
pub struct RegisterRequest {
    pub group_id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Fields that arrived as a JSON type other than string or null
    pub mistyped: Vec<&'static str>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(from = "RawFields")]
pub struct LoginRequest {
    pub group_id: String,
    pub email: String,
    pub password: String,
    pub mistyped: Vec<&'static str>,
}

/// Partial profile update; absent, `null`, or empty fields are left unchanged.
#[derive(Clone, Default, Deserialize)]
#[serde(from = "RawFields")]
pub struct UpdateRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub mistyped: Vec<&'static str>,
}

/// Any JSON object. Field typing is judged per field so that a wrongly typed
/// value becomes a validation detail instead of a decode failure.
#[derive(Deserialize)]
#[serde(transparent)]
struct RawFields(Map<String, Value>);

impl RawFields {
    fn take(&mut self, field: &'static str, mistyped: &mut Vec<&'static str>) -> Option<String> {
        match self.0.remove(field) {
            Some(Value::String(value)) => Some(value),
            None | Some(Value::Null) => None,
            Some(_) => {
                mistyped.push(field);
                None
            }
        }
    }
}

impl From<RawFields> for RegisterRequest {
    fn from(mut raw: RawFields) -> Self {
        let mut mistyped = Vec::new();
        Self {
            group_id: raw.take(fields::GROUP_ID, &mut mistyped).unwrap_or_default(),
            email: raw.take(fields::EMAIL, &mut mistyped).unwrap_or_default(),
            password: raw.take(fields::PASSWORD, &mut mistyped).unwrap_or_default(),
            first_name: raw.take(fields::FIRST_NAME, &mut mistyped).unwrap_or_default(),
            last_name: raw.take(fields::LAST_NAME, &mut mistyped).unwrap_or_default(),
            mistyped,
        }
    }
}

impl From<RawFields> for LoginRequest {
    fn from(mut raw: RawFields) -> Self {
        let mut mistyped = Vec::new();
        Self {
            group_id: raw.take(fields::GROUP_ID, &mut mistyped).unwrap_or_default(),
            email: raw.take(fields::EMAIL, &mut mistyped).unwrap_or_default(),
            password: raw.take(fields::PASSWORD, &mut mistyped).unwrap_or_default(),
            mistyped,
        }
    }
}

impl From<RawFields> for UpdateRequest {
    fn from(mut raw: RawFields) -> Self {
        let mut mistyped = Vec::new();
        Self {
            email: raw.take(fields::EMAIL, &mut mistyped),
            first_name: raw.take(fields::FIRST_NAME, &mut mistyped),
            last_name: raw.take(fields::LAST_NAME, &mut mistyped),
            password: raw.take(fields::PASSWORD, &mut mistyped),
            mistyped,
        }
    }
}

const REDACTED: &str = "<redacted>";

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("group_id", &self.group_id)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("mistyped", &self.mistyped)
            .finish()
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("group_id", &self.group_id)
            .field("email", &self.email)
            .field("password", &REDACTED)
            .field("mistyped", &self.mistyped)
            .finish()
    }
}

impl fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateRequest")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("mistyped", &self.mistyped)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_missing_fields_decode_as_empty() {
        let request: RegisterRequest =
            serde_json::from_value(json!({"email": null, "first_name": "Ada"})).unwrap();
        assert_eq!(request.email, "");
        assert_eq!(request.group_id, "");
        assert_eq!(request.first_name, "Ada");
        assert!(request.mistyped.is_empty());
    }

    #[test]
    fn wrongly_typed_fields_are_recorded() {
        let request: LoginRequest = serde_json::from_value(json!({
            "group_id": 42,
            "email": ["a@example.com"],
            "password": "pw",
        }))
        .unwrap();
        assert_eq!(request.mistyped, vec!["group_id", "email"]);
        assert_eq!(request.password, "pw");
    }

    #[test]
    fn update_keeps_null_as_not_supplied() {
        let request: UpdateRequest =
            serde_json::from_value(json!({"last_name": null, "password": false})).unwrap();
        assert!(request.last_name.is_none());
        assert!(request.password.is_none());
        assert_eq!(request.mistyped, vec!["password"]);
    }

    #[test]
    fn non_object_body_is_rejected_by_the_decoder() {
        assert!(serde_json::from_value::<RegisterRequest>(json!([1, 2])).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let request: LoginRequest =
            serde_json::from_value(json!({"password": "hunter2"})).unwrap();
        assert!(!format!("{request:?}").contains("hunter2"));
    }
}
