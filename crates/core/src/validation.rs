//! Shape of field-level validation failures returned by the API
//!
//! Validation rules live with the forms; this module only recognises the
//! error body so callers can route it to the right fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error code the API uses for failed validation
pub const FAILED_VALIDATION_CODE: &str = "failed_validation";

/// Validation failure body: `{"code": "failed_validation", "errors": [...]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: String,
    pub errors: Vec<FieldError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidationError {
    /// Parse `body` if it is a validation failure
    #[must_use]
    pub fn from_value(body: &Value) -> Option<Self> {
        if !is_validation_error(body) {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    /// Field errors that name both a field and a message
    pub fn field_messages(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors
            .iter()
            .filter_map(|e| Some((e.field.as_deref()?, e.message.as_deref()?)))
    }
}

/// Whether `body` is an object with the validation code and an `errors` array
#[must_use]
pub fn is_validation_error(body: &Value) -> bool {
    body.as_object().is_some_and(|obj| {
        obj.get("code").and_then(Value::as_str) == Some(FAILED_VALIDATION_CODE)
            && obj.get("errors").is_some_and(Value::is_array)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recognises_validation_body() {
        let body = json!({
            "code": "failed_validation",
            "errors": [
                {"field": "emailAddress", "message": "is taken"},
                {"message": "no field"}
            ]
        });
        assert!(is_validation_error(&body));

        let parsed = ValidationError::from_value(&body).unwrap();
        let fields: Vec<_> = parsed.field_messages().collect();
        assert_eq!(fields, vec![("emailAddress", "is taken")]);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(!is_validation_error(&json!({"code": "failed_validation"})));
        assert!(!is_validation_error(
            &json!({"code": "failed_validation", "errors": {}})
        ));
        assert!(!is_validation_error(&json!({"code": "not_found", "errors": []})));
        assert!(!is_validation_error(&json!([{"code": "failed_validation"}])));
        assert!(ValidationError::from_value(&json!("text")).is_none());
    }
}
