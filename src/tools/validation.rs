//! Validate tool call arguments against a declarative schema before execution.

use std::fmt;

use serde_json::Value;

use super::types::{FieldType, ToolParameters};

/// A single schema violation at a field path such as `profile.features[2]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Every violation found in one argument payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// A single error not tied to any field (e.g. malformed JSON).
    pub fn payload(message: impl Into<String>) -> Self {
        Self(vec![FieldError {
            path: String::new(),
            message: message.into(),
        }])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, path: &str, message: String) {
        self.0.push(FieldError {
            path: path.to_string(),
            message,
        });
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            if err.path.is_empty() {
                write!(f, "{}", err.message)?;
            } else {
                write!(f, "{}: {}", err.path, err.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Validate arguments against a tool schema.
///
/// Checks that the payload is an object, required fields are present and
/// every declared field has the declared type, recursing into arrays and
/// nested objects. Unknown fields are accepted. Returns the validated value
/// or every violation found.
pub fn validate_arguments(args: &Value, params: &ToolParameters) -> Result<Value, FieldErrors> {
    let mut errors = FieldErrors::default();
    validate_object(args, params, "", &mut errors);
    if errors.is_empty() {
        Ok(args.clone())
    } else {
        Err(errors)
    }
}

fn validate_object(value: &Value, params: &ToolParameters, path: &str, errors: &mut FieldErrors) {
    let Some(obj) = value.as_object() else {
        errors.push(
            path,
            format!("expected object, got {}", json_type_name(value)),
        );
        return;
    };

    for field in params.fields() {
        let field_path = join_path(path, &field.name);
        match obj.get(&field.name) {
            None | Some(Value::Null) if field.required => {
                errors.push(&field_path, "missing required field".to_string());
            }
            None | Some(Value::Null) => {}
            Some(v) => validate_value(v, &field.field_type, &field_path, errors),
        }
    }
}

fn validate_value(value: &Value, expected: &FieldType, path: &str, errors: &mut FieldErrors) {
    match expected {
        FieldType::Object(nested) => validate_object(value, nested, path, errors),
        FieldType::Array(items) => match value.as_array() {
            Some(elements) => {
                for (i, element) in elements.iter().enumerate() {
                    validate_value(element, items, &format!("{path}[{i}]"), errors);
                }
            }
            None => errors.push(path, type_mismatch(expected, value)),
        },
        scalar => {
            if !scalar_matches(value, scalar) {
                errors.push(path, type_mismatch(expected, value));
            }
        }
    }
}

fn scalar_matches(value: &Value, expected: &FieldType) -> bool {
    match expected {
        FieldType::String => value.is_string(),
        FieldType::Integer => value.is_i64() || value.is_u64(),
        FieldType::Number => value.is_number(),
        FieldType::Boolean => value.is_boolean(),
        FieldType::Array(_) => value.is_array(),
        FieldType::Object(_) => value.is_object(),
    }
}

fn type_mismatch(expected: &FieldType, value: &Value) -> String {
    format!(
        "expected type '{}', got {}",
        expected.type_name(),
        json_type_name(value)
    )
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_schema() -> ToolParameters {
        ToolParameters::object()
            .string("path", "File path", true)
            .boolean("verbose", "Verbose", false)
            .build()
    }

    #[test]
    fn rejects_non_object_args() {
        let err = validate_arguments(&json!("not an object"), &path_schema()).unwrap_err();

        assert_eq!(err.len(), 1);
        assert!(err.to_string().contains("expected object"));
    }

    #[test]
    fn rejects_missing_required_field() {
        let err = validate_arguments(&json!({}), &path_schema()).unwrap_err();

        assert_eq!(err.to_string(), "path: missing required field");
    }

    #[test]
    fn null_counts_as_missing_for_required_fields() {
        let err = validate_arguments(&json!({ "path": null }), &path_schema()).unwrap_err();

        assert!(err.to_string().contains("missing required field"));
    }

    #[test]
    fn accepts_valid_args_and_returns_them() {
        let args = json!({ "path": "test.txt" });

        let validated = validate_arguments(&args, &path_schema()).unwrap();

        assert_eq!(validated, args);
    }

    #[test]
    fn accepts_extra_fields_not_in_schema() {
        let args = json!({ "path": "test.txt", "extra": true });

        assert!(validate_arguments(&args, &path_schema()).is_ok());
    }

    #[test]
    fn rejects_field_with_wrong_type() {
        let schema = ToolParameters::object()
            .integer("count", "Count", true)
            .build();

        let err = validate_arguments(&json!({ "count": "three" }), &schema).unwrap_err();

        assert_eq!(err.to_string(), "count: expected type 'integer', got string");
    }

    #[test]
    fn integer_rejects_fractional_numbers() {
        let schema = ToolParameters::object()
            .integer("count", "Count", true)
            .build();

        assert!(validate_arguments(&json!({ "count": 1.5 }), &schema).is_err());
        assert!(validate_arguments(&json!({ "count": 2 }), &schema).is_ok());
    }

    #[test]
    fn collects_every_violation_with_nested_paths() {
        let profile = ToolParameters::object()
            .string("one_liner", "Summary", true)
            .string_list("features", "Features", true)
            .build();
        let schema = ToolParameters::object()
            .object("profile", "Profile", profile, true)
            .string_list("remaining_tasks", "Tasks", true)
            .build();
        let args = json!({
            "profile": { "features": ["a", 2] },
            "remaining_tasks": "none",
        });

        let err = validate_arguments(&args, &schema).unwrap_err();
        let paths: Vec<&str> = err.iter().map(|e| e.path.as_str()).collect();

        assert_eq!(
            paths,
            vec!["profile.one_liner", "profile.features[1]", "remaining_tasks"]
        );
    }

    #[test]
    fn empty_schema_accepts_any_object() {
        assert!(validate_arguments(&json!({ "anything": 42 }), &ToolParameters::empty()).is_ok());
    }
}
