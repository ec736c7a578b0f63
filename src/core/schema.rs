//! Project descriptor schema validation.
//!
//! Every descriptor is checked against the built-in JSON schema
//! (`project_schema.json`) before any of its fields are read. Fields the
//! schema does not mention are allowed; fields it does mention must have the
//! documented shape.

use std::sync::LazyLock;

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

/// The raw schema document.
pub const PROJECT_SCHEMA: &str = include_str!("project_schema.json");

static VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(PROJECT_SCHEMA).expect("built-in project schema is valid JSON");
    jsonschema::validator_for(&schema).expect("built-in project schema compiles")
});

/// A descriptor that does not conform to the project schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid project descriptor: {}", .messages.join("; "))]
pub struct SchemaError {
    /// One human-readable message per violation, in schema evaluation order.
    pub messages: Vec<String>,
}

/// Validate a raw descriptor, collecting every violation.
pub fn validate(descriptor: &Value) -> Result<(), SchemaError> {
    let messages: Vec<String> = VALIDATOR
        .iter_errors(descriptor)
        .map(|error| error.to_string())
        .collect();

    if messages.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { messages })
    }
}

/// Check whether a raw descriptor conforms to the project schema.
pub fn is_valid(descriptor: &Value) -> bool {
    VALIDATOR.is_valid(descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_compiles() {
        assert!(is_valid(&json!({ "project_name": "p" })));
    }

    #[test]
    fn test_empty_descriptor_is_invalid() {
        assert!(!is_valid(&json!({})));
        let err = validate(&json!({})).unwrap_err();
        assert!(!err.messages.is_empty());
    }

    #[test]
    fn test_descriptor_with_just_the_name_is_valid() {
        assert!(is_valid(&json!({ "project_name": "project" })));
    }

    #[test]
    fn test_non_string_name_is_invalid() {
        assert!(!is_valid(&json!({ "project_name": 12 })));
        assert!(!is_valid(&json!({ "project_name": ["a"] })));
        assert!(!is_valid(&json!({ "project_name": null })));
    }

    #[test]
    fn test_empty_name_is_invalid() {
        assert!(!is_valid(&json!({ "project_name": "" })));
    }

    #[test]
    fn test_non_mapping_documents_are_invalid() {
        assert!(!is_valid(&json!("project_name")));
        assert!(!is_valid(&json!(["project_name"])));
        assert!(!is_valid(&Value::Null));
    }

    #[test]
    fn test_unknown_fields_are_permitted() {
        assert!(is_valid(&json!({
            "project_name": "p",
            "maintainer": { "anything": [1, 2, 3] }
        })));
    }

    #[test]
    fn test_plans_are_typed() {
        assert!(is_valid(&json!({
            "project_name": "p",
            "build": { "bits": { "fmt": "10.0" }, "cflags": ["-O2"] },
            "test": { "bits": { "cest": 1.0 }, "libraries": ["pthread"] }
        })));
        assert!(is_valid(&json!({ "project_name": "p", "build": null })));
        assert!(!is_valid(&json!({ "project_name": "p", "build": "fmt" })));
        assert!(!is_valid(&json!({
            "project_name": "p",
            "build": { "bits": { "fmt": ["10.0"] } }
        })));
        assert!(!is_valid(&json!({
            "project_name": "p",
            "test": { "cflags": "-std=c++11" }
        })));
    }

    #[test]
    fn test_target_image_and_dockerfile_are_exclusive() {
        assert!(is_valid(&json!({
            "project_name": "p",
            "targets": { "default": { "image": "ubuntu:20.04" } }
        })));
        assert!(is_valid(&json!({
            "project_name": "p",
            "targets": { "default": { "dockerfile": "../environment" } }
        })));

        let both = json!({
            "project_name": "p",
            "targets": {
                "default": { "image": "ubuntu:20.04", "dockerfile": "../environment" }
            }
        });
        assert!(!is_valid(&both));
        assert!(validate(&both).is_err());
    }

    #[test]
    fn test_target_toolchain_is_closed() {
        assert!(is_valid(&json!({
            "project_name": "p",
            "targets": { "arm": { "image": "x", "toolchain": { "cxx": "arm-g++" } } }
        })));
        assert!(!is_valid(&json!({
            "project_name": "p",
            "targets": { "arm": { "toolchain": { "fortran": "gfortran" } } }
        })));
    }
}
