//! Instance validation against raw JSON schemas and OpenAPI documents.

use serde_json::Value;
use tracing::debug;

use crate::error::{ResolveError, ValidateError};
use crate::pointer::{Pointer, UriFragment};
use crate::schema::{BoolOrSchema, Scope, ValidationOptions};

fn decode(schema: &Value) -> Result<BoolOrSchema, ValidateError> {
    serde_json::from_value(schema.clone()).map_err(|source| ValidateError::InvalidSchema { source })
}

/// Validate an instance against a schema that is its own reference root.
///
/// # Errors
///
/// Returns `ValidateError::InvalidSchema` if `schema` does not decode, or
/// `ValidateError::Invalid` with the first failure.
pub fn validate_against_schema(schema: &Value, instance: &Value) -> Result<(), ValidateError> {
    validate_against_schema_with(schema, instance, ValidationOptions::default())
}

/// [`validate_against_schema`] with explicit options.
pub fn validate_against_schema_with(
    schema: &Value,
    instance: &Value,
    options: ValidationOptions,
) -> Result<(), ValidateError> {
    let compiled = decode(schema)?;
    compiled.validate_in(instance, &Scope::new(options).with_root(schema))?;
    Ok(())
}

/// Validate an instance against the schema at `fragment` inside `document`.
///
/// `fragment` is a URI fragment (`#/components/schemas/Pet`) or a plain JSON
/// Pointer (`/components/schemas/Pet`). References resolve against `document`.
///
/// # Errors
///
/// Returns `ValidateError::Resolve` if the fragment is malformed or points
/// nowhere, `ValidateError::InvalidSchema` if the target is not a schema, or
/// `ValidateError::Invalid` with the first failure.
pub fn validate_against_document(
    document: &Value,
    fragment: &str,
    instance: &Value,
    options: ValidationOptions,
) -> Result<(), ValidateError> {
    let pointer = if fragment.starts_with('#') {
        UriFragment::parse(fragment).map(|f| f.pointer().clone())
    } else {
        Pointer::parse(fragment)
    }
    .map_err(ResolveError::from)?;

    let target = pointer.access(document).map_err(ResolveError::from)?;
    debug!(pointer = %pointer, "validating against document schema");
    let compiled = decode(target)?;
    compiled.validate_in(instance, &Scope::new(options).with_root(document))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;

    #[test]
    fn validate_valid_payload() {
        let schema = json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" }
            },
            "required": ["name"]
        });
        assert!(validate_against_schema(&schema, &json!({ "name": "test" })).is_ok());
    }

    #[test]
    fn validate_missing_required_field() {
        let schema = json!({"type": "object", "required": ["name"]});
        let result = validate_against_schema(&schema, &json!({}));
        assert!(matches!(
            result,
            Err(ValidateError::Invalid(ValidationError::Required { .. }))
        ));
    }

    #[test]
    fn boolean_root_schema() {
        assert!(validate_against_schema(&json!(true), &json!(42)).is_ok());
        assert!(validate_against_schema(&json!(false), &json!(42)).is_err());
    }

    #[test]
    fn invalid_schema_is_reported() {
        let result = validate_against_schema(&json!({"type": "text"}), &json!(1));
        let err = result.unwrap_err();
        assert!(matches!(err, ValidateError::InvalidSchema { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn document_fragment_with_references() {
        let document = json!({
            "openapi": "3.1.0",
            "components": {"schemas": {
                "Pet": {"type": "object", "required": ["tag"], "properties": {"tag": {"$ref": "#/components/schemas/Tag"}}},
                "Tag": {"type": "string", "minLength": 1}
            }}
        });
        let options = ValidationOptions::default();
        for fragment in ["#/components/schemas/Pet", "/components/schemas/Pet"] {
            assert!(validate_against_document(&document, fragment, &json!({"tag": "a"}), options).is_ok());
            let err = validate_against_document(&document, fragment, &json!({"tag": ""}), options)
                .unwrap_err();
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn missing_fragment_is_resolve_error() {
        let result = validate_against_document(
            &json!({}),
            "#/components/schemas/Nope",
            &json!(1),
            ValidationOptions::default(),
        );
        assert!(matches!(result, Err(ValidateError::Resolve(ResolveError::Access(_)))));
    }

    #[test]
    fn depth_limit_is_configurable() {
        let schema = json!({"items": {"items": {"items": {}}}});
        let shallow = ValidationOptions::new().max_depth(2);
        let err = validate_against_schema_with(&schema, &json!([[[1]]]), shallow).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(validate_against_schema(&schema, &json!([[[1]]])).is_ok());
    }
}
