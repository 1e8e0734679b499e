//! Integration tests for the keyword validation engine.

use apispec::{validate_against_schema, Schema, ValidationError};
use serde_json::{json, Value};

fn schema(value: Value) -> Schema {
    serde_json::from_value(value).unwrap()
}

// === Applicators ===

mod applicators {
    use super::*;

    #[test]
    fn all_of_reports_failing_index() {
        let s = schema(json!({
            "allOf": [
                {"type": "object"},
                {"required": ["name"]}
            ]
        }));
        let err = s.validate(&json!({})).unwrap_err();
        assert_eq!(err.context_path(), vec!["allOf[1]"]);
        assert!(matches!(
            err.root_cause(),
            ValidationError::Required { name } if name == "name"
        ));
        assert_eq!(
            err.to_string(),
            "allOf[1]: required: property name \"name\" not found"
        );
    }

    #[test]
    fn any_of_rejects_when_no_branch_matches() {
        let s = schema(json!({"anyOf": [{"type": "string"}, {"type": "boolean"}]}));
        assert!(s.validate(&json!("x")).is_ok());
        assert!(s.validate(&json!(true)).is_ok());
        assert!(matches!(
            s.validate(&json!(1)).unwrap_err(),
            ValidationError::AnyOf { count: 2 }
        ));
    }

    #[test]
    fn one_of_counts_its_own_branches() {
        // An allOf next to the oneOf must not be counted in its place.
        let s = schema(json!({
            "allOf": [{}],
            "oneOf": [{"type": "string"}, {"maxLength": 3}]
        }));
        assert!(s.validate(&json!("abcd")).is_ok());
        match s.validate(&json!("ab")).unwrap_err() {
            ValidationError::OneOf { matched } => assert_eq!(matched, vec![0, 1]),
            other => panic!("expected oneOf error, got {other}"),
        }
        // Non-strings skip maxLength, so only the second branch matches.
        assert!(s.validate(&json!(7)).is_ok());
    }

    #[test]
    fn if_then_else() {
        let s = schema(json!({
            "if": {"properties": {"kind": {"const": "dog"}}},
            "then": {"required": ["bark"]},
            "else": {"required": ["meow"]}
        }));
        assert!(s.validate(&json!({"kind": "dog", "bark": true})).is_ok());
        assert!(s.validate(&json!({"kind": "cat", "meow": true})).is_ok());
        let err = s.validate(&json!({"kind": "dog"})).unwrap_err();
        assert_eq!(err.context_path(), vec!["then"]);
    }

    #[test]
    fn not() {
        let s = schema(json!({"not": {"type": "null"}}));
        assert!(s.validate(&json!(0)).is_ok());
        assert!(matches!(s.validate(&json!(null)).unwrap_err(), ValidationError::Not));
    }
}

// === Objects ===

mod objects {
    use super::*;

    #[test]
    fn required_name() {
        let s = schema(json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string"}}
        }));
        let err = s.validate(&json!({"tag": "x"})).unwrap_err();
        assert!(matches!(err, ValidationError::Required { ref name } if name == "name"));
    }

    #[test]
    fn nested_context_path() {
        let s = schema(json!({
            "properties": {
                "owner": {
                    "properties": {"tags": {"items": {"type": "string"}}}
                }
            }
        }));
        let err = s
            .validate(&json!({"owner": {"tags": ["a", 2]}}))
            .unwrap_err();
        assert_eq!(
            err.context_path(),
            vec![
                "properties",
                "property \"owner\"",
                "properties",
                "property \"tags\"",
                "items",
                "invalid item at index 1",
            ]
        );
    }

    #[test]
    fn additional_properties_apply_to_unmatched_members() {
        let s = schema(json!({
            "properties": {"id": {"type": "integer"}},
            "patternProperties": {"^x-": {}},
            "additionalProperties": false
        }));
        assert!(s.validate(&json!({"id": 1, "x-note": "ok"})).is_ok());
        assert!(matches!(
            s.validate(&json!({"id": 1, "extra": 0})).unwrap_err(),
            ValidationError::AdditionalProperty { ref name } if name == "extra"
        ));
    }

    #[test]
    fn property_names() {
        let s = schema(json!({"propertyNames": {"maxLength": 3}}));
        assert!(s.validate(&json!({"abc": 1})).is_ok());
        let err = s.validate(&json!({"abcd": 1})).unwrap_err();
        assert_eq!(err.context_path(), vec!["propertyNames", "name \"abcd\""]);
    }
}

// === References ===

mod references {
    use super::*;

    #[test]
    fn recursive_definition_through_the_root() {
        let root = json!({
            "$defs": {
                "node": {
                    "type": "object",
                    "properties": {
                        "value": {"type": "integer"},
                        "next": {"$ref": "#/$defs/node"}
                    }
                }
            },
            "$ref": "#/$defs/node"
        });
        assert!(validate_against_schema(&root, &json!({"value": 1, "next": {"value": 2}})).is_ok());
        assert!(validate_against_schema(&root, &json!({"value": 1, "next": {"value": "2"}})).is_err());
    }

    #[test]
    fn reference_siblings_also_apply() {
        let root = json!({
            "$defs": {"str": {"type": "string"}},
            "$ref": "#/$defs/str",
            "minLength": 2
        });
        assert!(validate_against_schema(&root, &json!("ab")).is_ok());
        assert!(validate_against_schema(&root, &json!("a")).is_err());
        assert!(validate_against_schema(&root, &json!(12)).is_err());
    }

    #[test]
    fn unevaluated_keywords_are_reported_unsupported() {
        let s = schema(json!({"unevaluatedProperties": false}));
        let err = s.validate(&json!({"a": 1})).unwrap_err();
        assert!(err.is_usage());
        assert!(s.validate(&json!("not an object")).is_ok());
    }
}

// === Boolean subschemas ===

mod boolean_schemas {
    use super::*;

    #[test]
    fn accepted_in_every_subschema_position() {
        let root = json!({
            "properties": {"id": true, "legacy": false},
            "patternProperties": {"^x-": true},
            "propertyNames": true,
            "allOf": [true],
            "anyOf": [false, true],
            "oneOf": [true],
            "if": true,
            "then": true,
            "not": false
        });
        assert!(validate_against_schema(&root, &json!({"id": 1, "x-a": 2})).is_ok());
        let err = validate_against_schema(&root, &json!({"legacy": 1})).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn nested_decode_errors_keep_their_detail() {
        let err = serde_json::from_value::<Schema>(json!({"allOf": [{"type": "float"}]}))
            .unwrap_err();
        assert!(err.to_string().contains("invalid type \"float\""), "{err}");
    }
}

// === Cross-check against the jsonschema crate ===

mod cross_check {
    use super::*;

    fn cases() -> Vec<(Value, Value)> {
        vec![
            (json!({"type": "integer"}), json!(1)),
            (json!({"type": "integer"}), json!(1.0)),
            (json!({"type": "integer"}), json!(1.5)),
            (json!({"type": ["string", "null"]}), json!(null)),
            (json!({"type": "number", "multipleOf": 0.5}), json!(2.5)),
            (json!({"type": "number", "multipleOf": 0.5}), json!(2.3)),
            (json!({"exclusiveMinimum": 0}), json!(0)),
            (json!({"maximum": 10}), json!(10)),
            (json!({"minLength": 2, "maxLength": 2}), json!("\u{1F600}\u{1F600}")),
            (json!({"pattern": "a+"}), json!("xaay")),
            (json!({"pattern": "^a+$"}), json!("xaay")),
            (json!({"const": {"a": [1, 2]}}), json!({"a": [1, 2]})),
            (json!({"const": {"a": [1, 2]}}), json!({"a": [2, 1]})),
            (json!({"enum": ["red", 1, null]}), json!(null)),
            (json!({"enum": ["red", 1, null]}), json!("blue")),
            (json!({"uniqueItems": true}), json!([1, 1])),
            (json!({"uniqueItems": true}), json!([{"a": 1}, {"a": 2}])),
            (json!({"prefixItems": [{"type": "string"}], "items": false}), json!(["a"])),
            (json!({"prefixItems": [{"type": "string"}], "items": false}), json!(["a", 1])),
            (json!({"contains": {"type": "integer"}}), json!(["a", "b"])),
            (
                json!({"contains": {"type": "integer"}, "minContains": 2, "maxContains": 3}),
                json!([1, 2, "x"]),
            ),
            (
                json!({"contains": {"type": "integer"}, "maxContains": 1}),
                json!([1, 2]),
            ),
            (json!({"minProperties": 1}), json!({})),
            (json!({"anyOf": [{"type": "string"}, {"minimum": 3}]}), json!(1)),
            (json!({"oneOf": [{"type": "integer"}, {"minimum": 0}]}), json!(2)),
            (json!({"oneOf": [{"type": "integer"}, {"minimum": 0}]}), json!(-2)),
            (json!({"not": {"type": "string"}}), json!("x")),
            (
                json!({"if": {"minimum": 10}, "then": {"multipleOf": 5}}),
                json!(12),
            ),
            (
                json!({"if": {"minimum": 10}, "then": {"multipleOf": 5}}),
                json!(3),
            ),
            (
                json!({"properties": {"a": {"type": "string"}}, "additionalProperties": {"type": "integer"}}),
                json!({"a": "x", "b": 1}),
            ),
            (
                json!({"properties": {"a": {"type": "string"}}, "additionalProperties": {"type": "integer"}}),
                json!({"a": "x", "b": "y"}),
            ),
            (
                json!({"$defs": {"p": {"minimum": 1}}, "items": {"$ref": "#/$defs/p"}}),
                json!([1, 0]),
            ),
            (json!({"properties": {"a": false}}), json!({"a": 1})),
            (json!({"properties": {"a": false}}), json!({"b": 1})),
            (json!({"allOf": [true, {"type": "integer"}]}), json!(1)),
            (json!({"anyOf": [false, false]}), json!(1)),
            (json!({"oneOf": [true, false]}), json!(1)),
            (json!({"not": false}), json!(1)),
            (json!({"prefixItems": [false]}), json!([])),
            (json!(false), json!("anything")),
            (json!(true), json!("anything")),
        ]
    }

    #[test]
    fn verdicts_agree() {
        for (schema, instance) in cases() {
            let oracle = jsonschema::draft202012::new(&schema)
                .unwrap_or_else(|e| panic!("oracle rejected {schema}: {e}"));
            let want = oracle.is_valid(&instance);
            let got = validate_against_schema(&schema, &instance).is_ok();
            assert_eq!(got, want, "schema {schema} instance {instance}");
        }
    }
}
