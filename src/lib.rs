//! OpenAPI 3.1 documents and JSON Schema 2020-12 validation.
//!
//! The crate has three layers:
//!
//! - a document model ([`OpenApi`] and friends) that round-trips through serde
//!   with `x-` extensions intact,
//! - a schema engine where each keyword group validates one concern and a
//!   [`Schema`] dispatches to the groups it declares,
//! - a deriver that builds schemas from Rust type descriptions and a components
//!   closure that copies exactly the derived definitions a document reaches.
//!
//! # Example
//!
//! ```
//! use apispec::Schema;
//! use serde_json::json;
//!
//! let schema: Schema = serde_json::from_value(json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {
//!         "name": { "type": "string", "minLength": 1 },
//!         "tags": { "type": "array", "items": { "type": "string" } }
//!     }
//! }))
//! .unwrap();
//!
//! assert!(schema.validate(&json!({"name": "Rex", "tags": ["good"]})).is_ok());
//!
//! let err = schema.validate(&json!({"name": "Rex", "tags": [1]})).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "properties: property \"tags\": items: invalid item at index 0: type: want string, got (integer|number)"
//! );
//! ```
//!
//! # References
//!
//! References are never followed implicitly. [`ValueOrReference::resolve`] and
//! [`Schema::validate_with_root`] take the root document as an argument.

mod closure;
pub mod derive;
pub mod document;
mod error;
pub mod flag;
pub mod keyword;
mod linter;
mod loader;
pub mod pointer;
mod reference;
mod schema;
mod types;
mod validator;

pub use derive::{Describe, DeriveOptions, Deriver, Field, Shape, TypeInfo};
pub use document::{
    Components, Info, Location, MediaType, Method, OpenApi, Operation, Parameter, PathItem,
    RequestBody, Response, Responses,
};
pub use error::{
    AccessError, LoadError, PointerError, ResolveError, UsageError, ValidateError,
    ValidationError,
};
pub use linter::{
    lint, lint_document, lint_file, Diagnostic, FileResult, FileStatus, LintResult, Severity,
};
pub use loader::{is_url, load_auto, load_document, load_json, load_json_str};
pub use pointer::{escape, unescape, Pointer, Token, UriFragment};
pub use reference::{component_schema_name, component_schema_ref, Reference, ValueOrReference};
pub use schema::{BoolOrSchema, Schema, Scope, ValidationOptions, DEFAULT_MAX_DEPTH};
pub use types::{format, json_equal, json_type_name, Kind, Type};
pub use validator::{validate_against_document, validate_against_schema, validate_against_schema_with};

#[cfg(feature = "remote")]
pub use loader::load_json_url;
