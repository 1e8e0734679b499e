//! Error types for schema validation, derivation, pointer access and loading.

use std::fmt;
use std::path::PathBuf;

use serde_json::{Number, Value};
use thiserror::Error;

use crate::pointer::Token;
use crate::types::Type;

/// A failed validation of an instance against a schema.
///
/// Keyword groups wrap the failures of their subschemas in [`ValidationError::Context`],
/// so the rendered message reads as a keyword path, e.g.
/// `properties: property "tags": items: invalid item at index 0: type: want string, got integer`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("const: invalid value")]
    Const,

    #[error("enum: invalid value")]
    Enum,

    #[error("type: want {want}, got {got}")]
    Type { want: Type, got: Type },

    #[error("maxLength: length {length} exceeds {limit}")]
    MaxLength { length: usize, limit: u64 },

    #[error("minLength: length {length} is less than {limit}")]
    MinLength { length: usize, limit: u64 },

    #[error("pattern: {value:?} does not match {pattern:?}")]
    Pattern { pattern: String, value: String },

    #[error("pattern: {pattern:?} failed to compile: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("multipleOf: {value} is not a multiple of {divisor}")]
    MultipleOf { value: Number, divisor: Number },

    #[error("maximum: {value} is greater than {limit}")]
    Maximum { value: Number, limit: Number },

    #[error("exclusiveMaximum: {value} is not less than {limit}")]
    ExclusiveMaximum { value: Number, limit: Number },

    #[error("minimum: {value} is less than {limit}")]
    Minimum { value: Number, limit: Number },

    #[error("exclusiveMinimum: {value} is not greater than {limit}")]
    ExclusiveMinimum { value: Number, limit: Number },

    #[error("maxItems: {count} items exceeds {limit}")]
    MaxItems { count: usize, limit: u64 },

    #[error("minItems: {count} items is less than {limit}")]
    MinItems { count: usize, limit: u64 },

    #[error("uniqueItems: items at index {first} and {second} are equal")]
    UniqueItems { first: usize, second: usize },

    #[error("items: items from index {index} is invalid")]
    AdditionalItems { index: usize },

    #[error("contains: found {found} matching items, want at least {min}")]
    MinContains { found: usize, min: u64 },

    #[error("contains: found {found} matching items, want at most {max}")]
    MaxContains { found: usize, max: u64 },

    #[error("maxProperties: {count} properties exceeds {limit}")]
    MaxProperties { count: usize, limit: u64 },

    #[error("minProperties: {count} properties is less than {limit}")]
    MinProperties { count: usize, limit: u64 },

    #[error("required: property name {name:?} not found")]
    Required { name: String },

    #[error("additionalProperties: got extra property {name:?}")]
    AdditionalProperty { name: String },

    #[error("anyOf: none of {count} subschemas matched")]
    AnyOf { count: usize },

    #[error("oneOf: found {} matching at {:?}, want 1", matched.len(), matched)]
    OneOf { matched: Vec<usize> },

    #[error("not: schema matched")]
    Not,

    #[error("schema is false")]
    FalseSchema,

    #[error("{keyword}: validation is not supported")]
    Unsupported { keyword: &'static str },

    #[error("validation exceeded the maximum depth of {limit}")]
    DepthExceeded { limit: usize },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl ValidationError {
    /// Wraps this error with one more keyword-path segment.
    pub fn context(self, context: impl Into<String>) -> Self {
        ValidationError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error below all context wrappers.
    pub fn root_cause(&self) -> &ValidationError {
        let mut current = self;
        while let ValidationError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// The context segments from outermost to innermost.
    pub fn context_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let ValidationError::Context { context, source } = current {
            path.push(context.as_str());
            current = source;
        }
        path
    }

    /// True when the failure comes from a misconfigured schema or caller rather
    /// than from the instance.
    pub fn is_usage(&self) -> bool {
        matches!(
            self.root_cause(),
            ValidationError::Usage(_)
                | ValidationError::Resolve(_)
                | ValidationError::InvalidPattern { .. }
                | ValidationError::Unsupported { .. }
                | ValidationError::DepthExceeded { .. }
        )
    }
}

/// Contract violations: the schema, type description or document was built wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("promoted field {field:?} of {record} conflicts with an existing property")]
    PromotedFieldConflict { record: String, field: String },

    #[error("field {field:?} of {record} is declared more than once")]
    FieldConflict { record: String, field: String },

    #[error("{type_name} does not derive to an object schema")]
    NotAnObject { type_name: String },

    #[error("reference {reference:?} cannot be resolved: no root document bound")]
    UnboundReference { reference: String },

    #[error("invalid http method: {method}")]
    InvalidHttpMethod { method: String },

    #[error("invalid components key {key:?}: must match ^[A-Za-z0-9._-]+$")]
    InvalidComponentKey { key: String },

    #[error("invalid response key {key:?}: must be \"default\" or match ^[1-5][0-9X]{{2}}$")]
    InvalidResponseKey { key: String },

    #[error("multipleOf must be greater than 0, got {value}")]
    InvalidMultipleOf { value: String },
}

/// A JSON Pointer or URI fragment that is not syntactically valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("invalid JSON pointer syntax: {pointer:?}")]
    InvalidSyntax { pointer: String },

    #[error("invalid URI fragment syntax: {fragment:?}")]
    InvalidFragment { fragment: String },

    #[error("URI fragment {fragment:?} is not valid UTF-8 after percent-decoding")]
    InvalidEncoding { fragment: String },
}

/// Failure to walk a pointer through a document.
///
/// Carries the tokens consumed before the failure, the tokens not yet consumed
/// (starting with the failing one), the value the failing token was applied to,
/// and the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessError {
    pub used: Vec<Token>,
    pub remaining: Vec<Token>,
    pub value: Value,
    pub reason: String,
}

impl AccessError {
    /// The pointer up to and including the failing token.
    pub fn failing_pointer(&self) -> String {
        self.used
            .iter()
            .chain(self.remaining.first())
            .map(|t| format!("/{}", t.escaped()))
            .collect()
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |tokens: &[Token]| {
            tokens
                .iter()
                .map(|t| format!("/{}", t.escaped()))
                .collect::<String>()
        };
        write!(
            f,
            "pointer access failed at {:?} (used {:?}, remaining {:?}, current value {}): {}",
            self.failing_pointer(),
            join(&self.used),
            join(&self.remaining),
            self.value,
            self.reason
        )
    }
}

impl std::error::Error for AccessError {}

/// Failure to resolve a `$ref` to a concrete value.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Pointer(#[from] PointerError),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("reference {reference:?} points at a value that does not decode: {source}")]
    Decode {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("reference {reference:?} is not a same-document fragment")]
    Unsupported { reference: String },
}

/// Errors while loading JSON documents.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid OpenAPI document: {source}")]
    InvalidDocument {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors from the convenience validation entry points.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("cannot locate schema: {0}")]
    Resolve(#[from] ResolveError),

    #[error("invalid schema: {source}")]
    InvalidSchema {
        #[source]
        source: serde_json::Error,
    },

    #[error("validation failed: {0}")]
    Invalid(ValidationError),
}

impl From<ValidationError> for ValidateError {
    fn from(err: ValidationError) -> Self {
        ValidateError::Invalid(err)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Load(e) => e.exit_code(),
            ValidateError::Invalid(e) if !e.is_usage() => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("openapi.json"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::InvalidJson {
            source: serde_json::from_str::<Value>("{").unwrap_err(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid(ValidationError::Required {
            name: "name".into(),
        });
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::Invalid(
            ValidationError::Usage(UsageError::UnboundReference {
                reference: "#/components/schemas/Pet".into(),
            })
            .context("items"),
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn context_chain_display() {
        let err = ValidationError::Type {
            want: Type::STRING,
            got: Type::INTEGER | Type::NUMBER,
        }
        .context("property \"tags\"")
        .context("properties");
        assert_eq!(
            err.to_string(),
            "properties: property \"tags\": type: want string, got (integer|number)"
        );
        assert_eq!(err.context_path(), vec!["properties", "property \"tags\""]);
        assert!(matches!(err.root_cause(), ValidationError::Type { .. }));
    }

    #[test]
    fn one_of_display_lists_indices() {
        let err = ValidationError::OneOf {
            matched: vec![0, 2],
        };
        assert_eq!(err.to_string(), "oneOf: found 2 matching at [0, 2], want 1");
    }

    #[test]
    fn access_error_display_names_failing_pointer() {
        let err = AccessError {
            used: vec![Token::key("foo")],
            remaining: vec![Token::index(5)],
            value: serde_json::json!(["bar", "baz"]),
            reason: "index out of range".into(),
        };
        assert_eq!(err.failing_pointer(), "/foo/5");
        assert!(err.to_string().ends_with("index out of range"));
    }
}
