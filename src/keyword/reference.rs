use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Group, Keyword};
use crate::error::{ResolveError, UsageError, ValidationError};
use crate::pointer::UriFragment;
use crate::schema::{BoolOrSchema, Scope};
use crate::types::Kind;

/// `$ref` and `$dynamicRef`.
///
/// Only same-document fragments resolve. `$dynamicRef` is resolved like `$ref`;
/// dynamic scopes are not tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Referencing {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "$dynamicRef", skip_serializing_if = "Option::is_none")]
    pub dynamic_reference: Option<String>,
}

impl Referencing {
    /// The reference that decides resolution: `$ref`, else `$dynamicRef`.
    pub fn target(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.dynamic_reference.as_deref())
    }
}

/// Resolves a same-document fragment in `root` to a subschema.
pub fn resolve_schema(reference: &str, root: &Value) -> Result<BoolOrSchema, ResolveError> {
    if !reference.starts_with('#') {
        return Err(ResolveError::Unsupported {
            reference: reference.to_string(),
        });
    }
    let target = UriFragment::parse(reference)?.access(root)?;
    serde_json::from_value(target.clone()).map_err(|source| ResolveError::Decode {
        reference: reference.to_string(),
        source,
    })
}

impl Keyword for Referencing {
    fn group(&self) -> Group {
        Group::Reference
    }

    fn kind(&self) -> Kind {
        Kind::APPLICATOR
    }

    fn is_active(&self) -> bool {
        self.reference.is_some() || self.dynamic_reference.is_some()
    }

    fn validate(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        let Some(reference) = self.target() else {
            return Ok(());
        };
        let keyword = if self.reference.is_some() {
            "$ref"
        } else {
            "$dynamicRef"
        };
        let root = scope.root().ok_or_else(|| UsageError::UnboundReference {
            reference: reference.to_string(),
        })?;
        let target = resolve_schema(reference, root).map_err(|e| {
            ValidationError::from(e).context(format!("{keyword} {reference:?}"))
        })?;
        target
            .validate_in(value, scope)
            .map_err(|e| e.context(format!("{keyword} {reference:?}")))
    }
}
