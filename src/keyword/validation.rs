use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{present, Group, Keyword};
use crate::error::ValidationError;
use crate::schema::Scope;
use crate::types::{json_equal, Kind, Type};

/// `type`, `format`, `enum` and `const`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Validation {
    /// An empty union counts as unset and accepts every kind.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<Type>,

    /// Annotation only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_: Vec<Value>,

    #[serde(
        rename = "const",
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub const_: Option<Value>,
}

impl Validation {
    /// The declared type, `Type::EMPTY` when unset.
    pub fn declared(&self) -> Type {
        self.type_.unwrap_or(Type::EMPTY)
    }
}

impl Keyword for Validation {
    fn group(&self) -> Group {
        Group::Validation
    }

    fn kind(&self) -> Kind {
        Kind::ANNOTATION | Kind::ASSERTION
    }

    fn is_active(&self) -> bool {
        self.type_.is_some()
            || self.format.is_some()
            || !self.enum_.is_empty()
            || self.const_.is_some()
    }

    fn validate(&self, value: &Value, _scope: &Scope<'_>) -> Result<(), ValidationError> {
        // const decides alone, then enum, then type.
        if let Some(expected) = &self.const_ {
            return if json_equal(expected, value) {
                Ok(())
            } else {
                Err(ValidationError::Const)
            };
        }
        if !self.enum_.is_empty() {
            return if self.enum_.iter().any(|e| json_equal(e, value)) {
                Ok(())
            } else {
                Err(ValidationError::Enum)
            };
        }
        let declared = self.declared();
        let got = Type::of(value);
        if declared.is_empty() || declared.has(&[got]) {
            Ok(())
        } else {
            Err(ValidationError::Type {
                want: declared,
                got,
            })
        }
    }
}
