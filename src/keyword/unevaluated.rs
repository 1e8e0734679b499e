use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Group, Keyword};
use crate::error::ValidationError;
use crate::schema::{BoolOrSchema, Scope};
use crate::types::{Kind, Type};

/// `unevaluatedItems` and `unevaluatedProperties`.
///
/// These need annotation results from sibling applicators, which the engine does
/// not collect. Validating an instance they apply to fails with
/// [`ValidationError::Unsupported`] rather than passing silently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Unevaluated {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unevaluated_items: Option<Box<BoolOrSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unevaluated_properties: Option<Box<BoolOrSchema>>,
}

impl Keyword for Unevaluated {
    fn group(&self) -> Group {
        Group::Unevaluated
    }

    fn kind(&self) -> Kind {
        Kind::APPLICATOR | Kind::ANNOTATION
    }

    fn applies_to(&self, t: Type) -> bool {
        t.has(&[Type::OBJECT | Type::ARRAY])
    }

    fn is_active(&self) -> bool {
        self.unevaluated_items.is_some() || self.unevaluated_properties.is_some()
    }

    fn validate(&self, value: &Value, _scope: &Scope<'_>) -> Result<(), ValidationError> {
        match value {
            Value::Array(_) if self.unevaluated_items.is_some() => {
                Err(ValidationError::Unsupported {
                    keyword: "unevaluatedItems",
                })
            }
            Value::Object(_) if self.unevaluated_properties.is_some() => {
                Err(ValidationError::Unsupported {
                    keyword: "unevaluatedProperties",
                })
            }
            _ => Ok(()),
        }
    }
}
