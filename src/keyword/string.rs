use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{compile_pattern, Group, Keyword};
use crate::error::ValidationError;
use crate::schema::Scope;
use crate::types::{Kind, Type};

/// `maxLength`, `minLength` and `pattern`. Lengths count Unicode code points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Keyword for StringConstraints {
    fn group(&self) -> Group {
        Group::String
    }

    fn kind(&self) -> Kind {
        Kind::ASSERTION
    }

    fn applies_to(&self, t: Type) -> bool {
        t.has(&[Type::STRING])
    }

    fn is_active(&self) -> bool {
        self.max_length.is_some() || self.min_length.is_some() || self.pattern.is_some()
    }

    fn validate(&self, value: &Value, _scope: &Scope<'_>) -> Result<(), ValidationError> {
        let Some(s) = value.as_str() else {
            return Ok(());
        };
        let length = s.chars().count();
        if let Some(limit) = self.max_length {
            if length as u64 > limit {
                return Err(ValidationError::MaxLength { length, limit });
            }
        }
        if let Some(limit) = self.min_length {
            if (length as u64) < limit {
                return Err(ValidationError::MinLength { length, limit });
            }
        }
        if let Some(pattern) = &self.pattern {
            if !compile_pattern(pattern)?.is_match(s) {
                return Err(ValidationError::Pattern {
                    pattern: pattern.clone(),
                    value: s.to_string(),
                });
            }
        }
        Ok(())
    }
}
