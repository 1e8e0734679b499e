use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Group, Keyword};
use crate::error::ValidationError;
use crate::schema::{BoolOrSchema, Schema, Scope};
use crate::types::{json_equal, Kind, Type};

/// `maxItems`, `minItems`, `uniqueItems`, `prefixItems`, `items`, `contains`,
/// `minContains` and `maxContains`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArrayConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prefix_items: Vec<BoolOrSchema>,

    /// Applies to every element past `prefixItems`. Unset accepts them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<BoolOrSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<BoolOrSchema>,

    /// Defaults to 1 when `contains` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_contains: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_contains: Option<u64>,
}

impl ArrayConstraints {
    /// The schema of elements past `prefixItems`, when `items` is a schema.
    pub fn items_schema(&self) -> Option<&Schema> {
        match self.items.as_deref() {
            Some(BoolOrSchema::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    pub fn items_schema_mut(&mut self) -> Option<&mut Schema> {
        match self.items.as_deref_mut() {
            Some(BoolOrSchema::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    fn validate_items(&self, items: &[Value], scope: &Scope<'_>) -> Result<(), ValidationError> {
        let prefix = self.prefix_items.len();
        for (i, (item, schema)) in items.iter().zip(&self.prefix_items).enumerate() {
            schema
                .validate_in(item, scope)
                .map_err(|e| e.context(format!("prefixItems[{i}]")))?;
        }
        if items.len() <= prefix {
            return Ok(());
        }
        match self.items.as_deref() {
            None | Some(BoolOrSchema::Bool(true)) => Ok(()),
            Some(BoolOrSchema::Bool(false)) => {
                Err(ValidationError::AdditionalItems { index: prefix })
            }
            Some(BoolOrSchema::Schema(schema)) => {
                for (i, item) in items.iter().enumerate().skip(prefix) {
                    schema.validate_in(item, scope).map_err(|e| {
                        e.context(format!("invalid item at index {i}"))
                            .context("items")
                    })?;
                }
                Ok(())
            }
        }
    }

    fn validate_contains(
        &self,
        items: &[Value],
        scope: &Scope<'_>,
    ) -> Result<(), ValidationError> {
        let Some(contains) = &self.contains else {
            return Ok(());
        };
        let mut found = 0;
        for item in items {
            match contains.validate_in(item, scope) {
                Ok(()) => found += 1,
                Err(e) if e.is_usage() => return Err(e.context("contains")),
                Err(_) => {}
            }
        }
        let min = self.min_contains.unwrap_or(1);
        if (found as u64) < min {
            return Err(ValidationError::MinContains { found, min });
        }
        if let Some(max) = self.max_contains {
            if found as u64 > max {
                return Err(ValidationError::MaxContains { found, max });
            }
        }
        Ok(())
    }
}

impl Keyword for ArrayConstraints {
    fn group(&self) -> Group {
        Group::Array
    }

    fn kind(&self) -> Kind {
        Kind::ASSERTION
    }

    fn applies_to(&self, t: Type) -> bool {
        t.has(&[Type::ARRAY])
    }

    fn is_active(&self) -> bool {
        self.max_items.is_some()
            || self.min_items.is_some()
            || self.unique_items.is_some()
            || !self.prefix_items.is_empty()
            || self.items.is_some()
            || self.contains.is_some()
            || self.min_contains.is_some()
            || self.max_contains.is_some()
    }

    fn validate(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        let Value::Array(items) = value else {
            return Ok(());
        };
        let count = items.len();
        if let Some(limit) = self.max_items {
            if count as u64 > limit {
                return Err(ValidationError::MaxItems { count, limit });
            }
        }
        if let Some(limit) = self.min_items {
            if (count as u64) < limit {
                return Err(ValidationError::MinItems { count, limit });
            }
        }
        if self.unique_items == Some(true) {
            for (first, a) in items.iter().enumerate() {
                if let Some(offset) = items[first + 1..].iter().position(|b| json_equal(a, b)) {
                    return Err(ValidationError::UniqueItems {
                        first,
                        second: first + 1 + offset,
                    });
                }
            }
        }
        self.validate_items(items, scope)?;
        self.validate_contains(items, scope)
    }
}
