use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{compile_pattern, Group, Keyword};
use crate::error::ValidationError;
use crate::schema::{BoolOrSchema, Scope};
use crate::types::{Kind, Type};

/// `maxProperties`, `minProperties`, `propertyNames`, `required`, `properties`,
/// `patternProperties` and `additionalProperties`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,

    /// Validated against every key, as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_names: Option<BoolOrSchema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, BoolOrSchema>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub pattern_properties: IndexMap<String, BoolOrSchema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<BoolOrSchema>>,
}

impl ObjectConstraints {
    /// Validates one member: `properties` first, then every matching
    /// `patternProperties` entry, then `additionalProperties`.
    fn validate_member(
        &self,
        name: &str,
        value: &Value,
        scope: &Scope<'_>,
    ) -> Result<(), ValidationError> {
        if let Some(schema) = self.properties.get(name) {
            return schema.validate_in(value, scope).map_err(|e| {
                e.context(format!("property {name:?}"))
                    .context("properties")
            });
        }

        let mut matched = false;
        for (pattern, schema) in &self.pattern_properties {
            if !compile_pattern(pattern)
                .map_err(|e| e.context("patternProperties"))?
                .is_match(name)
            {
                continue;
            }
            matched = true;
            schema.validate_in(value, scope).map_err(|e| {
                e.context(format!("property {name:?} matching {pattern:?}"))
                    .context("patternProperties")
            })?;
        }
        if matched {
            return Ok(());
        }

        match self.additional_properties.as_deref() {
            None | Some(BoolOrSchema::Bool(true)) => Ok(()),
            Some(BoolOrSchema::Bool(false)) => Err(ValidationError::AdditionalProperty {
                name: name.to_string(),
            }),
            Some(BoolOrSchema::Schema(schema)) => {
                schema.validate_in(value, scope).map_err(|e| {
                    e.context(format!("property {name:?}"))
                        .context("additionalProperties")
                })
            }
        }
    }
}

impl Keyword for ObjectConstraints {
    fn group(&self) -> Group {
        Group::Object
    }

    fn kind(&self) -> Kind {
        Kind::ASSERTION
    }

    fn applies_to(&self, t: Type) -> bool {
        t.has(&[Type::OBJECT])
    }

    fn is_active(&self) -> bool {
        self.max_properties.is_some()
            || self.min_properties.is_some()
            || self.property_names.is_some()
            || !self.required.is_empty()
            || !self.properties.is_empty()
            || !self.pattern_properties.is_empty()
            || self.additional_properties.is_some()
    }

    fn validate(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        let Value::Object(members) = value else {
            return Ok(());
        };
        for name in &self.required {
            if !members.contains_key(name) {
                return Err(ValidationError::Required { name: name.clone() });
            }
        }
        let count = members.len();
        if let Some(limit) = self.max_properties {
            if count as u64 > limit {
                return Err(ValidationError::MaxProperties { count, limit });
            }
        }
        if let Some(limit) = self.min_properties {
            if (count as u64) < limit {
                return Err(ValidationError::MinProperties { count, limit });
            }
        }
        if let Some(names) = &self.property_names {
            for name in members.keys() {
                names
                    .validate_in(&Value::String(name.clone()), scope)
                    .map_err(|e| e.context(format!("name {name:?}")).context("propertyNames"))?;
            }
        }
        for (name, member) in members {
            self.validate_member(name, member, scope)?;
        }
        Ok(())
    }
}
