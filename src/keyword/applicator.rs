use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Group, Keyword};
use crate::error::ValidationError;
use crate::schema::{BoolOrSchema, Scope};
use crate::types::Kind;

/// `allOf`, `anyOf`, `oneOf`, `if`/`then`/`else` and `not`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Applicator {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<BoolOrSchema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<BoolOrSchema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<BoolOrSchema>,

    /// Only evaluated when `then` or `else` is present.
    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_: Option<BoolOrSchema>,

    #[serde(rename = "then", skip_serializing_if = "Option::is_none")]
    pub then_: Option<BoolOrSchema>,

    #[serde(rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_: Option<BoolOrSchema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<BoolOrSchema>,
}

/// Runs `schema` as a trial. Instance failures become `false`; usage errors and
/// depth exhaustion still propagate.
fn passes(
    schema: &BoolOrSchema,
    value: &Value,
    scope: &Scope<'_>,
    context: impl FnOnce() -> String,
) -> Result<bool, ValidationError> {
    match schema.validate_in(value, scope) {
        Ok(()) => Ok(true),
        Err(e) if e.is_usage() => Err(e.context(context())),
        Err(_) => Ok(false),
    }
}

impl Applicator {
    fn validate_all_of(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        for (i, schema) in self.all_of.iter().enumerate() {
            schema
                .validate_in(value, scope)
                .map_err(|e| e.context(format!("allOf[{i}]")))?;
        }
        Ok(())
    }

    fn validate_any_of(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        if self.any_of.is_empty() {
            return Ok(());
        }
        for (i, schema) in self.any_of.iter().enumerate() {
            if passes(schema, value, scope, || format!("anyOf[{i}]"))? {
                return Ok(());
            }
        }
        Err(ValidationError::AnyOf {
            count: self.any_of.len(),
        })
    }

    fn validate_one_of(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        if self.one_of.is_empty() {
            return Ok(());
        }
        let mut matched = Vec::new();
        for (i, schema) in self.one_of.iter().enumerate() {
            if passes(schema, value, scope, || format!("oneOf[{i}]"))? {
                matched.push(i);
            }
        }
        if matched.len() == 1 {
            Ok(())
        } else {
            Err(ValidationError::OneOf { matched })
        }
    }

    fn validate_conditional(
        &self,
        value: &Value,
        scope: &Scope<'_>,
    ) -> Result<(), ValidationError> {
        let Some(condition) = &self.if_ else {
            return Ok(());
        };
        if self.then_.is_none() && self.else_.is_none() {
            return Ok(());
        }
        if passes(condition, value, scope, || "if".to_string())? {
            if let Some(then) = &self.then_ {
                then.validate_in(value, scope)
                    .map_err(|e| e.context("then"))?;
            }
        } else if let Some(otherwise) = &self.else_ {
            otherwise
                .validate_in(value, scope)
                .map_err(|e| e.context("else"))?;
        }
        Ok(())
    }

    fn validate_not(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        match &self.not {
            Some(schema) if passes(schema, value, scope, || "not".to_string())? => {
                Err(ValidationError::Not)
            }
            _ => Ok(()),
        }
    }
}

impl Keyword for Applicator {
    fn group(&self) -> Group {
        Group::Applicator
    }

    fn kind(&self) -> Kind {
        Kind::APPLICATOR
    }

    fn is_active(&self) -> bool {
        !self.all_of.is_empty()
            || !self.any_of.is_empty()
            || !self.one_of.is_empty()
            || self.if_.is_some()
            || self.then_.is_some()
            || self.else_.is_some()
            || self.not.is_some()
    }

    fn validate(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        self.validate_all_of(value, scope)?;
        self.validate_any_of(value, scope)?;
        self.validate_one_of(value, scope)?;
        self.validate_conditional(value, scope)?;
        self.validate_not(value, scope)
    }
}
