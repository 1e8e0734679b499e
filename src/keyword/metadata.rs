use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{present, Group, Keyword};
use crate::types::Kind;

/// Descriptive annotations. Never validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetaData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// `Some(Value::Null)` is an explicit `"default": null`.
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
}

impl Keyword for MetaData {
    fn group(&self) -> Group {
        Group::MetaData
    }

    fn kind(&self) -> Kind {
        Kind::ANNOTATION
    }

    fn is_active(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.default.is_some()
            || self.deprecated.is_some()
            || self.read_only.is_some()
            || self.write_only.is_some()
            || !self.examples.is_empty()
    }
}
