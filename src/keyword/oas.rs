use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{present, Group, Keyword};
use crate::document::ExternalDocumentation;
use crate::types::Kind;

/// OpenAPI's additions to the schema vocabulary. Annotation only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OasAnnotations {
    /// Deprecated by OpenAPI 3.1 in favour of `examples`.
    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml: Option<Xml>,
}

/// Tells consumers which member selects among `oneOf`/`anyOf` alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

/// XML representation hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Xml {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<bool>,
}

impl Keyword for OasAnnotations {
    fn group(&self) -> Group {
        Group::Oas
    }

    fn kind(&self) -> Kind {
        Kind::ANNOTATION
    }

    fn is_active(&self) -> bool {
        self.example.is_some()
            || self.external_docs.is_some()
            || self.discriminator.is_some()
            || self.xml.is_some()
    }
}
