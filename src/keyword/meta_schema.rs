use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Group, Keyword};
use crate::schema::BoolOrSchema;
use crate::types::Kind;

/// Core identification keywords: `$schema`, `$id`, `$anchor`, `$dynamicAnchor`,
/// `$vocabulary`, `$comment` and `$defs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaSchema {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(rename = "$id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$anchor", skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,

    #[serde(rename = "$dynamicAnchor", skip_serializing_if = "Option::is_none")]
    pub dynamic_anchor: Option<String>,

    #[serde(rename = "$vocabulary", skip_serializing_if = "IndexMap::is_empty")]
    pub vocabulary: IndexMap<String, bool>,

    #[serde(rename = "$comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(rename = "$defs", skip_serializing_if = "IndexMap::is_empty")]
    pub defs: IndexMap<String, BoolOrSchema>,
}

impl Keyword for MetaSchema {
    fn group(&self) -> Group {
        Group::MetaSchema
    }

    fn kind(&self) -> Kind {
        Kind::IDENTIFIER | Kind::RESERVED_LOCATION
    }

    fn is_active(&self) -> bool {
        self.schema.is_some()
            || self.id.is_some()
            || self.anchor.is_some()
            || self.dynamic_anchor.is_some()
            || !self.vocabulary.is_empty()
            || self.comment.is_some()
            || !self.defs.is_empty()
    }
}
