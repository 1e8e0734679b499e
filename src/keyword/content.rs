use serde::{Deserialize, Serialize};

use super::{Group, Keyword};
use crate::schema::Schema;
use crate::types::{Kind, Type};

/// `contentEncoding`, `contentMediaType` and `contentSchema`. Annotation only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_media_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_schema: Option<Box<Schema>>,
}

impl Keyword for Content {
    fn group(&self) -> Group {
        Group::Content
    }

    fn kind(&self) -> Kind {
        Kind::ANNOTATION
    }

    fn applies_to(&self, t: Type) -> bool {
        t.has(&[Type::STRING])
    }

    fn is_active(&self) -> bool {
        self.content_encoding.is_some()
            || self.content_media_type.is_some()
            || self.content_schema.is_some()
    }
}
