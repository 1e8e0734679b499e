//! References and the value-or-reference slot used throughout the document model.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ResolveError;
use crate::pointer::{Pointer, UriFragment};

/// `#/components/schemas/<name>`, with the name escaped and percent-encoded.
pub fn component_schema_ref(name: &str) -> String {
    let pointer = Pointer::root().join("components").join("schemas").join(name);
    UriFragment::from(pointer).to_string()
}

/// The schema name a `#/components/schemas/<name>` reference targets.
pub fn component_schema_name(reference: &str) -> Option<String> {
    let fragment = UriFragment::parse(reference).ok()?;
    match fragment.pointer().tokens() {
        [components, schemas, name]
            if components.as_str() == "components" && schemas.as_str() == "schemas" =>
        {
            Some(name.as_str().to_string())
        }
        _ => None,
    }
}

/// A reference object: `$ref` (or `$dynamicRef`) plus the optional OpenAPI 3.1
/// `summary` and `description` overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "$dynamicRef", default, skip_serializing_if = "Option::is_none")]
    pub dynamic_reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Reference {
    pub fn new(uri: impl Into<String>) -> Self {
        Reference {
            reference: Some(uri.into()),
            ..Default::default()
        }
    }

    /// A reference to `#/components/schemas/<name>`.
    pub fn to_schema(name: &str) -> Self {
        Reference::new(component_schema_ref(name))
    }

    /// The target URI: `$ref`, else `$dynamicRef`.
    pub fn uri(&self) -> &str {
        self.reference
            .as_deref()
            .or(self.dynamic_reference.as_deref())
            .unwrap_or("")
    }

    /// The components schema name this reference targets, if it targets one.
    pub fn schema_name(&self) -> Option<String> {
        component_schema_name(self.uri())
    }

    /// Locates the referenced value inside `root`.
    pub fn locate<'v>(&self, root: &'v Value) -> Result<&'v Value, ResolveError> {
        let uri = self.uri();
        if !uri.starts_with('#') {
            return Err(ResolveError::Unsupported {
                reference: uri.to_string(),
            });
        }
        Ok(UriFragment::parse(uri)?.access(root)?)
    }

    /// Locates and decodes the referenced value.
    pub fn resolve<T: DeserializeOwned>(&self, root: &Value) -> Result<T, ResolveError> {
        let target = self.locate(root)?;
        serde_json::from_value(target.clone()).map_err(|source| ResolveError::Decode {
            reference: self.uri().to_string(),
            source,
        })
    }
}

/// A slot holding either an inline value or a reference to one elsewhere in the
/// document.
///
/// Decoding inspects the payload first: an object with a `$ref` or `$dynamicRef`
/// key is a reference, and any sibling keys are ignored. Encoding writes only the
/// active arm.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueOrReference<T> {
    Inline(T),
    Reference(Reference),
}

impl<T> ValueOrReference<T> {
    pub fn is_reference(&self) -> bool {
        matches!(self, ValueOrReference::Reference(_))
    }

    pub fn as_inline(&self) -> Option<&T> {
        match self {
            ValueOrReference::Inline(value) => Some(value),
            ValueOrReference::Reference(_) => None,
        }
    }

    pub fn as_inline_mut(&mut self) -> Option<&mut T> {
        match self {
            ValueOrReference::Inline(value) => Some(value),
            ValueOrReference::Reference(_) => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            ValueOrReference::Reference(reference) => Some(reference),
            ValueOrReference::Inline(_) => None,
        }
    }
}

impl<T: Clone + DeserializeOwned> ValueOrReference<T> {
    /// The inline value, or the value the reference points at in `root`.
    ///
    /// `root` must be the serialized document the slot belongs to.
    pub fn resolve(&self, root: &Value) -> Result<T, ResolveError> {
        match self {
            ValueOrReference::Inline(value) => Ok(value.clone()),
            ValueOrReference::Reference(reference) => reference.resolve(root),
        }
    }
}

impl<T> From<T> for ValueOrReference<T> {
    fn from(value: T) -> Self {
        ValueOrReference::Inline(value)
    }
}

fn is_reference_payload(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.contains_key("$ref") || map.contains_key("$dynamicRef"))
        .unwrap_or(false)
}

impl<T: Serialize> Serialize for ValueOrReference<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ValueOrReference::Inline(value) => value.serialize(serializer),
            ValueOrReference::Reference(reference) => reference.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ValueOrReference<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if is_reference_payload(&value) {
            Reference::deserialize(value)
                .map(ValueOrReference::Reference)
                .map_err(D::Error::custom)
        } else {
            T::deserialize(value)
                .map(ValueOrReference::Inline)
                .map_err(D::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::types::Type;
    use serde_json::json;

    #[test]
    fn reference_marker_decides_the_arm() {
        let slot: ValueOrReference<Schema> =
            serde_json::from_value(json!({"$ref": "#/components/schemas/Pet", "type": "string"}))
                .unwrap();
        let reference = slot.as_reference().unwrap();
        assert_eq!(reference.schema_name().as_deref(), Some("Pet"));

        let slot: ValueOrReference<Schema> =
            serde_json::from_value(json!({"type": "string"})).unwrap();
        assert_eq!(slot.as_inline().unwrap().declared_type(), Type::STRING);

        let slot: ValueOrReference<Schema> =
            serde_json::from_value(json!({"$dynamicRef": "#meta"})).unwrap();
        assert!(slot.is_reference());
    }

    #[test]
    fn encodes_only_the_active_arm() {
        let slot = ValueOrReference::<Schema>::Reference(Reference::to_schema("Pet"));
        assert_eq!(
            serde_json::to_value(&slot).unwrap(),
            json!({"$ref": "#/components/schemas/Pet"})
        );
        let slot = ValueOrReference::Inline(Schema::typed(Type::BOOLEAN));
        assert_eq!(serde_json::to_value(&slot).unwrap(), json!({"type": "boolean"}));
    }

    #[test]
    fn resolves_against_an_explicit_root() {
        let root = json!({"components": {"schemas": {"Pet": {"type": "object"}}}});
        let slot = ValueOrReference::<Schema>::Reference(Reference::to_schema("Pet"));
        assert_eq!(slot.resolve(&root).unwrap().declared_type(), Type::OBJECT);

        let dangling = ValueOrReference::<Schema>::Reference(Reference::to_schema("Tag"));
        assert!(matches!(dangling.resolve(&root), Err(ResolveError::Access(_))));

        let remote = ValueOrReference::<Schema>::Reference(Reference::new("pet.json#/Pet"));
        assert!(matches!(remote.resolve(&root), Err(ResolveError::Unsupported { .. })));
    }

    #[test]
    fn component_names_escape() {
        assert_eq!(component_schema_ref("a/b c"), "#/components/schemas/a~1b%20c");
        assert_eq!(
            component_schema_name("#/components/schemas/a~1b%20c").as_deref(),
            Some("a/b c")
        );
        assert_eq!(component_schema_name("#/components/responses/NotFound"), None);
        assert_eq!(component_schema_name("#/components/schemas"), None);
    }
}
