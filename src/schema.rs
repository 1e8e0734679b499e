//! The schema aggregate and validation dispatch.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::ValidationError;
use crate::keyword::{
    Applicator, ArrayConstraints, Content, Keyword, KeywordSet, MetaData, MetaSchema,
    NumericConstraints, OasAnnotations, ObjectConstraints, Referencing, StringConstraints,
    Unevaluated, Validation,
};
use crate::reference::component_schema_ref;
use crate::types::{Kind, Type};

/// Default recursion limit for validation.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// A JSON Schema 2020-12 node with the OpenAPI 3.1 additions.
///
/// Every keyword group is flattened into one JSON object. Keys no group claims,
/// including `x-` extensions, are kept in [`Schema::extensions`] and written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(flatten)]
    pub meta_schema: MetaSchema,

    #[serde(flatten)]
    pub reference: Referencing,

    #[serde(flatten)]
    pub metadata: MetaData,

    #[serde(flatten)]
    pub validation: Validation,

    #[serde(flatten)]
    pub string: StringConstraints,

    #[serde(flatten)]
    pub numeric: NumericConstraints,

    #[serde(flatten)]
    pub object: ObjectConstraints,

    #[serde(flatten)]
    pub array: ArrayConstraints,

    #[serde(flatten)]
    pub unevaluated: Unevaluated,

    #[serde(flatten)]
    pub applicator: Applicator,

    #[serde(flatten)]
    pub content: Content,

    #[serde(flatten)]
    pub oas: OasAnnotations,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,

    /// Canonical name of the type this schema was derived from.
    #[serde(skip)]
    name: Option<String>,
}

impl Schema {
    /// A schema declaring only `type`.
    pub fn typed(t: Type) -> Self {
        let mut schema = Schema::default();
        schema.validation.type_ = Some(t);
        schema
    }

    /// `{"$ref": "#/components/schemas/<name>"}`.
    pub fn reference_to(name: &str) -> Self {
        let mut schema = Schema::default();
        schema.reference.reference = Some(component_schema_ref(name));
        schema
    }

    /// An open schema accepting every value.
    pub fn any() -> Self {
        Schema::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    /// The declared `type`, `Type::EMPTY` when unset.
    pub fn declared_type(&self) -> Type {
        self.validation.declared()
    }

    /// The `$ref`/`$dynamicRef` target, if this node is a reference.
    pub fn ref_target(&self) -> Option<&str> {
        self.reference.target()
    }

    /// True for a node holding nothing but `$ref`.
    pub fn is_bare_reference(&self) -> bool {
        let active = self.active();
        self.reference.reference.is_some()
            && active.len() == 1
            && self.extensions.is_empty()
    }

    /// The keyword groups, in dispatch order.
    pub fn keywords(&self) -> [&dyn Keyword; 12] {
        [
            &self.meta_schema,
            &self.reference,
            &self.metadata,
            &self.validation,
            &self.string,
            &self.numeric,
            &self.object,
            &self.array,
            &self.unevaluated,
            &self.applicator,
            &self.content,
            &self.oas,
        ]
    }

    /// The groups with at least one field present.
    pub fn active(&self) -> KeywordSet {
        self.keywords()
            .into_iter()
            .filter(|k| k.is_active())
            .map(|k| k.group())
            .collect()
    }

    /// The union of the kinds of every active group.
    pub fn kind(&self) -> Kind {
        let mut kind = Kind::EMPTY;
        for keyword in self.keywords() {
            if keyword.is_active() {
                kind |= keyword.kind();
            }
        }
        kind
    }

    /// Whether a value of kind `t` can satisfy the declared `type`.
    pub fn applies_to(&self, t: Type) -> bool {
        let declared = self.declared_type();
        declared.is_empty() || declared.has(&[t])
    }

    /// The direct subschemas of this node, boolean schemas excluded.
    pub fn subschemas(&self) -> Vec<&Schema> {
        fn either(s: &Option<BoolOrSchema>) -> Option<&Schema> {
            s.as_ref().and_then(BoolOrSchema::as_schema)
        }
        fn boxed(s: &Option<Box<BoolOrSchema>>) -> Option<&Schema> {
            s.as_deref().and_then(BoolOrSchema::as_schema)
        }
        fn all<'a>(list: impl IntoIterator<Item = &'a BoolOrSchema>) -> impl Iterator<Item = &'a Schema> {
            list.into_iter().filter_map(BoolOrSchema::as_schema)
        }

        let mut out: Vec<&Schema> = Vec::new();
        out.extend(all(self.meta_schema.defs.values()));
        out.extend(all(self.object.properties.values()));
        out.extend(all(self.object.pattern_properties.values()));
        out.extend(boxed(&self.object.additional_properties));
        out.extend(either(&self.object.property_names));
        out.extend(all(&self.array.prefix_items));
        out.extend(boxed(&self.array.items));
        out.extend(either(&self.array.contains));
        out.extend(boxed(&self.unevaluated.unevaluated_items));
        out.extend(boxed(&self.unevaluated.unevaluated_properties));
        out.extend(all(&self.applicator.all_of));
        out.extend(all(&self.applicator.any_of));
        out.extend(all(&self.applicator.one_of));
        out.extend(either(&self.applicator.if_));
        out.extend(either(&self.applicator.then_));
        out.extend(either(&self.applicator.else_));
        out.extend(either(&self.applicator.not));
        out.extend(self.content.content_schema.as_deref());
        out
    }

    /// Every `$ref`/`$dynamicRef` target in this node and below, in visit order.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(schema) = stack.pop() {
            out.extend(schema.ref_target());
            let mut children = schema.subschemas();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Adds `null` to the accepted kinds.
    ///
    /// A reference cannot carry `type`, so it is wrapped as
    /// `anyOf: [{$ref}, {type: null}]`. A schema without `type` already accepts null.
    pub fn nullable(self) -> Self {
        if self.ref_target().is_some() {
            let mut wrapper = Schema::default();
            wrapper.applicator.any_of = vec![self.into(), Schema::typed(Type::NULL).into()];
            return wrapper;
        }
        let mut schema = self;
        if let Some(t) = schema.validation.type_.as_mut() {
            *t |= Type::NULL;
        }
        schema
    }

    /// Reverses [`Schema::nullable`].
    pub fn strip_null(mut self) -> Self {
        if self.is_nullable_wrapper() {
            if let BoolOrSchema::Schema(inner) = self.applicator.any_of.swap_remove(0) {
                return *inner;
            }
        }
        if let Some(t) = self.validation.type_.as_mut() {
            if *t != Type::NULL {
                *t = t.without_null();
            }
        }
        self
    }

    fn is_nullable_wrapper(&self) -> bool {
        let any_of = &self.applicator.any_of;
        any_of.len() == 2
            && any_of[0].as_schema().is_some()
            && any_of[1] == BoolOrSchema::from(Schema::typed(Type::NULL))
            && self.active().len() == 1
            && self.extensions.is_empty()
    }

    /// Validates `value` with no root document bound and default options.
    ///
    /// A `$ref` reached this way fails with
    /// [`UsageError::UnboundReference`](crate::UsageError::UnboundReference).
    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.validate_in(value, &Scope::default())
    }

    /// Validates `value`, resolving references against `root`.
    pub fn validate_with_root(&self, value: &Value, root: &Value) -> Result<(), ValidationError> {
        self.validate_in(value, &Scope::new(ValidationOptions::default()).with_root(root))
    }

    /// Validates `value` one level below `scope`.
    ///
    /// Every active group that applies to the value's kind and is an assertion or
    /// an applicator runs in dispatch order; the first failure is returned.
    pub fn validate_in(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        let scope = scope.descend()?;
        let t = Type::of(value);
        for keyword in self.keywords() {
            if !keyword.is_active()
                || !keyword.applies_to(t)
                || !keyword.kind().has(&[Kind::ASSERTION | Kind::APPLICATOR])
            {
                continue;
            }
            trace!(group = keyword.name(), depth = scope.depth(), "validating");
            keyword.validate(value, &scope)?;
        }
        Ok(())
    }
}

/// `true`, `false` or a schema, where 2020-12 allows a boolean schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoolOrSchema {
    Bool(bool),
    Schema(Box<Schema>),
}

impl BoolOrSchema {
    pub fn validate_in(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        match self {
            BoolOrSchema::Bool(true) => Ok(()),
            BoolOrSchema::Bool(false) => Err(ValidationError::FalseSchema),
            BoolOrSchema::Schema(schema) => schema.validate_in(value, scope),
        }
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            BoolOrSchema::Schema(schema) => Some(schema),
            BoolOrSchema::Bool(_) => None,
        }
    }
}

impl<'de> Deserialize<'de> for BoolOrSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Bool(b) => Ok(BoolOrSchema::Bool(b)),
            value => Schema::deserialize(value)
                .map(BoolOrSchema::from)
                .map_err(D::Error::custom),
        }
    }
}

impl From<Schema> for BoolOrSchema {
    fn from(schema: Schema) -> Self {
        BoolOrSchema::Schema(Box::new(schema))
    }
}

impl From<bool> for BoolOrSchema {
    fn from(b: bool) -> Self {
        BoolOrSchema::Bool(b)
    }
}

/// Options controlling validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Maximum number of nested schemas entered for one instance.
    pub max_depth: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Validation context threaded through every keyword group.
///
/// The root document is passed explicitly; references never hold a pointer back
/// into the document that contains them.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    root: Option<&'a Value>,
    depth: usize,
    max_depth: usize,
}

impl Default for Scope<'_> {
    fn default() -> Self {
        Scope::new(ValidationOptions::default())
    }
}

impl<'a> Scope<'a> {
    pub fn new(options: ValidationOptions) -> Self {
        Scope {
            root: None,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    pub fn with_root(mut self, root: &'a Value) -> Self {
        self.root = Some(root);
        self
    }

    pub fn root(&self) -> Option<&'a Value> {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The scope one schema deeper, or `DepthExceeded`.
    pub fn descend(&self) -> Result<Scope<'a>, ValidationError> {
        if self.depth >= self.max_depth {
            warn!(limit = self.max_depth, "validation depth limit reached");
            return Err(ValidationError::DepthExceeded {
                limit: self.max_depth,
            });
        }
        Ok(Scope {
            depth: self.depth + 1,
            ..*self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::Group;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn groups_flatten_onto_one_object() {
        let wire = json!({
            "$id": "urn:pet",
            "title": "Pet",
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string", "minLength": 1}},
            "x-internal": true
        });
        let s = schema(wire.clone());
        assert_eq!(s.meta_schema.id.as_deref(), Some("urn:pet"));
        assert_eq!(s.object.required, vec!["name".to_string()]);
        assert_eq!(s.extensions.get("x-internal"), Some(&json!(true)));
        assert_eq!(serde_json::to_value(&s).unwrap(), wire);
    }

    #[test]
    fn active_groups_follow_presence() {
        let s = schema(json!({"minimum": 0, "description": "count"}));
        let active: Vec<_> = s.active().iter().collect();
        assert_eq!(active, vec![Group::MetaData, Group::Numeric]);
        assert_eq!(s.kind(), Kind::ANNOTATION | Kind::ASSERTION);
        assert!(Schema::default().active().is_empty());
    }

    #[test]
    fn absent_type_accepts_any_kind() {
        let s = schema(json!({"description": "anything"}));
        for value in [json!(null), json!(1), json!("x"), json!([]), json!({})] {
            assert!(s.validate(&value).is_ok());
        }
    }

    #[test]
    fn string_rules_skip_other_kinds() {
        let s = schema(json!({"maxLength": 1}));
        assert!(s.validate(&json!(12345)).is_ok());
        assert!(s.validate(&json!("ab")).is_err());
    }

    #[test]
    fn type_is_checked_before_kind_specific_rules() {
        let s = schema(json!({"type": "string", "maxLength": 1}));
        let err = s.validate(&json!(["a", "b"])).unwrap_err();
        assert!(matches!(err, ValidationError::Type { .. }));
    }

    #[test]
    fn references_resolve_against_the_root() {
        let root = json!({
            "$defs": {"positive": {"type": "integer", "minimum": 1}},
            "type": "array",
            "items": {"$ref": "#/$defs/positive"}
        });
        let s = schema(root.clone());
        assert!(s.validate_with_root(&json!([1, 2]), &root).is_ok());
        let err = s.validate_with_root(&json!([1, 0]), &root).unwrap_err();
        assert_eq!(
            err.context_path(),
            vec!["items", "invalid item at index 1", "$ref \"#/$defs/positive\""]
        );
    }

    #[test]
    fn unbound_reference_is_usage_error() {
        let s = Schema::reference_to("Pet");
        let err = s.validate(&json!({})).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("no root document bound"));
    }

    #[test]
    fn boolean_reference_targets() {
        let root = json!({"$defs": {"no": false, "yes": true}});
        let no = schema(json!({"$ref": "#/$defs/no"}));
        let yes = schema(json!({"$ref": "#/$defs/yes"}));
        assert!(yes.validate_with_root(&json!(1), &root).is_ok());
        assert!(matches!(
            no.validate_with_root(&json!(1), &root).unwrap_err().root_cause(),
            ValidationError::FalseSchema
        ));
    }

    #[test]
    fn self_referential_schema_hits_depth_limit() {
        let root = json!({"$ref": "#"});
        let s = schema(root.clone());
        let err = s.validate_with_root(&json!(1), &root).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ValidationError::DepthExceeded { limit: DEFAULT_MAX_DEPTH }
        ));
    }

    #[test]
    fn nullable_and_strip_null() {
        let s = Schema::typed(Type::STRING).nullable();
        assert_eq!(s.declared_type(), Type::STRING | Type::NULL);
        assert_eq!(s.strip_null().declared_type(), Type::STRING);

        let r = Schema::reference_to("Pet").nullable();
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            json!({"anyOf": [{"$ref": "#/components/schemas/Pet"}, {"type": "null"}]})
        );
        assert!(r.strip_null().is_bare_reference());
    }

    #[test]
    fn name_is_not_serialized() {
        let s = Schema::typed(Type::OBJECT).with_name("app.Pet");
        assert_eq!(s.name(), Some("app.Pet"));
        assert_eq!(serde_json::to_value(&s).unwrap(), json!({"type": "object"}));
    }

    #[test]
    fn bool_or_schema_wire_forms() {
        let b: BoolOrSchema = serde_json::from_value(json!(false)).unwrap();
        assert_eq!(b, BoolOrSchema::Bool(false));
        let s: BoolOrSchema = serde_json::from_value(json!({"type": "string"})).unwrap();
        assert_eq!(s.as_schema().unwrap().declared_type(), Type::STRING);
    }
}
