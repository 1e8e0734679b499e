//! Schema derivation from Rust type descriptions.
//!
//! Types describe themselves through [`Describe`]; the [`Deriver`] walks those
//! descriptions into [`Schema`]s. Records and interfaces get a canonical name and
//! are cached per deriver: the first encounter registers a placeholder under the
//! name *before* walking fields, so recursive types terminate and every later
//! encounter becomes `{"$ref": "#/components/schemas/<name>"}`.
//!
//! ```
//! use apispec::derive::{Describe, Deriver, Field, TypeInfo};
//!
//! struct Pet {
//!     name: String,
//!     parent: Option<Box<Pet>>,
//! }
//!
//! impl Describe for Pet {
//!     fn describe() -> TypeInfo {
//!         TypeInfo::record(module_path!(), "Pet", vec![
//!             Field::of::<String>("name").required(),
//!             Field::of::<Option<Box<Pet>>>("parent"),
//!         ])
//!     }
//! }
//!
//! let deriver = Deriver::new();
//! let schema = deriver.derive::<Pet>().unwrap();
//! assert_eq!(schema.object.required, vec!["name".to_string()]);
//! assert_eq!(deriver.cache().len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::UsageError;
use crate::schema::{BoolOrSchema, Schema};
use crate::types::{format, Type};

/// A lazily evaluated type description. Field types are stored this way so a
/// record can mention itself.
pub type TypeRef = fn() -> TypeInfo;

/// A type that can describe its serialized shape.
pub trait Describe {
    fn describe() -> TypeInfo;
}

/// The description of one type: where it lives, what it is called, and its shape.
#[derive(Debug, Clone)]
pub struct TypeInfo {
    module: &'static str,
    ident: &'static str,
    shape: Shape,
}

/// The serialized shape of a type.
#[derive(Debug, Clone)]
pub enum Shape {
    Boolean,
    /// `bits` is `None` for pointer-sized integers.
    Integer { bits: Option<u32>, signed: bool },
    Float { bits: u32 },
    String,
    /// May be absent or null.
    Optional(TypeRef),
    /// Serialized exactly like the inner type.
    Boxed(TypeRef),
    Sequence(TypeRef),
    /// A map with string keys.
    Map(TypeRef),
    Record(Vec<Field>),
    /// Any JSON value.
    Interface,
}

impl TypeInfo {
    pub fn new(module: &'static str, ident: &'static str, shape: Shape) -> Self {
        TypeInfo {
            module,
            ident,
            shape,
        }
    }

    /// A struct serialized as a JSON object. Pass `module_path!()` as `module`.
    pub fn record(module: &'static str, ident: &'static str, fields: Vec<Field>) -> Self {
        TypeInfo::new(module, ident, Shape::Record(fields))
    }

    /// An open type accepting any JSON value.
    pub fn interface(module: &'static str, ident: &'static str) -> Self {
        TypeInfo::new(module, ident, Shape::Interface)
    }

    pub fn of<T: Describe + ?Sized>() -> Self {
        T::describe()
    }

    pub fn module(&self) -> &'static str {
        self.module
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// `module::ident`, before any name filter.
    pub fn path(&self) -> String {
        if self.module.is_empty() {
            self.ident.to_string()
        } else {
            format!("{}::{}", self.module, self.ident)
        }
    }

    /// Looks through `Boxed` layers.
    fn unboxed(&self) -> TypeInfo {
        let mut info = self.clone();
        while let Shape::Boxed(inner) = info.shape {
            info = inner();
        }
        info
    }
}

/// One field of a record.
#[derive(Debug, Clone)]
pub struct Field {
    ident: &'static str,
    ty: TypeRef,
    rename: Option<&'static str>,
    required: bool,
    skip: bool,
    private: bool,
    flatten: bool,
    as_string: bool,
}

impl Field {
    pub fn of<T: Describe + ?Sized>(ident: &'static str) -> Self {
        Field {
            ident,
            ty: T::describe,
            rename: None,
            required: false,
            skip: false,
            private: false,
            flatten: false,
            as_string: false,
        }
    }

    /// Serialized name, like `#[serde(rename = "...")]`.
    pub fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    /// Lists the field in `required` and removes `null` from its type.
    ///
    /// JSON Schema keeps "must be present" and "may be null" separate; a required
    /// field here means both present and non-null.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Leaves the field out, like `#[serde(skip)]`.
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Marks the field as not part of the public shape. Private fields are
    /// skipped unless flattened.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    /// Promotes the fields of an embedded record, like `#[serde(flatten)]`.
    pub fn flatten(mut self) -> Self {
        self.flatten = true;
        self
    }

    /// The value is written as a JSON string, like `serde_with::DisplayFromStr`.
    pub fn as_string(mut self) -> Self {
        self.as_string = true;
        self
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn serialized_name(&self) -> &'static str {
        self.rename.unwrap_or(self.ident)
    }
}

/// Rewrites a raw `module::Ident` path into a canonical name.
pub type NameFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// The default name filter: `::` and `/` become `.`, `-` becomes `_`.
pub fn default_name_filter(path: &str) -> String {
    path.replace("::", ".").replace('/', ".").replace('-', "_")
}

/// Options for a [`Deriver`].
#[derive(Clone, Default)]
pub struct DeriveOptions {
    /// Whether maps derive with `null` in their type.
    pub nullable_maps: bool,
    /// Whether sequences derive with `null` in their type.
    pub nullable_sequences: bool,
    filters: Vec<NameFilter>,
}

impl DeriveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nullable_maps(mut self, nullable: bool) -> Self {
        self.nullable_maps = nullable;
        self
    }

    pub fn nullable_sequences(mut self, nullable: bool) -> Self {
        self.nullable_sequences = nullable;
        self
    }

    /// Adds a filter applied after the default one and any added earlier.
    pub fn name_filter(mut self, filter: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }
}

impl fmt::Debug for DeriveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveOptions")
            .field("nullable_maps", &self.nullable_maps)
            .field("nullable_sequences", &self.nullable_sequences)
            .field("filters", &self.filters.len())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    schema: Schema,
    /// False while the record's fields are still being walked.
    complete: bool,
}

/// Derives schemas and owns the named-schema cache they share.
///
/// One deriver is one naming universe: schemas derived through it reference each
/// other by canonical name, and [`Deriver::cache`] holds exactly one definition
/// per name. `Deriver` is `Send + Sync`; concurrent derivations share the cache.
#[derive(Debug, Default)]
pub struct Deriver {
    options: DeriveOptions,
    cache: RwLock<BTreeMap<String, CacheEntry>>,
}

impl Deriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DeriveOptions) -> Self {
        Deriver {
            options,
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn options(&self) -> &DeriveOptions {
        &self.options
    }

    /// Derives the schema of `T`.
    ///
    /// A record yields its full definition with the canonical name attached;
    /// records nested anywhere inside it are references.
    pub fn derive<T: Describe + ?Sized>(&self) -> Result<Schema, UsageError> {
        self.derive_info(&T::describe())
    }

    pub fn derive_info(&self, info: &TypeInfo) -> Result<Schema, UsageError> {
        self.schema_for(info, true)
    }

    /// A `$ref` to `T`'s definition, deriving it first if needed.
    pub fn reference_for<T: Describe + ?Sized>(&self) -> Result<Schema, UsageError> {
        let info = T::describe().unboxed();
        if !matches!(info.shape, Shape::Record(_)) {
            return Err(UsageError::NotAnObject {
                type_name: info.path(),
            });
        }
        let schema = self.derive_info(&info)?;
        let name = schema.name().map(str::to_string).unwrap_or_else(|| self.canonical_name(&info));
        Ok(Schema::reference_to(&name))
    }

    /// The canonical name of a type under this deriver's filters.
    pub fn canonical_name(&self, info: &TypeInfo) -> String {
        let mut name = default_name_filter(&info.path());
        for filter in &self.options.filters {
            name = filter(&name);
        }
        name
    }

    /// A snapshot of every completed definition, keyed by canonical name.
    pub fn cache(&self) -> BTreeMap<String, Schema> {
        self.cache
            .read()
            .iter()
            .filter(|(_, entry)| entry.complete)
            .map(|(name, entry)| (name.clone(), entry.schema.clone()))
            .collect()
    }

    /// The completed definition cached under `name`.
    pub fn get(&self, name: &str) -> Option<Schema> {
        self.cache
            .read()
            .get(name)
            .filter(|entry| entry.complete)
            .map(|entry| entry.schema.clone())
    }

    /// `{"components": {"schemas": {...}}}` holding every cached definition, a
    /// root document for validating derived schemas that contain references.
    pub fn definitions(&self) -> Value {
        let schemas: Map<String, Value> = self
            .cache()
            .into_iter()
            .map(|(name, schema)| {
                // Schemas hold only string-keyed maps and finite numbers.
                let value = serde_json::to_value(schema).expect("derived schemas always serialize");
                (name, value)
            })
            .collect();
        let mut components = Map::new();
        components.insert("schemas".to_string(), Value::Object(schemas));
        let mut root = Map::new();
        root.insert("components".to_string(), Value::Object(components));
        Value::Object(root)
    }

    fn schema_for(&self, info: &TypeInfo, top: bool) -> Result<Schema, UsageError> {
        match &info.shape {
            Shape::Boolean => Ok(Schema::typed(Type::BOOLEAN)),
            Shape::Integer { .. } | Shape::Float { .. } => {
                let t = if matches!(info.shape, Shape::Float { .. }) {
                    Type::NUMBER
                } else {
                    Type::INTEGER
                };
                let mut schema = Schema::typed(t);
                schema.validation.format = canonical_format(&info.shape).map(str::to_string);
                Ok(schema)
            }
            Shape::String => Ok(Schema::typed(Type::STRING)),
            Shape::Optional(inner) => Ok(self.schema_for(&inner(), top)?.nullable()),
            Shape::Boxed(inner) => self.schema_for(&inner(), top),
            Shape::Sequence(element) => {
                let mut schema = Schema::typed(Type::ARRAY);
                schema.array.items = Some(Box::new(BoolOrSchema::from(
                    self.schema_for(&element(), false)?,
                )));
                Ok(if self.options.nullable_sequences {
                    schema.nullable()
                } else {
                    schema
                })
            }
            Shape::Map(value) => {
                let mut schema = Schema::typed(Type::OBJECT);
                schema.object.additional_properties = Some(Box::new(BoolOrSchema::from(
                    self.schema_for(&value(), false)?,
                )));
                Ok(if self.options.nullable_maps {
                    schema.nullable()
                } else {
                    schema
                })
            }
            Shape::Interface => Ok(self.interface(info)),
            Shape::Record(fields) => self.record(info, fields, top),
        }
    }

    fn interface(&self, info: &TypeInfo) -> Schema {
        let name = self.canonical_name(info);
        if let Some(entry) = self.cache.read().get(&name) {
            return entry.schema.clone();
        }
        let mut cache = self.cache.write();
        let entry = cache.entry(name.clone()).or_insert_with(|| {
            debug!(name = %name, "caching interface schema");
            CacheEntry {
                schema: Schema::any().with_name(name.clone()),
                complete: true,
            }
        });
        entry.schema.clone()
    }

    fn record(&self, info: &TypeInfo, fields: &[Field], top: bool) -> Result<Schema, UsageError> {
        let name = self.canonical_name(info);
        {
            let mut cache = self.cache.write();
            if let Some(entry) = cache.get(&name) {
                debug!(name = %name, complete = entry.complete, "schema cache hit");
                return Ok(if top && entry.complete {
                    entry.schema.clone()
                } else {
                    Schema::reference_to(&name)
                });
            }
            debug!(name = %name, "registering schema placeholder");
            cache.insert(
                name.clone(),
                CacheEntry {
                    schema: Schema::typed(Type::OBJECT).with_name(name.clone()),
                    complete: false,
                },
            );
        }

        let mut properties = IndexMap::new();
        let mut required = Vec::new();
        if let Err(e) = self.walk_fields(info, fields, &mut properties, &mut required) {
            self.cache.write().remove(&name);
            return Err(e);
        }

        let mut cache = self.cache.write();
        let entry = cache.entry(name.clone()).or_insert_with(|| CacheEntry {
            schema: Schema::typed(Type::OBJECT).with_name(name.clone()),
            complete: false,
        });
        entry.schema.object.properties = properties
            .into_iter()
            .map(|(name, schema)| (name, BoolOrSchema::from(schema)))
            .collect();
        entry.schema.object.required = required;
        entry.complete = true;

        Ok(if top {
            entry.schema.clone()
        } else {
            Schema::reference_to(&name)
        })
    }

    fn walk_fields(
        &self,
        info: &TypeInfo,
        fields: &[Field],
        properties: &mut IndexMap<String, Schema>,
        required: &mut Vec<String>,
    ) -> Result<(), UsageError> {
        for field in fields {
            if field.flatten {
                self.promote(info, field, properties, required)?;
                continue;
            }
            if field.private || field.skip {
                continue;
            }
            let name = field.serialized_name();
            if properties.contains_key(name) {
                return Err(UsageError::FieldConflict {
                    record: info.path(),
                    field: name.to_string(),
                });
            }
            let ty = (field.ty)();
            let mut schema = if field.as_string {
                self.string_encoded(&ty)?
            } else {
                self.schema_for(&ty, false)?
            };
            if field.required {
                if !required.iter().any(|r| r == name) {
                    required.push(name.to_string());
                }
                schema = schema.strip_null();
            }
            properties.insert(name.to_string(), schema);
        }
        Ok(())
    }

    /// Merges an embedded record's properties into the parent.
    fn promote(
        &self,
        parent: &TypeInfo,
        field: &Field,
        properties: &mut IndexMap<String, Schema>,
        required: &mut Vec<String>,
    ) -> Result<(), UsageError> {
        let mut embedded = (field.ty)().unboxed();
        if let Shape::Optional(inner) = embedded.shape {
            embedded = inner().unboxed();
        }
        let Shape::Record(fields) = &embedded.shape else {
            return Err(UsageError::NotAnObject {
                type_name: embedded.path(),
            });
        };

        let mut promoted = IndexMap::new();
        let mut promoted_required = Vec::new();
        self.walk_fields(&embedded, fields, &mut promoted, &mut promoted_required)?;
        for (name, schema) in promoted {
            if properties.contains_key(&name) {
                return Err(UsageError::PromotedFieldConflict {
                    record: parent.path(),
                    field: name,
                });
            }
            properties.insert(name, schema);
        }
        for name in promoted_required {
            if !required.contains(&name) {
                required.push(name);
            }
        }
        Ok(())
    }

    /// A scalar written as a JSON string, formatted with the Rust type's name.
    fn string_encoded(&self, info: &TypeInfo) -> Result<Schema, UsageError> {
        let info = info.unboxed();
        match &info.shape {
            Shape::String => Ok(Schema::typed(Type::STRING)),
            Shape::Boolean | Shape::Integer { .. } | Shape::Float { .. } => {
                let mut schema = Schema::typed(Type::STRING);
                schema.validation.format = Some(string_format(&info.shape));
                Ok(schema)
            }
            _ => self.schema_for(&info, false),
        }
    }
}

/// The OpenAPI format for 32- and 64-bit numbers. Narrower widths get none.
fn canonical_format(shape: &Shape) -> Option<&'static str> {
    match shape {
        Shape::Integer {
            bits: Some(32),
            signed: true,
        } => Some(format::INT32),
        Shape::Integer {
            bits: Some(64),
            signed: true,
        } => Some(format::INT64),
        Shape::Float { bits: 32 } => Some(format::FLOAT),
        Shape::Float { bits: 64 } => Some(format::DOUBLE),
        _ => None,
    }
}

/// The canonical format if there is one, else the Rust type's name.
fn string_format(shape: &Shape) -> String {
    if let Some(format) = canonical_format(shape) {
        return format.to_string();
    }
    match shape {
        Shape::Boolean => "bool".to_string(),
        Shape::Integer { bits, signed } => {
            let prefix = if *signed { "int" } else { "uint" };
            match bits {
                Some(bits) => format!("{prefix}{bits}"),
                None => prefix.to_string(),
            }
        }
        Shape::Float { bits } => format!("float{bits}"),
        _ => String::new(),
    }
}

macro_rules! describe_integers {
    ($($t:ty => $bits:expr, $signed:expr;)+) => {
        $(
            impl Describe for $t {
                fn describe() -> TypeInfo {
                    TypeInfo::new("", stringify!($t), Shape::Integer { bits: $bits, signed: $signed })
                }
            }
        )+
    };
}

describe_integers! {
    i8 => Some(8), true;
    i16 => Some(16), true;
    i32 => Some(32), true;
    i64 => Some(64), true;
    i128 => Some(128), true;
    isize => None, true;
    u8 => Some(8), false;
    u16 => Some(16), false;
    u32 => Some(32), false;
    u64 => Some(64), false;
    u128 => Some(128), false;
    usize => None, false;
}

impl Describe for bool {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "bool", Shape::Boolean)
    }
}

impl Describe for f32 {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "f32", Shape::Float { bits: 32 })
    }
}

impl Describe for f64 {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "f64", Shape::Float { bits: 64 })
    }
}

impl Describe for String {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "String", Shape::String)
    }
}

impl Describe for str {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "str", Shape::String)
    }
}

impl Describe for char {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "char", Shape::String)
    }
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "&", Shape::Boxed(T::describe))
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("core::option", "Option", Shape::Optional(T::describe))
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::boxed", "Box", Shape::Boxed(T::describe))
    }
}

impl<T: Describe + ?Sized> Describe for Arc<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::sync", "Arc", Shape::Boxed(T::describe))
    }
}

impl<T: Describe + ?Sized> Describe for Rc<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::rc", "Rc", Shape::Boxed(T::describe))
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::vec", "Vec", Shape::Sequence(T::describe))
    }
}

impl<T: Describe> Describe for VecDeque<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::collections", "VecDeque", Shape::Sequence(T::describe))
    }
}

impl<T: Describe> Describe for [T] {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "slice", Shape::Sequence(T::describe))
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeInfo {
        TypeInfo::new("", "array", Shape::Sequence(T::describe))
    }
}

impl<T: Describe, S> Describe for HashSet<T, S> {
    fn describe() -> TypeInfo {
        TypeInfo::new("std::collections", "HashSet", Shape::Sequence(T::describe))
    }
}

impl<T: Describe> Describe for BTreeSet<T> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::collections", "BTreeSet", Shape::Sequence(T::describe))
    }
}

impl<V: Describe, S> Describe for HashMap<String, V, S> {
    fn describe() -> TypeInfo {
        TypeInfo::new("std::collections", "HashMap", Shape::Map(V::describe))
    }
}

impl<V: Describe> Describe for BTreeMap<String, V> {
    fn describe() -> TypeInfo {
        TypeInfo::new("alloc::collections", "BTreeMap", Shape::Map(V::describe))
    }
}

impl<V: Describe, S> Describe for IndexMap<String, V, S> {
    fn describe() -> TypeInfo {
        TypeInfo::new("indexmap", "IndexMap", Shape::Map(V::describe))
    }
}

impl Describe for Map<String, Value> {
    fn describe() -> TypeInfo {
        TypeInfo::new("serde_json", "Map", Shape::Map(Value::describe))
    }
}

impl Describe for Value {
    fn describe() -> TypeInfo {
        TypeInfo::interface("serde_json", "Value")
    }
}
