//! OpenAPI 3.1 document records.
//!
//! Plain data: every record round-trips through serde with its `x-` extensions
//! preserved. Schema slots are [`ValueOrReference<Schema>`] so the components
//! closure can hoist inline definitions.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ResolveError, UsageError};
use crate::keyword::present;
use crate::reference::ValueOrReference;
use crate::schema::Schema;

/// The `openapi` version written by [`OpenApi::new`].
pub const OPENAPI_VERSION: &str = "3.1.0";

fn is_false(b: &bool) -> bool {
    !*b
}

fn component_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("component key regex must compile"))
}

fn response_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[1-5][0-9X]{2}$").expect("response key regex must compile"))
}

/// Whether `key` may name an entry of any `components` map.
pub fn is_valid_component_key(key: &str) -> bool {
    component_key_re().is_match(key)
}

/// Whether `key` may name an entry of a `responses` map.
pub fn is_valid_response_key(key: &str) -> bool {
    key == "default" || response_key_re().is_match(key)
}

/// The root of an OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApi {
    pub openapi: String,

    pub info: Info,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl OpenApi {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        OpenApi {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info::new(title, version),
            json_schema_dialect: None,
            servers: Vec::new(),
            paths: IndexMap::new(),
            webhooks: IndexMap::new(),
            components: Components::default(),
            security: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            extensions: Map::new(),
        }
    }

    /// The path item at `path`, created empty if missing.
    pub fn path(&mut self, path: impl Into<String>) -> &mut PathItem {
        self.paths.entry(path.into()).or_default()
    }

    /// The webhook at `name`, created empty if missing.
    pub fn webhook(&mut self, name: impl Into<String>) -> &mut PathItem {
        self.webhooks.entry(name.into()).or_default()
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Resolves a slot of this document, using the document itself as the root.
    pub fn resolve<T: Clone + DeserializeOwned>(
        &self,
        slot: &ValueOrReference<T>,
    ) -> Result<T, ResolveError> {
        match slot {
            ValueOrReference::Inline(value) => Ok(value.clone()),
            ValueOrReference::Reference(reference) => {
                let root = self.to_value().map_err(|source| ResolveError::Decode {
                    reference: reference.uri().to_string(),
                    source,
                })?;
                reference.resolve(&root)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    pub version: String,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Info {
            title: title.into(),
            version: version.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,

    /// An SPDX expression. Mutually exclusive with `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_: Vec<String>,

    pub default: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Reusable objects. `schemas` is filled by the components closure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, ValueOrReference<Response>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, ValueOrReference<Parameter>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ValueOrReference<Example>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, ValueOrReference<RequestBody>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, ValueOrReference<Header>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, ValueOrReference<SecurityScheme>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, ValueOrReference<Link>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, ValueOrReference<Callback>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub path_items: IndexMap<String, ValueOrReference<PathItem>>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
            && self.responses.is_empty()
            && self.parameters.is_empty()
            && self.examples.is_empty()
            && self.request_bodies.is_empty()
            && self.headers.is_empty()
            && self.security_schemes.is_empty()
            && self.links.is_empty()
            && self.callbacks.is_empty()
            && self.path_items.is_empty()
            && self.extensions.is_empty()
    }

    /// Adds a schema under a key matching `^[A-Za-z0-9._-]+$`.
    pub fn insert_schema(&mut self, key: impl Into<String>, schema: Schema) -> Result<(), UsageError> {
        let key = key.into();
        if !is_valid_component_key(&key) {
            return Err(UsageError::InvalidComponentKey { key });
        }
        self.schemas.insert(key, schema);
        Ok(())
    }

    /// Every map key, tagged with the map it belongs to.
    pub fn keys(&self) -> impl Iterator<Item = (&'static str, &str)> {
        fn tagged<'a, V>(
            section: &'static str,
            map: &'a IndexMap<String, V>,
        ) -> impl Iterator<Item = (&'static str, &'a str)> {
            map.keys().map(move |k| (section, k.as_str()))
        }
        tagged("schemas", &self.schemas)
            .chain(tagged("responses", &self.responses))
            .chain(tagged("parameters", &self.parameters))
            .chain(tagged("examples", &self.examples))
            .chain(tagged("requestBodies", &self.request_bodies))
            .chain(tagged("headers", &self.headers))
            .chain(tagged("securitySchemes", &self.security_schemes))
            .chain(tagged("links", &self.links))
            .chain(tagged("callbacks", &self.callbacks))
            .chain(tagged("pathItems", &self.path_items))
    }
}

/// An HTTP method a path item can hold an operation for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl Method {
    pub const ALL: [Method; 8] = [
        Method::Get,
        Method::Put,
        Method::Post,
        Method::Delete,
        Method::Options,
        Method::Head,
        Method::Patch,
        Method::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Post => "post",
            Method::Delete => "delete",
            Method::Options => "options",
            Method::Head => "head",
            Method::Patch => "patch",
            Method::Trace => "trace",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = UsageError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| UsageError::InvalidHttpMethod {
                method: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathItem {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ValueOrReference<Parameter>>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl PathItem {
    fn slot(&self, method: Method) -> &Option<Operation> {
        match method {
            Method::Get => &self.get,
            Method::Put => &self.put,
            Method::Post => &self.post,
            Method::Delete => &self.delete,
            Method::Options => &self.options,
            Method::Head => &self.head,
            Method::Patch => &self.patch,
            Method::Trace => &self.trace,
        }
    }

    fn slot_mut(&mut self, method: Method) -> &mut Option<Operation> {
        match method {
            Method::Get => &mut self.get,
            Method::Put => &mut self.put,
            Method::Post => &mut self.post,
            Method::Delete => &mut self.delete,
            Method::Options => &mut self.options,
            Method::Head => &mut self.head,
            Method::Patch => &mut self.patch,
            Method::Trace => &mut self.trace,
        }
    }

    pub fn operation(&self, method: Method) -> Option<&Operation> {
        self.slot(method).as_ref()
    }

    /// The operations present, in method declaration order.
    pub fn operations(&self) -> impl Iterator<Item = (Method, &Operation)> {
        Method::ALL
            .into_iter()
            .filter_map(move |m| self.operation(m).map(|op| (m, op)))
    }

    /// Mutable access to every present operation.
    pub fn operations_mut(&mut self) -> impl Iterator<Item = (Method, &mut Operation)> {
        [
            (Method::Get, &mut self.get),
            (Method::Put, &mut self.put),
            (Method::Post, &mut self.post),
            (Method::Delete, &mut self.delete),
            (Method::Options, &mut self.options),
            (Method::Head, &mut self.head),
            (Method::Patch, &mut self.patch),
            (Method::Trace, &mut self.trace),
        ]
        .into_iter()
        .filter_map(|(m, slot)| slot.as_mut().map(|op| (m, op)))
    }

    /// Sets the operation for a method given by name, e.g. `"GET"` or `"patch"`.
    pub fn set_operation(&mut self, method: &str, operation: Operation) -> Result<(), UsageError> {
        let method: Method = method.parse()?;
        *self.slot_mut(method) = Some(operation);
        Ok(())
    }

    pub fn with_operation(mut self, method: Method, operation: Operation) -> Self {
        *self.slot_mut(method) = Some(operation);
        self
    }
}

/// Path items keyed by callback expression.
pub type Callback = IndexMap<String, PathItem>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Operation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ValueOrReference<Parameter>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<ValueOrReference<RequestBody>>,

    #[serde(skip_serializing_if = "Responses::is_empty")]
    pub responses: Responses,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, ValueOrReference<Callback>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// `Some(vec![])` removes document-level security for this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    pub fn parameter(mut self, parameter: impl Into<ValueOrReference<Parameter>>) -> Self {
        self.parameters.push(parameter.into());
        self
    }

    pub fn request_body(mut self, body: impl Into<ValueOrReference<RequestBody>>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// Adds a response; see [`Responses::insert`] for valid keys.
    pub fn response(
        mut self,
        status: &str,
        response: impl Into<ValueOrReference<Response>>,
    ) -> Result<Self, UsageError> {
        self.responses.insert(status, response.into())?;
        Ok(self)
    }
}

/// Responses keyed by `default` or a status pattern such as `200` or `4XX`.
///
/// `x-` keys are kept as extensions rather than decoded as responses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Responses {
    entries: IndexMap<String, ValueOrReference<Response>>,
    pub extensions: Map<String, Value>,
}

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: &str,
        response: ValueOrReference<Response>,
    ) -> Result<(), UsageError> {
        if !is_valid_response_key(key) {
            return Err(UsageError::InvalidResponseKey {
                key: key.to_string(),
            });
        }
        self.entries.insert(key.to_string(), response);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ValueOrReference<Response>> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueOrReference<Response>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ValueOrReference<Response>)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.extensions.is_empty()
    }
}

impl Serialize for Responses {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len() + self.extensions.len()))?;
        for (key, response) in &self.entries {
            map.serialize_entry(key, response)?;
        }
        for (key, value) in &self.extensions {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Responses {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut responses = Responses::default();
        for (key, value) in raw {
            if key.starts_with("x-") {
                responses.extensions.insert(key, value);
                continue;
            }
            let response = ValueOrReference::<Response>::deserialize(value)
                .map_err(|e| D::Error::custom(format!("response {key:?}: {e}")))?;
            responses.entries.insert(key, response);
        }
        Ok(responses)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, ValueOrReference<Header>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, ValueOrReference<Link>>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Response {
    pub fn new(description: impl Into<String>) -> Self {
        Response {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content.insert(media_type.into(), content);
        self
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Query,
    Header,
    Path,
    Cookie,
}

/// How a parameter value is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,

    #[serde(rename = "in")]
    pub location: Location,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Must be `true` for path parameters.
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,

    /// Exactly one of `schema` and `content` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ValueOrReference<Schema>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ValueOrReference<Example>>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Parameter {
            name: name.into(),
            location,
            description: None,
            required: location == Location::Path,
            deprecated: None,
            allow_empty_value: None,
            style: None,
            explode: None,
            allow_reserved: None,
            schema: None,
            content: IndexMap::new(),
            example: None,
            examples: IndexMap::new(),
            extensions: Map::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<ValueOrReference<Schema>>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<ValueOrReference<Schema>>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ValueOrReference<Example>>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub content: IndexMap<String, MediaType>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl RequestBody {
    pub fn new(media_type: impl Into<String>, content: MediaType) -> Self {
        let mut body = RequestBody::default();
        body.content.insert(media_type.into(), content);
        body
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<ValueOrReference<Schema>>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, ValueOrReference<Example>>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub encoding: IndexMap<String, Encoding>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl MediaType {
    pub fn new(schema: impl Into<ValueOrReference<Schema>>) -> Self {
        MediaType {
            schema: Some(schema.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Encoding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, ValueOrReference<Header>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Link {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Value>,

    #[serde(deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalDocumentation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecuritySchemeType {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "mutualTLS")]
    MutualTls,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub type_: SecuritySchemeType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Header, query or cookie parameter name for `apiKey`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    /// HTTP authorization scheme for `http`, e.g. `bearer`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuthFlow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,

    pub scopes: IndexMap<String, String>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Security scheme names mapped to required scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityRequirement(pub IndexMap<String, Vec<String>>);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Reference;
    use crate::types::Type;
    use serde_json::json;

    #[test]
    fn new_document_is_3_1() {
        let doc = OpenApi::new("Petstore", "1.0.0");
        assert_eq!(
            doc.to_value().unwrap(),
            json!({"openapi": "3.1.0", "info": {"title": "Petstore", "version": "1.0.0"}})
        );
    }

    #[test]
    fn methods_parse_case_insensitively() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert_eq!(
            "FETCH".parse::<Method>().unwrap_err(),
            UsageError::InvalidHttpMethod {
                method: "FETCH".into()
            }
        );
    }

    #[test]
    fn set_operation_by_name() {
        let mut item = PathItem::default();
        item.set_operation("post", Operation::new().operation_id("addPet"))
            .unwrap();
        assert!(item.set_operation("connect", Operation::new()).is_err());
        let ops: Vec<_> = item.operations().map(|(m, _)| m).collect();
        assert_eq!(ops, vec![Method::Post]);
    }

    #[test]
    fn component_keys_are_checked() {
        let mut components = Components::default();
        assert!(components.insert_schema("app.Pet_v2-1", Schema::default()).is_ok());
        assert_eq!(
            components.insert_schema("Pet Store", Schema::default()),
            Err(UsageError::InvalidComponentKey {
                key: "Pet Store".into()
            })
        );
    }

    #[test]
    fn response_keys_are_checked() {
        let mut responses = Responses::new();
        for key in ["200", "4XX", "default", "599"] {
            assert!(responses.insert(key, Response::new("ok").into()).is_ok(), "{key}");
        }
        for key in ["600", "20", "2xx", "other"] {
            assert!(responses.insert(key, Response::new("ok").into()).is_err(), "{key}");
        }
    }

    #[test]
    fn responses_keep_extensions_apart() {
        let responses: Responses = serde_json::from_value(json!({
            "200": {"description": "ok"},
            "x-rate-limited": true
        }))
        .unwrap();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses.extensions["x-rate-limited"], json!(true));
        assert_eq!(
            serde_json::to_value(&responses).unwrap(),
            json!({"200": {"description": "ok"}, "x-rate-limited": true})
        );
    }

    #[test]
    fn round_trip_preserves_extensions() {
        let wire = json!({
            "openapi": "3.1.0",
            "info": {"title": "t", "version": "1", "x-logo": "logo.png"},
            "paths": {
                "/pets/{id}": {
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}}],
                    "get": {
                        "responses": {
                            "200": {
                                "description": "a pet",
                                "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}
                            }
                        }
                    }
                }
            },
            "components": {"schemas": {"Pet": {"type": "object"}}},
            "x-owner": "pets-team"
        });
        let doc: OpenApi = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(doc.to_value().unwrap(), wire);
    }

    #[test]
    fn resolve_uses_the_document_as_root() {
        let mut doc = OpenApi::new("t", "1");
        doc.components
            .insert_schema("Pet", Schema::typed(Type::OBJECT))
            .unwrap();
        let slot = ValueOrReference::<Schema>::Reference(Reference::to_schema("Pet"));
        assert_eq!(doc.resolve(&slot).unwrap().declared_type(), Type::OBJECT);
    }

    #[test]
    fn path_parameters_default_to_required() {
        assert!(Parameter::new("id", Location::Path).required);
        assert!(!Parameter::new("limit", Location::Query).required);
    }
}
