//! Components closure: hoists derived object schemas out of operations and copies
//! exactly the cached definitions the document reaches into `components.schemas`.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use tracing::debug;

use crate::derive::Deriver;
use crate::document::{Header, MediaType, OpenApi, Operation, Parameter, PathItem};
use crate::reference::{component_schema_name, Reference, ValueOrReference};
use crate::schema::Schema;
use crate::types::Type;

impl OpenApi {
    /// Sweeps every schema slot under `paths` and `webhooks`, then adds the
    /// transitively referenced entries of `cache` to `components.schemas`.
    ///
    /// Inline object schemas that carry a canonical name, either in the slot
    /// itself or at the end of an `items` chain, are replaced by a reference to
    /// that name. Cached entries the document never reaches are left out.
    /// Existing `components.schemas` entries are kept; a needed cached entry
    /// replaces an existing one of the same name.
    pub fn collect_referenced_components(&mut self, cache: &BTreeMap<String, Schema>) {
        let mut sweep = Sweep::default();
        for item in self.paths.values_mut().chain(self.webhooks.values_mut()) {
            sweep.path_item(item);
        }

        let needed = sweep.close(cache);
        for name in &needed {
            let definition = cache.get(name).or_else(|| sweep.hoisted.get(name));
            if let Some(schema) = definition {
                debug!(name = %name, "adding component schema");
                self.components.schemas.insert(name.clone(), schema.clone());
            }
        }
        for name in cache.keys().filter(|name| !needed.contains(*name)) {
            debug!(name = %name, "dropping unreferenced definition");
        }
    }

    /// [`collect_referenced_components`](Self::collect_referenced_components)
    /// over the completed definitions of `deriver`.
    pub fn with_schema_definitions(mut self, deriver: &Deriver) -> Self {
        self.collect_referenced_components(&deriver.cache());
        self
    }
}

#[derive(Default)]
struct Sweep {
    needed: BTreeSet<String>,
    hoisted: BTreeMap<String, Schema>,
}

/// The canonical name of a schema that can stand as a component on its own.
fn hoistable(schema: &Schema) -> Option<String> {
    let t = schema.declared_type();
    if schema.ref_target().is_some() || !t.has(&[Type::OBJECT]) || t.has(&[Type::NULL]) {
        return None;
    }
    schema.name().map(str::to_string)
}

impl Sweep {
    fn path_item(&mut self, item: &mut PathItem) {
        for parameter in &mut item.parameters {
            self.parameter(parameter);
        }
        for (_, operation) in item.operations_mut() {
            self.operation(operation);
        }
    }

    fn operation(&mut self, operation: &mut Operation) {
        for parameter in &mut operation.parameters {
            self.parameter(parameter);
        }
        if let Some(body) = operation.request_body.as_mut().and_then(ValueOrReference::as_inline_mut) {
            for media in body.content.values_mut() {
                self.media_type(media);
            }
        }
        for (_, response) in operation.responses.iter_mut() {
            let Some(response) = response.as_inline_mut() else {
                continue;
            };
            for header in response.headers.values_mut() {
                self.header(header);
            }
            for media in response.content.values_mut() {
                self.media_type(media);
            }
        }
        for callback in operation.callbacks.values_mut() {
            if let Some(callback) = callback.as_inline_mut() {
                for item in callback.values_mut() {
                    self.path_item(item);
                }
            }
        }
    }

    fn parameter(&mut self, parameter: &mut ValueOrReference<Parameter>) {
        let Some(parameter) = parameter.as_inline_mut() else {
            return;
        };
        if let Some(slot) = parameter.schema.as_mut() {
            self.slot(slot);
        }
        for media in parameter.content.values_mut() {
            self.media_type(media);
        }
    }

    fn header(&mut self, header: &mut ValueOrReference<Header>) {
        let Some(header) = header.as_inline_mut() else {
            return;
        };
        if let Some(slot) = header.schema.as_mut() {
            self.slot(slot);
        }
        for media in header.content.values_mut() {
            self.media_type(media);
        }
    }

    fn media_type(&mut self, media: &mut MediaType) {
        if let Some(slot) = media.schema.as_mut() {
            self.slot(slot);
        }
        for encoding in media.encoding.values_mut() {
            for header in encoding.headers.values_mut() {
                self.header(header);
            }
        }
    }

    fn slot(&mut self, slot: &mut ValueOrReference<Schema>) {
        let schema = match slot {
            ValueOrReference::Reference(reference) => {
                if let Some(name) = reference.schema_name() {
                    self.needed.insert(name);
                }
                return;
            }
            ValueOrReference::Inline(schema) => schema,
        };
        if let Some(name) = hoistable(schema) {
            let schema = mem::take(schema);
            self.hoist(&name, schema);
            *slot = ValueOrReference::Reference(Reference::to_schema(&name));
            return;
        }
        self.unwrap_items(schema);
        self.record_references(schema);
    }

    /// Follows `items` through nested arrays and hoists a named object at the end.
    fn unwrap_items(&mut self, schema: &mut Schema) {
        if !schema.declared_type().has(&[Type::ARRAY]) {
            return;
        }
        let Some(items) = schema.array.items_schema_mut() else {
            return;
        };
        match hoistable(items) {
            Some(name) => {
                let definition = mem::take(items);
                self.hoist(&name, definition);
                *items = Schema::reference_to(&name);
            }
            None => self.unwrap_items(items),
        }
    }

    fn hoist(&mut self, name: &str, schema: Schema) {
        debug!(name, "hoisting inline schema");
        self.needed.insert(name.to_string());
        self.hoisted.entry(name.to_string()).or_insert(schema);
    }

    fn record_references(&mut self, schema: &Schema) {
        self.needed.extend(
            schema
                .references()
                .into_iter()
                .filter_map(component_schema_name),
        );
    }

    /// Closes the needed names over the references inside each definition.
    fn close(&self, cache: &BTreeMap<String, Schema>) -> BTreeSet<String> {
        let mut needed = self.needed.clone();
        let mut queue: Vec<String> = needed.iter().cloned().collect();
        while let Some(name) = queue.pop() {
            let Some(definition) = cache.get(&name).or_else(|| self.hoisted.get(&name)) else {
                continue;
            };
            for target in definition.references() {
                if let Some(next) = component_schema_name(target) {
                    if needed.insert(next.clone()) {
                        queue.push(next);
                    }
                }
            }
        }
        needed
    }
}
