//! JSON Schema 2020-12 vocabulary, split into independently pluggable keyword groups.
//!
//! Each group owns only the fields of its vocabulary slice and is flattened into
//! [`Schema`](crate::Schema) on the wire. A group is *active* when at least one of
//! its fields is present; presence is tracked per field with `Option` and
//! non-empty collections, so `minimum: 0` is an active constraint.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use parking_lot::RwLock;
use regex::{Regex, RegexBuilder};
use tracing::debug;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ValidationError;
use crate::schema::Scope;
use crate::types::{Kind, Type};

mod applicator;
mod array;
mod content;
mod meta_schema;
mod metadata;
mod numeric;
mod oas;
mod object;
mod reference;
mod string;
mod unevaluated;
mod validation;

pub use self::applicator::Applicator;
pub use self::array::ArrayConstraints;
pub use self::content::Content;
pub use self::meta_schema::MetaSchema;
pub use self::metadata::MetaData;
pub use self::numeric::NumericConstraints;
pub use self::oas::{Discriminator, OasAnnotations, Xml};
pub use self::object::ObjectConstraints;
pub use self::reference::{resolve_schema, Referencing};
pub use self::string::StringConstraints;
pub use self::unevaluated::Unevaluated;
pub use self::validation::Validation;

/// One keyword group of the vocabulary.
pub trait Keyword {
    fn group(&self) -> Group;

    fn kind(&self) -> Kind;

    /// Whether the group constrains values of kind `t`.
    fn applies_to(&self, t: Type) -> bool {
        let _ = t;
        true
    }

    /// Whether any field of the group is present.
    fn is_active(&self) -> bool;

    /// Checks `value` against the group's keywords. Annotation-only groups accept
    /// everything.
    fn validate(&self, value: &Value, scope: &Scope<'_>) -> Result<(), ValidationError> {
        let _ = (value, scope);
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.group().name()
    }
}

/// Identifies a keyword group, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Group {
    MetaSchema,
    Reference,
    MetaData,
    Validation,
    String,
    Numeric,
    Object,
    Array,
    Unevaluated,
    Applicator,
    Content,
    Oas,
}

impl Group {
    pub const ALL: [Group; 12] = [
        Group::MetaSchema,
        Group::Reference,
        Group::MetaData,
        Group::Validation,
        Group::String,
        Group::Numeric,
        Group::Object,
        Group::Array,
        Group::Unevaluated,
        Group::Applicator,
        Group::Content,
        Group::Oas,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Group::MetaSchema => "meta-schema",
            Group::Reference => "reference",
            Group::MetaData => "meta-data",
            Group::Validation => "validation",
            Group::String => "string",
            Group::Numeric => "numeric",
            Group::Object => "object",
            Group::Array => "array",
            Group::Unevaluated => "unevaluated",
            Group::Applicator => "applicator",
            Group::Content => "content",
            Group::Oas => "oas",
        }
    }

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The set of groups active on one schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeywordSet(u16);

impl KeywordSet {
    pub fn insert(&mut self, group: Group) {
        self.0 |= group.bit();
    }

    pub fn contains(self, group: Group) -> bool {
        self.0 & group.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Group> {
        Group::ALL.into_iter().filter(move |g| self.contains(*g))
    }
}

impl FromIterator<Group> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        let mut set = KeywordSet::default();
        for group in iter {
            set.insert(group);
        }
        set
    }
}

/// Deserializes a present field as `Some`, including an explicit `null`.
pub(crate) fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// Distinct patterns kept compiled at once. Reaching it empties the cache.
pub(crate) const PATTERN_CACHE_LIMIT: usize = 256;

/// Upper bound on the compiled size of a single pattern, in bytes.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

struct PatternCache {
    limit: usize,
    patterns: RwLock<HashMap<String, Regex>>,
}

impl PatternCache {
    fn new(limit: usize) -> Self {
        PatternCache {
            limit,
            patterns: RwLock::new(HashMap::new()),
        }
    }

    fn get_or_compile(&self, pattern: &str) -> Result<Regex, ValidationError> {
        if let Some(re) = self.patterns.read().get(pattern) {
            return Ok(re.clone());
        }
        let re = RegexBuilder::new(pattern)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .map_err(|source| ValidationError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        let mut patterns = self.patterns.write();
        if patterns.len() >= self.limit {
            debug!(limit = self.limit, "pattern cache full, clearing");
            patterns.clear();
        }
        patterns.insert(pattern.to_string(), re.clone());
        Ok(re)
    }

    fn len(&self) -> usize {
        self.patterns.read().len()
    }
}

/// Compiles `pattern`, reusing recent compilations process-wide.
///
/// Patterns are searched, not anchored. The `regex` dialect has no lookaround or
/// backreferences; such patterns fail to compile.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, ValidationError> {
    static CACHE: OnceLock<PatternCache> = OnceLock::new();
    CACHE
        .get_or_init(|| PatternCache::new(PATTERN_CACHE_LIMIT))
        .get_or_compile(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_set_iterates_in_dispatch_order() {
        let set: KeywordSet = [Group::Applicator, Group::Validation, Group::MetaSchema]
            .into_iter()
            .collect();
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Group::MetaSchema, Group::Validation, Group::Applicator]
        );
        assert_eq!(set.len(), 3);
        assert!(!set.contains(Group::Oas));
        assert!(KeywordSet::default().is_empty());
    }

    #[test]
    fn pattern_cache_reports_compile_errors() {
        assert!(compile_pattern("^[a-z]+$").unwrap().is_match("abc"));
        let err = compile_pattern("(?=x)").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPattern { .. }));
        assert!(err.is_usage());
    }

    #[test]
    fn pattern_cache_stays_bounded() {
        let cache = PatternCache::new(4);
        for i in 0..10 {
            assert!(cache.get_or_compile(&format!("^a{{{i}}}$")).is_ok());
            assert!(cache.len() <= 4);
        }
        assert!(cache.get_or_compile("^a{9}$").unwrap().is_match("aaaaaaaaa"));
    }

    #[test]
    fn oversized_patterns_are_rejected() {
        let err = compile_pattern("(a{1000}){1000}").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPattern { .. }));
    }
}
