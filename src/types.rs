//! Core vocabulary types: JSON value kinds, keyword kinds and formats.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::flag::flag_set;

flag_set! {
    /// The JSON value kinds a schema's `type` keyword accepts.
    ///
    /// The zero value means "unset" (any kind accepted), not "matches nothing".
    pub struct Type {
        const NULL = 0;
        const INTEGER = 1;
        const NUMBER = 2;
        const STRING = 3;
        const BOOLEAN = 4;
        const OBJECT = 5;
        const ARRAY = 6;
    }
}

flag_set! {
    /// The category a keyword group belongs to.
    pub struct Kind {
        /// Controls schema identification and base URI.
        const IDENTIFIER = 0;
        /// Reserves a location without affecting results.
        const RESERVED_LOCATION = 1;
        /// Applies subschemas to the instance and combines their results.
        const APPLICATOR = 2;
        /// Attaches information for application use.
        const ANNOTATION = 3;
        /// Produces a boolean result for an instance.
        const ASSERTION = 4;
    }
}

impl Type {
    /// Every JSON value kind.
    pub const ANY: Type = Type::from_bits(0b111_1111);

    const NAMES: &'static [(Type, &'static str)] = &[
        (Type::NULL, "null"),
        (Type::INTEGER, "integer"),
        (Type::NUMBER, "number"),
        (Type::STRING, "string"),
        (Type::BOOLEAN, "boolean"),
        (Type::OBJECT, "object"),
        (Type::ARRAY, "array"),
    ];

    /// The wire name of this exact bit pattern, if it has one.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, name)| *name)
    }

    /// Parses a single wire name.
    pub fn parse(name: &str) -> Option<Type> {
        Self::NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(t, _)| *t)
    }

    /// The kind of a JSON value.
    ///
    /// Numbers with no fractional part are both `integer` and `number`, so they
    /// satisfy either declaration under [`Type::has`].
    pub fn of(value: &Value) -> Type {
        match value {
            Value::Null => Type::NULL,
            Value::Bool(_) => Type::BOOLEAN,
            Value::Number(n) => {
                if n.is_i64() || n.is_u64() || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
                {
                    Type::INTEGER | Type::NUMBER
                } else {
                    Type::NUMBER
                }
            }
            Value::String(_) => Type::STRING,
            Value::Array(_) => Type::ARRAY,
            Value::Object(_) => Type::OBJECT,
        }
    }

    /// This type with `null` removed.
    pub fn without_null(self) -> Type {
        self & !Type::NULL
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("<unset>");
        }
        if *self == Type::ANY {
            return f.write_str("any");
        }
        if let Some(name) = self.name() {
            return f.write_str(name);
        }
        let names: Vec<_> = self.range().filter_map(Type::name).collect();
        write!(f, "({})", names.join("|"))
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Some(name) = self.name() {
            return serializer.serialize_str(name);
        }
        let mut seq = serializer.serialize_seq(Some(self.range().count()))?;
        for atom in self.range() {
            if let Some(name) = atom.name() {
                seq.serialize_element(name)?;
            }
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypeVisitor;

        impl<'de> Visitor<'de> for TypeVisitor {
            type Value = Type;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a type name or an array of type names")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Type, E> {
                Type::parse(v).ok_or_else(|| E::custom(format!("invalid type {v:?}")))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Type, A::Error> {
                let mut t = Type::EMPTY;
                while let Some(name) = seq.next_element::<String>()? {
                    t |= Type::parse(&name)
                        .ok_or_else(|| de::Error::custom(format!("invalid type {name:?}")))?;
                }
                Ok(t)
            }
        }

        deserializer.deserialize_any(TypeVisitor)
    }
}

impl Kind {
    const NAMES: &'static [(Kind, &'static str)] = &[
        (Kind::IDENTIFIER, "Identifier"),
        (Kind::RESERVED_LOCATION, "Reserved Location"),
        (Kind::APPLICATOR, "Applicator"),
        (Kind::ANNOTATION, "Annotation"),
        (Kind::ASSERTION, "Assertion"),
    ];
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self
            .range()
            .filter_map(|atom| Kind::NAMES.iter().find(|(k, _)| *k == atom))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&names.join(" | "))
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kind({self})")
    }
}

/// Well-known `format` values. Formats are annotations and are not asserted.
pub mod format {
    pub const DATE_TIME: &str = "date-time";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
    pub const DURATION: &str = "duration";
    pub const EMAIL: &str = "email";
    pub const IDN_EMAIL: &str = "idn-email";
    pub const IPV4: &str = "ipv4";
    pub const IPV6: &str = "ipv6";
    pub const URI: &str = "uri";
    pub const URI_REFERENCE: &str = "uri-reference";
    pub const IRI: &str = "iri";
    pub const IRI_REFERENCE: &str = "iri-reference";
    pub const UUID: &str = "uuid";
    pub const URI_TEMPLATE: &str = "uri-template";
    pub const JSON_POINTER: &str = "json-pointer";
    pub const RELATIVE_JSON_POINTER: &str = "relative-json-pointer";
    pub const REGEX: &str = "regex";

    // OpenAPI data type formats
    pub const INT32: &str = "int32";
    pub const INT64: &str = "int64";
    pub const FLOAT: &str = "float";
    pub const DOUBLE: &str = "double";
    pub const BASE64: &str = "base64";
    pub const BINARY: &str = "binary";
    pub const PASSWORD: &str = "password";
}

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// JSON Schema equality: numbers compare by value (`1 == 1.0`), arrays
/// element-wise, objects key-wise regardless of order.
pub fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return x == y;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| json_equal(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map(|w| json_equal(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}
