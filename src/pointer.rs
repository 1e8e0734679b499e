//! JSON Pointer (RFC 6901) and same-document URI fragments.
//!
//! A pointer is `""` or a sequence of `/`-prefixed tokens. Within a token `~1`
//! stands for `/` and `~0` for `~`. A URI fragment is `#` followed by a
//! percent-encoded pointer.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AccessError, PointerError};
use crate::types::json_type_name;

/// Characters escaped when rendering a pointer as a URI fragment.
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn pointer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(/([^/~]|~[01])*)*$").expect("pointer regex must compile"))
}

fn index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("index regex must compile"))
}

/// Escapes a raw key for use as a pointer token.
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Reverses [`escape`]: `~1` becomes `/` first, then `~0` becomes `~`.
pub fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// One unescaped reference token.
///
/// Tokens spelled as a non-negative integer without leading zeros also carry
/// an array index; they still address object members by their text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    key: String,
    index: Option<usize>,
}

impl Token {
    /// A token from its unescaped text.
    pub fn key(key: impl Into<String>) -> Self {
        let key = key.into();
        let index = if index_re().is_match(&key) {
            key.parse().ok()
        } else {
            None
        };
        Token { key, index }
    }

    pub fn index(index: usize) -> Self {
        Token {
            key: index.to_string(),
            index: Some(index),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn as_index(&self) -> Option<usize> {
        self.index
    }

    /// The token as it appears inside a pointer.
    pub fn escaped(&self) -> String {
        escape(&self.key)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

/// A parsed JSON Pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    tokens: Vec<Token>,
}

impl Pointer {
    /// The empty pointer, addressing the whole document.
    pub fn root() -> Self {
        Pointer::default()
    }

    /// Parses RFC 6901 syntax.
    pub fn parse(pointer: &str) -> Result<Self, PointerError> {
        if !pointer_re().is_match(pointer) {
            return Err(PointerError::InvalidSyntax {
                pointer: pointer.to_string(),
            });
        }
        let tokens = pointer
            .split('/')
            .skip(1)
            .map(|part| Token::key(unescape(part)))
            .collect();
        Ok(Pointer { tokens })
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Appends one unescaped token.
    pub fn push(&mut self, token: impl Into<String>) {
        self.tokens.push(Token::key(token));
    }

    /// Returns a new pointer with one more token.
    pub fn join(&self, token: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(token);
        next
    }

    /// The last token, if any.
    pub fn last(&self) -> Option<&Token> {
        self.tokens.last()
    }

    /// Walks the pointer through a decoded JSON document.
    pub fn access<'v>(&self, document: &'v Value) -> Result<&'v Value, AccessError> {
        let mut current = document;
        for (i, token) in self.tokens.iter().enumerate() {
            let fail = |value: &Value, reason: String| AccessError {
                used: self.tokens[..i].to_vec(),
                remaining: self.tokens[i..].to_vec(),
                value: value.clone(),
                reason,
            };
            current = match current {
                Value::Array(items) => match token.as_index() {
                    Some(idx) => items
                        .get(idx)
                        .ok_or_else(|| fail(current, "index out of range".to_string()))?,
                    None => return Err(fail(current, "expect object got array".to_string())),
                },
                Value::Object(map) => map
                    .get(token.as_str())
                    .ok_or_else(|| fail(current, "key out of range".to_string()))?,
                other => {
                    return Err(fail(
                        other,
                        format!("expect object got {}", json_type_name(other)),
                    ))
                }
            };
        }
        Ok(current)
    }

    /// Walks the pointer through a record by its serialized field names.
    ///
    /// The record is serialized first, so `Option`, `Box` and other transparent
    /// layers are looked through and renamed fields answer to their wire names.
    pub fn access_serialized<T: Serialize + ?Sized>(
        &self,
        document: &T,
    ) -> Result<Value, AccessError> {
        let value = serde_json::to_value(document).map_err(|e| AccessError {
            used: Vec::new(),
            remaining: self.tokens.clone(),
            value: Value::Null,
            reason: format!("document does not serialize: {e}"),
        })?;
        self.access(&value).cloned()
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "/{}", token.escaped())?;
        }
        Ok(())
    }
}

impl FromStr for Pointer {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pointer::parse(s)
    }
}

/// A same-document URI fragment: `#` plus a percent-encoded pointer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UriFragment {
    pointer: Pointer,
}

impl UriFragment {
    /// Percent-decodes the fragment, then parses the pointer after `#`.
    pub fn parse(fragment: &str) -> Result<Self, PointerError> {
        let decoded = percent_decode_str(fragment)
            .decode_utf8()
            .map_err(|_| PointerError::InvalidEncoding {
                fragment: fragment.to_string(),
            })?;
        let pointer = decoded
            .strip_prefix('#')
            .ok_or_else(|| PointerError::InvalidFragment {
                fragment: fragment.to_string(),
            })?;
        Ok(UriFragment {
            pointer: Pointer::parse(pointer)?,
        })
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    pub fn access<'v>(&self, document: &'v Value) -> Result<&'v Value, AccessError> {
        self.pointer.access(document)
    }
}

impl From<Pointer> for UriFragment {
    fn from(pointer: Pointer) -> Self {
        UriFragment { pointer }
    }
}

impl fmt::Display for UriFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = self.pointer.to_string();
        write!(f, "#{}", utf8_percent_encode(&pointer, FRAGMENT))
    }
}

impl FromStr for UriFragment {
    type Err = PointerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UriFragment::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn token_counts() {
        let cases = [
            ("", 0),
            ("/foo", 1),
            ("/foo/0", 2),
            ("/", 1),
            ("/a/b", 2),
            ("/c%d", 1),
            ("/e^f", 1),
            ("/g|h", 1),
            ("/\\j", 1),
            ("/\"l", 1),
            ("/ ", 1),
            ("/m~0n", 1),
        ];
        for (pointer, len) in cases {
            let parsed = Pointer::parse(pointer).unwrap();
            assert_eq!(parsed.tokens().len(), len, "{pointer:?}");
        }
    }

    #[test]
    fn invalid_syntax() {
        for pointer in ["foo", "/a~2", "/a~", "#/foo"] {
            assert!(
                matches!(Pointer::parse(pointer), Err(PointerError::InvalidSyntax { .. })),
                "{pointer:?}"
            );
        }
    }

    #[test]
    fn unescape_order() {
        // "~01" is "~0" followed by "1", not an escaped slash.
        assert_eq!(unescape("~01"), "~1");
        assert_eq!(unescape("a~1b"), "a/b");
        assert_eq!(escape("m~n/o"), "m~0n~1o");
    }

    #[test]
    fn index_tokens() {
        assert_eq!(Token::key("0").as_index(), Some(0));
        assert_eq!(Token::key("12").as_index(), Some(12));
        assert_eq!(Token::key("01").as_index(), None);
        assert_eq!(Token::key("-1").as_index(), None);
        assert_eq!(Token::key("x").as_index(), None);
    }

    #[test]
    fn numeric_token_addresses_object_member() {
        let doc = json!({"0": "zero"});
        assert_eq!(Pointer::parse("/0").unwrap().access(&doc).unwrap(), "zero");
    }

    #[test]
    fn access_errors_carry_context() {
        let doc = json!({"foo": ["bar", "baz"], "n": 1});

        let err = Pointer::parse("/foo/2").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "index out of range");
        assert_eq!(err.used, vec![Token::key("foo")]);
        assert_eq!(err.remaining, vec![Token::index(2)]);
        assert_eq!(err.value, json!(["bar", "baz"]));

        let err = Pointer::parse("/missing/x").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "key out of range");
        assert_eq!(err.remaining.len(), 2);

        let err = Pointer::parse("/n/x").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "expect object got number");

        let err = Pointer::parse("/foo/bar").unwrap().access(&doc).unwrap_err();
        assert_eq!(err.reason, "expect object got array");
    }

    #[test]
    fn serialized_records_use_wire_names() {
        #[derive(Serialize)]
        struct Inner {
            #[serde(rename = "displayName")]
            display_name: String,
        }
        #[derive(Serialize)]
        struct Outer {
            inner: Option<Box<Inner>>,
        }

        let doc = Outer {
            inner: Some(Box::new(Inner {
                display_name: "pet".into(),
            })),
        };
        let pointer = Pointer::parse("/inner/displayName").unwrap();
        assert_eq!(pointer.access_serialized(&doc).unwrap(), json!("pet"));

        let pointer = Pointer::parse("/inner/display_name").unwrap();
        assert_eq!(
            pointer.access_serialized(&doc).unwrap_err().reason,
            "key out of range"
        );
    }

    #[test]
    fn fragment_requires_hash() {
        assert!(matches!(
            UriFragment::parse("/foo"),
            Err(PointerError::InvalidFragment { .. })
        ));
        assert!(UriFragment::parse("#").unwrap().pointer().is_root());
    }

    #[test]
    fn fragment_display_percent_encodes() {
        let fragment = UriFragment::from(Pointer::parse("/c%d/ ").unwrap());
        assert_eq!(fragment.to_string(), "#/c%25d/%20");
        assert_eq!(UriFragment::parse(&fragment.to_string()).unwrap(), fragment);
    }

    #[test]
    fn join_escapes_on_display() {
        let pointer = Pointer::parse("/components/schemas")
            .unwrap()
            .join("a/b");
        assert_eq!(pointer.to_string(), "/components/schemas/a~1b");
        assert_eq!(pointer.last().unwrap().as_str(), "a/b");
    }

    proptest! {
        #[test]
        fn escape_round_trips(key in "[a-z~/0-9 ]{0,12}") {
            prop_assert_eq!(unescape(&escape(&key)), key.clone());
            let pointer = Pointer::parse(&format!("/{}", escape(&key))).unwrap();
            prop_assert_eq!(pointer.tokens()[0].as_str(), key.as_str());
        }
    }
}
